//! Principal public-key registry for signature verification.
//!
//! The registry maps principal ids to registered Ed25519 verifying keys and
//! tracks revocation. How keys are provisioned or rotated is an external
//! concern; verification only needs the resulting view. A revoked key is a
//! distinct lookup outcome from an unknown principal because the two
//! indicate different failure causes (trust withdrawal versus tamper or
//! misattribution).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::{SignerError, VerifyingKey, parse_verifying_key_hex};

/// One principal's entry in a serialized key registry file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryEntry {
    /// Principal identifier.
    pub principal: String,

    /// Hex-encoded Ed25519 public key.
    pub public_key: String,

    /// Whether trust in this key has been withdrawn.
    #[serde(default)]
    pub revoked: bool,
}

/// Errors that can occur while building a registry.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RegistryError {
    /// A registry entry carries an unusable public key.
    #[error("invalid public key for principal '{principal}': {source}")]
    InvalidKey {
        /// The principal whose key is invalid.
        principal: String,
        /// The underlying parse failure.
        #[source]
        source: SignerError,
    },

    /// The same principal appears twice.
    #[error("duplicate principal '{principal}' in registry")]
    DuplicatePrincipal {
        /// The duplicated principal id.
        principal: String,
    },
}

/// A registered key and its trust state.
#[derive(Debug, Clone)]
pub struct KeyRecord {
    verifying_key: VerifyingKey,
    revoked: bool,
}

impl KeyRecord {
    /// Returns the verifying key.
    #[must_use]
    pub const fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    /// Returns true if trust in this key has been withdrawn.
    #[must_use]
    pub const fn is_revoked(&self) -> bool {
        self.revoked
    }
}

/// Public-key registry keyed by principal id.
#[derive(Debug, Clone, Default)]
pub struct KeyRegistry {
    keys: BTreeMap<String, KeyRecord>,
}

impl KeyRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from serialized entries.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidKey`] for an unparseable key and
    /// [`RegistryError::DuplicatePrincipal`] if a principal repeats.
    pub fn from_entries(entries: &[RegistryEntry]) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for entry in entries {
            let key = parse_verifying_key_hex(&entry.public_key).map_err(|source| {
                RegistryError::InvalidKey {
                    principal: entry.principal.clone(),
                    source,
                }
            })?;
            if registry.keys.contains_key(&entry.principal) {
                return Err(RegistryError::DuplicatePrincipal {
                    principal: entry.principal.clone(),
                });
            }
            registry.keys.insert(
                entry.principal.clone(),
                KeyRecord {
                    verifying_key: key,
                    revoked: entry.revoked,
                },
            );
        }
        Ok(registry)
    }

    /// Registers (or replaces) a principal's key as trusted.
    pub fn register(&mut self, principal: impl Into<String>, key: VerifyingKey) {
        self.keys.insert(
            principal.into(),
            KeyRecord {
                verifying_key: key,
                revoked: false,
            },
        );
    }

    /// Marks a principal's key as revoked.
    ///
    /// Returns false if the principal is not registered.
    pub fn revoke(&mut self, principal: &str) -> bool {
        match self.keys.get_mut(principal) {
            Some(record) => {
                record.revoked = true;
                true
            },
            None => false,
        }
    }

    /// Looks up a principal's key record.
    #[must_use]
    pub fn record(&self, principal: &str) -> Option<&KeyRecord> {
        self.keys.get(principal)
    }

    /// Returns the number of registered principals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if no principals are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Signer;

    #[test]
    fn register_and_lookup() {
        let signer = Signer::generate();
        let mut registry = KeyRegistry::new();
        registry.register("kernel-1", signer.verifying_key());

        let record = registry.record("kernel-1").unwrap();
        assert_eq!(record.verifying_key(), &signer.verifying_key());
        assert!(!record.is_revoked());
        assert!(registry.record("kernel-2").is_none());
    }

    #[test]
    fn revoke_flips_trust_state() {
        let signer = Signer::generate();
        let mut registry = KeyRegistry::new();
        registry.register("kernel-1", signer.verifying_key());

        assert!(registry.revoke("kernel-1"));
        assert!(registry.record("kernel-1").unwrap().is_revoked());
        assert!(!registry.revoke("kernel-2"));
    }

    #[test]
    fn from_entries_round_trip() {
        let signer = Signer::generate();
        let entries = vec![RegistryEntry {
            principal: "kernel-1".to_string(),
            public_key: signer.public_key_hex(),
            revoked: true,
        }];
        let registry = KeyRegistry::from_entries(&entries).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.record("kernel-1").unwrap().is_revoked());
    }

    #[test]
    fn from_entries_rejects_bad_key() {
        let entries = vec![RegistryEntry {
            principal: "kernel-1".to_string(),
            public_key: "not-hex".to_string(),
            revoked: false,
        }];
        assert!(matches!(
            KeyRegistry::from_entries(&entries),
            Err(RegistryError::InvalidKey { .. })
        ));
    }

    #[test]
    fn from_entries_rejects_duplicate_principal() {
        let signer = Signer::generate();
        let entry = RegistryEntry {
            principal: "kernel-1".to_string(),
            public_key: signer.public_key_hex(),
            revoked: false,
        };
        let result = KeyRegistry::from_entries(&[entry.clone(), entry]);
        assert!(matches!(
            result,
            Err(RegistryError::DuplicatePrincipal { .. })
        ));
    }

    #[test]
    fn registry_entry_defaults_revoked_to_false() {
        let json = r#"{"principal": "p", "public_key": "00"}"#;
        let entry: RegistryEntry = serde_json::from_str(json).unwrap();
        assert!(!entry.revoked);
    }
}
