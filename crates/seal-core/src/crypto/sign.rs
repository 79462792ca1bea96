//! Ed25519 signing and verification primitives.

use ed25519_dalek::{Signer as _, SigningKey};
use rand::rngs::OsRng;
use thiserror::Error;

pub use ed25519_dalek::{Signature, VerifyingKey};

/// Size of an Ed25519 public key in bytes.
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Size of an Ed25519 signature in bytes.
pub const SIGNATURE_SIZE: usize = 64;

/// Errors that can occur during signing and verification operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SignerError {
    /// The public key bytes are malformed.
    #[error("invalid public key: {reason}")]
    InvalidPublicKey {
        /// The reason the key is invalid.
        reason: String,
    },

    /// The signature encoding is malformed.
    #[error("malformed signature: {reason}")]
    MalformedSignature {
        /// The reason the signature is malformed.
        reason: String,
    },

    /// The signature does not verify against the key and message.
    #[error("signature verification failed")]
    VerificationFailed,
}

/// An Ed25519 signing identity.
///
/// Wraps the signing key so callers only see the operations the receipt
/// contract needs: sign canonical bytes, expose the verifying key.
pub struct Signer {
    signing_key: SigningKey,
}

impl Signer {
    /// Generates a new random keypair.
    #[must_use]
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Constructs a signer from raw secret key bytes.
    #[must_use]
    pub fn from_bytes(bytes: &[u8; PUBLIC_KEY_SIZE]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(bytes),
        }
    }

    /// Signs a message.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }

    /// Returns the verifying (public) key for this signer.
    #[must_use]
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Returns the public key bytes.
    #[must_use]
    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Returns the hex-encoded public key.
    #[must_use]
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key_bytes())
    }
}

impl std::fmt::Debug for Signer {
    // The secret key never appears in debug output.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("public_key", &self.public_key_hex())
            .finish()
    }
}

/// Parses a verifying key from raw bytes.
///
/// # Errors
///
/// Returns [`SignerError::InvalidPublicKey`] if the bytes are not a valid
/// Ed25519 public key.
pub fn parse_verifying_key(bytes: &[u8]) -> Result<VerifyingKey, SignerError> {
    let array: [u8; PUBLIC_KEY_SIZE] =
        bytes
            .try_into()
            .map_err(|_| SignerError::InvalidPublicKey {
                reason: format!("expected {PUBLIC_KEY_SIZE} bytes, got {}", bytes.len()),
            })?;
    VerifyingKey::from_bytes(&array).map_err(|e| SignerError::InvalidPublicKey {
        reason: e.to_string(),
    })
}

/// Parses a verifying key from a hex string.
///
/// # Errors
///
/// Returns [`SignerError::InvalidPublicKey`] if the string is not valid hex
/// or the decoded bytes are not a valid Ed25519 public key.
pub fn parse_verifying_key_hex(hex_key: &str) -> Result<VerifyingKey, SignerError> {
    let bytes = hex::decode(hex_key).map_err(|e| SignerError::InvalidPublicKey {
        reason: format!("invalid hex: {e}"),
    })?;
    parse_verifying_key(&bytes)
}

/// Parses a signature from a hex string.
///
/// # Errors
///
/// Returns [`SignerError::MalformedSignature`] if the string is not valid
/// hex or decodes to the wrong length.
pub fn parse_signature_hex(hex_sig: &str) -> Result<Signature, SignerError> {
    let bytes = hex::decode(hex_sig).map_err(|e| SignerError::MalformedSignature {
        reason: format!("invalid hex: {e}"),
    })?;
    let array: [u8; SIGNATURE_SIZE] =
        bytes
            .as_slice()
            .try_into()
            .map_err(|_| SignerError::MalformedSignature {
                reason: format!("expected {SIGNATURE_SIZE} bytes, got {}", bytes.len()),
            })?;
    Ok(Signature::from_bytes(&array))
}

/// Verifies a signature over a message.
///
/// # Errors
///
/// Returns [`SignerError::VerificationFailed`] if the signature is invalid.
pub fn verify_signature(
    key: &VerifyingKey,
    message: &[u8],
    signature: &Signature,
) -> Result<(), SignerError> {
    key.verify_strict(message, signature)
        .map_err(|_| SignerError::VerificationFailed)
}
