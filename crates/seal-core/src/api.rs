//! Kernel-facing interface types, transport-agnostic.
//!
//! The kernel's HTTP surface is an external collaborator: this module
//! defines only the shapes the engine shares with it — the structured
//! error body every kernel error response carries, and the
//! [`ReceiptSource`] trait abstracting "list sessions, fetch receipts,
//! export a pack" so the engine can be driven by any transport (or, in
//! tests, by an in-memory producer) without a client dependency.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::receipt::{ReasonCode, Receipt, Session};

/// The structured body carried by every kernel error response.
///
/// `reason_code` is drawn from the same closed enumeration receipts use,
/// so kernel-reported and locally-detected denials share one vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiErrorBody {
    /// Human-readable message.
    pub message: String,

    /// Error class, e.g. `invalid_request_error`.
    #[serde(rename = "type")]
    pub error_type: String,

    /// Machine-readable error code.
    pub code: String,

    /// Reason code from the closed enumeration.
    pub reason_code: ReasonCode,
}

/// A kernel-surface failure: HTTP-ish status plus structured body.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("kernel error {status}: {} ({})", .body.message, .body.reason_code)]
pub struct ApiError {
    /// Status code of the response.
    pub status: u16,

    /// The structured error body.
    pub body: ApiErrorBody,
}

impl ApiError {
    /// Builds a not-found error for a missing session.
    #[must_use]
    pub fn session_not_found(session_id: &str) -> Self {
        Self {
            status: 404,
            body: ApiErrorBody {
                message: format!("session '{session_id}' not found"),
                error_type: "invalid_request_error".to_string(),
                code: "session_not_found".to_string(),
                reason_code: ReasonCode::ErrorInternal,
            },
        }
    }

    /// Builds a not-found error for a missing receipt.
    #[must_use]
    pub fn receipt_not_found(blob_hash: &str) -> Self {
        Self {
            status: 404,
            body: ApiErrorBody {
                message: format!("no receipt with blob_hash '{blob_hash}'"),
                error_type: "invalid_request_error".to_string(),
                code: "receipt_not_found".to_string(),
                reason_code: ReasonCode::ErrorInternal,
            },
        }
    }

    /// Builds an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: 500,
            body: ApiErrorBody {
                message: message.into(),
                error_type: "internal_error".to_string(),
                code: "internal".to_string(),
                reason_code: ReasonCode::ErrorInternal,
            },
        }
    }
}

/// A producer of sessions, receipts, and evidence packs.
///
/// The kernel's HTTP client implements this in the surrounding tooling;
/// [`crate::receipt::ReceiptGenerator`] implements it in-memory so the
/// engine can be exercised end-to-end without a network.
pub trait ReceiptSource {
    /// Lists the sessions this source knows about.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the source cannot produce the listing.
    fn list_sessions(&self) -> Result<Vec<Session>, ApiError>;

    /// Fetches one session's ordered receipt sequence.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the session is unknown or unreadable.
    fn session_receipts(&self, session_id: &str) -> Result<Vec<Receipt>, ApiError>;

    /// Fetches a single receipt by its `blob_hash`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if no receipt carries the hash.
    fn receipt_by_hash(&self, blob_hash: &str) -> Result<Receipt, ApiError>;

    /// Exports the full trail as an evidence pack (gzip tarball bytes).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if export fails.
    fn export_pack(&self) -> Result<Vec<u8>, ApiError>;
}

impl ReceiptSource for crate::receipt::ReceiptGenerator {
    fn list_sessions(&self) -> Result<Vec<Session>, ApiError> {
        Ok(self.sessions())
    }

    fn session_receipts(&self, session_id: &str) -> Result<Vec<Receipt>, ApiError> {
        self.session_receipts(session_id)
            .map(<[Receipt]>::to_vec)
            .ok_or_else(|| ApiError::session_not_found(session_id))
    }

    fn receipt_by_hash(&self, blob_hash: &str) -> Result<Receipt, ApiError> {
        self.sessions()
            .iter()
            .filter_map(|session| self.session_receipts(&session.session_id))
            .flatten()
            .find(|receipt| receipt.blob_hash == blob_hash)
            .cloned()
            .ok_or_else(|| ApiError::receipt_not_found(blob_hash))
    }

    fn export_pack(&self) -> Result<Vec<u8>, ApiError> {
        self.export().map_err(|e| ApiError::internal(e.to_string()))
    }
}
