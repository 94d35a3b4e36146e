//! Error types for the slipscan-core library.
//!
//! Slip parsing itself never fails; these cover the relay and its
//! collaborators.

use thiserror::Error;

/// Main error type for the slipscan library.
#[derive(Error, Debug)]
pub enum SlipscanError {
    /// Request-level relay error.
    #[error("relay error: {0}")]
    Relay(#[from] RelayError),

    /// OCR provider error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Slip storage error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Chat messaging error.
    #[error("messaging error: {0}")]
    Messaging(#[from] MessagingError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while validating or routing an inbound request.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RelayError {
    /// The shared secret was missing or did not match.
    #[error("missing or invalid secret")]
    Unauthorized,

    /// The request carried no image bytes.
    #[error("empty request body")]
    EmptyBody,

    /// A collaborator needed for this request is not configured.
    #[error("missing {0} configuration")]
    MissingConfig(&'static str),
}

/// Errors from an OCR provider.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The provider has no credentials to call the API with.
    #[error("no OCR credentials configured")]
    MissingCredentials,

    /// Transport-level failure.
    #[error("OCR request failed: {0}")]
    Request(String),

    /// The API answered with a non-2xx status.
    #[error("Vision API error {status}: {body}")]
    Api { status: u16, body: String },

    /// The API answered 2xx but the body could not be decoded.
    #[error("invalid OCR response: {0}")]
    InvalidResponse(String),
}

/// Errors from a slip store.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to persist the image.
    #[error("failed to write {name}: {reason}")]
    Write { name: String, reason: String },
}

/// Errors from the chat messaging API.
#[derive(Error, Debug)]
pub enum MessagingError {
    /// No channel access token is configured.
    #[error("no channel access token configured")]
    MissingToken,

    /// Transport-level failure.
    #[error("messaging request failed: {0}")]
    Request(String),

    /// The API answered with a non-2xx status.
    #[error("messaging API error {status}: {body}")]
    Api { status: u16, body: String },
}

/// Result type for the slipscan library.
pub type Result<T> = std::result::Result<T, SlipscanError>;
