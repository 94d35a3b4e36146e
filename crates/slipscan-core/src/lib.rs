//! Core library for Thai payment-slip OCR relays.
//!
//! This crate provides:
//! - Slip text parsing (amount, bank account, paid-at timestamp, slip id)
//! - Buddhist-era year and Thai month-name normalization
//! - The relay pipeline shared by the upload and chat webhook entry points
//! - Collaborator traits for OCR, slip storage and chat messaging

pub mod clock;
pub mod error;
pub mod models;
pub mod relay;
pub mod slip;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{MessagingError, OcrError, RelayError, Result, SlipscanError, StorageError};
pub use models::chat::{ChatEnvelope, ChatEvent};
pub use models::config::{SlipscanConfig, YearMode};
pub use models::slip::{PaidAtSource, ParsedSlip};
pub use relay::{
    MessagingApi, OcrProvider, OcrText, Relay, RelayResponse, SlipStore, StoredSlip,
    UploadRequest,
};
pub use slip::SlipParser;
