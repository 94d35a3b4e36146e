//! Relay pipeline shared by every webhook entry point.
//!
//! The relay owns no I/O of its own: OCR, slip storage and chat messaging are
//! reached through the collaborator traits below.

mod chat;
mod upload;

pub use chat::summary_text;
pub use upload::{
    collect_metadata, resolve_secret, sanitize_filename, verify_secret, UploadRequest,
};

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{MessagingError, OcrError, RelayError, Result, StorageError};
use crate::models::slip::ict_timestamp;
use crate::slip::SlipParser;

/// Text recognized in an image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OcrText {
    /// Full recognized text.
    pub text: String,
    /// Provider diagnostics (e.g. HTTP status), echoed to upload callers.
    pub debug: Option<String>,
}

/// Recognizes text in slip images.
#[async_trait]
pub trait OcrProvider: Send + Sync {
    async fn recognize(&self, image: &[u8]) -> std::result::Result<OcrText, OcrError>;
}

/// A persisted slip image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSlip {
    /// Name the image was stored under.
    pub name: String,
    /// URL the image can be retrieved from.
    pub url: String,
}

/// Persists slip images.
#[async_trait]
pub trait SlipStore: Send + Sync {
    async fn put(
        &self,
        filename: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> std::result::Result<StoredSlip, StorageError>;
}

/// Chat-platform messaging.
#[async_trait]
pub trait MessagingApi: Send + Sync {
    /// Download the binary content of a received message.
    async fn fetch_content(&self, message_id: &str) -> std::result::Result<Vec<u8>, MessagingError>;

    /// Push a text message to a user.
    async fn push_text(&self, to: &str, text: &str) -> std::result::Result<(), MessagingError>;
}

/// Payload returned to upload callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayResponse {
    /// Always `"ok"`; errors use a separate payload.
    pub status: String,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub amount: Option<Decimal>,
    pub paid_at: String,
    pub bank_account: String,
    pub slip_id: String,
    pub slip_url: String,
    pub ocr_debug: Option<String>,
    pub raw_text: String,
    pub metadata: BTreeMap<String, String>,
}

/// Relay pipeline: secret check, storage, OCR, parsing, replies.
pub struct Relay {
    parser: SlipParser,
    webhook_secret: String,
    ocr: Option<Arc<dyn OcrProvider>>,
    store: Option<Arc<dyn SlipStore>>,
    messaging: Option<Arc<dyn MessagingApi>>,
}

impl Relay {
    /// Create a relay with no collaborators and no secret.
    pub fn new(parser: SlipParser) -> Self {
        Self {
            parser,
            webhook_secret: String::new(),
            ocr: None,
            store: None,
            messaging: None,
        }
    }

    /// Require callers to present this secret. Empty disables the check.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.webhook_secret = secret.into();
        self
    }

    pub fn with_ocr(mut self, ocr: Arc<dyn OcrProvider>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn SlipStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_messaging(mut self, messaging: Arc<dyn MessagingApi>) -> Self {
        self.messaging = Some(messaging);
        self
    }

    /// Check a caller-provided secret against the configured one.
    pub fn authorize(&self, provided: Option<&str>) -> std::result::Result<(), RelayError> {
        verify_secret(&self.webhook_secret, provided)
    }

    fn ocr(&self) -> std::result::Result<&dyn OcrProvider, RelayError> {
        self.ocr.as_deref().ok_or(RelayError::MissingConfig("ocr"))
    }

    fn store(&self) -> std::result::Result<&dyn SlipStore, RelayError> {
        self.store.as_deref().ok_or(RelayError::MissingConfig("storage"))
    }

    fn messaging(&self) -> std::result::Result<&dyn MessagingApi, RelayError> {
        self.messaging
            .as_deref()
            .ok_or(RelayError::MissingConfig("messaging"))
    }

    /// Store an uploaded slip image, OCR it and return the parsed fields.
    pub async fn process_upload(&self, request: UploadRequest) -> Result<RelayResponse> {
        self.authorize(request.provided_secret())?;
        let store = self.store()?;

        if request.body.is_empty() {
            return Err(RelayError::EmptyBody.into());
        }

        let filename = request.filename();
        let stored = store
            .put(&filename, request.content_type(), &request.body)
            .await?;
        info!("Stored slip {} at {}", stored.name, stored.url);

        let ocr = self.ocr()?.recognize(&request.body).await?;
        let parsed = self.parser.parse(&ocr.text);

        Ok(RelayResponse {
            status: "ok".to_string(),
            amount: parsed.amount,
            paid_at: ict_timestamp::format(&parsed.paid_at),
            bank_account: parsed.bank_account,
            slip_id: parsed.slip_id,
            slip_url: stored.url,
            ocr_debug: ocr.debug,
            raw_text: ocr.text,
            metadata: request.metadata(),
        })
    }
}
