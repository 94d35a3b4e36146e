//! Configuration structures for the slip relay.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Environment variable overriding [`ServerConfig::webhook_secret`].
pub const ENV_WEBHOOK_SECRET: &str = "SLIPSCAN_WEBHOOK_SECRET";
/// Environment variable overriding [`OcrConfig::api_key`].
pub const ENV_VISION_API_KEY: &str = "SLIPSCAN_VISION_API_KEY";
/// Environment variable overriding [`OcrConfig::access_token`].
pub const ENV_VISION_TOKEN: &str = "SLIPSCAN_VISION_TOKEN";
/// Environment variable overriding [`MessagingConfig::channel_access_token`].
pub const ENV_LINE_TOKEN: &str = "SLIPSCAN_LINE_TOKEN";

/// Main configuration for slipscan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SlipscanConfig {
    /// Webhook server configuration.
    pub server: ServerConfig,

    /// OCR provider configuration.
    pub ocr: OcrConfig,

    /// Slip image storage configuration.
    pub storage: StorageConfig,

    /// Chat messaging configuration.
    pub messaging: MessagingConfig,

    /// Slip field extraction configuration.
    pub extraction: ExtractionConfig,
}

/// Webhook server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on.
    pub bind: String,

    /// Shared secret callers must present. Empty disables the check.
    pub webhook_secret: String,

    /// Largest accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            webhook_secret: String::new(),
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Which Vision feature to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrMode {
    /// Dense document text (`DOCUMENT_TEXT_DETECTION`).
    Document,
    /// Sparse text (`TEXT_DETECTION`).
    Text,
}

impl OcrMode {
    pub fn feature_type(self) -> &'static str {
        match self {
            Self::Document => "DOCUMENT_TEXT_DETECTION",
            Self::Text => "TEXT_DETECTION",
        }
    }
}

/// OCR provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Vision API base URL.
    pub endpoint: String,

    /// API key sent as the `key` query parameter.
    pub api_key: Option<String>,

    /// Pre-issued OAuth bearer token. Used when no API key is set.
    pub access_token: Option<String>,

    /// Detection feature.
    pub mode: OcrMode,

    /// Language hints passed to the recognizer.
    pub language_hints: Vec<String>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://vision.googleapis.com".to_string(),
            api_key: None,
            access_token: None,
            mode: OcrMode::Document,
            language_hints: vec!["th".to_string(), "en".to_string()],
            timeout_secs: 30,
        }
    }
}

/// Slip image storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory slips are written to. Uploads are rejected when unset.
    pub dir: Option<PathBuf>,

    /// URL prefix under which `dir` is publicly served.
    pub public_base_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: None,
            public_base_url: "http://127.0.0.1:8080/slips".to_string(),
        }
    }
}

/// Chat messaging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagingConfig {
    /// Messaging API base URL (push).
    pub endpoint: String,

    /// Content API base URL (message attachments).
    pub data_endpoint: String,

    /// Long-lived channel access token.
    pub channel_access_token: Option<String>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.line.me".to_string(),
            data_endpoint: "https://api-data.line.me".to_string(),
            channel_access_token: None,
            timeout_secs: 30,
        }
    }
}

/// How four-digit Buddhist-era years up to 2500 are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YearMode {
    /// Years in (2400, 2500] pass through unchanged, matching slips
    /// already recorded by earlier relays.
    #[default]
    Compatible,
    /// Every year above 2400 is converted from BE to CE.
    Corrected,
}

/// Slip field extraction configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Buddhist-era year handling.
    pub year_mode: YearMode,
}

impl SlipscanConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Apply secret overrides from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_env_from(&std::env::vars().collect())
    }

    /// Apply secret overrides from the given variables. Empty values are ignored.
    pub fn with_env_from(mut self, env: &HashMap<String, String>) -> Self {
        let get = |key: &str| env.get(key).filter(|v| !v.is_empty()).cloned();

        if let Some(secret) = get(ENV_WEBHOOK_SECRET) {
            self.server.webhook_secret = secret;
        }
        if let Some(key) = get(ENV_VISION_API_KEY) {
            self.ocr.api_key = Some(key);
        }
        if let Some(token) = get(ENV_VISION_TOKEN) {
            self.ocr.access_token = Some(token);
        }
        if let Some(token) = get(ENV_LINE_TOKEN) {
            self.messaging.channel_access_token = Some(token);
        }
        self
    }

    /// Whether an OCR credential is available.
    pub fn has_ocr_credentials(&self) -> bool {
        self.ocr.api_key.is_some() || self.ocr.access_token.is_some()
    }
}
