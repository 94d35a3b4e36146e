//! Raw image upload requests.

use std::collections::{BTreeMap, HashMap};

use crate::error::RelayError;

const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";
const DEFAULT_FILENAME: &str = "slip.jpg";

/// Query parameters echoed back to the caller as metadata.
const METADATA_KEYS: &[&str] = &["mode", "room", "lineUserId", "flowId", "ticketId"];

/// An inbound slip upload: the raw image body plus request metadata.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    /// Image bytes.
    pub body: Vec<u8>,
    /// `Content-Type` of the body, if sent.
    pub content_type: Option<String>,
    /// Value of the `X-Worker-Secret` header, if sent.
    pub secret_header: Option<String>,
    /// Query parameters.
    pub params: HashMap<String, String>,
}

impl UploadRequest {
    /// Secret from the header, else the `workerSecret` or `secret` parameter.
    pub fn provided_secret(&self) -> Option<&str> {
        resolve_secret(self.secret_header.as_deref(), &self.params)
    }

    pub fn content_type(&self) -> &str {
        self.content_type
            .as_deref()
            .filter(|ct| !ct.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
    }

    /// Caller-supplied filename, sanitized.
    pub fn filename(&self) -> String {
        let raw = self
            .params
            .get("filename")
            .map(String::as_str)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_FILENAME);
        sanitize_filename(raw)
    }

    pub fn metadata(&self) -> BTreeMap<String, String> {
        collect_metadata(&self.params)
    }
}

/// First non-empty secret among the header value and the `workerSecret` and
/// `secret` parameters, in that order.
pub fn resolve_secret<'a>(
    header: Option<&'a str>,
    params: &'a HashMap<String, String>,
) -> Option<&'a str> {
    header
        .into_iter()
        .chain(params.get("workerSecret").map(String::as_str))
        .chain(params.get("secret").map(String::as_str))
        .find(|secret| !secret.is_empty())
}

/// Reject the request unless `provided` equals a non-empty `expected` secret.
pub fn verify_secret(expected: &str, provided: Option<&str>) -> Result<(), RelayError> {
    if expected.is_empty() || provided == Some(expected) {
        Ok(())
    } else {
        Err(RelayError::Unauthorized)
    }
}

/// Replace every character outside `[A-Za-z0-9_.-]` with `_`.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Copy the known, non-empty metadata parameters.
pub fn collect_metadata(params: &HashMap<String, String>) -> BTreeMap<String, String> {
    METADATA_KEYS
        .iter()
        .filter_map(|key| {
            params
                .get(*key)
                .filter(|value| !value.is_empty())
                .map(|value| (key.to_string(), value.clone()))
        })
        .collect()
}
