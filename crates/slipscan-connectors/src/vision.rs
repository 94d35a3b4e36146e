//! Google Cloud Vision OCR provider.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use slipscan_core::models::config::{OcrConfig, OcrMode};
use slipscan_core::{OcrError, OcrProvider, OcrText};

enum VisionAuth {
    ApiKey(String),
    Bearer(String),
}

/// OCR via the Vision `images:annotate` endpoint.
///
/// Credentials are used as given; obtaining or refreshing a bearer token is
/// the caller's business.
pub struct VisionOcr {
    client: reqwest::Client,
    endpoint: String,
    auth: VisionAuth,
    mode: OcrMode,
    language_hints: Vec<String>,
}

impl VisionOcr {
    /// Build a client from configuration. Prefers the API key over the token.
    pub fn from_config(config: &OcrConfig) -> Result<Self, OcrError> {
        let auth = match (&config.api_key, &config.access_token) {
            (Some(key), _) => VisionAuth::ApiKey(key.clone()),
            (None, Some(token)) => VisionAuth::Bearer(token.clone()),
            (None, None) => return Err(OcrError::MissingCredentials),
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OcrError::Request(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            auth,
            mode: config.mode,
            language_hints: config.language_hints.clone(),
        })
    }

    fn url(&self) -> String {
        format!("{}/v1/images:annotate", self.endpoint)
    }

    /// Request body for a single image.
    pub fn annotate_request(&self, image: &[u8]) -> AnnotateRequest {
        AnnotateRequest::new(image, self.mode, &self.language_hints)
    }
}

#[async_trait]
impl OcrProvider for VisionOcr {
    async fn recognize(&self, image: &[u8]) -> Result<OcrText, OcrError> {
        info!("[Vision] Recognizing {} byte image", image.len());

        let mut request = self.client.post(self.url()).json(&self.annotate_request(image));
        request = match &self.auth {
            VisionAuth::ApiKey(key) => request.query(&[("key", key)]),
            VisionAuth::Bearer(token) => request.bearer_auth(token),
        };

        let response = request
            .send()
            .await
            .map_err(|e| OcrError::Request(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| OcrError::Request(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(OcrError::Api { status, body });
        }

        let parsed: AnnotateResponse =
            serde_json::from_str(&body).map_err(|e| OcrError::InvalidResponse(e.to_string()))?;
        let text = parsed.into_text()?;
        debug!("[Vision] Recognized {} characters", text.len());

        Ok(OcrText {
            text,
            debug: Some(format!("Vision HTTP {status}")),
        })
    }
}

/// `images:annotate` request body.
#[derive(Debug, Serialize)]
pub struct AnnotateRequest {
    requests: Vec<ImageRequest>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageRequest {
    image: ImageContent,
    features: Vec<Feature>,
    image_context: ImageContext,
}

#[derive(Debug, Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
    max_results: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageContext {
    language_hints: Vec<String>,
}

impl AnnotateRequest {
    pub fn new(image: &[u8], mode: OcrMode, language_hints: &[String]) -> Self {
        Self {
            requests: vec![ImageRequest {
                image: ImageContent {
                    content: STANDARD.encode(image),
                },
                features: vec![Feature {
                    kind: mode.feature_type(),
                    max_results: 1,
                }],
                image_context: ImageContext {
                    language_hints: language_hints.to_vec(),
                },
            }],
        }
    }
}

/// `images:annotate` response body, reduced to the text fields.
#[derive(Debug, Default, Deserialize)]
pub struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<ImageResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageResponse {
    #[serde(default)]
    full_text_annotation: Option<FullTextAnnotation>,
    #[serde(default)]
    text_annotations: Vec<EntityAnnotation>,
    #[serde(default)]
    error: Option<ImageError>,
}

#[derive(Debug, Deserialize)]
struct FullTextAnnotation {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct EntityAnnotation {
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ImageError {
    #[serde(default)]
    message: String,
}

impl AnnotateResponse {
    /// Document text if present, else the first text annotation, else empty.
    pub fn into_text(self) -> Result<String, OcrError> {
        let Some(first) = self.responses.into_iter().next() else {
            return Ok(String::new());
        };

        if let Some(error) = first.error {
            return Err(OcrError::InvalidResponse(error.message));
        }

        Ok(first
            .full_text_annotation
            .map(|annotation| annotation.text)
            .or_else(|| first.text_annotations.into_iter().next().map(|a| a.description))
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn response(json: &str) -> AnnotateResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_request_body() {
        let hints = vec!["th".to_string(), "en".to_string()];
        let request = AnnotateRequest::new(b"abc", OcrMode::Document, &hints);

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "requests": [{
                    "image": {"content": "YWJj"},
                    "features": [{"type": "DOCUMENT_TEXT_DETECTION", "maxResults": 1}],
                    "imageContext": {"languageHints": ["th", "en"]}
                }]
            })
        );
    }

    #[test]
    fn test_document_text_preferred() {
        let text = response(
            r#"{"responses": [{
                "fullTextAnnotation": {"text": "full text"},
                "textAnnotations": [{"description": "first annotation"}]
            }]}"#,
        )
        .into_text()
        .unwrap();

        assert_eq!(text, "full text");
    }

    #[test]
    fn test_text_annotation_fallback() {
        let text = response(r#"{"responses": [{"textAnnotations": [{"description": "plain"}]}]}"#)
            .into_text()
            .unwrap();

        assert_eq!(text, "plain");
    }

    #[test]
    fn test_empty_response() {
        assert_eq!(response(r#"{"responses": [{}]}"#).into_text().unwrap(), "");
        assert_eq!(response("{}").into_text().unwrap(), "");
    }

    #[test]
    fn test_image_error() {
        let err = response(r#"{"responses": [{"error": {"code": 3, "message": "Bad image data."}}]}"#)
            .into_text()
            .unwrap_err();

        assert_eq!(err.to_string(), "invalid OCR response: Bad image data.");
    }

    #[test]
    fn test_missing_credentials() {
        let err = VisionOcr::from_config(&OcrConfig::default()).err().unwrap();
        assert!(matches!(err, OcrError::MissingCredentials));
    }
}
