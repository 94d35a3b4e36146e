//! LINE Messaging API client.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use slipscan_core::models::config::MessagingConfig;
use slipscan_core::{MessagingApi, MessagingError};

/// Downloads message content and pushes text replies with a channel access
/// token.
pub struct LineMessaging {
    client: reqwest::Client,
    endpoint: String,
    data_endpoint: String,
    token: String,
}

impl LineMessaging {
    pub fn from_config(config: &MessagingConfig) -> Result<Self, MessagingError> {
        let token = config
            .channel_access_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or(MessagingError::MissingToken)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(request_error)?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            data_endpoint: config.data_endpoint.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn content_url(&self, message_id: &str) -> String {
        format!("{}/v2/bot/message/{}/content", self.data_endpoint, message_id)
    }

    fn push_url(&self) -> String {
        format!("{}/v2/bot/message/push", self.endpoint)
    }
}

/// Push message request body.
#[derive(Debug, Serialize)]
pub struct PushRequest {
    to: String,
    messages: Vec<TextMessage>,
}

#[derive(Debug, Serialize)]
struct TextMessage {
    #[serde(rename = "type")]
    kind: &'static str,
    text: String,
}

impl PushRequest {
    pub fn text(to: &str, text: &str) -> Self {
        Self {
            to: to.to_string(),
            messages: vec![TextMessage {
                kind: "text",
                text: text.to_string(),
            }],
        }
    }
}

fn request_error(e: reqwest::Error) -> MessagingError {
    MessagingError::Request(e.to_string())
}

async fn api_error(response: reqwest::Response) -> MessagingError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    MessagingError::Api { status, body }
}

#[async_trait]
impl MessagingApi for LineMessaging {
    async fn fetch_content(&self, message_id: &str) -> Result<Vec<u8>, MessagingError> {
        info!("[LINE] Fetching content of message {}", message_id);

        let response = self
            .client
            .get(self.content_url(message_id))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(request_error)?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let bytes = response.bytes().await.map_err(request_error)?;
        Ok(bytes.to_vec())
    }

    async fn push_text(&self, to: &str, text: &str) -> Result<(), MessagingError> {
        info!("[LINE] Pushing text to {}", to);

        let response = self
            .client
            .post(self.push_url())
            .bearer_auth(&self.token)
            .json(&PushRequest::text(to, text))
            .send()
            .await
            .map_err(request_error)?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }
        Ok(())
    }
}
