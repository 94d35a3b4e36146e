//! Chat-platform webhook envelopes (LINE Messaging API shape).

use serde::{Deserialize, Serialize};

/// Body of a chat-platform webhook call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatEnvelope {
    /// Bot user id the events were sent to.
    #[serde(default)]
    pub destination: Option<String>,

    /// Events in delivery order.
    #[serde(default)]
    pub events: Vec<ChatEvent>,
}

/// A single webhook event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatEvent {
    /// Event type (`message`, `follow`, `postback`, ...).
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub reply_token: Option<String>,

    #[serde(default)]
    pub source: Option<EventSource>,

    #[serde(default)]
    pub message: Option<EventMessage>,

    /// Milliseconds since the epoch.
    #[serde(default)]
    pub timestamp: Option<i64>,
}

/// Who sent the event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSource {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    #[serde(default)]
    pub user_id: Option<String>,
}

/// Message payload of a `message` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMessage {
    pub id: String,

    /// Message type (`text`, `image`, `sticker`, ...).
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub text: Option<String>,
}

impl ChatEvent {
    /// Message id and sender of an image message, if this event is one.
    pub fn image_message(&self) -> Option<(&str, &str)> {
        if self.kind != "message" {
            return None;
        }
        let message = self.message.as_ref().filter(|m| m.kind == "image")?;
        let sender = self.source.as_ref()?.user_id.as_deref()?;
        Some((message.id.as_str(), sender))
    }
}
