//! Chat-platform image events.

use tracing::{debug, info, warn};

use super::Relay;
use crate::error::Result;
use crate::models::chat::ChatEnvelope;
use crate::models::slip::ParsedSlip;

impl Relay {
    /// OCR every image message in the envelope and push a summary back to
    /// its sender.
    ///
    /// Non-image events are skipped. A failure on one image is logged and
    /// does not stop the rest. Returns the number of slips answered.
    pub async fn handle_chat_envelope(
        &self,
        provided_secret: Option<&str>,
        envelope: &ChatEnvelope,
    ) -> Result<usize> {
        self.authorize(provided_secret)?;

        let images: Vec<(&str, &str)> = envelope
            .events
            .iter()
            .filter_map(|event| {
                let image = event.image_message();
                if image.is_none() {
                    debug!("Skipping {} event", event.kind);
                }
                image
            })
            .collect();

        if images.is_empty() {
            return Ok(0);
        }

        // Missing collaborators fail the whole call, not each event.
        self.ocr()?;
        self.messaging()?;

        let mut handled = 0;
        for (message_id, sender) in images {
            match self.answer_chat_image(message_id, sender).await {
                Ok(slip) => {
                    info!("Answered slip {} for message {}", slip.slip_id, message_id);
                    handled += 1;
                }
                Err(e) => warn!("Failed to handle image message {}: {}", message_id, e),
            }
        }

        Ok(handled)
    }

    async fn answer_chat_image(&self, message_id: &str, sender: &str) -> Result<ParsedSlip> {
        let messaging = self.messaging()?;
        let image = messaging.fetch_content(message_id).await?;

        if let Some(store) = self.store.as_deref() {
            let name = format!("{message_id}.jpg");
            match store.put(&name, "image/jpeg", &image).await {
                Ok(stored) => debug!("Archived message {} at {}", message_id, stored.url),
                Err(e) => warn!("Failed to archive message {}: {}", message_id, e),
            }
        }

        let ocr = self.ocr()?.recognize(&image).await?;
        let slip = self.parser.parse(&ocr.text);

        messaging.push_text(sender, &summary_text(&slip)).await?;
        Ok(slip)
    }
}

/// Plain-text reply describing a parsed slip.
pub fn summary_text(slip: &ParsedSlip) -> String {
    let amount = slip
        .amount
        .map(|a| format!("{:.2} THB", a))
        .unwrap_or_else(|| "-".to_string());
    let account = if slip.bank_account.is_empty() {
        "-"
    } else {
        slip.bank_account.as_str()
    };

    format!(
        "Slip received\nAmount: {}\nPaid at: {}\nAccount: {}\nSlip ID: {}",
        amount,
        slip.paid_at_string(),
        account,
        slip.slip_id
    )
}
