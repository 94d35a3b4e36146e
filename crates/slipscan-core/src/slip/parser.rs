//! Slip parser combining the rule-based extractors.

use std::sync::Arc;

use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::models::config::{ExtractionConfig, YearMode};
use crate::models::slip::{PaidAtSource, ParsedSlip};

use super::rules::{
    amounts::AmountExtractor, dates::DateExtractor, extract_account,
    slip_id::slip_id_from_timestamp, FieldExtractor,
};

/// Parses raw OCR text into a [`ParsedSlip`].
///
/// Parsing never fails: fields that cannot be found take their empty value
/// and `paid_at` falls back to the clock.
#[derive(Clone)]
pub struct SlipParser {
    clock: Arc<dyn Clock>,
    year_mode: YearMode,
}

impl SlipParser {
    /// Create a parser using wall-clock time and compatible year handling.
    pub fn new() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            year_mode: YearMode::Compatible,
        }
    }

    /// Create a parser from extraction settings.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new().with_year_mode(config.year_mode)
    }

    /// Set the time source used when no date is printed on the slip.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set Buddhist-era year handling.
    pub fn with_year_mode(mut self, year_mode: YearMode) -> Self {
        self.year_mode = year_mode;
        self
    }

    /// Parse slip fields from OCR text.
    pub fn parse(&self, text: &str) -> ParsedSlip {
        info!("Parsing slip from {} characters of text", text.len());

        let amount = AmountExtractor::new().extract(text).map(|m| m.value);
        let bank_account = extract_account(text);
        let paid_at = DateExtractor::new()
            .with_year_mode(self.year_mode)
            .resolve(text, self.clock.as_ref());

        if paid_at.source == PaidAtSource::ProcessingTime {
            debug!("No slip date recognized, using processing time");
        }

        let slip = ParsedSlip {
            amount,
            bank_account,
            slip_id: slip_id_from_timestamp(&paid_at.timestamp),
            paid_at: paid_at.timestamp,
            paid_at_source: paid_at.source,
        };

        debug!(
            "Extracted slip {} (amount: {:?}, account: {:?})",
            slip.slip_id, slip.amount, slip.bank_account
        );

        slip
    }
}

impl Default for SlipParser {
    fn default() -> Self {
        Self::new()
    }
}
