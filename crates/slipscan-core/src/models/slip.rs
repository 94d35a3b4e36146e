//! Parsed payment-slip record.

use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Structured fields extracted from one slip's OCR text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedSlip {
    /// Transfer amount; `None` when no amount followed by a currency marker was found.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub amount: Option<Decimal>,

    /// Masked account number as printed, or empty.
    pub bank_account: String,

    /// Transaction time in UTC+07:00.
    #[serde(with = "ict_timestamp")]
    pub paid_at: DateTime<FixedOffset>,

    /// `SCN-YYYYMMDD-HHMMSS` derived from `paid_at`.
    pub slip_id: String,

    /// Which date grammar produced `paid_at`.
    pub paid_at_source: PaidAtSource,
}

impl ParsedSlip {
    /// `paid_at` rendered as `YYYY-MM-DDTHH:MM:SS+07:00`.
    pub fn paid_at_string(&self) -> String {
        ict_timestamp::format(&self.paid_at)
    }
}

/// Origin of a slip's `paid_at` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaidAtSource {
    /// `YYYY-MM-DD [HH:MM]` style date.
    Iso,
    /// `D <month> YY(YY) HH:MM` style date with a Thai or English month.
    Thai,
    /// No date recognized; the processing instant was used.
    ProcessingTime,
}

/// Serde adapter writing timestamps with an explicit offset and whole seconds.
pub mod ict_timestamp {
    use chrono::{DateTime, FixedOffset};
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

    pub fn format(value: &DateTime<FixedOffset>) -> String {
        value.format(FORMAT).to_string()
    }

    pub fn serialize<S: Serializer>(
        value: &DateTime<FixedOffset>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<FixedOffset>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw).map_err(serde::de::Error::custom)
    }
}
