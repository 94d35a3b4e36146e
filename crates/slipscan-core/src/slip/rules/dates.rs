//! Paid-at extraction for transfer slips.
//!
//! Two grammars are tried in order: an ISO-like `YYYY-MM-DD [HH:MM]` date and
//! a Thai-style `D <month> YY(YY) HH:MM` date. All timestamps are in
//! Indochina Time (UTC+07:00).

use chrono::{DateTime, FixedOffset, NaiveDate, SubsecRound};

use super::months::month_number;
use super::patterns::{DATE_ISO, DATE_THAI};
use super::{ExtractionMatch, FieldExtractor};
use crate::clock::Clock;
use crate::models::config::YearMode;
use crate::models::slip::PaidAtSource;

const ICT_OFFSET_SECS: i32 = 7 * 3600;

/// The fixed UTC+07:00 offset slips are printed in.
pub fn ict_offset() -> FixedOffset {
    FixedOffset::east_opt(ICT_OFFSET_SECS).expect("UTC+07:00 is a valid offset")
}

/// A resolved paid-at timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaidAt {
    pub timestamp: DateTime<FixedOffset>,
    pub source: PaidAtSource,
}

/// Date field extractor.
pub struct DateExtractor {
    year_mode: YearMode,
}

impl DateExtractor {
    pub fn new() -> Self {
        Self {
            year_mode: YearMode::Compatible,
        }
    }

    /// Set Buddhist-era year handling.
    pub fn with_year_mode(mut self, year_mode: YearMode) -> Self {
        self.year_mode = year_mode;
        self
    }

    /// First ISO-like date in the text, if it is a real date and time.
    pub fn extract_iso(&self, text: &str) -> Option<ExtractionMatch<PaidAt>> {
        let caps = DATE_ISO.captures(text)?;
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        let time = caps.get(4).map_or("00:00", |m| m.as_str());

        let timestamp = build_timestamp(year, month, day, time)?;
        let full_match = caps.get(0)?;
        Some(
            ExtractionMatch::new(
                PaidAt {
                    timestamp,
                    source: PaidAtSource::Iso,
                },
                full_match.as_str(),
            )
            .with_position(full_match.start(), full_match.end()),
        )
    }

    /// First Thai-style date in the text, if its month and year resolve.
    pub fn extract_thai(&self, text: &str) -> Option<ExtractionMatch<PaidAt>> {
        let caps = DATE_THAI.captures(text)?;
        let day: u32 = caps[1].parse().ok()?;
        let month = month_number(&caps[2])?;
        let year = normalize_year(&caps[3], self.year_mode)?;

        let timestamp = build_timestamp(year, month, day, &caps[4])?;
        let full_match = caps.get(0)?;
        Some(
            ExtractionMatch::new(
                PaidAt {
                    timestamp,
                    source: PaidAtSource::Thai,
                },
                full_match.as_str(),
            )
            .with_position(full_match.start(), full_match.end()),
        )
    }

    /// Extract the paid-at time, falling back to the clock's current instant.
    pub fn resolve(&self, text: &str, clock: &dyn Clock) -> PaidAt {
        self.extract(text).map(|m| m.value).unwrap_or_else(|| PaidAt {
            timestamp: processing_time(clock),
            source: PaidAtSource::ProcessingTime,
        })
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = ExtractionMatch<PaidAt>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_iso(text).or_else(|| self.extract_thai(text))
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        self.extract_iso(text)
            .into_iter()
            .chain(self.extract_thai(text))
            .collect()
    }
}

/// Extract the paid-at time with default year handling.
pub fn extract_paid_at(text: &str, clock: &dyn Clock) -> PaidAt {
    DateExtractor::new().resolve(text, clock)
}

/// The clock's current instant in UTC+07:00, whole seconds.
pub fn processing_time(clock: &dyn Clock) -> DateTime<FixedOffset> {
    clock.now().with_timezone(&ict_offset()).trunc_subsecs(0)
}

/// Convert a printed year to a Gregorian year.
///
/// Two-digit years are short Buddhist-era years (67 -> 2567 BE -> 2024).
/// Four-digit years above 2500 are Buddhist-era. In [`YearMode::Compatible`]
/// years in (2400, 2500] are returned unchanged.
pub fn normalize_year(raw: &str, mode: YearMode) -> Option<i32> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let num: i32 = digits.parse().ok()?;

    let year = if num > 2400 {
        match mode {
            YearMode::Compatible if num <= 2500 => num,
            _ => num - 543,
        }
    } else if num < 100 {
        2500 + num - 543
    } else {
        num
    };
    Some(year)
}

/// Assemble a UTC+07:00 timestamp from date parts and an `H:MM` token.
///
/// Returns `None` if the parts do not form a real date and time.
fn build_timestamp(year: i32, month: u32, day: u32, time: &str) -> Option<DateTime<FixedOffset>> {
    let cleaned: String = time
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ':')
        .collect();
    let mut parts = cleaned.split(':');
    let hour = clock_field(parts.next())?;
    let minute = clock_field(parts.next())?;

    NaiveDate::from_ymd_opt(year, month, day)?
        .and_hms_opt(hour, minute, 0)?
        .and_local_timezone(ict_offset())
        .single()
}

fn clock_field(part: Option<&str>) -> Option<u32> {
    match part {
        None | Some("") => Some(0),
        Some(value) => value.parse().ok(),
    }
}
