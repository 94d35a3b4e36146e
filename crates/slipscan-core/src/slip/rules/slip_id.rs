//! Slip identifier synthesis.

use chrono::{DateTime, Datelike, FixedOffset, Timelike};

use super::dates::{ict_offset, processing_time};
use crate::clock::Clock;

/// Format `SCN-YYYYMMDD-HHMMSS` from the calendar fields of `timestamp` read
/// in UTC+07:00.
pub fn slip_id_from_timestamp(timestamp: &DateTime<FixedOffset>) -> String {
    let local = timestamp.with_timezone(&ict_offset());
    format!(
        "SCN-{}{:02}{:02}-{:02}{:02}{:02}",
        local.year(),
        local.month(),
        local.day(),
        local.hour(),
        local.minute(),
        local.second()
    )
}

/// Slip id for an RFC 3339 `paid_at` string.
///
/// A missing or unparsable string uses the clock's current instant instead.
pub fn slip_id_for(paid_at: Option<&str>, clock: &dyn Clock) -> String {
    let timestamp = paid_at
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .unwrap_or_else(|| processing_time(clock));
    slip_id_from_timestamp(&timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn clock() -> FixedClock {
        FixedClock::new(Utc.with_ymd_and_hms(2024, 1, 31, 17, 5, 9).unwrap())
    }

    #[test]
    fn test_slip_id_from_paid_at() {
        assert_eq!(
            slip_id_for(Some("2024-03-05T14:30:00+07:00"), &clock()),
            "SCN-20240305-143000"
        );
    }

    #[test]
    fn test_slip_id_is_deterministic() {
        let paid_at = Some("2023-12-12T08:05:00+07:00");
        assert_eq!(slip_id_for(paid_at, &clock()), slip_id_for(paid_at, &clock()));
    }

    #[test]
    fn test_other_offsets_read_in_ict() {
        // 2024-03-05T07:30Z is 14:30 in Bangkok
        assert_eq!(
            slip_id_for(Some("2024-03-05T07:30:00Z"), &clock()),
            "SCN-20240305-143000"
        );
    }

    #[test]
    fn test_missing_or_invalid_paid_at_uses_clock() {
        assert_eq!(slip_id_for(None, &clock()), "SCN-20240201-000509");
        assert_eq!(slip_id_for(Some("not a date"), &clock()), "SCN-20240201-000509");
    }
}
