//! Thai and English month names.

use lazy_static::lazy_static;
use std::collections::HashMap;

/// Month spellings as they appear on slips, before normalization.
const MONTH_NAMES: &[(&str, u32)] = &[
    ("jan", 1),
    ("january", 1),
    ("ม.ค.", 1),
    ("มกราคม", 1),
    ("feb", 2),
    ("february", 2),
    ("ก.พ.", 2),
    ("กุมภาพันธ์", 2),
    ("mar", 3),
    ("march", 3),
    ("มี.ค.", 3),
    ("มีนาคม", 3),
    ("apr", 4),
    ("april", 4),
    ("เม.ย.", 4),
    ("เมษายน", 4),
    ("may", 5),
    ("พ.ค.", 5),
    ("พฤษภาคม", 5),
    ("jun", 6),
    ("june", 6),
    ("มิ.ย.", 6),
    ("มิถุนายน", 6),
    ("jul", 7),
    ("july", 7),
    ("ก.ค.", 7),
    ("กรกฎาคม", 7),
    ("aug", 8),
    ("august", 8),
    ("ส.ค.", 8),
    ("สิงหาคม", 8),
    ("sep", 9),
    ("sept", 9),
    ("september", 9),
    ("ก.ย.", 9),
    ("กันยายน", 9),
    ("oct", 10),
    ("october", 10),
    ("ต.ค.", 10),
    ("ตุลาคม", 10),
    ("nov", 11),
    ("november", 11),
    ("พ.ย.", 11),
    ("พฤศจิกายน", 11),
    ("dec", 12),
    ("december", 12),
    ("ธ.ค.", 12),
    ("ธันวาคม", 12),
];

lazy_static! {
    /// Normalized month token -> month number.
    static ref MONTHS: HashMap<String, u32> = MONTH_NAMES
        .iter()
        .map(|(name, month)| (normalize_month_token(name), *month))
        .collect();
}

/// Keep Latin letters and Thai script, lowercase the rest away.
///
/// "มี.ค." becomes "มีค", "Mar," becomes "mar".
pub fn normalize_month_token(token: &str) -> String {
    token
        .chars()
        .filter(|c| c.is_ascii_alphabetic() || is_thai(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Look up a month number (1-12) from a raw month token.
pub fn month_number(token: &str) -> Option<u32> {
    let normalized = normalize_month_token(token);
    if let Some(month) = MONTHS.get(&normalized) {
        return Some(*month);
    }
    let trimmed = normalize_month_token(token.trim_end_matches('.'));
    MONTHS.get(&trimmed).copied()
}

fn is_thai(c: char) -> bool {
    ('\u{0E00}'..='\u{0E7F}').contains(&c)
}
