//! Amount extraction for transfer slips.

use regex::Captures;
use rust_decimal::Decimal;
use std::str::FromStr;

use super::patterns::AMOUNT_WITH_CURRENCY;
use super::{ExtractionMatch, FieldExtractor};

/// Amount field extractor.
///
/// Only numerals written before a currency marker count; `THB 500` is not an
/// amount.
pub struct AmountExtractor;

impl AmountExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Matches whose numeral is not the tail of a longer numeral.
    fn candidates<'t>(&self, text: &'t str) -> impl Iterator<Item = Captures<'t>> + 't {
        AMOUNT_WITH_CURRENCY
            .captures_iter(text)
            .filter(move |caps| starts_at_boundary(text, caps.get(1).map_or(0, |m| m.start())))
    }

    fn to_match(caps: &Captures<'_>) -> Option<ExtractionMatch<Decimal>> {
        let numeral = caps.get(1)?;
        let full_match = caps.get(0)?;
        let amount = parse_amount(numeral.as_str())?;
        Some(
            ExtractionMatch::new(amount, full_match.as_str())
                .with_position(full_match.start(), full_match.end()),
        )
    }
}

impl Default for AmountExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for AmountExtractor {
    type Output = ExtractionMatch<Decimal>;

    /// The first candidate decides: if its numeral is malformed the result is
    /// `None`, later amounts are not consulted.
    fn extract(&self, text: &str) -> Option<Self::Output> {
        let caps = self.candidates(text).next()?;
        Self::to_match(&caps)
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        self.candidates(text)
            .filter_map(|caps| Self::to_match(&caps))
            .collect()
    }
}

/// Extract the slip amount from OCR text.
pub fn extract_amount(text: &str) -> Option<Decimal> {
    AmountExtractor::new().extract(text).map(|m| m.value)
}

/// Parse a numeral with comma group separators ("1,234.50").
///
/// Returns `None` for anything that is not a single finite decimal number,
/// e.g. "1.2.3".
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned = raw.replace(',', "");
    let cleaned = cleaned.strip_suffix('.').unwrap_or(&cleaned);
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(cleaned).ok()
}

/// False when the numeral at `start` continues a longer numeral to its left.
///
/// Separators alone (dot leaders, a stray comma) do not count as a numeral.
fn starts_at_boundary(text: &str, start: usize) -> bool {
    !text[..start]
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit() || matches!(c, ',' | '.'))
        .any(|c| c.is_ascii_digit())
}
