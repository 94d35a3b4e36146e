//! Bank account extraction for transfer slips.

use super::patterns::BANK_ACCOUNT;
use super::{ExtractionMatch, FieldExtractor};

/// Masked bank-account extractor. Purely syntactic: no bank-specific
/// layout or checksum rules are applied.
pub struct AccountExtractor;

impl AccountExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AccountExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for AccountExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        BANK_ACCOUNT
            .find_iter(text)
            .map(|m| {
                ExtractionMatch::new(m.as_str().to_string(), m.as_str())
                    .with_position(m.start(), m.end())
            })
            .collect()
    }
}

/// Extract the first account number, or an empty string.
pub fn extract_account(text: &str) -> String {
    BANK_ACCOUNT
        .find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}
