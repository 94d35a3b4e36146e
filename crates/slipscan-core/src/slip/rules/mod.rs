//! Rule-based field extractors for Thai transfer slips.

pub mod accounts;
pub mod amounts;
pub mod dates;
pub mod months;
pub mod patterns;
pub mod slip_id;

pub use accounts::{extract_account, AccountExtractor};
pub use amounts::{extract_amount, parse_amount, AmountExtractor};
pub use dates::{extract_paid_at, ict_offset, normalize_year, DateExtractor, PaidAt};
pub use months::month_number;
pub use slip_id::{slip_id_for, slip_id_from_timestamp};

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// An extracted value and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Byte range in source text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, source: impl Into<String>) -> Self {
        Self {
            value,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }
}
