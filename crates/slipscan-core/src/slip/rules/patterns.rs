//! Common regex patterns for slip extraction.
//!
//! Digit classes are spelled `[0-9]` because `\d` in the regex crate also
//! matches Thai digits.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Amount followed by a currency marker: "1,234.50 บาท", "500THB", "20 ฿"
    pub static ref AMOUNT_WITH_CURRENCY: Regex = Regex::new(
        r"(?i)([0-9][0-9,.]{0,15})\s*(บาท|thb|฿)"
    ).unwrap();

    // Masked account number: "123-4-56789-0", "012-3-xxxx-5" style digits only
    pub static ref BANK_ACCOUNT: Regex = Regex::new(
        r"([0-9]{2,3}-[0-9]-[0-9-]{4,16}-[0-9])"
    ).unwrap();

    // 2024-03-05, 2024/3/5 14:30, 2024-03-05T14:30
    pub static ref DATE_ISO: Regex = Regex::new(
        r"([0-9]{4})[-/]([0-9]{1,2})[-/]([0-9]{1,2})(?:[T\s]([0-9]{1,2}:[0-9]{2}))?"
    ).unwrap();

    // 5 มี.ค. 67 14:30, 05 Mar 2024 09:15
    pub static ref DATE_THAI: Regex = Regex::new(
        r"(?i)([0-9]{1,2})\s*([^0-9\s]+)\s*([0-9]{2,4})\s*([0-9]{1,2}:[0-9]{2})"
    ).unwrap();
}
