//! Free-text phone number lists

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Separators between numbers: `,` `;` `/`, the word "or", or `&`
    static ref PHONE_SEPARATOR: Regex = Regex::new(r"(?i)[,;/]|(?:\s+or\s+)|(?:\s*&\s*)").unwrap();
}

/// Split a phone field holding several numbers into an ordered list
pub fn split_phones(raw: &str) -> Vec<String> {
    PHONE_SEPARATOR
        .split(raw)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
