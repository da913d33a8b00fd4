//! Input validation for front-end supplied text: prices, item names and search patterns.

use regex::{Regex, RegexBuilder};

/// Maximum accepted item name length, in characters.
pub const MAX_NAME_CHARS: usize = 128;
/// Maximum accepted pattern length, in characters.
pub const MAX_PATTERN_CHARS: usize = 256;
/// Compiled regex size cap so a pathological pattern cannot stall the dispatcher.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// Malformed user input, reported back to the caller as text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("price is missing")]
    MissingPrice,

    #[error("could not parse price: {0}")]
    BadPrice(String),

    #[error("price cannot be negative")]
    NegativePrice,

    #[error("item name is empty")]
    EmptyName,

    #[error("item name is too long (maximum {max} characters)")]
    NameTooLong { max: usize },

    #[error("item name contains control characters")]
    ControlCharacters,

    #[error("pattern is too long (maximum {max} characters)")]
    PatternTooLong { max: usize },

    #[error("{0}")]
    BadPattern(String),
}

/// Parse a price such as `1500`, `1,500` or `1_500`.
pub fn parse_price(text: &str) -> Result<i64, InputError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(InputError::MissingPrice);
    }
    let digits: String = trimmed.chars().filter(|c| *c != ',' && *c != '_').collect();
    let value: i64 = digits
        .parse()
        .map_err(|_| InputError::BadPrice(trimmed.to_string()))?;
    check_price(value)
}

/// Reject negative prices.
pub fn check_price(value: i64) -> Result<i64, InputError> {
    if value < 0 {
        Err(InputError::NegativePrice)
    } else {
        Ok(value)
    }
}

/// Trim and collapse inner whitespace of an item name.
pub fn normalize_item_name(name: &str) -> Result<String, InputError> {
    if name.chars().any(|c| c.is_control() && !c.is_whitespace()) {
        return Err(InputError::ControlCharacters);
    }
    let collapsed = name.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return Err(InputError::EmptyName);
    }
    if collapsed.chars().count() > MAX_NAME_CHARS {
        return Err(InputError::NameTooLong { max: MAX_NAME_CHARS });
    }
    Ok(collapsed)
}

/// Compile a case-insensitive item name pattern.
pub fn compile_pattern(pattern: &str) -> Result<Regex, InputError> {
    let trimmed = pattern.trim();
    if trimmed.is_empty() {
        return Err(InputError::EmptyName);
    }
    if trimmed.chars().count() > MAX_PATTERN_CHARS {
        return Err(InputError::PatternTooLong { max: MAX_PATTERN_CHARS });
    }
    RegexBuilder::new(trimmed)
        .case_insensitive(true)
        .size_limit(PATTERN_SIZE_LIMIT)
        .build()
        .map_err(|e| InputError::BadPattern(e.to_string()))
}
