//! Cell input validation
//!
//! Constrains what users can enter into cells before an edit batch reaches
//! the stores: SPSS-style dates, numeric input, and string width.
//!
//! ## Dates
//!
//! Date cells are entered as `DD-MM-YYYY`. A date must exist on the
//! calendar and fall on or after the SPSS epoch (15 October 1582, the first
//! day of the Gregorian calendar).

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Display format for date cells.
pub const DATE_FORMAT: &str = "DD-MM-YYYY";

/// The earliest date a date variable accepts.
pub fn spss_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1582, 10, 15).unwrap_or(NaiveDate::MIN)
}

// ============================================================================
// Dates
// ============================================================================

/// Why a date cell was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateParseError {
    /// Not `DD-MM-YYYY`.
    Format,
    /// Well-formed but not a real calendar date (e.g. 31-02-2024).
    Calendar,
    /// Earlier than 15-10-1582.
    BeforeEpoch,
}

impl fmt::Display for DateParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateParseError::Format => write!(f, "Date must use the format {}", DATE_FORMAT),
            DateParseError::Calendar => write!(f, "Date does not exist on the calendar"),
            DateParseError::BeforeEpoch => write!(f, "Date is before 15-10-1582"),
        }
    }
}

impl std::error::Error for DateParseError {}

/// Parse a `DD-MM-YYYY` date cell.
///
/// # Examples
/// ```
/// use statgrid_engine::validation::{parse_spss_date, DateParseError};
///
/// assert!(parse_spss_date("15-10-1582").is_ok());
/// assert_eq!(parse_spss_date("14-10-1582"), Err(DateParseError::BeforeEpoch));
/// assert_eq!(parse_spss_date("31-02-2024"), Err(DateParseError::Calendar));
/// assert_eq!(parse_spss_date("2024-02-01"), Err(DateParseError::Format));
/// ```
pub fn parse_spss_date(value: &str) -> Result<NaiveDate, DateParseError> {
    let trimmed = value.trim();
    let parts: Vec<&str> = trimmed.split('-').collect();
    let [day, month, year] = parts.as_slice() else {
        return Err(DateParseError::Format);
    };

    let all_digits = |s: &str, len: usize| s.len() == len && s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(day, 2) || !all_digits(month, 2) || !all_digits(year, 4) {
        return Err(DateParseError::Format);
    }

    // Digit-only strings of bounded length always parse
    let day: u32 = day.parse().map_err(|_| DateParseError::Format)?;
    let month: u32 = month.parse().map_err(|_| DateParseError::Format)?;
    let year: i32 = year.parse().map_err(|_| DateParseError::Format)?;

    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or(DateParseError::Calendar)?;
    if date < spss_epoch() {
        return Err(DateParseError::BeforeEpoch);
    }
    Ok(date)
}

// ============================================================================
// Numbers
// ============================================================================

/// Error when parsing numeric input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericParseError {
    /// Input is empty (after trimming whitespace).
    Empty,
    /// Input contains invalid characters or format.
    InvalidFormat,
}

impl fmt::Display for NumericParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericParseError::Empty => write!(f, "Value is empty"),
            NumericParseError::InvalidFormat => write!(f, "Value is not a valid number"),
        }
    }
}

impl std::error::Error for NumericParseError {}

/// Parse user input as a number.
///
/// # Rules
/// - Whitespace is trimmed
/// - Leading `+` is allowed
/// - Thousands separators (`,`) are stripped
/// - `NaN` and infinities are rejected
///
/// # Examples
/// ```
/// use statgrid_engine::validation::parse_numeric_input;
///
/// assert_eq!(parse_numeric_input("1,234.5"), Ok(1234.5));
/// assert_eq!(parse_numeric_input("+7"), Ok(7.0));
/// assert!(parse_numeric_input("abc").is_err());
/// ```
pub fn parse_numeric_input(value: &str) -> Result<f64, NumericParseError> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(NumericParseError::Empty);
    }

    let normalized = trimmed.strip_prefix('+').unwrap_or(trimmed).replace(',', "");
    if normalized.is_empty() {
        return Err(NumericParseError::InvalidFormat);
    }

    match normalized.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(NumericParseError::InvalidFormat),
    }
}

// ============================================================================
// Strings
// ============================================================================

/// Truncate `text` to at most `width` characters.
pub fn truncate_to_width(text: &str, width: u32) -> String {
    text.chars().take(width as usize).collect()
}

// ============================================================================
// Validation Result
// ============================================================================

/// Reason why a cell failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum ValidationFailureReason {
    /// Date column received an invalid date.
    Date(DateParseError),
    /// Numeric column received non-numeric text.
    NotNumeric,
}

impl fmt::Display for ValidationFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationFailureReason::Date(e) => write!(f, "{}", e),
            ValidationFailureReason::NotNumeric => write!(f, "Value is not a valid number"),
        }
    }
}

/// A cell flagged invalid, for consumer feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidCell {
    pub row: usize,
    pub col: usize,
    pub reason: ValidationFailureReason,
}

// ============================================================================
// Tests
// ============================================================================
