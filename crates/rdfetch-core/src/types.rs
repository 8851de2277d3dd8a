//! Shared types used across the rdfetch application.
//!
//! This module defines the domain newtypes that provide type safety
//! and clear modeling of record identifiers and operator input.

use crate::error::RdFetchError;
use chrono::NaiveDate;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Zero-padded width of the numeric suffix in a rendered RD number.
const SUFFIX_WIDTH: usize = 6;

/// A record identifier ("RD number"): an alphabetic prefix plus a numeric
/// suffix, rendered zero-padded to six digits (`JG000001`).
///
/// Identifiers are immutable once constructed and totally ordered by
/// prefix, then numeric value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RdNumber {
    prefix: String,
    number: u32,
}

impl RdNumber {
    /// Create a new `RdNumber` from a prefix and numeric suffix.
    ///
    /// # Errors
    /// Returns error if the prefix is not 1-8 uppercase ASCII letters.
    pub fn new(prefix: impl Into<String>, number: u32) -> Result<Self, RdFetchError> {
        let prefix = prefix.into();
        Self::validate_prefix(&prefix)?;
        Ok(Self { prefix, number })
    }

    /// Parse an `RdNumber` from its rendered form (`JG000001`).
    ///
    /// # Errors
    /// Returns error if the string is not a valid prefix followed by digits.
    pub fn parse(s: &str) -> Result<Self, RdFetchError> {
        let split = s.find(|c: char| c.is_ascii_digit()).ok_or_else(|| {
            RdFetchError::Validation(format!("invalid RD number: no numeric suffix in '{s}'"))
        })?;
        let (prefix, digits) = s.split_at(split);
        let number = digits.parse::<u32>().map_err(|_| {
            RdFetchError::Validation(format!("invalid RD number: bad numeric suffix in '{s}'"))
        })?;
        Self::new(prefix, number)
    }

    /// Get the alphabetic prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Get the numeric suffix.
    #[must_use]
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Validate prefix format: 1-8 uppercase ASCII letters.
    fn validate_prefix(prefix: &str) -> Result<(), RdFetchError> {
        static PREFIX_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = PREFIX_REGEX.get_or_init(|| Regex::new(r"^[A-Z]{1,8}$").expect("valid regex"));

        if regex.is_match(prefix) {
            Ok(())
        } else {
            Err(RdFetchError::Validation(format!(
                "invalid RD prefix: must be 1-8 uppercase letters, got '{prefix}'"
            )))
        }
    }
}

impl fmt::Display for RdNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:0width$}", self.prefix, self.number, width = SUFFIX_WIDTH)
    }
}

/// An inclusive range of RD numbers sharing one prefix.
///
/// Iteration yields identifiers in ascending numeric order, which is the
/// processing order guaranteed within a single pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RdRange {
    prefix: String,
    start: u32,
    end: u32,
}

impl RdRange {
    /// Create a new inclusive range.
    ///
    /// # Errors
    /// Returns error if the prefix is invalid or `start > end`.
    pub fn new(prefix: impl Into<String>, start: u32, end: u32) -> Result<Self, RdFetchError> {
        let prefix = prefix.into();
        RdNumber::validate_prefix(&prefix)?;
        if start > end {
            return Err(RdFetchError::Validation(format!(
                "invalid RD range: start {start} is greater than end {end}"
            )));
        }
        Ok(Self { prefix, start, end })
    }

    /// Get the shared prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Number of identifiers in the range.
    #[must_use]
    pub fn count(&self) -> u64 {
        u64::from(self.end - self.start) + 1
    }

    /// Iterate the range in ascending numeric order.
    pub fn iter(&self) -> impl Iterator<Item = RdNumber> + '_ {
        (self.start..=self.end).map(|number| RdNumber {
            prefix: self.prefix.clone(),
            number,
        })
    }
}

/// A crash date in `MM-DD-YYYY` form, validated once at entry.
///
/// The original text is preserved because it is echoed verbatim into portal
/// form fields and artifact file names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CrashDate(String);

impl CrashDate {
    /// Textual format accepted by both portals.
    pub const FORMAT: &'static str = "%m-%d-%Y";

    /// Create a new `CrashDate` from its textual form.
    ///
    /// # Errors
    /// Returns error if the text is not a real calendar date in `MM-DD-YYYY`.
    pub fn new(text: impl Into<String>) -> Result<Self, RdFetchError> {
        let text = text.into();
        NaiveDate::parse_from_str(&text, Self::FORMAT).map_err(|_| {
            RdFetchError::Validation(format!(
                "invalid crash date: expected MM-DD-YYYY, got '{text}'"
            ))
        })?;
        Ok(Self(text))
    }

    /// Get the validated text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CrashDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
