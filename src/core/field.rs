//! Field values, field kinds and the parsing/comparison rules shared by the
//! filter, sort and stats stages

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// A polymorphic field value read from an entity through its accessor map
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::String(value.into())
    }

    /// Optional text, mapping `None` to `Null`
    pub fn opt_text(value: Option<&str>) -> Self {
        value.map_or(FieldValue::Null, FieldValue::text)
    }

    /// Optional number, mapping `None` to `Null`
    pub fn opt_float(value: Option<f64>) -> Self {
        value.map_or(FieldValue::Null, FieldValue::Float)
    }

    /// Get the value as a string if possible
    pub fn as_string(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as an integer if possible
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the value as a float, widening integers
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Text used by free-text search; numbers render without a trailing `.0`
    pub fn search_text(&self) -> Option<String> {
        match self {
            FieldValue::String(s) => Some(s.clone()),
            FieldValue::Integer(i) => Some(i.to_string()),
            FieldValue::Float(f) => Some(f.to_string()),
            FieldValue::Boolean(b) => Some(b.to_string()),
            FieldValue::Null => None,
        }
    }
}

/// How a sortable field is compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Number,
    Date,
}

/// Field format validators for form input
#[derive(Debug, Clone)]
pub enum FieldFormat {
    Email,
    Phone,
    Custom(Regex),
}

impl FieldFormat {
    /// Validate a string against this format
    pub fn is_match(&self, value: &str) -> bool {
        match self {
            FieldFormat::Email => Self::email_regex().is_match(value),
            FieldFormat::Phone => Self::phone_regex().is_match(value),
            FieldFormat::Custom(regex) => regex.is_match(value),
        }
    }

    /// Human-readable name used in validation messages
    pub fn describe(&self) -> &str {
        match self {
            FieldFormat::Email => "a valid email address",
            FieldFormat::Phone => "a valid phone number",
            FieldFormat::Custom(_) => "in the expected format",
        }
    }

    fn email_regex() -> &'static Regex {
        static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
        EMAIL_REGEX.get_or_init(|| {
            Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
                .expect("email pattern is valid")
        })
    }

    fn phone_regex() -> &'static Regex {
        static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();
        // E.164: optional '+', no leading zero, up to 15 digits
        PHONE_REGEX
            .get_or_init(|| Regex::new(r"^\+?[1-9]\d{1,14}$").expect("phone pattern is valid"))
    }
}

/// Parse a backend timestamp.
///
/// Accepts RFC 3339 (with offset), local date-times without an offset (as
/// produced for `LocalDateTime` fields, interpreted in `local`), and plain
/// dates (interpreted as UTC midnight). Anything else yields `None`.
pub fn parse_timestamp(raw: &str, local: FixedOffset) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return local
                .from_local_datetime(&naive)
                .single()
                .map(|dt| dt.with_timezone(&Utc));
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Milliseconds since the epoch, with missing or unparseable values at 0
pub fn timestamp_millis(raw: Option<&str>, local: FixedOffset) -> i64 {
    raw.and_then(|r| parse_timestamp(r, local))
        .map(|dt| dt.timestamp_millis())
        .unwrap_or(0)
}

/// Lowercased base letters, with accents and other combining marks dropped
fn base_letters(s: &str) -> impl Iterator<Item = char> + '_ {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
}

/// Locale-style string ordering.
///
/// Base letters decide first, so `Émile` sorts with the `E`s. Strings equal
/// up to accents order unaccented first; strings equal up to case order
/// lowercase first.
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(base_letters(b))
        .then_with(|| {
            a.chars()
                .flat_map(char::to_lowercase)
                .cmp(b.chars().flat_map(char::to_lowercase))
        })
        .then_with(|| b.cmp(a))
}

/// Case-insensitive substring check
pub fn contains_ignore_case(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}
