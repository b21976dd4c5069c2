//! Reusable field validators
//!
//! Each validator receives the field path and its JSON value. Validators
//! other than `required` let values of a different type pass, so they can
//! be stacked on optional fields.

use crate::core::field::FieldFormat;
use serde_json::Value;

/// Validator: field is present and, for strings, not blank
pub fn required() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |field: &str, value: &Value| {
        let missing = match value {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            _ => false,
        };
        if missing {
            Err(format!("'{}' is required", field))
        } else {
            Ok(())
        }
    }
}

/// Validator: number must be positive
pub fn positive() -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    |field: &str, value: &Value| match value.as_f64() {
        Some(num) if num <= 0.0 => Err(format!("'{}' must be positive (got {})", field, num)),
        _ => Ok(()),
    }
}

/// Validator: string length (in characters) must be within range
pub fn string_length(
    min: usize,
    max: usize,
) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &Value| {
        if let Some(s) = value.as_str() {
            let len = s.chars().count();
            if len < min {
                Err(format!(
                    "'{}' must be at least {} characters (got {})",
                    field, min, len
                ))
            } else if len > max {
                Err(format!(
                    "'{}' must be at most {} characters (got {})",
                    field, max, len
                ))
            } else {
                Ok(())
            }
        } else {
            Ok(())
        }
    }
}

/// Validator: number must not be below minimum
pub fn min_value(min: f64) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &Value| match value.as_f64() {
        Some(num) if num < min => Err(format!(
            "'{}' must be at least {} (got {})",
            field, min, num
        )),
        _ => Ok(()),
    }
}

/// Validator: number must lie in `[min, max]`
pub fn range(
    min: f64,
    max: f64,
) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &Value| match value.as_f64() {
        Some(num) if num < min || num > max => Err(format!(
            "'{}' must be between {} and {} (got {})",
            field, min, max, num
        )),
        _ => Ok(()),
    }
}

/// Validator: value must be in allowed list
pub fn in_list(
    allowed: Vec<String>,
) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &Value| {
        if let Some(s) = value.as_str() {
            if !allowed.iter().any(|a| a == s) {
                Err(format!(
                    "'{}' must be one of: {} (got {})",
                    field,
                    allowed.join(", "),
                    s
                ))
            } else {
                Ok(())
            }
        } else {
            Ok(())
        }
    }
}

/// Validator: date must match format
pub fn date_format(
    format: &'static str,
) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &Value| {
        if let Some(s) = value.as_str() {
            match chrono::NaiveDate::parse_from_str(s, format) {
                Ok(_) => Ok(()),
                Err(_) => Err(format!(
                    "'{}' must use the format {} (got {})",
                    field, format, s
                )),
            }
        } else {
            Ok(())
        }
    }
}

/// Validator: string must match a field format (email, phone, custom pattern)
pub fn format(
    format: FieldFormat,
) -> impl Fn(&str, &Value) -> Result<(), String> + Send + Sync + Clone {
    move |field: &str, value: &Value| match value.as_str() {
        Some(s) if !s.is_empty() && !format.is_match(s) => {
            Err(format!("'{}' must be {}", field, format.describe()))
        }
        _ => Ok(()),
    }
}
