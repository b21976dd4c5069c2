//! Reusable field normalizers
//!
//! Normalizers rewrite a field value before the validators run, so that
//! `"  Jane@Example.COM "` is checked (and sent) as `"jane@example.com"`.

use anyhow::Result;
use serde_json::{Value, json};

/// Normalizer: trim whitespace from string
pub fn trim() -> impl Fn(&str, Value) -> Result<Value> + Send + Sync + Clone {
    |_: &str, value: Value| match value {
        Value::String(s) => Ok(Value::String(s.trim().to_string())),
        other => Ok(other),
    }
}

/// Normalizer: convert string to uppercase
pub fn uppercase() -> impl Fn(&str, Value) -> Result<Value> + Send + Sync + Clone {
    |_: &str, value: Value| match value {
        Value::String(s) => Ok(Value::String(s.to_uppercase())),
        other => Ok(other),
    }
}

/// Normalizer: convert string to lowercase
pub fn lowercase() -> impl Fn(&str, Value) -> Result<Value> + Send + Sync + Clone {
    |_: &str, value: Value| match value {
        Value::String(s) => Ok(Value::String(s.to_lowercase())),
        other => Ok(other),
    }
}

/// Normalizer: blank strings become null, for optional fields
pub fn blank_to_null() -> impl Fn(&str, Value) -> Result<Value> + Send + Sync + Clone {
    |_: &str, value: Value| match value {
        Value::String(s) if s.trim().is_empty() => Ok(Value::Null),
        other => Ok(other),
    }
}

/// Normalizer: round number to specified decimal places
pub fn round_decimals(
    decimals: u32,
) -> impl Fn(&str, Value) -> Result<Value> + Send + Sync + Clone {
    move |field: &str, value: Value| {
        if let Some(num) = value.as_f64() {
            let factor = 10_f64.powi(decimals as i32);
            let rounded = (num * factor).round() / factor;
            if !rounded.is_finite() {
                anyhow::bail!("'{}' is not a finite number", field);
            }
            Ok(json!(rounded))
        } else {
            Ok(value)
        }
    }
}
