//! Local form validation
//!
//! Request payloads are validated before any mutation reaches the network.
//! A form declares per-field [`FieldRules`]: normalizers run first, then
//! validators; all failures are collected into one
//! [`ValidationError::FieldErrors`].

pub mod filters;
pub mod validators;

use crate::core::clock::{Clock, SystemClock};
use crate::core::error::{FieldError, ValidationError};
use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

type Validator = Box<dyn Fn(&str, &Value) -> Result<(), String> + Send + Sync>;
type Normalizer = Box<dyn Fn(&str, Value) -> anyhow::Result<Value> + Send + Sync>;

/// Rules for one field, addressed by a dotted path such as `vehicle.year`
pub struct FieldRules {
    path: &'static str,
    normalizers: Vec<Normalizer>,
    validators: Vec<Validator>,
}

impl FieldRules {
    pub fn new(path: &'static str) -> Self {
        Self {
            path,
            normalizers: Vec::new(),
            validators: Vec::new(),
        }
    }

    /// Add a normalizer (see [`filters`])
    pub fn filter<F>(mut self, normalizer: F) -> Self
    where
        F: Fn(&str, Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.normalizers.push(Box::new(normalizer));
        self
    }

    /// Add a validator (see [`validators`])
    pub fn validate<F>(mut self, validator: F) -> Self
    where
        F: Fn(&str, &Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validators.push(Box::new(validator));
        self
    }

    fn pointer(&self) -> String {
        format!("/{}", self.path.replace('.', "/"))
    }
}

/// All rules of one form
#[derive(Default)]
pub struct FormRules {
    fields: Vec<FieldRules>,
}

impl FormRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, rules: FieldRules) -> Self {
        self.fields.push(rules);
        self
    }

    /// Normalize then validate a JSON payload.
    ///
    /// Every field is checked; the error lists each failing field once per
    /// failed rule, in declaration order.
    pub fn apply(&self, mut payload: Value) -> Result<Value, ValidationError> {
        let mut errors = Vec::new();

        for rules in &self.fields {
            let pointer = rules.pointer();

            if let Some(slot) = payload.pointer_mut(&pointer) {
                for normalize in &rules.normalizers {
                    match normalize(rules.path, slot.clone()) {
                        Ok(next) => *slot = next,
                        Err(e) => errors.push(FieldError::new(rules.path, e.to_string())),
                    }
                }
            }

            let value = payload.pointer(&pointer).unwrap_or(&Value::Null);
            for validate in &rules.validators {
                if let Err(message) = validate(rules.path, value) {
                    errors.push(FieldError::new(rules.path, message));
                }
            }
        }

        if errors.is_empty() {
            Ok(payload)
        } else {
            Err(ValidationError::FieldErrors(errors))
        }
    }
}

/// A request payload with local validation rules.
///
/// Rules receive the current local date so calendar checks such as a
/// vehicle's model year or a card's expiry follow the caller's [`Clock`].
pub trait Form: Serialize + DeserializeOwned {
    fn rules(today: NaiveDate) -> FormRules;

    /// Return the normalized form as of `today`, or every rule violation
    fn validated_on(&self, today: NaiveDate) -> Result<Self, ValidationError> {
        let payload = serde_json::to_value(self)?;
        let normalized = Self::rules(today).apply(payload)?;
        Ok(serde_json::from_value(normalized)?)
    }

    /// [`Form::validated_on`] with the date of `clock`
    fn validated_with(&self, clock: &dyn Clock) -> Result<Self, ValidationError> {
        self.validated_on(clock.now().date_naive())
    }

    /// [`Form::validated_on`] with the host's local date
    fn validated(&self) -> Result<Self, ValidationError> {
        self.validated_with(&SystemClock)
    }
}
