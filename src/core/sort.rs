//! Sort state and the field comparator

use crate::core::entity::{Entity, EntitySchema};
use crate::core::error::ValidationError;
use crate::core::field::{FieldKind, FieldValue, locale_compare, timestamp_millis};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    /// Apply the direction to an ascending comparison
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Active sort key and direction of one view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub key: String,
    pub direction: SortDirection,
}

impl SortState {
    pub fn new(key: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            key: key.into(),
            direction,
        }
    }

    /// Initial state for a schema, honouring per-field direction overrides
    pub fn initial(schema: &EntitySchema, overrides: &HashMap<String, SortDirection>) -> Self {
        let (key, direction) = schema.initial_sort();
        let direction = overrides.get(key).copied().unwrap_or(direction);
        Self::new(key, direction)
    }

    /// Select a sort key.
    ///
    /// With an explicit direction the state is set as given. Without one,
    /// re-selecting the active key flips the direction and selecting a new key
    /// starts from that field's default (or its configured override).
    pub fn select(
        &mut self,
        schema: &EntitySchema,
        key: &str,
        direction: Option<SortDirection>,
        overrides: &HashMap<String, SortDirection>,
    ) -> Result<(), ValidationError> {
        let field = schema
            .sort_field(key)
            .ok_or_else(|| ValidationError::UnknownSortKey {
                key: key.to_string(),
                allowed: schema.sort_fields.iter().map(|f| f.key.to_string()).collect(),
            })?;

        self.direction = match direction {
            Some(direction) => direction,
            None if self.key == key => self.direction.flipped(),
            None => overrides
                .get(key)
                .copied()
                .unwrap_or(field.default_direction),
        };
        self.key = key.to_string();
        Ok(())
    }

    /// Compare two entities by the active key.
    ///
    /// Text uses locale ordering, numbers treat missing values as 0, dates
    /// treat missing or invalid values as the epoch. Unknown keys compare equal.
    pub fn compare<E: Entity>(&self, a: &E, b: &E, local: FixedOffset) -> Ordering {
        let Some(field) = E::schema().sort_field(&self.key) else {
            return Ordering::Equal;
        };

        let ordering = match field.kind {
            FieldKind::Text => {
                let left = text_of(a.field_value(field.key));
                let right = text_of(b.field_value(field.key));
                locale_compare(&left, &right)
            }
            FieldKind::Number => {
                let left = number_of(a.field_value(field.key));
                let right = number_of(b.field_value(field.key));
                left.total_cmp(&right)
            }
            FieldKind::Date => {
                let left = timestamp_millis(raw_of(&a.field_value(field.key)), local);
                let right = timestamp_millis(raw_of(&b.field_value(field.key)), local);
                left.cmp(&right)
            }
        };

        self.direction.apply(ordering)
    }

    /// Sort a collection into a new vector; the sort is stable
    pub fn apply<E: Entity>(&self, items: &[E], local: FixedOffset) -> Vec<E> {
        let mut sorted = items.to_vec();
        sorted.sort_by(|a, b| self.compare(a, b, local));
        sorted
    }
}

fn text_of(value: Option<FieldValue>) -> String {
    value.and_then(|v| v.search_text()).unwrap_or_default()
}

fn number_of(value: Option<FieldValue>) -> f64 {
    value.and_then(|v| v.as_f64()).unwrap_or(0.0)
}

fn raw_of(value: &Option<FieldValue>) -> Option<&str> {
    value.as_ref().and_then(FieldValue::as_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::driver::{Driver, DriverStatus};

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn driver(id: i64, name: &str, rating: f64, created: Option<&str>) -> Driver {
        Driver {
            id: Some(id),
            name: name.to_string(),
            rating,
            status: DriverStatus::Active,
            created_date: created.map(String::from),
            ..Driver::default()
        }
    }

    fn ids(items: &[Driver]) -> Vec<i64> {
        items.iter().filter_map(|d| d.id).collect()
    }

    #[test]
    fn test_text_sort_is_case_insensitive() {
        let items = vec![
            driver(1, "charlie", 4.0, None),
            driver(2, "Alice", 4.0, None),
            driver(3, "bob", 4.0, None),
        ];
        let sorted = SortState::new("name", SortDirection::Asc).apply(&items, utc());
        assert_eq!(ids(&sorted), vec![2, 3, 1]);
    }

    #[test]
    fn test_numeric_sort_descending() {
        let items = vec![
            driver(1, "a", 3.5, None),
            driver(2, "b", 4.9, None),
            driver(3, "c", 4.1, None),
        ];
        let sorted = SortState::new("rating", SortDirection::Desc).apply(&items, utc());
        assert_eq!(ids(&sorted), vec![2, 3, 1]);
    }

    #[test]
    fn test_invalid_dates_sort_as_epoch() {
        let items = vec![
            driver(1, "a", 0.0, Some("2024-02-01T10:00:00Z")),
            driver(2, "b", 0.0, Some("not a date")),
            driver(3, "c", 0.0, None),
            driver(4, "d", 0.0, Some("2023-12-31T10:00:00Z")),
        ];
        let sorted = SortState::new("createdDate", SortDirection::Asc).apply(&items, utc());
        assert_eq!(ids(&sorted), vec![2, 3, 4, 1]);
    }

    #[test]
    fn test_sort_is_permutation() {
        let items = vec![
            driver(1, "x", 2.0, None),
            driver(2, "y", 5.0, None),
            driver(3, "z", 2.0, None),
        ];
        let sorted = SortState::new("rating", SortDirection::Desc).apply(&items, utc());
        let mut before = ids(&items);
        let mut after = ids(&sorted);
        before.sort_unstable();
        after.sort_unstable();
        assert_eq!(before, after);
    }

    #[test]
    fn test_reselecting_key_flips_and_new_key_uses_default() {
        let schema = Driver::schema();
        let overrides = HashMap::new();
        let mut state = SortState::initial(schema, &overrides);
        assert_eq!(state, SortState::new("createdDate", SortDirection::Desc));

        state.select(schema, "createdDate", None, &overrides).unwrap();
        assert_eq!(state.direction, SortDirection::Asc);

        state.select(schema, "name", None, &overrides).unwrap();
        assert_eq!(state, SortState::new("name", SortDirection::Asc));

        state.select(schema, "rating", None, &overrides).unwrap();
        assert_eq!(state, SortState::new("rating", SortDirection::Desc));
    }

    #[test]
    fn test_override_changes_default_direction() {
        let schema = Driver::schema();
        let overrides = HashMap::from([("name".to_string(), SortDirection::Desc)]);
        let mut state = SortState::initial(schema, &overrides);
        state.select(schema, "name", None, &overrides).unwrap();
        assert_eq!(state.direction, SortDirection::Desc);
    }

    #[test]
    fn test_unknown_key_is_rejected_without_change() {
        let schema = Driver::schema();
        let mut state = SortState::new("name", SortDirection::Asc);
        let err = state
            .select(schema, "shoeSize", None, &HashMap::new())
            .unwrap_err();
        assert!(matches!(err, ValidationError::UnknownSortKey { .. }));
        assert_eq!(state, SortState::new("name", SortDirection::Asc));
    }

    #[test]
    fn test_toggle_twice_restores_order() {
        let items = vec![
            driver(1, "b", 4.0, None),
            driver(2, "a", 4.0, None),
            driver(3, "a", 3.0, None),
        ];
        let schema = Driver::schema();
        let overrides = HashMap::new();
        let mut state = SortState::new("name", SortDirection::Asc);
        let original = ids(&state.apply(&items, utc()));

        state.select(schema, "name", None, &overrides).unwrap();
        state.select(schema, "name", None, &overrides).unwrap();
        assert_eq!(ids(&state.apply(&items, utc())), original);
    }
}
