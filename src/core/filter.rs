//! Filter predicate set applied conjunctively to a collection

use crate::core::entity::Entity;
use crate::core::field::{contains_ignore_case, parse_timestamp};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Filter configuration of one list view.
///
/// Every configured predicate must hold (logical AND). Empty strings and a
/// zero rating threshold mean "not configured".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterConfig {
    /// Exact match on the status field
    pub status: Option<String>,

    /// Exact match on the role/type/method field
    pub category: Option<String>,

    /// Minimum rating, inclusive; 0 disables the predicate
    pub min_rating: f64,

    /// Case-insensitive substring of the location field
    pub location: Option<String>,

    /// Case-insensitive substring of any searchable field
    pub search_term: Option<String>,

    /// First local day included
    pub date_from: Option<NaiveDate>,

    /// Last local day included, up to 23:59:59.999
    pub date_to: Option<NaiveDate>,
}

/// Partial update of a [`FilterConfig`].
///
/// `None` leaves a predicate unchanged; an empty string (or a zero rating)
/// clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterPatch {
    pub status: Option<String>,
    pub category: Option<String>,
    pub min_rating: Option<f64>,
    pub location: Option<String>,
    pub search_term: Option<String>,
    pub date_from: Option<Option<NaiveDate>>,
    pub date_to: Option<Option<NaiveDate>>,
}

impl FilterPatch {
    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn min_rating(mut self, min_rating: f64) -> Self {
        self.min_rating = Some(min_rating);
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search_term = Some(term.into());
        self
    }

    pub fn date_from(mut self, date: Option<NaiveDate>) -> Self {
        self.date_from = Some(date);
        self
    }

    pub fn date_to(mut self, date: Option<NaiveDate>) -> Self {
        self.date_to = Some(date);
        self
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl FilterConfig {
    /// Merge a partial update into this configuration
    pub fn merge(&mut self, patch: FilterPatch) {
        if let Some(status) = patch.status {
            self.status = non_empty(status);
        }
        if let Some(category) = patch.category {
            self.category = non_empty(category);
        }
        if let Some(min_rating) = patch.min_rating {
            self.min_rating = if min_rating.is_finite() { min_rating.max(0.0) } else { 0.0 };
        }
        if let Some(location) = patch.location {
            self.location = non_empty(location);
        }
        if let Some(term) = patch.search_term {
            self.search_term = non_empty(term);
        }
        if let Some(date_from) = patch.date_from {
            self.date_from = date_from;
        }
        if let Some(date_to) = patch.date_to {
            self.date_to = date_to;
        }
    }

    /// Clear every predicate
    pub fn reset(&mut self) {
        *self = FilterConfig::default();
    }

    /// Whether any predicate is configured
    pub fn is_active(&self) -> bool {
        *self != FilterConfig::default()
    }

    /// Evaluate every configured predicate against one entity
    pub fn matches<E: Entity>(&self, item: &E, local: FixedOffset) -> bool {
        let schema = E::schema();

        if let Some(status) = &self.status {
            if item.status() != status.as_str() {
                return false;
            }
        }

        if let Some(category) = &self.category {
            let value = schema
                .category_field
                .and_then(|field| item.field_value(field))
                .and_then(|v| v.search_text());
            if value.as_deref() != Some(category.as_str()) {
                return false;
            }
        }

        if self.min_rating > 0.0 {
            let rating = schema
                .rating_field
                .and_then(|field| item.field_value(field))
                .and_then(|v| v.as_f64())
                .unwrap_or(0.0);
            if rating < self.min_rating {
                return false;
            }
        }

        if let Some(location) = &self.location {
            let needle = location.to_lowercase();
            let found = schema
                .location_field
                .and_then(|field| item.field_value(field))
                .and_then(|v| v.search_text())
                .is_some_and(|text| contains_ignore_case(&text, &needle));
            if !found {
                return false;
            }
        }

        if let Some(term) = &self.search_term {
            let needle = term.to_lowercase();
            let found = schema.search_fields.iter().any(|field| {
                item.field_value(field)
                    .and_then(|v| v.search_text())
                    .is_some_and(|text| contains_ignore_case(&text, &needle))
            });
            if !found {
                return false;
            }
        }

        if self.date_from.is_some() || self.date_to.is_some() {
            let Some(created) = item
                .created_date()
                .and_then(|raw| parse_timestamp(raw, local))
            else {
                return false;
            };
            let from = self.date_from.and_then(|d| start_of_day(d, local));
            if from.is_some_and(|from| created < from) {
                return false;
            }
            let to = self.date_to.and_then(|d| end_of_day(d, local));
            if to.is_some_and(|to| created > to) {
                return false;
            }
        }

        true
    }

    /// Select the matching entities, preserving collection order
    pub fn select<'a, E: Entity>(&self, items: &'a [E], local: FixedOffset) -> Vec<&'a E> {
        items.iter().filter(|item| self.matches(*item, local)).collect()
    }

    /// Positions of the matching entities within `items`
    pub fn select_indices<E: Entity>(&self, items: &[E], local: FixedOffset) -> Vec<usize> {
        items
            .iter()
            .enumerate()
            .filter(|(_, item)| self.matches(*item, local))
            .map(|(index, _)| index)
            .collect()
    }
}

fn start_of_day(date: NaiveDate, local: FixedOffset) -> Option<DateTime<Utc>> {
    local
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

fn end_of_day(date: NaiveDate, local: FixedOffset) -> Option<DateTime<Utc>> {
    let last_milli = NaiveTime::from_hms_milli_opt(23, 59, 59, 999)?;
    local
        .from_local_datetime(&date.and_time(last_milli))
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}
