//! Stats aggregation over an unfiltered collection
//!
//! Aggregates are pure functions of the store contents and the clock's
//! "now"; filtering and pagination never influence them.

use crate::core::entity::Entity;
use crate::core::field::parse_timestamp;
use chrono::{DateTime, Datelike, FixedOffset};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt::Debug;

/// Per-kind summary counters
pub trait Aggregate: Entity {
    type Stats: Clone + Debug + Default + PartialEq + Serialize + Send + Sync + 'static;

    /// Compute the summary of `items` as of `now`
    fn aggregate(items: &[Self], now: DateTime<FixedOffset>) -> Self::Stats;
}

/// Bucket counts every kind gets for free from its schema
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSummary {
    pub total: usize,
    pub by_status: IndexMap<String, usize>,
    pub by_category: IndexMap<String, usize>,
}

impl CollectionSummary {
    pub fn of<E: Entity>(items: &[E]) -> Self {
        let schema = E::schema();
        let by_category = match schema.category_field {
            Some(field) => count_by(items, |item| {
                item.field_value(field)
                    .and_then(|v| v.search_text())
                    .unwrap_or_default()
            }),
            None => IndexMap::new(),
        };

        Self {
            total: items.len(),
            by_status: count_by(items, |item| item.status().to_string()),
            by_category,
        }
    }

    pub fn status_count(&self, status: &str) -> usize {
        self.by_status.get(status).copied().unwrap_or(0)
    }

    pub fn category_count(&self, category: &str) -> usize {
        self.by_category.get(category).copied().unwrap_or(0)
    }
}

pub fn count_where<E>(items: &[E], predicate: impl Fn(&E) -> bool) -> usize {
    items.iter().filter(|item| predicate(item)).count()
}

/// Count items per key, keys in first-seen order
pub fn count_by<E>(items: &[E], key: impl Fn(&E) -> String) -> IndexMap<String, usize> {
    let mut counts = IndexMap::new();
    for item in items {
        *counts.entry(key(item)).or_insert(0) += 1;
    }
    counts
}

/// Sum of `value` over items matching `predicate`
pub fn sum_by<E>(
    items: &[E],
    predicate: impl Fn(&E) -> bool,
    value: impl Fn(&E) -> f64,
) -> f64 {
    items
        .iter()
        .filter(|item| predicate(item))
        .map(value)
        .sum()
}

/// Mean over strictly positive values; zero and absent values are left out
/// of the denominator
pub fn mean_positive(values: impl IntoIterator<Item = Option<f64>>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .flatten()
        .filter(|v| *v > 0.0)
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));

    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// `part / whole * 100`, 0 when `whole` is 0
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// `numerator / denominator`, 0 when the denominator is 0
pub fn ratio(numerator: f64, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator / denominator as f64
    }
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Whether a raw timestamp falls in the calendar month of `now`, in `now`'s offset
pub fn in_month(raw: Option<&str>, now: DateTime<FixedOffset>) -> bool {
    let offset = *now.offset();
    raw.and_then(|r| parse_timestamp(r, offset))
        .map(|ts| ts.with_timezone(&offset))
        .is_some_and(|local| local.year() == now.year() && local.month() == now.month())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::payment::{Payment, PaymentMethod, PaymentStatus};

    fn now() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-05-15T12:00:00+02:00").unwrap()
    }

    #[test]
    fn test_percentage_guards_zero() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(3, 4), 75.0);
        assert_eq!(ratio(10.0, 0), 0.0);
    }

    #[test]
    fn test_mean_positive_skips_zero_and_missing() {
        let mean = mean_positive([Some(4.0), Some(0.0), None, Some(5.0)]);
        assert_eq!(mean, 4.5);
        assert_eq!(mean_positive(Vec::<Option<f64>>::new()), 0.0);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(4.25, 1), 4.3);
        assert_eq!(round_to(4.549, 1), 4.5);
        assert_eq!(round_to(17.125, 2), 17.13);
    }

    #[test]
    fn test_in_month_uses_clock_offset() {
        assert!(in_month(Some("2024-05-01T00:30:00+02:00"), now()));
        // 23:30 UTC on April 30th is already May 1st at +02:00
        assert!(in_month(Some("2024-04-30T23:30:00Z"), now()));
        assert!(!in_month(Some("2024-04-30T21:00:00Z"), now()));
        assert!(!in_month(Some("2023-05-10T10:00:00Z"), now()));
        assert!(!in_month(None, now()));
        assert!(!in_month(Some("invalid"), now()));
    }

    #[test]
    fn test_summary_buckets() {
        let payment = |status: PaymentStatus, method: PaymentMethod| Payment {
            status,
            payment_method: method,
            ..Payment::default()
        };
        let items = vec![
            payment(PaymentStatus::Completed, PaymentMethod::Cash),
            payment(PaymentStatus::Failed, PaymentMethod::CreditCard),
            payment(PaymentStatus::Completed, PaymentMethod::CreditCard),
        ];

        let summary = CollectionSummary::of(&items);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.status_count("COMPLETED"), 2);
        assert_eq!(summary.status_count("REFUNDED"), 0);
        assert_eq!(summary.category_count("CREDIT_CARD"), 2);
        assert_eq!(
            summary.by_status.keys().collect::<Vec<_>>(),
            vec!["COMPLETED", "FAILED"]
        );
    }
}
