//! Cross-entity activity feed

use crate::core::entity::Entity;
use crate::core::field::{parse_timestamp, timestamp_millis};
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fmt;

/// Source of a feed entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    User,
    Driver,
    Ride,
    Payment,
}

impl ActivityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityKind::User => "user",
            ActivityKind::Driver => "driver",
            ActivityKind::Ride => "ride",
            ActivityKind::Payment => "payment",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One feed entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// `"<kind>-<entity id>"`
    pub id: String,
    pub kind: ActivityKind,
    pub title: String,
    pub description: String,
    /// Parsed `createdDate`, `None` when missing or invalid
    pub timestamp: Option<DateTime<Utc>>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
}

impl Activity {
    fn sort_key(&self) -> i64 {
        self.timestamp.map_or(0, |ts| ts.timestamp_millis())
    }
}

/// Entities that can appear in the feed
pub trait IntoActivity: Entity {
    const KIND: ActivityKind;

    fn title(&self) -> String;

    fn description(&self) -> String;

    fn amount(&self) -> Option<f64> {
        None
    }

    fn to_activity(&self, local: FixedOffset) -> Activity {
        let id = self
            .id()
            .map_or_else(|| "new".to_string(), |id| id.to_string());
        Activity {
            id: format!("{}-{}", Self::KIND, id),
            kind: Self::KIND,
            title: self.title(),
            description: self.description(),
            timestamp: self
                .created_date()
                .and_then(|raw| parse_timestamp(raw, local)),
            status: self.status().to_string(),
            amount: self.amount(),
        }
    }
}

/// Per-source candidate counts and the final feed length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedLimits {
    pub users: usize,
    pub drivers: usize,
    pub rides: usize,
    pub payments: usize,
    pub total: usize,
}

impl Default for FeedLimits {
    fn default() -> Self {
        Self {
            users: 3,
            drivers: 2,
            rides: 3,
            payments: 3,
            total: 10,
        }
    }
}

/// The `limit` most recent items by `createdDate`, newest first.
///
/// Missing or invalid dates count as the epoch; ties keep collection order.
pub fn recent<E: Entity>(items: &[E], limit: usize, local: FixedOffset) -> Vec<&E> {
    newest_first(items.iter().collect(), limit, local)
}

/// Feed candidates from one source
pub fn candidates<'a, E, I>(items: I, limit: usize, local: FixedOffset) -> Vec<Activity>
where
    E: IntoActivity + 'a,
    I: IntoIterator<Item = &'a E>,
{
    newest_first(items.into_iter().collect(), limit, local)
        .into_iter()
        .map(|item| item.to_activity(local))
        .collect()
}

fn newest_first<E: Entity>(mut items: Vec<&E>, limit: usize, local: FixedOffset) -> Vec<&E> {
    items.sort_by_key(|item| Reverse(timestamp_millis(item.created_date(), local)));
    items.truncate(limit);
    items
}

/// Concatenate the sources, order newest first and keep `total` entries
pub fn merge_feed(sources: Vec<Vec<Activity>>, total: usize) -> Vec<Activity> {
    let mut feed: Vec<Activity> = sources.into_iter().flatten().collect();
    feed.sort_by_key(|activity| Reverse(activity.sort_key()));
    feed.truncate(total);
    feed
}
