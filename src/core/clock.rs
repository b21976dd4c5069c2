//! Time source for the "this month" windows and local-day filter bounds

use chrono::{DateTime, FixedOffset, Local};

/// Supplies the current local time.
///
/// Aggregation compares calendar months in the clock's offset, and date
/// range filters build their day bounds in the same offset.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;

    fn offset(&self) -> FixedOffset {
        *self.now().offset()
    }
}

/// Wall clock in the host's local time zone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// A clock frozen at a given instant, for deterministic views and tests
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl FixedClock {
    /// Freeze the clock at an RFC 3339 instant
    pub fn parse(rfc3339: &str) -> Result<Self, chrono::ParseError> {
        DateTime::parse_from_rfc3339(rfc3339).map(Self)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}
