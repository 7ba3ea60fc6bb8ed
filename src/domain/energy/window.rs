//! Aggregation windows
//!
//! Every window is half-open, `[start, end)`, and expressed in UTC. Day
//! buckets are UTC calendar dates.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::domain::{DomainError, DomainResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> DomainResult<Self> {
        if end < start {
            return Err(DomainError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// The `days` days ending at `now`.
    pub fn last_days(now: DateTime<Utc>, days: u32) -> Self {
        Self {
            start: now - Duration::days(i64::from(days)),
            end: now,
        }
    }

    /// Resolve optional query bounds. A missing end means `now`, a missing
    /// start means `default_days` before the end.
    pub fn from_bounds(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
        default_days: u32,
    ) -> DomainResult<Self> {
        let end = end.unwrap_or(now);
        let start = start.unwrap_or_else(|| end - Duration::days(i64::from(default_days)));
        Self::new(start, end)
    }

    /// The window of length `span` that ends where this one starts.
    pub fn preceding(&self, span: Duration) -> Self {
        Self {
            start: self.start - span,
            end: self.start,
        }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts < self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Length in fractional days.
    pub fn days(&self) -> f64 {
        self.duration().num_seconds() as f64 / 86_400.0
    }

    /// UTC dates touched by the window, in order.
    pub fn dates(&self) -> Vec<NaiveDate> {
        if self.is_empty() {
            return Vec::new();
        }
        let first = self.start.date_naive();
        let last = (self.end - Duration::nanoseconds(1)).date_naive();
        first.iter_days().take_while(|d| *d <= last).collect()
    }
}
