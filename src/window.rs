//! Shared metric query window
//!
//! One window is computed at startup and reused by every CloudWatch query in
//! the run. Recomputing "now" per resource would skew start/end across
//! thousands of calls; a single captured pair keeps all reports comparable.

use chrono::{DateTime, Duration, Utc};

/// Default lookback for utilization metrics (days)
pub const DEFAULT_LOOKBACK_DAYS: i64 = 90;

/// Default aggregation period: 30 days in seconds. With the 90-day lookback
/// this yields at most 3 datapoints per metric per resource.
pub const DEFAULT_PERIOD_SECS: i32 = 30 * 24 * 60 * 60;

/// Start/end pair plus aggregation period for CloudWatch statistics queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub period_secs: i32,
}

impl MetricWindow {
    /// Capture a window ending now (UTC) and starting `days` earlier.
    pub fn lookback(days: i64, period_secs: i32) -> Self {
        let end = Utc::now();
        let start = end - Duration::days(days);
        Self {
            start,
            end,
            period_secs,
        }
    }

    /// Window length in whole seconds
    pub fn span_secs(&self) -> i64 {
        (self.end - self.start).num_seconds()
    }
}

impl Default for MetricWindow {
    fn default() -> Self {
        Self::lookback(DEFAULT_LOOKBACK_DAYS, DEFAULT_PERIOD_SECS)
    }
}

/// Render a timestamp as ISO-8601 with second precision and a literal `Z`
/// suffix, the format the CSV reports use.
pub fn iso8601(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
