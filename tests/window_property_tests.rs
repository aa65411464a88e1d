//! Property-based tests for the shared metric window
//!
//! Tests that the window arithmetic and timestamp rendering hold for any
//! lookback, not just the 90-day default.

use chrono::{DateTime, TimeZone, Utc};
use costctl::window::{iso8601, MetricWindow, DEFAULT_PERIOD_SECS};
use proptest::prelude::*;

proptest! {
    #[test]
    fn test_window_span_matches_lookback(days in 1i64..3650) {
        let window = MetricWindow::lookback(days, DEFAULT_PERIOD_SECS);

        // Properties:
        // 1. Span is exactly the lookback, in whole seconds
        prop_assert_eq!(window.span_secs(), days * 24 * 60 * 60);

        // 2. End is strictly after start
        prop_assert!(window.start < window.end);

        // 3. Period is carried through untouched
        prop_assert_eq!(window.period_secs, DEFAULT_PERIOD_SECS);
    }

    #[test]
    fn test_iso8601_rendering(secs in 0i64..4_102_444_800) {
        let t = Utc.timestamp_opt(secs, 0).unwrap();
        let rendered = iso8601(t);

        // Properties:
        // 1. Literal Z suffix, second precision (fixed width)
        prop_assert!(rendered.ends_with('Z'));
        prop_assert_eq!(rendered.len(), 20);

        // 2. Round-trips through a strict ISO-8601 parse
        let parsed: DateTime<Utc> = rendered.parse().unwrap();
        prop_assert_eq!(parsed, t);
    }
}

#[test]
fn test_window_is_shared_not_recomputed() {
    // One window value reused across formatting calls yields identical
    // start/end strings - the audit relies on this to keep every metric
    // query in a run on the same interval.
    let window = MetricWindow::lookback(90, DEFAULT_PERIOD_SECS);
    let first = (iso8601(window.start), iso8601(window.end));
    let second = (iso8601(window.start), iso8601(window.end));
    assert_eq!(first, second);
}
