//! Stale-vehicle detection (§4.4). A vehicle's real-time position is stale
//! once too much time has passed since its last reported timestamp — or
//! immediately, if it was never timestamped at all.

use chrono::{DateTime, Utc};

/// Resolved open question (spec.md §9): a vehicle position with no
/// timestamp at all is always considered stale, regardless of whether a
/// position is present. There is no meaningful age to compare against a
/// threshold, so treating "no data" as "fresh" would be misleading.
pub fn is_stale(
    timestamp: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    threshold: chrono::Duration,
) -> bool {
    match timestamp {
        None => true,
        Some(timestamp) => now.signed_duration_since(timestamp) > threshold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn missing_timestamp_is_always_stale() {
        let now = Utc::now();
        assert!(is_stale(None, now, Duration::seconds(300)));
    }

    #[test]
    fn boundary_is_not_stale() {
        let now = Utc::now();
        let timestamp = now - Duration::seconds(300);
        assert!(!is_stale(Some(timestamp), now, Duration::seconds(300)));
    }

    #[test]
    fn just_past_boundary_is_stale() {
        let now = Utc::now();
        let timestamp = now - Duration::seconds(301);
        assert!(is_stale(Some(timestamp), now, Duration::seconds(300)));
    }

    #[test]
    fn fresh_timestamp_is_not_stale() {
        let now = Utc::now();
        assert!(!is_stale(Some(now), now, Duration::seconds(300)));
    }
}
