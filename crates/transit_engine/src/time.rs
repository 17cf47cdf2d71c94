//! The single helper every service-day-midnight calculation in the engine
//! goes through, so an off-by-one-day mistake can't creep in at more than
//! one call site (spec.md §9).

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

/// UTC instant of local midnight on `date` in `tz`. `None` only for the
/// (practically nonexistent for IANA transit zones) case of a local
/// midnight that falls in a spring-forward DST gap.
pub fn service_day_midnight_utc(tz: Tz, date: NaiveDate) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&date.and_hms_opt(0, 0, 0)?)
        .single()
        .map(|local| local.with_timezone(&Utc))
}

/// Nanoseconds since `midnight_utc`, which may be negative (before
/// midnight) or exceed one day's worth of nanoseconds (GTFS's past-
/// midnight stop-times, e.g. `25:30:00`).
pub fn nanos_since_midnight(instant: DateTime<Utc>, midnight_utc: DateTime<Utc>) -> i64 {
    (instant - midnight_utc)
        .num_nanoseconds()
        .unwrap_or(if instant >= midnight_utc { i64::MAX } else { i64::MIN })
}

/// Inverse of [`nanos_since_midnight`]: the UTC instant `nanos` past
/// `midnight_utc`.
pub fn instant_from_nanos_since_midnight(midnight_utc: DateTime<Utc>, nanos: i64) -> DateTime<Utc> {
    midnight_utc + chrono::Duration::nanoseconds(nanos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn service_day_midnight_resolves_in_named_zone() {
        let tz: Tz = "Europe/Berlin".parse().unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        let midnight = service_day_midnight_utc(tz, date).unwrap();
        assert_eq!(midnight.hour(), 22);
        assert_eq!(midnight.date_naive(), NaiveDate::from_ymd_opt(2026, 5, 31).unwrap());
    }

    #[test]
    fn nanos_since_midnight_round_trips() {
        let midnight = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let instant = midnight + chrono::Duration::hours(25) + chrono::Duration::minutes(30);
        let nanos = nanos_since_midnight(instant, midnight);
        assert_eq!(instant_from_nanos_since_midnight(midnight, nanos), instant);
        assert!(nanos > 24 * 3_600 * 1_000_000_000);
    }
}
