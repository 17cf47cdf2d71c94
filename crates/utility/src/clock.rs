//! Time source abstraction. The engine never calls `chrono::Local::now()`
//! directly so that tests can pin or advance time deterministically.

use std::{
    env,
    fs,
    sync::{Arc, Mutex},
};

use chrono::{DateTime, Local, TimeZone, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;

    fn now_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RealClock;

impl Clock for RealClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Settable/advanceable clock for deterministic unit and scenario tests.
#[derive(Clone)]
pub struct MockClock {
    current: Arc<Mutex<DateTime<Local>>>,
}

impl MockClock {
    pub fn at(time: DateTime<Local>) -> Self {
        Self {
            current: Arc::new(Mutex::new(time)),
        }
    }

    pub fn set(&self, time: DateTime<Local>) {
        *self.current.lock().expect("mock clock poisoned") = time;
    }

    pub fn advance(&self, duration: chrono::Duration) {
        let mut guard = self.current.lock().expect("mock clock poisoned");
        *guard = *guard + duration;
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Local> {
        *self.current.lock().expect("mock clock poisoned")
    }
}

/// Reads the current time from an environment variable or, failing that,
/// a file path, both holding an RFC3339 timestamp. Falls back to the real
/// clock if neither is set or parseable — used to pin time during
/// integration test runs without rebuilding the binary.
pub struct EnvClock {
    pub env_var: &'static str,
    pub file_path: Option<&'static str>,
}

impl EnvClock {
    pub fn new(env_var: &'static str) -> Self {
        Self {
            env_var,
            file_path: None,
        }
    }

    pub fn with_file_fallback(
        env_var: &'static str,
        file_path: &'static str,
    ) -> Self {
        Self {
            env_var,
            file_path: Some(file_path),
        }
    }

    fn read_pinned(&self) -> Option<DateTime<Local>> {
        let raw = env::var(self.env_var).ok().or_else(|| {
            self.file_path
                .and_then(|path| fs::read_to_string(path).ok())
        })?;
        let parsed = DateTime::parse_from_rfc3339(raw.trim()).ok()?;
        Some(parsed.with_timezone(&Local))
    }
}

impl Clock for EnvClock {
    fn now(&self) -> DateTime<Local> {
        self.read_pinned().unwrap_or_else(Local::now)
    }
}

/// Converts a UTC timestamp to local without panicking on ambiguous/invalid
/// local times — a single helper avoids the off-by-hour mistakes of ad hoc
/// `TimeZone::from_utc_datetime` calls scattered through the engine.
pub fn utc_to_local(timestamp: DateTime<Utc>) -> DateTime<Local> {
    timestamp.with_timezone(&Local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn mock_clock_advances() {
        let start = Local::now();
        let clock = MockClock::at(start);
        clock.advance(Duration::minutes(5));
        assert_eq!(clock.now(), start + Duration::minutes(5));
    }

    #[test]
    fn mock_clock_set_overrides() {
        let clock = MockClock::at(Local::now());
        let target = Local.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        clock.set(target);
        assert_eq!(clock.now(), target);
    }
}
