//! Environment-variable configuration (§A.4). Deliberately a handful of
//! `env::var` calls rather than a config-file parser — configuration
//! *loading* as a subsystem is out of scope, but the values still have to
//! come from somewhere.

use std::{env, time::Duration};

use database::DatabaseConnectionInfo;
use transit_engine::{engine::EngineConfig, rate_limit::RateLimiterConfig};

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

pub struct Config {
    pub database: DatabaseConnectionInfo,
    pub bind_addr: String,
    pub engine: EngineConfig,
    pub rate_limiter: RateLimiterConfig,
    pub rate_limit_cleanup_interval: Duration,
    pub request_id_max_len: usize,
    /// Caller-presented api keys accepted by the auth middleware. Empty
    /// means no key is required (§7's Unauthorized path never triggers).
    pub api_keys: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        let database = DatabaseConnectionInfo::from_env()
            .expect("expected database connection info in env");

        let engine = EngineConfig {
            stale_vehicle_threshold: chrono::Duration::seconds(env_or(
                "STALE_VEHICLE_THRESHOLD_SECS",
                900,
            )),
            nearby_stop_radius_meters: env_or("NEARBY_STOP_RADIUS_METERS", 10_000.0),
            ..EngineConfig::default()
        };

        let rate_limiter = RateLimiterConfig {
            requests_per_minute: env_or("RATE_LIMIT_PER_MINUTE", 60.0),
            idle_evict: Duration::from_secs(env_or("RATE_LIMIT_IDLE_EVICT_SECS", 600)),
        };

        let api_keys = env::var("API_KEYS")
            .ok()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|key| !key.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            database,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_owned()),
            engine,
            rate_limiter,
            rate_limit_cleanup_interval: Duration::from_secs(env_or(
                "RATE_LIMIT_CLEANUP_INTERVAL_SECS",
                300,
            )),
            request_id_max_len: env_or("REQUEST_ID_MAX_LEN", 128),
            api_keys,
        }
    }
}
