use std::sync::Arc;

use database::PgDatabase;
use transit_engine::{
    rate_limit::RateLimiter,
    snapshot::{Snapshot, SnapshotHandle},
    Engine,
};
use utility::clock::RealClock;
use web::{start_web_server, AppState, Config};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = Config::from_env();

    let database = PgDatabase::connect(&config.database)
        .await
        .expect("could not connect to database");

    // Real-time ingest (GTFS-RT polling, the feed collectors that would
    // populate `SnapshotHandle::swap`) lives outside this crate's scope;
    // the engine starts with an empty snapshot and serves schedule-only
    // arrivals/status until something swaps one in.
    let snapshot = SnapshotHandle::new(Snapshot::default());
    let rate_limiter = RateLimiter::new(config.rate_limiter);

    let engine = Arc::new(Engine::new(Arc::new(database.clone()), snapshot, rate_limiter, config.engine));

    let cleanup_engine = engine.clone();
    let cleanup_interval = config.rate_limit_cleanup_interval;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(cleanup_interval);
        loop {
            ticker.tick().await;
            let now_millis = chrono::Utc::now().timestamp_millis();
            cleanup_engine.rate_limiter.cleanup(now_millis);
        }
    });

    let state = AppState {
        engine,
        database,
        clock: Arc::new(RealClock),
        api_keys: Arc::new(config.api_keys),
        request_id_max_len: config.request_id_max_len,
    };

    let bind_addr = config.bind_addr.clone();
    tracing::info!(bind_addr, "starting transit information server");
    start_web_server(state, &bind_addr)
        .await
        .expect("web server exited unexpectedly");
}
