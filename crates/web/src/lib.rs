use std::sync::Arc;

use axum::{extract::FromRef, Router};
use database::PgDatabase;
use tokio::net::TcpListener;
use transit_engine::Engine;
use utility::clock::Clock;

pub mod api;
pub mod config;
pub mod envelope;
pub mod error;
pub mod middleware;
pub mod view;

pub use config::Config;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub engine: Arc<Engine<PgDatabase>>,
    /// Problem-report CRUD (§1/§6) sits outside the `ScheduleStore` trait —
    /// it's a plain write-only table with no query-fusion involvement — so
    /// handlers talk to the database directly rather than through `engine`.
    pub database: PgDatabase,
    pub clock: Arc<dyn Clock>,
    pub api_keys: Arc<Vec<String>>,
    pub request_id_max_len: usize,
}

pub fn app(state: AppState) -> Router {
    api::routes(state)
}

pub async fn start_web_server(state: AppState, bind_addr: &str) -> std::io::Result<()> {
    let routes = app(state);
    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!(bind_addr, "listening");
    axum::serve(listener, routes.into_make_service()).await
}
