//! `/healthz` (§7): the one endpoint where store unavailability is a 503
//! rather than the generic 500 every other handler gives it, since this
//! is the probe whose entire point is reporting that distinction.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::AppState;

pub async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    match state.engine.health_check().await {
        Ok(()) => (StatusCode::OK, Json(json!({"status": "ok"}))),
        Err(why) => {
            tracing::warn!(%why, "healthz: schedule store unavailable");
            (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"status": "unavailable"})))
        }
    }
}
