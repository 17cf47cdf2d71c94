//! API-key check plus rate limiting (§5, §7), combined into one middleware
//! since both are keyed off the same caller identity: the `key` query
//! parameter OBA-style clients already send.

use axum::{
    extract::State,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{api::params::query_param, error::ApiError, AppState};

pub async fn auth_middleware(
    State(state): State<AppState>,
    req: axum::extract::Request,
    next: Next,
) -> Response {
    let now_millis = state.clock.now_millis();
    let supplied_key = query_param(req.uri(), "key").map(str::to_owned);

    if !state.api_keys.is_empty() {
        let authorized = supplied_key
            .as_deref()
            .is_some_and(|key| state.api_keys.iter().any(|configured| configured == key));
        if !authorized {
            return ApiError::unauthorized(now_millis).into_response();
        }
    }

    let rate_limit_key = supplied_key.as_deref().unwrap_or("anonymous");
    let admission = state.engine.rate_limiter.check(
        rate_limit_key,
        std::time::Instant::now(),
        now_millis,
    );

    match admission {
        transit_engine::rate_limit::Admission::Allowed => next.run(req).await,
        transit_engine::rate_limit::Admission::Denied { retry_after_secs } => {
            let limit_per_minute = state.engine.rate_limiter.requests_per_minute() as u64;
            ApiError::rate_limited(now_millis, retry_after_secs, limit_per_minute).into_response()
        }
    }
}
