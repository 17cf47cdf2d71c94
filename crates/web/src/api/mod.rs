//! `/api/where/*` routing (§6): one `Router::route` per endpoint, grouped
//! under whichever cache tier (`static`/`realtime`/`no-cache`) its
//! underlying data has, all wrapped in the same auth/rate-limit and
//! request-id middleware regardless of group.

use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};

pub mod agency;
pub mod arrivals;
pub mod block;
pub mod current_time;
pub mod health;
pub mod params;
pub mod problem_report;
pub mod route;
pub mod schedule;
pub mod search;
pub mod shape;
pub mod stop;
pub mod trip;

use crate::{
    middleware::{
        auth::auth_middleware,
        cache_control::{no_cache, realtime_cache, static_cache},
        request_id::request_id_middleware,
    },
    AppState,
};

async fn route_not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "no such resource")
}

/// Static lookups: entities and topology that only change on a feed
/// reload, cached for five minutes.
fn static_routes(state: AppState) -> Router {
    Router::new()
        .route("/agency/:agency_id", get(agency::agency))
        .route("/stop/:stop_id", get(stop::stop))
        .route("/stops-for-agency/:agency_id", get(stop::stops_for_agency))
        .route("/stops-for-location", get(stop::stops_for_location))
        .route("/route/:route_id", get(route::route))
        .route("/routes-for-agency/:agency_id", get(route::routes_for_agency))
        .route("/routes-for-location", get(route::routes_for_location))
        .route("/search/stop", get(search::search_stop))
        .route("/search/route", get(search::search_route))
        .route("/schedule-for-stop/:stop_id", get(schedule::schedule_for_stop))
        .route("/schedule-for-route/:route_id", get(schedule::schedule_for_route))
        .route("/block/:block_id", get(block::block))
        .route("/shape/:shape_id", get(shape::shape))
        .layer(static_cache())
        .with_state(state)
}

/// Real-time-backed lookups, cached for thirty seconds.
fn realtime_routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/arrivals-and-departures-for-stop/:stop_id",
            get(arrivals::arrivals_and_departures_for_stop),
        )
        .route("/trip-for-vehicle/:vehicle_id", get(trip::trip_for_vehicle))
        .route("/trip/:trip_id/status", get(trip::trip_status))
        .layer(realtime_cache())
        .with_state(state)
}

/// Writes and their own read-backs: problem reports and the current-time
/// probe never cache.
fn no_cache_routes(state: AppState) -> Router {
    Router::new()
        .route("/current-time", get(current_time::current_time))
        .route(
            "/report-problem-with-stop/:stop_id",
            post(problem_report::report_problem_with_stop),
        )
        .route(
            "/report-problem-with-trip/:trip_id",
            post(problem_report::report_problem_with_trip),
        )
        .route(
            "/problem-reports-for-stop/:stop_id",
            get(problem_report::problem_reports_for_stop),
        )
        .route(
            "/problem-reports-for-trip/:trip_id",
            get(problem_report::problem_reports_for_trip),
        )
        .layer(no_cache())
        .with_state(state)
}

pub fn routes(state: AppState) -> Router {
    let where_routes = static_routes(state.clone())
        .merge(realtime_routes(state.clone()))
        .merge(no_cache_routes(state.clone()))
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/healthz", get(health::healthz))
        .nest("/api/where", where_routes)
        .layer(axum::middleware::from_fn_with_state(state.clone(), request_id_middleware))
        .fallback(route_not_found)
        .with_state(state)
}
