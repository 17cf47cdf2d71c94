use axum::{extract::State, http::Uri, Json};
use transit_engine::reference::ReferenceCollector;

use crate::{
    envelope::{Envelope, ListData, References},
    error::ApiError,
    view::{render_route, render_stop, RenderedRoute, RenderedStop},
    AppState,
};

use super::params;

pub async fn search_stop(
    State(state): State<AppState>,
    uri: Uri,
) -> Result<Json<Envelope<ListData<RenderedStop>>>, ApiError> {
    let now = state.clock.now_millis();
    let input = params::query_param(&uri, "input").unwrap_or_default();
    let max_count = params::max_count(&uri, 20).map_err(|why| ApiError::from_engine_error(why, now))?;

    let mut results = state
        .engine
        .search_stop(input)
        .await
        .map_err(|why| ApiError::from_engine_error(why, now))?;

    let limit_exceeded = results.len() > max_count;
    results.truncate(max_count);

    let mut references = ReferenceCollector::new();
    for stop in &results {
        if let Ok(agency) = state.engine.agency(&stop.content.agency_id.raw()).await {
            references.add_agency(agency);
        }
    }

    let entries = results.into_iter().map(render_stop).collect();
    Ok(Json(Envelope::ok(
        now,
        ListData::new(entries)
            .with_references(References::from(references))
            .with_limit_exceeded(limit_exceeded),
    )))
}

pub async fn search_route(
    State(state): State<AppState>,
    uri: Uri,
) -> Result<Json<Envelope<ListData<RenderedRoute>>>, ApiError> {
    let now = state.clock.now_millis();
    let input = params::query_param(&uri, "input").unwrap_or_default();
    let max_count = params::max_count(&uri, 20).map_err(|why| ApiError::from_engine_error(why, now))?;

    let mut results = state
        .engine
        .search_route(input)
        .await
        .map_err(|why| ApiError::from_engine_error(why, now))?;

    let limit_exceeded = results.len() > max_count;
    results.truncate(max_count);

    let mut references = ReferenceCollector::new();
    for route in &results {
        if let Ok(agency) = state.engine.agency(&route.content.agency_id.raw()).await {
            references.add_agency(agency);
        }
    }

    let entries = results.into_iter().map(render_route).collect();
    Ok(Json(Envelope::ok(
        now,
        ListData::new(entries)
            .with_references(References::from(references))
            .with_limit_exceeded(limit_exceeded),
    )))
}
