use axum::{
    extract::{Path, State},
    http::Uri,
    Json,
};
use transit_engine::reference::ReferenceCollector;

use crate::{
    envelope::{EntryData, Envelope, ListData, References},
    error::ApiError,
    view::{render_route, RenderedRoute},
    AppState,
};

use super::params::{self, strip_json_suffix};

pub async fn route(
    State(state): State<AppState>,
    Path(route_id): Path<String>,
) -> Result<Json<Envelope<EntryData<RenderedRoute>>>, ApiError> {
    let now = state.clock.now_millis();
    let combined_id = strip_json_suffix(&route_id);

    let route = state
        .engine
        .route(combined_id)
        .await
        .map_err(|why| ApiError::from_engine_error(why, now))?;

    let agency = state
        .engine
        .agency(&route.content.agency_id.raw())
        .await
        .map_err(|why| ApiError::from_engine_error(why, now))?;
    let mut references = ReferenceCollector::new();
    references.add_agency(agency);

    let entry = render_route(route);
    Ok(Json(Envelope::ok(
        now,
        EntryData::new(entry).with_references(References::from(references)),
    )))
}

pub async fn routes_for_agency(
    State(state): State<AppState>,
    Path(agency_id): Path<String>,
) -> Result<Json<Envelope<ListData<RenderedRoute>>>, ApiError> {
    let now = state.clock.now_millis();
    let agency_id = strip_json_suffix(&agency_id);

    let routes = state
        .engine
        .routes_for_agency(agency_id)
        .await
        .map_err(|why| ApiError::from_engine_error(why, now))?;

    let agency = state
        .engine
        .agency(agency_id)
        .await
        .map_err(|why| ApiError::from_engine_error(why, now))?;
    let mut references = ReferenceCollector::new();
    references.add_agency(agency);

    let entries = routes.into_iter().map(render_route).collect();
    Ok(Json(Envelope::ok(
        now,
        ListData::new(entries).with_references(References::from(references)),
    )))
}

/// `?lat=&lon=&radius=` (or `latSpan`/`lonSpan`), same bounding-box
/// convention as `stops-for-location`; `query` filters by display name.
pub async fn routes_for_location(
    State(state): State<AppState>,
    uri: Uri,
) -> Result<Json<Envelope<ListData<RenderedRoute>>>, ApiError> {
    let now = state.clock.now_millis();
    let lat = params::require_f64(&uri, "lat").map_err(|why| ApiError::from_engine_error(why, now))?;
    let lon = params::require_f64(&uri, "lon").map_err(|why| ApiError::from_engine_error(why, now))?;
    let radius = super::stop::resolve_radius(&uri, lat, lon, now)?;
    let max_count = params::max_count(&uri, 100).map_err(|why| ApiError::from_engine_error(why, now))?;
    let query = params::query_param(&uri, "query").map(str::to_lowercase);

    let mut results = state
        .engine
        .routes_for_location(lat, lon, radius)
        .await
        .map_err(|why| ApiError::from_engine_error(why, now))?;

    if let Some(needle) = &query {
        results.retain(|route| {
            route
                .content
                .display_name()
                .map(|name| name.to_lowercase().contains(needle.as_str()))
                .unwrap_or(false)
        });
    }

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
