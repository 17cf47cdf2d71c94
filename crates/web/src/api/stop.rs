use axum::{
    extract::{Path, State},
    http::Uri,
    Json,
};
use transit_engine::reference::ReferenceCollector;

use crate::{
    envelope::{EntryData, Envelope, ListData, References},
    error::ApiError,
    view::{render_stop, render_stop_with_distance, RenderedStop, RenderedStopWithDistance},
    AppState,
};

use super::params::{self, strip_json_suffix};

pub async fn stop(
    State(state): State<AppState>,
    Path(stop_id): Path<String>,
) -> Result<Json<Envelope<EntryData<RenderedStop>>>, ApiError> {
    let now = state.clock.now_millis();
    let combined_id = strip_json_suffix(&stop_id);

    let stop = state
        .engine
        .stop(combined_id)
        .await
        .map_err(|why| ApiError::from_engine_error(why, now))?;

    let agency = state
        .engine
        .agency(&stop.content.agency_id.raw())
        .await
        .map_err(|why| ApiError::from_engine_error(why, now))?;

    let mut references = ReferenceCollector::new();
    references.add_agency(agency);

    let entry = render_stop(stop);
    Ok(Json(Envelope::ok(
        now,
        EntryData::new(entry).with_references(References::from(references)),
    )))
}

pub async fn stops_for_agency(
    State(state): State<AppState>,
    Path(agency_id): Path<String>,
) -> Result<Json<Envelope<ListData<RenderedStop>>>, ApiError> {
    let now = state.clock.now_millis();
    let agency_id = strip_json_suffix(&agency_id);

    let stops = state
        .engine
        .stops_for_agency(agency_id)
        .await
        .map_err(|why| ApiError::from_engine_error(why, now))?;

    let agency = state
        .engine
        .agency(agency_id)
        .await
        .map_err(|why| ApiError::from_engine_error(why, now))?;
    let mut references = ReferenceCollector::new();
    references.add_agency(agency);

    let entries = stops.into_iter().map(render_stop).collect();
    Ok(Json(Envelope::ok(
        now,
        ListData::new(entries).with_references(References::from(references)),
    )))
}

/// `?lat=&lon=` required; `radius` in meters, or `latSpan`/`lonSpan` in
/// degrees as an OBA-style bounding-box alternative, converted to an
/// equivalent radius via the distance to the box's corner. `query`
/// further filters the radius search by stop name.
pub async fn stops_for_location(
    State(state): State<AppState>,
    uri: Uri,
) -> Result<Json<Envelope<ListData<RenderedStopWithDistance>>>, ApiError> {
    let now = state.clock.now_millis();
    let lat = params::require_f64(&uri, "lat").map_err(|why| ApiError::from_engine_error(why, now))?;
    let lon = params::require_f64(&uri, "lon").map_err(|why| ApiError::from_engine_error(why, now))?;
    let radius = resolve_radius(&uri, lat, lon, now)?;
    let max_count = params::max_count(&uri, 100).map_err(|why| ApiError::from_engine_error(why, now))?;
    let query = params::query_param(&uri, "query").map(str::to_lowercase);

    let mut results = state
        .engine
        .stops_for_location(lat, lon, radius)
        .await
        .map_err(|why| ApiError::from_engine_error(why, now))?;

    if let Some(needle) = &query {
        results.retain(|stop| {
            stop.content
                .content
                .name
                .as_deref()
                .map(|name| name.to_lowercase().contains(needle.as_str()))
                .unwrap_or(false)
        });
    }

    let limit_exceeded = results.len() > max_count;
    results.truncate(max_count);

    let mut references = ReferenceCollector::new();
    for stop in &results {
        if let Ok(agency) = state.engine.agency(&stop.content.content.agency_id.raw()).await {
            references.add_agency(agency);
        }
    }

    let entries = results.into_iter().map(render_stop_with_distance).collect();
    Ok(Json(Envelope::ok(
        now,
        ListData::new(entries)
            .with_references(References::from(references))
            .with_limit_exceeded(limit_exceeded),
    )))
}

pub(super) fn resolve_radius(uri: &Uri, lat: f64, lon: f64, now: i64) -> Result<Option<f64>, ApiError> {
    if let Some(radius) = params::parse_f64(uri, "radius").map_err(|why| ApiError::from_engine_error(why, now))? {
        return Ok(Some(radius));
    }
    let lat_span = params::parse_f64(uri, "latSpan").map_err(|why| ApiError::from_engine_error(why, now))?;
    let lon_span = params::parse_f64(uri, "lonSpan").map_err(|why| ApiError::from_engine_error(why, now))?;
    match (lat_span, lon_span) {
        (Some(lat_span), Some(lon_span)) => {
            let corner_lat = lat + lat_span / 2.0;
            let corner_lon = lon + lon_span / 2.0;
            Ok(Some(utility::geo::distance_m(lat, lon, corner_lat, corner_lon)))
        }
        _ => Ok(None),
    }
}
