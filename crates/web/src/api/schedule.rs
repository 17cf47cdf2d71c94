use axum::{
    extract::{Path, State},
    http::Uri,
    Json,
};
use chrono::Utc;
use transit_engine::{
    engine::{resolve_tz, service_date_for},
    reference::ReferenceCollector,
};

use crate::{
    envelope::{EntryData, Envelope, References},
    error::ApiError,
    view::{render_route_trip_schedule, render_stop_route_schedule, RenderedRouteTripSchedule, RenderedStopRouteSchedule},
    AppState,
};

use super::params::{self, strip_json_suffix};

pub async fn schedule_for_stop(
    State(state): State<AppState>,
    Path(stop_id): Path<String>,
    uri: Uri,
) -> Result<Json<Envelope<EntryData<Vec<RenderedStopRouteSchedule>>>>, ApiError> {
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
    let tz = resolve_tz(&agency.content).map_err(|why| ApiError::from_engine_error(why, now))?;
    let now_utc = state.clock.now().with_timezone(&Utc);

    let date = params::date_or(&uri, service_date_for(now_utc, tz))
        .map_err(|why| ApiError::from_engine_error(why, now))?;
    let midnight_utc = transit_engine::time::service_day_midnight_utc(tz, date)
        .ok_or_else(|| ApiError::from_engine_error(transit_engine::error::EngineError::Internal("service date has no local midnight in agency timezone".into()), now))?;

    let schedules = state
        .engine
        .schedule_for_stop(combined_id, date)
        .await
        .map_err(|why| ApiError::from_engine_error(why, now))?;

    let agency_raw = agency.id.raw();
    let mut references = ReferenceCollector::new();
    references.add_agency(agency);
    references.add_stop(stop);

    let entry = schedules
        .into_iter()
        .map(|schedule| render_stop_route_schedule(schedule, midnight_utc, &agency_raw))
        .collect();

    Ok(Json(Envelope::ok(
        now,
        EntryData::new(entry).with_references(References::from(references)),
    )))
}

pub async fn schedule_for_route(
    State(state): State<AppState>,
    Path(route_id): Path<String>,
    uri: Uri,
) -> Result<Json<Envelope<EntryData<Vec<RenderedRouteTripSchedule>>>>, ApiError> {
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
    let tz = resolve_tz(&agency.content).map_err(|why| ApiError::from_engine_error(why, now))?;
    let now_utc = state.clock.now().with_timezone(&Utc);

    let date = params::date_or(&uri, service_date_for(now_utc, tz))
        .map_err(|why| ApiError::from_engine_error(why, now))?;
    let midnight_utc = transit_engine::time::service_day_midnight_utc(tz, date)
        .ok_or_else(|| ApiError::from_engine_error(transit_engine::error::EngineError::Internal("service date has no local midnight in agency timezone".into()), now))?;

    let schedules = state
        .engine
        .schedule_for_route(combined_id, date)
        .await
        .map_err(|why| ApiError::from_engine_error(why, now))?;

    let agency_raw = agency.id.raw();
    let mut references = ReferenceCollector::new();
    references.add_agency(agency);
    references.add_route(route);

    let entry = schedules
        .into_iter()
        .map(|schedule| render_route_trip_schedule(schedule, midnight_utc, &agency_raw))
        .collect();

    Ok(Json(Envelope::ok(
        now,
        EntryData::new(entry).with_references(References::from(references)),
    )))
}
