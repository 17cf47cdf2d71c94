use axum::{
    extract::{Path, State},
    http::Uri,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use transit_engine::{
    engine::{resolve_tz, service_date_for},
    error::EngineError,
    reference::ReferenceCollector,
};
use utility::composite_id;

use crate::{
    envelope::{EntryData, Envelope, References},
    error::ApiError,
    view::{render_stop_time, render_trip_status, RenderedStopTime, RenderedTripStatus},
    AppState,
};

use super::params::{self, strip_json_suffix};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripStatusEntry {
    pub trip_id: String,
    pub status: RenderedTripStatus,
}

/// `GET /trip/{tripId}/status.json?serviceDate=&time=` (§4.5).
pub async fn trip_status(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
    uri: Uri,
) -> Result<Json<Envelope<EntryData<TripStatusEntry>>>, ApiError> {
    let now = state.clock.now_millis();
    let combined_id = strip_json_suffix(&trip_id);
    let agency_raw = parse_owning_agency(combined_id, now)?;

    let agency = state
        .engine
        .agency(&agency_raw)
        .await
        .map_err(|why| ApiError::from_engine_error(why, now))?;
    let tz = resolve_tz(&agency.content).map_err(|why| ApiError::from_engine_error(why, now))?;
    let now_utc = state.clock.now().with_timezone(&Utc);

    let service_date = params::date_or(&uri, service_date_for(now_utc, tz))
        .map_err(|why| ApiError::from_engine_error(why, now))?;
    let query_time = params::time_or(&uri, now_utc).map_err(|why| ApiError::from_engine_error(why, now))?;

    let status = state
        .engine
        .trip_status_for_trip(combined_id, service_date, query_time)
        .await
        .map_err(|why| ApiError::from_engine_error(why, now))?;

    let mut references = ReferenceCollector::new();
    references.add_agency(agency);
    if let Ok(trip) = state.engine.trip(combined_id).await {
        let route_combined = composite_id::render(&agency_raw, &trip.content.route_id.raw());
        if let Ok(route) = state.engine.route(&route_combined).await {
            references.add_trip(trip, &route.content.agency_id);
            references.add_route(route);
        }
    }

    let entry = TripStatusEntry {
        trip_id: combined_id.to_owned(),
        status: render_trip_status(status, &agency_raw),
    };

    Ok(Json(Envelope::ok(
        now,
        EntryData::new(entry).with_references(References::from(references)),
    )))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripForVehicleEntry {
    pub trip_id: String,
    pub service_date: NaiveDate,
    pub status: RenderedTripStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Vec<RenderedStopTime>>,
}

/// `GET /trip-for-vehicle/{vehicleId}.json?serviceDate=&time=&includeTrip=&includeSchedule=`.
/// The vehicle's combined id is assumed to carry the same agency prefix as
/// the trip it is currently assigned to (true for every feed this engine
/// ingests, since a vehicle never crosses agencies mid-assignment) — this
/// lets the handler resolve an owning agency before it even knows which
/// trip the vehicle is on.
pub async fn trip_for_vehicle(
    State(state): State<AppState>,
    Path(vehicle_id): Path<String>,
    uri: Uri,
) -> Result<Json<Envelope<EntryData<TripForVehicleEntry>>>, ApiError> {
    let now = state.clock.now_millis();
    let combined_id = strip_json_suffix(&vehicle_id);
    let agency_raw = parse_owning_agency(combined_id, now)?;
    let (_, vehicle_raw) = composite_id::parse(combined_id)
        .map_err(|_| ApiError::from_engine_error(EngineError::validation("id", format!("'{combined_id}' is not a valid combined id")), now))?;

    let agency = state
        .engine
        .agency(&agency_raw)
        .await
        .map_err(|why| ApiError::from_engine_error(why, now))?;
    let tz = resolve_tz(&agency.content).map_err(|why| ApiError::from_engine_error(why, now))?;
    let now_utc = state.clock.now().with_timezone(&Utc);

    let service_date = params::date_or(&uri, now_utc.date_naive())
        .map_err(|why| ApiError::from_engine_error(why, now))?;
    let query_time = params::time_or(&uri, now_utc).map_err(|why| ApiError::from_engine_error(why, now))?;
    let include_trip = params::bool_or(&uri, "includeTrip", true);
    let include_schedule = params::bool_or(&uri, "includeSchedule", false);

    let status = state
        .engine
        .trip_for_vehicle(vehicle_raw, service_date, query_time)
        .await
        .map_err(|why| ApiError::from_engine_error(why, now))?;

    let mut references = ReferenceCollector::new();
    references.add_agency(agency.clone());

    let mut schedule = None;
    if include_trip || include_schedule {
        if let Ok(trip) = state.engine.trip(&composite_id::render(&agency_raw, &status.active_trip_id.raw())).await {
            if include_trip {
                let route_combined = composite_id::render(&agency_raw, &trip.content.route_id.raw());
                if let Ok(route) = state.engine.route(&route_combined).await {
                    references.add_trip(trip.clone(), &route.content.agency_id);
                    references.add_route(route);
                }
            }
            if include_schedule {
                if let Some(midnight_utc) = transit_engine::time::service_day_midnight_utc(tz, service_date) {
                    if let Ok(stop_times) = state.engine.stop_times_for_trip(&trip.id).await {
                        schedule = Some(
                            stop_times
                                .iter()
                                .map(|stop_time| render_stop_time(stop_time, midnight_utc, &agency_raw))
                                .collect(),
                        );
                    }
                }
            }
        }
    }

    let entry = TripForVehicleEntry {
        trip_id: composite_id::render(&agency_raw, &status.active_trip_id.raw()),
        service_date,
        status: render_trip_status(status, &agency_raw),
        schedule,
    };

    Ok(Json(Envelope::ok(
        now,
        EntryData::new(entry).with_references(References::from(references)),
    )))
}

fn parse_owning_agency(combined_id: &str, now: i64) -> Result<String, ApiError> {
    composite_id::parse(combined_id)
        .map(|(agency_raw, _)| agency_raw.to_owned())
        .map_err(|_| ApiError::from_engine_error(EngineError::validation("id", format!("'{combined_id}' is not a valid combined id")), now))
}
