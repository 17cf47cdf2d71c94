use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    http::Uri,
    Json,
};
use chrono::Utc;
use serde::Serialize;
use transit_engine::error::EngineError;
use utility::composite_id;

use crate::{
    envelope::{EntryData, Envelope, References},
    error::ApiError,
    view::{render_arrival, RenderedArrival},
    AppState,
};

use super::params::{self, strip_json_suffix};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrivalsAndDeparturesEntry {
    pub stop_id: String,
    pub arrivals_and_departures: Vec<RenderedArrival>,
    pub nearby_stop_ids: Vec<String>,
}

/// `?minutesBefore=&minutesAfter=&time=` (§4.6). `minutesBefore` defaults
/// to 5, `minutesAfter` to 35, matching the OBA convention this endpoint
/// is modeled on; both are bounded to keep a single request from scanning
/// an unreasonably wide window.
pub async fn arrivals_and_departures_for_stop(
    State(state): State<AppState>,
    Path(stop_id): Path<String>,
    uri: Uri,
) -> Result<Json<Envelope<EntryData<ArrivalsAndDeparturesEntry>>>, ApiError> {
    let now = state.clock.now_millis();
    let combined_id = strip_json_suffix(&stop_id);
    let (stop_agency_id, _) = composite_id::parse(combined_id)
        .map_err(|_| ApiError::from_engine_error(EngineError::validation("id", format!("'{combined_id}' is not a valid combined id")), now))?;
    let stop_agency_id = stop_agency_id.to_owned();

    let query_time = params::time_or(&uri, state.clock.now().with_timezone(&Utc))
        .map_err(|why| ApiError::from_engine_error(why, now))?;
    let minutes_before = bounded_minutes(&uri, "minutesBefore", 5, 0, 60, now)?;
    let minutes_after = bounded_minutes(&uri, "minutesAfter", 35, 0, 240, now)?;

    let result = state
        .engine
        .arrivals_and_departures_for_stop(combined_id, query_time, minutes_before, minutes_after)
        .await
        .map_err(|why| ApiError::from_engine_error(why, now))?;

    let route_agency_by_raw_id: HashMap<String, String> = result
        .references
        .routes
        .iter()
        .map(|route| (route.id.raw(), route.content.agency_id.raw()))
        .collect();

    let arrivals_and_departures = result
        .entries
        .into_iter()
        .map(|entry| {
            let route_owning_agency = route_agency_by_raw_id
                .get(&entry.route_id.raw())
                .cloned()
                .unwrap_or_else(|| stop_agency_id.clone());
            render_arrival(entry, &stop_agency_id, &route_owning_agency)
        })
        .collect();

    let entry = ArrivalsAndDeparturesEntry {
        stop_id: combined_id.to_owned(),
        arrivals_and_departures,
        nearby_stop_ids: result.nearby_stop_ids,
    };

    Ok(Json(Envelope::ok(
        now,
        EntryData::new(entry).with_references(References::from(result.references)),
    )))
}

fn bounded_minutes(uri: &Uri, name: &str, default_value: i64, min: i64, max: i64, now: i64) -> Result<i64, ApiError> {
    let value = params::parse_i64(uri, name)
        .map_err(|why| ApiError::from_engine_error(why, now))?
        .unwrap_or(default_value);
    if !(min..=max).contains(&value) {
        return Err(ApiError::from_engine_error(
            EngineError::validation(name, format!("must be between {min} and {max}")),
            now,
        ));
    }
    Ok(value)
}
