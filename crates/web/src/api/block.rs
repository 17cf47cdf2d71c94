use axum::{
    extract::{Path, State},
    http::Uri,
    Json,
};
use chrono::Utc;
use transit_engine::{
    engine::{resolve_tz, service_date_for},
    error::EngineError,
    reference::ReferenceCollector,
};
use utility::composite_id;

use crate::{
    envelope::{EntryData, Envelope, References},
    error::ApiError,
    view::{render_block_trip, RenderedBlockTrip},
    AppState,
};

use super::params::{self, strip_json_suffix};

pub async fn block(
    State(state): State<AppState>,
    Path(block_id): Path<String>,
    uri: Uri,
) -> Result<Json<Envelope<EntryData<Vec<RenderedBlockTrip>>>>, ApiError> {
    let now = state.clock.now_millis();
    let combined_id = strip_json_suffix(&block_id);
    let (agency_raw, raw_block_id) = composite_id::parse(combined_id)
        .map_err(|_| ApiError::from_engine_error(EngineError::validation("id", format!("'{combined_id}' is not a valid combined id")), now))?;

    let agency = state
        .engine
        .agency(agency_raw)
        .await
        .map_err(|why| ApiError::from_engine_error(why, now))?;
    let tz = resolve_tz(&agency.content).map_err(|why| ApiError::from_engine_error(why, now))?;
    let now_utc = state.clock.now().with_timezone(&Utc);

    let date = params::date_or(&uri, service_date_for(now_utc, tz))
        .map_err(|why| ApiError::from_engine_error(why, now))?;

    let summaries = state
        .engine
        .block(agency_raw, raw_block_id, date)
        .await
        .map_err(|why| ApiError::from_engine_error(why, now))?;

    let agency_raw = agency.id.raw();
    let mut references = ReferenceCollector::new();
    references.add_agency(agency);

    let entry = summaries
        .into_iter()
        .map(|summary| render_block_trip(summary, &agency_raw))
        .collect();

    Ok(Json(Envelope::ok(
        now,
        EntryData::new(entry).with_references(References::from(references)),
    )))
}
