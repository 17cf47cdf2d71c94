use axum::{extract::{Path, State}, Json};

use crate::{
    envelope::{EntryData, Envelope},
    error::ApiError,
    view::render_agency,
    AppState,
};

use super::params::strip_json_suffix;

pub async fn agency(
    State(state): State<AppState>,
    Path(agency_id): Path<String>,
) -> Result<Json<Envelope<EntryData<crate::view::RenderedAgency>>>, ApiError> {
    let now = state.clock.now_millis();
    let agency_id = strip_json_suffix(&agency_id);

    let agency = state
        .engine
        .agency(agency_id)
        .await
        .map_err(|why| ApiError::from_engine_error(why, now))?;

    let entry = render_agency(agency);
    Ok(Json(Envelope::ok(now, EntryData::new(entry))))
}
