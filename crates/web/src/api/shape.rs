use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    envelope::{EntryData, Envelope},
    error::ApiError,
    AppState,
};

use super::params::strip_json_suffix;

pub async fn shape(
    State(state): State<AppState>,
    Path(shape_id): Path<String>,
) -> Result<Json<Envelope<EntryData<transit_engine::shape::EncodedShape>>>, ApiError> {
    let now = state.clock.now_millis();
    let combined_id = strip_json_suffix(&shape_id);

    let encoded = state
        .engine
        .shape(combined_id)
        .await
        .map_err(|why| ApiError::from_engine_error(why, now))?;

    Ok(Json(Envelope::ok(now, EntryData::new(encoded))))
}
