use axum::{extract::State, Json};
use serde::Serialize;

use crate::{
    envelope::{Envelope, EntryData},
    AppState,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentTime {
    time: i64,
    readable_time: String,
}

pub async fn current_time(State(state): State<AppState>) -> Json<Envelope<EntryData<CurrentTime>>> {
    let now = state.clock.now();
    let entry = CurrentTime {
        time: now.timestamp_millis(),
        readable_time: now.to_rfc3339(),
    };
    Json(Envelope::ok(now.timestamp_millis(), EntryData::new(entry)))
}
