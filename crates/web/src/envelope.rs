//! The `{code,text,version,currentTime,data}` response envelope every
//! `/api/where/*` endpoint wraps its payload in (§6).

use serde::Serialize;
use transit_engine::reference::ReferenceCollector;

use crate::view::{
    render_agency, render_route, render_situation, render_stop, render_trip, RenderedAgency,
    RenderedRoute, RenderedSituation, RenderedStop, RenderedTrip,
};

/// `version` is 1 for an unauthorized response, 2 for everything else —
/// carried over from the OBA-style convention §6 is modeled on.
pub const VERSION_UNAUTHORIZED: u8 = 1;
pub const VERSION_OK: u8 = 2;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T: Serialize> {
    pub code: u16,
    pub text: String,
    pub version: u8,
    pub current_time: i64,
    pub data: T,
}

impl<T: Serialize> Envelope<T> {
    pub fn new(code: u16, text: impl Into<String>, current_time_millis: i64, data: T) -> Self {
        Self {
            code,
            text: text.into(),
            version: VERSION_OK,
            current_time: current_time_millis,
            data,
        }
    }

    pub fn ok(current_time_millis: i64, data: T) -> Self {
        Self::new(200, "OK", current_time_millis, data)
    }
}

/// §4.10's reference collector, reshaped into the envelope's
/// `references:{agencies,routes,trips,stops,stopTimes,situations}` block.
/// `stopTimes` has no counterpart of its own in the engine: every response
/// entry that would need one (arrivals, schedules) already embeds its
/// stop-times directly, so this is always an empty list rather than a
/// second, redundant index of the same data.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct References {
    pub agencies: Vec<RenderedAgency>,
    pub routes: Vec<RenderedRoute>,
    pub trips: Vec<RenderedTrip>,
    pub stops: Vec<RenderedStop>,
    pub stop_times: Vec<serde_json::Value>,
    pub situations: Vec<RenderedSituation>,
}

impl From<ReferenceCollector> for References {
    fn from(collector: ReferenceCollector) -> Self {
        Self {
            agencies: collector.agencies.into_iter().map(render_agency).collect(),
            routes: collector.routes.into_iter().map(render_route).collect(),
            trips: collector
                .trips
                .into_iter()
                .map(|(agency_id, trip)| render_trip(trip, &agency_id.raw()))
                .collect(),
            stops: collector.stops.into_iter().map(render_stop).collect(),
            stop_times: Vec::new(),
            situations: collector
                .situations
                .into_iter()
                .map(|(agency_id, alert)| render_situation(alert, &agency_id.raw()))
                .collect(),
        }
    }
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryData<E: Serialize> {
    pub entry: E,
    pub references: References,
    pub limit_exceeded: Option<bool>,
    pub out_of_range: Option<bool>,
}

impl<E: Serialize> EntryData<E> {
    pub fn new(entry: E) -> Self {
        Self {
            entry,
            references: References::default(),
            limit_exceeded: None,
            out_of_range: None,
        }
    }

    pub fn with_references(mut self, references: References) -> Self {
        self.references = references;
        self
    }
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListData<E: Serialize> {
    pub list: Vec<E>,
    pub references: References,
    pub limit_exceeded: Option<bool>,
    pub out_of_range: Option<bool>,
}

impl<E: Serialize> ListData<E> {
    pub fn new(list: Vec<E>) -> Self {
        Self {
            list,
            references: References::default(),
            limit_exceeded: None,
            out_of_range: None,
        }
    }

    pub fn with_references(mut self, references: References) -> Self {
        self.references = references;
        self
    }

    pub fn with_limit_exceeded(mut self, limit_exceeded: bool) -> Self {
        self.limit_exceeded = Some(limit_exceeded);
        self
    }
}
