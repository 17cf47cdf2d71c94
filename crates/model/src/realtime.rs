//! The decoded, in-process shape of real-time feed messages. Fetching and
//! protobuf-decoding the upstream GTFS-realtime feed is out of scope here;
//! these types are what a decoder is assumed to hand the engine.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::id::{HasId, Id};

use crate::{agency::Agency, route::Route, stop::Stop, trip::Trip};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum VehicleStopStatus {
    StoppedAt,
    InTransitTo,
    IncomingAt,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum ScheduleRelationship {
    Scheduled,
    Canceled,
    Added,
    Duplicated,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum OccupancyStatus {
    Empty,
    ManySeatsAvailable,
    FewSeatsAvailable,
    StandingRoomOnly,
    CrushedStandingRoomOnly,
    Full,
    NotAcceptingPassengers,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct VehiclePosition {
    pub latitude: f64,
    pub longitude: f64,
    /// Compass bearing in degrees, 0 = true north, clockwise.
    pub bearing: Option<f64>,
}

/// A vehicle's last reported position. Overwritten wholesale on each
/// real-time poll; absent from the snapshot after the feed evicts it.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeVehicle {
    pub trip_id: Option<Id<Trip>>,
    pub route_id: Option<Id<Route>>,
    pub position: Option<VehiclePosition>,
    pub timestamp: Option<DateTime<Utc>>,
    pub current_stop_sequence: Option<i32>,
    pub current_stop_id: Option<Id<Stop>>,
    pub current_status: Option<VehicleStopStatus>,
    pub schedule_relationship: ScheduleRelationship,
    pub occupancy_status: Option<OccupancyStatus>,
}

pub struct Vehicle;

impl HasId for Vehicle {
    type IdType = String;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum StopTimeEventUpdate {
    AbsoluteTime { time: DateTime<Utc> },
    Delay { delay_seconds: i32 },
    Both { time: DateTime<Utc>, delay_seconds: i32 },
}

impl StopTimeEventUpdate {
    pub fn absolute_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::AbsoluteTime { time } | Self::Both { time, .. } => Some(*time),
            Self::Delay { .. } => None,
        }
    }

    pub fn delay_seconds(&self) -> Option<i32> {
        match self {
            Self::Delay { delay_seconds } | Self::Both { delay_seconds, .. } => {
                Some(*delay_seconds)
            }
            Self::AbsoluteTime { .. } => None,
        }
    }
}

/// Either `stopId` or `stopSequence` identifies the affected stop-time.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StopTimeUpdate {
    pub stop_sequence: Option<i32>,
    pub stop_id: Option<Id<Stop>>,
    pub arrival: Option<StopTimeEventUpdate>,
    pub departure: Option<StopTimeEventUpdate>,
    pub schedule_relationship: ScheduleRelationship,
}

/// Trip-level delay plus an ordered list of per-stop overrides.
/// Overwritten wholesale on each real-time poll.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeTripUpdate {
    pub trip_id: Id<Trip>,
    pub vehicle_id: Option<Id<Vehicle>>,
    pub delay_seconds: Option<i32>,
    pub stop_time_updates: Vec<StopTimeUpdate>,
}

impl RealtimeTripUpdate {
    pub fn stop_time_update_for_sequence(
        &self,
        stop_sequence: i32,
    ) -> Option<&StopTimeUpdate> {
        self.stop_time_updates
            .iter()
            .find(|update| update.stop_sequence == Some(stop_sequence))
    }

    pub fn stop_time_update_for_stop(&self, stop_id: &Id<Stop>) -> Option<&StopTimeUpdate> {
        self.stop_time_updates
            .iter()
            .find(|update| update.stop_id.as_ref() == Some(stop_id))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum AlertCause {
    UnknownCause,
    OtherCause,
    TechnicalProblem,
    Strike,
    Demonstration,
    Accident,
    Holiday,
    Weather,
    Maintenance,
    Construction,
    PoliceActivity,
    MedicalEmergency,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum AlertEffect {
    NoService,
    ReducedService,
    SignificantDelays,
    Detour,
    AdditionalService,
    ModifiedService,
    OtherEffect,
    UnknownEffect,
    StopMoved,
}

/// Selects the entities an alert informs: any of agency/route/trip/stop
/// may be set; the alert applies to an entity if any selector matches it.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InformedEntity {
    pub agency_id: Option<Id<Agency>>,
    pub route_id: Option<Id<Route>>,
    pub trip_id: Option<Id<Trip>>,
    pub stop_id: Option<Id<Stop>>,
}

impl InformedEntity {
    pub fn matches(
        &self,
        agency_id: &Id<Agency>,
        route_id: Option<&Id<Route>>,
        trip_id: Option<&Id<Trip>>,
    ) -> bool {
        self.agency_id.as_ref().is_some_and(|id| id == agency_id)
            || (self.route_id.is_some() && self.route_id.as_ref() == route_id)
            || (self.trip_id.is_some() && self.trip_id.as_ref() == trip_id)
    }
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivePeriod {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl ActivePeriod {
    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        let after_start = match self.start {
            Some(start) => time >= start,
            None => true,
        };
        let before_end = match self.end {
            Some(end) => time <= end,
            None => true,
        };
        after_start && before_end
    }
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAlert {
    pub informed_entities: Vec<InformedEntity>,
    pub active_periods: Vec<ActivePeriod>,
    pub cause: AlertCause,
    pub effect: AlertEffect,
    pub header_text: Option<String>,
    pub description_text: Option<String>,
}

impl HasId for ServiceAlert {
    type IdType = String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn informed_entity_matches_by_route() {
        let selector = InformedEntity {
            agency_id: None,
            route_id: Some(Id::new("re83".to_owned())),
            trip_id: None,
            stop_id: None,
        };
        let agency = Id::new("erixx".to_owned());
        assert!(selector.matches(&agency, Some(&Id::new("re83".to_owned())), None));
        assert!(!selector.matches(&agency, Some(&Id::new("re84".to_owned())), None));
    }

    #[test]
    fn stop_time_event_update_exposes_absolute_and_delay() {
        let delay_only = StopTimeEventUpdate::Delay { delay_seconds: 120 };
        assert_eq!(delay_only.delay_seconds(), Some(120));
        assert_eq!(delay_only.absolute_time(), None);
    }
}
