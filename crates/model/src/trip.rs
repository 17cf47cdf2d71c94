use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::{id::{HasId, Id}, serde::NanosSinceMidnight};

use crate::{calendar::Service, route::Route, shape::Shape, stop::Stop};

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub route_id: Id<Route>,
    pub service_id: Id<Service>,
    pub headsign: Option<String>,
    pub short_name: Option<String>,
    pub direction_id: Option<bool>,
    pub block_id: Option<String>,
    pub shape_id: Option<Id<Shape>>,
    pub wheelchair_accessible: Option<bool>,
    pub bikes_allowed: Option<bool>,
}

impl HasId for Trip {
    type IdType = String;
}

/// Pickup/drop-off availability for an individual stop-time, distinct from
/// a route's continuous policy (GTFS `pickup_type`/`drop_off_type`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum StopTimeAvailability {
    RegularlyScheduled,
    NoneAvailable,
    PhoneAgency,
    CoordinateWithDriver,
}

/// `(tripId, stopSequence)` is unique. `arrivalTimeNanos`/
/// `departureTimeNanos` are nanoseconds since service-day midnight and may
/// exceed one day's worth of nanoseconds for trips crossing midnight.
/// Invariant: `stopSequence` is monotonically non-decreasing within a trip
/// and `arrivalTimeNanos <= departureTimeNanos`.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StopTime {
    pub trip_id: Id<Trip>,
    pub stop_sequence: i32,
    pub stop_id: Id<Stop>,
    pub arrival_time_nanos: NanosSinceMidnight,
    pub departure_time_nanos: NanosSinceMidnight,
    pub stop_headsign: Option<String>,
    pub pickup_type: StopTimeAvailability,
    pub drop_off_type: StopTimeAvailability,
    pub shape_dist_traveled_meters: Option<f64>,
}

impl StopTime {
    /// True iff `self.stop_sequence` and `other.stop_sequence` are ordered
    /// consistently with `self` preceding `other` and the arrival/departure
    /// invariant holds for both.
    pub fn is_valid(&self) -> bool {
        self.arrival_time_nanos <= self.departure_time_nanos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop_time(sequence: i32, arrival: i64, departure: i64) -> StopTime {
        StopTime {
            trip_id: Id::new("t1".to_owned()),
            stop_sequence: sequence,
            stop_id: Id::new("s1".to_owned()),
            arrival_time_nanos: arrival,
            departure_time_nanos: departure,
            stop_headsign: None,
            pickup_type: StopTimeAvailability::RegularlyScheduled,
            drop_off_type: StopTimeAvailability::RegularlyScheduled,
            shape_dist_traveled_meters: None,
        }
    }

    #[test]
    fn arrival_must_not_exceed_departure() {
        assert!(stop_time(1, 0, 60_000_000_000).is_valid());
        assert!(!stop_time(1, 60_000_000_000, 0).is_valid());
    }

    #[test]
    fn stop_sequence_ordering_within_trip() {
        let stops = vec![stop_time(1, 0, 0), stop_time(2, 60, 60), stop_time(2, 120, 120)];
        let sorted = stops.windows(2).all(|w| w[0].stop_sequence <= w[1].stop_sequence);
        assert!(sorted);
    }
}
