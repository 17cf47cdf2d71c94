//! Live trip status (§4.5): fuses a trip's scheduled stop-times with
//! whatever real-time vehicle position and trip update the snapshot holds
//! for it, producing a single fused view of where the vehicle currently
//! is, how far off schedule it is running, and where it sits along the
//! trip's shape.

use chrono::{DateTime, NaiveDate, Utc};
use model::{
    block::BlockTripSummary,
    realtime::{RealtimeTripUpdate, RealtimeVehicle, ScheduleRelationship, VehicleStopStatus},
    shape::ShapePoint,
    stop::Stop,
    trip::{StopTime, Trip},
};
use schemars::JsonSchema;
use serde::Serialize;
use utility::id::Id;

use crate::{shape_geometry, stale};

/// The trip's phase of operation, independent of whether it is running
/// on time.
#[derive(Debug, Clone, Copy, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Scheduled,
    InProgress,
    Canceled,
}

/// Derived from the trip's `scheduleRelationship` when real-time data is
/// present; `"default"` when the engine has nothing but the static
/// schedule to go on.
#[derive(Debug, Clone, Copy, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StatusLabel {
    Default,
    Scheduled,
    Canceled,
    Added,
    Duplicated,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TripStatus {
    pub active_trip_id: Id<Trip>,
    pub service_date: NaiveDate,
    /// Whether any real-time data was found for this trip/date at all.
    pub predicted: bool,
    /// `!predicted` — spelled out explicitly since callers key UI copy off
    /// either flag and shouldn't have to derive the complement themselves.
    pub scheduled: bool,
    pub vehicle_id: Option<String>,
    pub last_location_update_time: Option<DateTime<Utc>>,
    /// The vehicle's raw reported GPS fix, unprojected.
    pub last_known_location: Option<Location>,
    /// The fix refined by projecting onto the trip's shape, when a shape
    /// exists and the projection lands within 200m of the raw point.
    pub position: Option<Location>,
    /// Math-angle orientation (`(90 - bearing) mod 360`), converted from
    /// the vehicle's compass bearing.
    pub orientation_degrees: Option<f64>,
    /// `(value, hasData)` convention (spec.md §9 open question): `Some`
    /// only when a real-time update actually carries a deviation, never a
    /// bare `0` standing in for "no data".
    pub schedule_deviation_seconds: Option<i32>,
    pub closest_stop_id: Option<Id<Stop>>,
    pub closest_stop_time_offset_seconds: Option<i64>,
    pub next_stop_id: Option<Id<Stop>>,
    pub next_stop_time_offset_seconds: Option<i64>,
    pub distance_along_trip_meters: Option<f64>,
    pub scheduled_distance_along_trip_meters: Option<f64>,
    pub total_distance_along_trip_meters: Option<f64>,
    pub block_trip_sequence: Option<usize>,
    pub occupancy_capacity: i32,
    pub occupancy_count: i32,
    pub status: StatusLabel,
    pub phase: Phase,
    /// Combined ids of service alerts matched against (trip, route, agency)
    /// (§4.5 step 1). Filled in by the engine layer after `compute` returns,
    /// since matching needs the snapshot's alert list and the route's
    /// owning agency, neither of which this module otherwise touches.
    #[serde(default)]
    pub situation_ids: Vec<String>,
}

/// Converts a 0-360 compass bearing (0 = north, clockwise) to a math
/// angle (0 = east, counterclockwise), the convention map UIs rotate
/// vehicle icons by.
fn compass_to_math_angle(bearing: f64) -> f64 {
    ((90.0 - bearing) % 360.0 + 360.0) % 360.0
}

fn status_and_phase(relationship: ScheduleRelationship) -> (StatusLabel, Phase) {
    match relationship {
        ScheduleRelationship::Scheduled => (StatusLabel::Scheduled, Phase::InProgress),
        ScheduleRelationship::Canceled => (StatusLabel::Canceled, Phase::Canceled),
        ScheduleRelationship::Added => (StatusLabel::Added, Phase::InProgress),
        ScheduleRelationship::Duplicated => (StatusLabel::Duplicated, Phase::InProgress),
    }
}

/// Picks the closest and next stop-time per §4.5 step 4's priority order,
/// given an already-sequence-sorted stop-time list and whatever real-time
/// positioning data is available. Returns `(closest_index, next_index)`.
fn resolve_closest_and_next(
    ordered: &[&StopTime],
    vehicle: Option<&RealtimeVehicle>,
    current_seconds_since_midnight: Option<i64>,
    schedule_deviation_seconds: Option<i32>,
) -> (Option<usize>, Option<usize>) {
    if let Some(vehicle) = vehicle {
        if let Some(stop_id) = vehicle.current_stop_id.as_ref() {
            if let Some(closest) = ordered.iter().position(|st| &st.stop_id == stop_id) {
                let next = if vehicle.current_status == Some(VehicleStopStatus::StoppedAt) {
                    closest + 1
                } else {
                    closest
                };
                return (Some(closest), ordered.get(next).map(|_| next).or(Some(closest)));
            }
        }
        if let Some(sequence) = vehicle.current_stop_sequence {
            if let Some(closest) = ordered.iter().position(|st| st.stop_sequence == sequence) {
                let next = if vehicle.current_status == Some(VehicleStopStatus::StoppedAt) {
                    closest + 1
                } else {
                    closest
                };
                return (Some(closest), ordered.get(next).map(|_| next).or(Some(closest)));
            }
        }
    }

    if let Some(current_seconds) = current_seconds_since_midnight {
        let deviation = schedule_deviation_seconds.unwrap_or(0) as i64;
        // walk stop-times until the predicted arrival passes current time;
        // the one just passed is closest, the current one is next.
        let mut closest = None;
        for (index, stop_time) in ordered.iter().enumerate() {
            let predicted_seconds = stop_time.arrival_time_nanos / 1_000_000_000 + deviation;
            if predicted_seconds > current_seconds {
                return (closest.or(Some(index)), Some(index));
            }
            closest = Some(index);
        }
        return (closest, closest);
    }

    if ordered.is_empty() {
        (None, None)
    } else {
        (Some(0), ordered.get(1).map(|_| 1).or(Some(0)))
    }
}

#[allow(clippy::too_many_arguments)]
pub fn compute(
    trip_id: &Id<Trip>,
    service_date: NaiveDate,
    stop_times: &[StopTime],
    shape_points: Option<&[ShapePoint]>,
    block_sequence: Option<&[BlockTripSummary]>,
    trip_update: Option<&RealtimeTripUpdate>,
    vehicle: Option<&RealtimeVehicle>,
    now: DateTime<Utc>,
    midnight_utc: DateTime<Utc>,
    stale_threshold: chrono::Duration,
) -> TripStatus {
    let mut ordered: Vec<&StopTime> = stop_times.iter().collect();
    ordered.sort_by_key(|stop_time| stop_time.stop_sequence);

    let last_location_update_time = vehicle.and_then(|v| v.timestamp);
    let is_stale = stale::is_stale(last_location_update_time, now, stale_threshold);
    let vehicle_fresh = vehicle.filter(|_| !is_stale);

    // step 3: trip-level delay takes precedence over the first per-stop
    // arrival delay, then the first departure delay.
    let schedule_deviation_seconds = trip_update.and_then(|update| {
        update.delay_seconds.or_else(|| {
            update
                .stop_time_updates
                .iter()
                .find_map(|stu| stu.arrival.as_ref().and_then(|e| e.delay_seconds()))
                .or_else(|| {
                    update
                        .stop_time_updates
                        .iter()
                        .find_map(|stu| stu.departure.as_ref().and_then(|e| e.delay_seconds()))
                })
        })
    });

    let predicted = vehicle_fresh.is_some() || trip_update.is_some();

    let current_seconds_since_midnight = Some((now - midnight_utc).num_seconds());
    let (closest_index, next_index) = resolve_closest_and_next(
        &ordered,
        vehicle_fresh,
        current_seconds_since_midnight,
        schedule_deviation_seconds,
    );

    let closest = closest_index.and_then(|i| ordered.get(i)).copied();
    let next = next_index.and_then(|i| ordered.get(i)).copied();

    let last_known_location = vehicle_fresh
        .and_then(|v| v.position)
        .map(|p| Location { latitude: p.latitude, longitude: p.longitude });

    let orientation_degrees = vehicle_fresh
        .and_then(|v| v.position)
        .and_then(|p| p.bearing)
        .map(compass_to_math_angle);

    // step 6: refine position via shape projection, accept only within 200m.
    let (position, distance_along_trip_meters, total_distance_along_trip_meters) =
        match (shape_points, last_known_location.as_ref()) {
            (Some(points), Some(raw)) if !points.is_empty() => {
                let cumulative = shape_geometry::cumulative_distances(points);
                let total = cumulative.last().copied().unwrap_or(0.0);

                let min_dist = closest
                    .and_then(|st| st.shape_dist_traveled_meters)
                    .unwrap_or(0.0);
                let max_dist = next
                    .and_then(|st| st.shape_dist_traveled_meters)
                    .unwrap_or(total);

                let projection = shape_geometry::project_in_range(
                    raw.latitude,
                    raw.longitude,
                    points,
                    &cumulative,
                    min_dist,
                    max_dist,
                );

                match projection {
                    Some(p) if p.offset_m <= 200.0 => (
                        Some(Location { latitude: p.latitude, longitude: p.longitude }),
                        Some(p.distance_along_shape_m),
                        Some(total),
                    ),
                    _ => (Some(raw.clone()), None, Some(total)),
                }
            }
            _ => (last_known_location.clone(), None, None),
        };

    // step 6 cont'd: scheduled distance-along-trip via interpolation
    // between the stop-time pair bracketing the effective scheduled time,
    // only meaningful when the vehicle is actually off schedule.
    let scheduled_distance_along_trip_meters = match schedule_deviation_seconds {
        Some(deviation) if deviation != 0 => {
            current_seconds_since_midnight.and_then(|current_seconds| {
                let effective_scheduled_seconds = current_seconds - deviation as i64;
                interpolate_scheduled_distance(&ordered, effective_scheduled_seconds)
            })
        }
        _ => None,
    };

    let block_trip_sequence = block_sequence.and_then(|sequence| {
        sequence
            .iter()
            .find(|summary| summary.trip_id.raw() == trip_id.raw())
            .map(|summary| summary.block_sequence)
    });

    let (status, phase) = match vehicle_fresh {
        Some(v) => status_and_phase(v.schedule_relationship),
        None => (StatusLabel::Default, Phase::Scheduled),
    };

    TripStatus {
        active_trip_id: trip_id.clone(),
        service_date,
        predicted,
        scheduled: !predicted,
        vehicle_id: trip_update.and_then(|u| u.vehicle_id.as_ref()).map(|id| id.raw()),
        last_location_update_time,
        last_known_location,
        position,
        orientation_degrees,
        schedule_deviation_seconds,
        closest_stop_id: closest.map(|st| st.stop_id.clone()),
        closest_stop_time_offset_seconds: closest.map(|st| st.arrival_time_nanos / 1_000_000_000),
        next_stop_id: next.map(|st| st.stop_id.clone()),
        next_stop_time_offset_seconds: next.map(|st| st.arrival_time_nanos / 1_000_000_000),
        distance_along_trip_meters,
        scheduled_distance_along_trip_meters,
        total_distance_along_trip_meters,
        block_trip_sequence,
        occupancy_capacity: -1,
        occupancy_count: -1,
        status,
        phase,
        situation_ids: Vec::new(),
    }
}

/// Linearly interpolates shape-distance between the stop-time pair whose
/// scheduled arrivals bracket `effective_scheduled_seconds`.
fn interpolate_scheduled_distance(ordered: &[&StopTime], effective_scheduled_seconds: i64) -> Option<f64> {
    let target_nanos = effective_scheduled_seconds * 1_000_000_000;
    for window in ordered.windows(2) {
        let (a, b) = (window[0], window[1]);
        if target_nanos >= a.arrival_time_nanos && target_nanos <= b.arrival_time_nanos {
            let (da, db) = (a.shape_dist_traveled_meters?, b.shape_dist_traveled_meters?);
            let span = b.arrival_time_nanos - a.arrival_time_nanos;
            if span == 0 {
                return Some(da);
            }
            let ratio = (target_nanos - a.arrival_time_nanos) as f64 / span as f64;
            return Some(da + ratio * (db - da));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::trip::StopTimeAvailability;

    fn stop_time(sequence: i32, stop: &str) -> StopTime {
        StopTime {
            trip_id: Id::new("t1".to_owned()),
            stop_sequence: sequence,
            stop_id: Id::new(stop.to_owned()),
            arrival_time_nanos: sequence as i64 * 60_000_000_000,
            departure_time_nanos: sequence as i64 * 60_000_000_000,
            stop_headsign: None,
            pickup_type: StopTimeAvailability::RegularlyScheduled,
            drop_off_type: StopTimeAvailability::RegularlyScheduled,
            shape_dist_traveled_meters: None,
        }
    }

    fn midnight() -> DateTime<Utc> {
        chrono::TimeZone::with_ymd_and_hms(&Utc, 2026, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn without_realtime_data_is_unpredicted_and_default_status() {
        let stops = vec![stop_time(1, "a"), stop_time(2, "b")];
        let status = compute(
            &Id::new("t1".to_owned()),
            chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            &stops,
            None,
            None,
            None,
            None,
            midnight(),
            midnight(),
            chrono::Duration::seconds(300),
        );
        assert!(!status.predicted);
        assert!(status.scheduled);
        assert_eq!(status.status, StatusLabel::Default);
        assert_eq!(status.phase, Phase::Scheduled);
        assert_eq!(status.closest_stop_id.unwrap().raw(), "a");
        assert_eq!(status.next_stop_id.unwrap().raw(), "b");
    }

    #[test]
    fn vehicle_position_pins_closest_stop_via_sequence() {
        let stops = vec![stop_time(1, "a"), stop_time(2, "b"), stop_time(3, "c")];
        let now = midnight() + chrono::Duration::minutes(2);
        let vehicle = RealtimeVehicle {
            trip_id: None,
            route_id: None,
            position: None,
            timestamp: Some(now),
            current_stop_sequence: Some(2),
            current_stop_id: None,
            current_status: Some(VehicleStopStatus::StoppedAt),
            schedule_relationship: ScheduleRelationship::Scheduled,
            occupancy_status: None,
        };
        let status = compute(
            &Id::new("t1".to_owned()),
            chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            &stops,
            None,
            None,
            None,
            Some(&vehicle),
            now,
            midnight(),
            chrono::Duration::seconds(300),
        );
        assert!(status.predicted);
        assert_eq!(status.closest_stop_id.unwrap().raw(), "b");
        assert_eq!(status.next_stop_id.unwrap().raw(), "c");
        assert_eq!(status.status, StatusLabel::Scheduled);
        assert_eq!(status.phase, Phase::InProgress);
    }

    #[test]
    fn stale_vehicle_falls_back_to_default_status() {
        let stops = vec![stop_time(1, "a"), stop_time(2, "b")];
        let now = midnight() + chrono::Duration::minutes(30);
        let stale_timestamp = now - chrono::Duration::minutes(20);
        let vehicle = RealtimeVehicle {
            trip_id: None,
            route_id: None,
            position: None,
            timestamp: Some(stale_timestamp),
            current_stop_sequence: Some(1),
            current_stop_id: None,
            current_status: Some(VehicleStopStatus::StoppedAt),
            schedule_relationship: ScheduleRelationship::Scheduled,
            occupancy_status: None,
        };
        let status = compute(
            &Id::new("t1".to_owned()),
            chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            &stops,
            None,
            None,
            None,
            Some(&vehicle),
            now,
            midnight(),
            chrono::Duration::seconds(900),
        );
        assert!(!status.predicted);
        assert_eq!(status.status, StatusLabel::Default);
        assert_eq!(status.phase, Phase::Scheduled);
    }

    #[test]
    fn compass_bearing_converts_to_math_angle() {
        assert_eq!(compass_to_math_angle(0.0), 90.0);
        assert_eq!(compass_to_math_angle(90.0), 0.0);
        assert_eq!(compass_to_math_angle(180.0), 270.0);
    }

    #[test]
    fn trip_level_delay_overlays_as_schedule_deviation() {
        let stops = vec![stop_time(1, "a"), stop_time(2, "b")];
        let update = RealtimeTripUpdate {
            trip_id: Id::new("t1".to_owned()),
            vehicle_id: Some(Id::new("v1".to_owned())),
            delay_seconds: Some(120),
            stop_time_updates: vec![],
        };
        let status = compute(
            &Id::new("t1".to_owned()),
            chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            &stops,
            None,
            None,
            Some(&update),
            None,
            midnight(),
            midnight(),
            chrono::Duration::seconds(300),
        );
        assert_eq!(status.schedule_deviation_seconds, Some(120));
        assert!(status.predicted);
    }
}
