//! Renders engine value types into the wire shapes the envelope carries.
//! The engine's own types (§4) stay internally typed (`Id<Route>`,
//! `Id<Stop>`, ...) since that's what every lookup and join needs; turning
//! those into the externally-visible `"{agencyId}_{rawId}"` combined id
//! (§3/§6/§8) is this layer's job, the same way the teacher's `hateoas`
//! module is the seam that turns a bare model value into a response body.

use chrono::{DateTime, NaiveDate, Utc};
use model::{
    agency::Agency, block::BlockTripSummary, realtime::ServiceAlert, route::Route,
    stop::Stop, trip::{StopTime, Trip}, WithDistance, WithId,
};
use serde::Serialize;
use transit_engine::{
    arrivals::ArrivalAndDeparture,
    schedule::{RouteTripSchedule, StopRouteSchedule},
    trip_status::TripStatus,
};
use utility::composite_id;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedAgency {
    pub id: String,
    #[serde(flatten)]
    pub agency: Agency,
}

pub fn render_agency(agency: WithId<Agency>) -> RenderedAgency {
    RenderedAgency {
        id: agency.id.raw(),
        agency: agency.content,
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedRoute {
    pub id: String,
    #[serde(flatten)]
    pub route: Route,
}

pub fn render_route(route: WithId<Route>) -> RenderedRoute {
    let id = composite_id::render(&route.content.agency_id.raw(), &route.id.raw());
    RenderedRoute {
        id,
        route: route.content,
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedStop {
    pub id: String,
    #[serde(flatten)]
    pub stop: Stop,
}

pub fn render_stop(stop: WithId<Stop>) -> RenderedStop {
    let id = composite_id::render(&stop.content.agency_id.raw(), &stop.id.raw());
    RenderedStop { id, stop: stop.content }
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedStopWithDistance {
    pub id: String,
    pub distance_meters: f64,
    #[serde(flatten)]
    pub stop: Stop,
}

pub fn render_stop_with_distance(stop: WithDistance<WithId<Stop>>) -> RenderedStopWithDistance {
    let id = composite_id::render(&stop.content.content.agency_id.raw(), &stop.content.id.raw());
    RenderedStopWithDistance {
        id,
        distance_meters: stop.distance_meters,
        stop: stop.content.content,
    }
}

/// A trip has no agency field of its own; `owning_agency_id` is always the
/// id of the route it belongs to (§4.10's multi-agency invariant).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedTrip {
    pub id: String,
    #[serde(flatten)]
    pub trip: Trip,
}

pub fn render_trip(trip: WithId<Trip>, owning_agency_id: &str) -> RenderedTrip {
    let id = composite_id::render(owning_agency_id, &trip.id.raw());
    RenderedTrip { id, trip: trip.content }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedSituation {
    pub id: String,
    #[serde(flatten)]
    pub alert: ServiceAlert,
}

pub fn render_situation(alert: WithId<ServiceAlert>, owning_agency_id: &str) -> RenderedSituation {
    let id = composite_id::render(owning_agency_id, &alert.id.raw());
    RenderedSituation { id, alert: alert.content }
}

/// A stop-time rendered for a particular service date: nanoseconds since
/// midnight converted to the epoch-ms convention every other timestamp in
/// the envelope uses (§4.7).
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedStopTime {
    pub stop_id: String,
    pub stop_sequence: i32,
    #[serde(with = "utility::serde::epoch_millis")]
    pub arrival_time: DateTime<Utc>,
    #[serde(with = "utility::serde::epoch_millis")]
    pub departure_time: DateTime<Utc>,
    pub stop_headsign: Option<String>,
}

pub fn render_stop_time(stop_time: &StopTime, midnight_utc: DateTime<Utc>, stop_owning_agency_id: &str) -> RenderedStopTime {
    RenderedStopTime {
        stop_id: composite_id::render(stop_owning_agency_id, &stop_time.stop_id.raw()),
        stop_sequence: stop_time.stop_sequence,
        arrival_time: transit_engine::time::instant_from_nanos_since_midnight(midnight_utc, stop_time.arrival_time_nanos),
        departure_time: transit_engine::time::instant_from_nanos_since_midnight(midnight_utc, stop_time.departure_time_nanos),
        stop_headsign: stop_time.stop_headsign.clone(),
    }
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedTripStatus {
    pub active_trip_id: String,
    pub service_date: NaiveDate,
    pub predicted: bool,
    pub scheduled: bool,
    pub vehicle_id: Option<String>,
    #[serde(with = "utility::serde::epoch_millis::option")]
    pub last_location_update_time: Option<DateTime<Utc>>,
    pub last_known_location: Option<transit_engine::trip_status::Location>,
    pub position: Option<transit_engine::trip_status::Location>,
    pub orientation_degrees: Option<f64>,
    pub schedule_deviation_seconds: Option<i32>,
    pub closest_stop_id: Option<String>,
    pub closest_stop_time_offset_seconds: Option<i64>,
    pub next_stop_id: Option<String>,
    pub next_stop_time_offset_seconds: Option<i64>,
    pub distance_along_trip_meters: Option<f64>,
    pub scheduled_distance_along_trip_meters: Option<f64>,
    pub total_distance_along_trip_meters: Option<f64>,
    pub block_trip_sequence: Option<usize>,
    pub occupancy_capacity: i32,
    pub occupancy_count: i32,
    pub status: transit_engine::trip_status::StatusLabel,
    pub phase: transit_engine::trip_status::Phase,
    pub situation_ids: Vec<String>,
}

/// Every id a `TripStatus` carries belongs to the same trip/route, so one
/// owning agency id covers all of them.
pub fn render_trip_status(status: TripStatus, owning_agency_id: &str) -> RenderedTripStatus {
    RenderedTripStatus {
        active_trip_id: composite_id::render(owning_agency_id, &status.active_trip_id.raw()),
        service_date: status.service_date,
        predicted: status.predicted,
        scheduled: status.scheduled,
        vehicle_id: status.vehicle_id.map(|id| composite_id::render(owning_agency_id, &id)),
        last_location_update_time: status.last_location_update_time,
        last_known_location: status.last_known_location,
        position: status.position,
        orientation_degrees: status.orientation_degrees,
        schedule_deviation_seconds: status.schedule_deviation_seconds,
        closest_stop_id: status.closest_stop_id.map(|id| composite_id::render(owning_agency_id, &id.raw())),
        closest_stop_time_offset_seconds: status.closest_stop_time_offset_seconds,
        next_stop_id: status.next_stop_id.map(|id| composite_id::render(owning_agency_id, &id.raw())),
        next_stop_time_offset_seconds: status.next_stop_time_offset_seconds,
        distance_along_trip_meters: status.distance_along_trip_meters,
        scheduled_distance_along_trip_meters: status.scheduled_distance_along_trip_meters,
        total_distance_along_trip_meters: status.total_distance_along_trip_meters,
        block_trip_sequence: status.block_trip_sequence,
        occupancy_capacity: status.occupancy_capacity,
        occupancy_count: status.occupancy_count,
        status: status.status,
        phase: status.phase,
        situation_ids: status.situation_ids,
    }
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedArrival {
    pub trip_id: String,
    pub route_id: String,
    pub stop_id: String,
    pub service_date: NaiveDate,
    pub stop_sequence: i32,
    #[serde(with = "utility::serde::epoch_millis")]
    pub scheduled_arrival_time: DateTime<Utc>,
    #[serde(with = "utility::serde::epoch_millis")]
    pub scheduled_departure_time: DateTime<Utc>,
    #[serde(with = "utility::serde::epoch_millis::option")]
    pub predicted_arrival_time: Option<DateTime<Utc>>,
    #[serde(with = "utility::serde::epoch_millis::option")]
    pub predicted_departure_time: Option<DateTime<Utc>>,
    pub schedule_deviation_seconds: Option<i32>,
    pub predicted: bool,
    pub vehicle_id: Option<String>,
    pub trip_status: Option<RenderedTripStatus>,
}

/// `route_owning_agency_id` is the route's own agency — the multi-agency
/// invariant (§4.6 step 5) this whole render pass exists to uphold.
pub fn render_arrival(entry: ArrivalAndDeparture, stop_owning_agency_id: &str, route_owning_agency_id: &str) -> RenderedArrival {
    RenderedArrival {
        trip_id: composite_id::render(route_owning_agency_id, &entry.trip_id.raw()),
        route_id: composite_id::render(route_owning_agency_id, &entry.route_id.raw()),
        stop_id: composite_id::render(stop_owning_agency_id, &entry.stop_id.raw()),
        service_date: entry.service_date,
        stop_sequence: entry.stop_sequence,
        scheduled_arrival_time: entry.scheduled_arrival_time,
        scheduled_departure_time: entry.scheduled_departure_time,
        predicted_arrival_time: entry.predicted_arrival_time,
        predicted_departure_time: entry.predicted_departure_time,
        schedule_deviation_seconds: entry.schedule_deviation_seconds,
        predicted: entry.predicted,
        vehicle_id: entry.vehicle_id.map(|id| composite_id::render(route_owning_agency_id, &id)),
        trip_status: entry.trip_status.map(|status| render_trip_status(status, route_owning_agency_id)),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedStopRouteSchedule {
    pub route_id: String,
    pub stop_times: Vec<RenderedStopTime>,
}

pub fn render_stop_route_schedule(
    schedule: StopRouteSchedule,
    midnight_utc: DateTime<Utc>,
    agency_id: &str,
) -> RenderedStopRouteSchedule {
    RenderedStopRouteSchedule {
        route_id: composite_id::render(agency_id, &schedule.route_id.raw()),
        stop_times: schedule
            .stop_times
            .iter()
            .map(|stop_time| render_stop_time(stop_time, midnight_utc, agency_id))
            .collect(),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedRouteTripSchedule {
    pub trip_id: String,
    pub stop_times: Vec<RenderedStopTime>,
}

pub fn render_route_trip_schedule(
    schedule: RouteTripSchedule,
    midnight_utc: DateTime<Utc>,
    agency_id: &str,
) -> RenderedRouteTripSchedule {
    RenderedRouteTripSchedule {
        trip_id: composite_id::render(agency_id, &schedule.trip_id.raw()),
        stop_times: schedule
            .stop_times
            .iter()
            .map(|stop_time| render_stop_time(stop_time, midnight_utc, agency_id))
            .collect(),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedBlockTrip {
    pub trip_id: String,
    pub block_sequence: usize,
    pub accumulated_stop_time_count: usize,
}

pub fn render_block_trip(summary: BlockTripSummary, agency_id: &str) -> RenderedBlockTrip {
    RenderedBlockTrip {
        trip_id: composite_id::render(agency_id, &summary.trip_id.raw()),
        block_sequence: summary.block_sequence,
        accumulated_stop_time_count: summary.accumulated_stop_time_count,
    }
}
