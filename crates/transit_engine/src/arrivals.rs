//! Arrivals-and-departures for a stop (§4.6): the engine's busiest query.
//! Scans a three-service-day window (yesterday/today/tomorrow in the
//! stop's owning agency's local time) so that a trip scheduled to depart
//! at `25:30` — 1:30 AM the next calendar day, in GTFS's past-midnight
//! convention — is still found when a rider queries shortly after
//! midnight on the day the trip is conceptually still "yesterday's last
//! run".

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use model::{
    agency::Agency, realtime::RealtimeTripUpdate, route::Route, stop::Stop, trip::{StopTime, Trip},
    WithId,
};
use tracing::warn;
use utility::id::Id;

use crate::{
    snapshot::Snapshot,
    store::{ScheduleStore, StoreResult},
    time::service_day_midnight_utc,
};

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, serde::Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArrivalAndDeparture {
    pub trip_id: Id<Trip>,
    pub route_id: Id<Route>,
    pub stop_id: Id<Stop>,
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
    /// `(value, hasData)` convention: `None` unless a real-time update
    /// actually reported a deviation for this stop-time.
    pub schedule_deviation_seconds: Option<i32>,
    pub predicted: bool,
    pub vehicle_id: Option<String>,
    /// Populated by the engine layer (§4.6 step 5) once a fresh vehicle is
    /// known for this trip; left `None` here since building it needs the
    /// trip's full stop-time list, shape, and block sequence, which this
    /// window query does not fetch for every candidate trip.
    pub trip_status: Option<crate::trip_status::TripStatus>,
}

pub struct ArrivalsWindow {
    pub query_time: DateTime<Utc>,
    pub minutes_before: i64,
    pub minutes_after: i64,
}

/// Computes the arrivals-and-departures list for `stop_id`. Skips
/// individual trip lookups that fail rather than failing the whole batch
/// (§7's partial-success preference for the arrivals engine); the window
/// query itself, if it fails, is surfaced to the caller.
pub async fn compute_for_stop(
    store: &dyn ScheduleStore,
    snapshot: &Snapshot,
    stop: &WithId<Stop>,
    agency_tz: Tz,
    window: &ArrivalsWindow,
) -> StoreResult<Vec<ArrivalAndDeparture>> {
    let mut results = Vec::new();

    // A shared stop may be served by routes owned by agencies other than
    // the stop's own (§4.6 step 5's multi-agency invariant); a trip's
    // service is only ever active under the *route's* owning agency's
    // calendar (`database::queries::service` scopes `calendars` by
    // `agency_id`, and `service_id` is only unique within one agency's
    // calendar), so the active-service check below resolves the agency
    // per trip via its route rather than assuming the stop's agency.
    // Both caches are keyed across the whole three-day scan since the same
    // route/agency recurs across candidate days.
    let mut route_agency_cache: HashMap<String, Id<Agency>> = HashMap::new();
    let mut active_service_cache: HashMap<(String, NaiveDate), Vec<Id<model::calendar::Service>>> =
        HashMap::new();

    for day_offset in [-1i64, 0, 1] {
        let candidate_date = (window.query_time.with_timezone(&agency_tz).date_naive())
            + Duration::days(day_offset);
        let Some(midnight_utc) = service_day_midnight_utc(agency_tz, candidate_date) else {
            continue;
        };

        let window_start_nanos = (window.query_time - Duration::minutes(window.minutes_before)
            - midnight_utc)
            .num_nanoseconds()
            .unwrap_or(i64::MIN);
        let window_end_nanos = (window.query_time + Duration::minutes(window.minutes_after)
            - midnight_utc)
            .num_nanoseconds()
            .unwrap_or(i64::MAX);

        let stop_times = store
            .stop_times_at_stop_in_window(&stop.id, window_start_nanos, window_end_nanos)
            .await?;

        for stop_time in stop_times {
            let trip = match store.get_trip(&stop_time.trip_id).await {
                Ok(Some(trip)) => trip,
                Ok(None) => {
                    warn!(trip_id = %stop_time.trip_id, "arrivals: trip referenced by stop-time not found");
                    continue;
                }
                Err(why) => {
                    warn!(trip_id = %stop_time.trip_id, error = %why, "arrivals: trip lookup failed, skipping");
                    continue;
                }
            };

            let route_agency_id = match route_agency_cache.get(&trip.content.route_id.raw()) {
                Some(agency_id) => agency_id.clone(),
                None => {
                    let Some(route) = store.get_route(&trip.content.route_id).await? else {
                        warn!(route_id = %trip.content.route_id, "arrivals: route referenced by trip not found");
                        continue;
                    };
                    let agency_id = route.content.agency_id.clone();
                    route_agency_cache.insert(trip.content.route_id.raw(), agency_id.clone());
                    agency_id
                }
            };

            let cache_key = (route_agency_id.raw(), candidate_date);
            if !active_service_cache.contains_key(&cache_key) {
                let ids = store.active_service_ids(&route_agency_id, candidate_date).await?;
                active_service_cache.insert(cache_key.clone(), ids);
            }
            let active_service_ids = active_service_cache.get(&cache_key).expect("just inserted");

            if !active_service_ids
                .iter()
                .any(|id| id.raw() == trip.content.service_id.raw())
            {
                continue;
            }

            results.push(build_entry(
                &stop_time,
                &trip,
                candidate_date,
                midnight_utc,
                snapshot.trip_update(&stop_time.trip_id, candidate_date),
            ));
        }
    }

    results.sort_by_key(|entry| entry.scheduled_departure_time);
    Ok(results)
}

fn build_entry(
    stop_time: &StopTime,
    trip: &WithId<Trip>,
    service_date: NaiveDate,
    midnight_utc: DateTime<Utc>,
    trip_update: Option<&RealtimeTripUpdate>,
) -> ArrivalAndDeparture {
    let scheduled_arrival_time =
        midnight_utc + Duration::nanoseconds(stop_time.arrival_time_nanos);
    let scheduled_departure_time =
        midnight_utc + Duration::nanoseconds(stop_time.departure_time_nanos);

    let stop_time_update = trip_update.and_then(|update| {
        update
            .stop_time_update_for_sequence(stop_time.stop_sequence)
            .or_else(|| update.stop_time_update_for_stop(&stop_time.stop_id))
    });

    let predicted_arrival_time = stop_time_update
        .and_then(|update| update.arrival.as_ref())
        .and_then(|arrival| {
            arrival
                .absolute_time()
                .or_else(|| arrival.delay_seconds().map(|delay| scheduled_arrival_time + Duration::seconds(delay as i64)))
        })
        .or_else(|| {
            trip_update
                .and_then(|update| update.delay_seconds)
                .map(|delay| scheduled_arrival_time + Duration::seconds(delay as i64))
        });

    let predicted_departure_time = stop_time_update
        .and_then(|update| update.departure.as_ref())
        .and_then(|departure| {
            departure
                .absolute_time()
                .or_else(|| departure.delay_seconds().map(|delay| scheduled_departure_time + Duration::seconds(delay as i64)))
        })
        .or_else(|| {
            trip_update
                .and_then(|update| update.delay_seconds)
                .map(|delay| scheduled_departure_time + Duration::seconds(delay as i64))
        });

    let schedule_deviation_seconds = predicted_departure_time
        .map(|predicted| (predicted - scheduled_departure_time).num_seconds() as i32);

    ArrivalAndDeparture {
        trip_id: trip.id.clone(),
        route_id: trip.content.route_id.clone(),
        stop_id: stop_time.stop_id.clone(),
        service_date,
        stop_sequence: stop_time.stop_sequence,
        scheduled_arrival_time,
        scheduled_departure_time,
        predicted_arrival_time,
        predicted_departure_time,
        schedule_deviation_seconds,
        predicted: trip_update.is_some(),
        vehicle_id: trip_update.and_then(|update| update.vehicle_id.as_ref()).map(|id| id.raw()),
        trip_status: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{
        agency::Agency,
        route::{ContinuousPolicy, RouteType},
        stop::{Coordinates, LocationType},
        trip::StopTimeAvailability,
    };
    use std::sync::Mutex;

    struct FakeStore {
        trips: Mutex<std::collections::HashMap<String, WithId<Trip>>>,
        routes: std::collections::HashMap<String, WithId<Route>>,
        stop_times: Vec<StopTime>,
        /// Keyed by agency id, honoring the same per-agency calendar
        /// scoping `database::queries::service` applies against Postgres —
        /// a service active for one agency must not leak into another's
        /// active set just because `active_service_ids` was called with a
        /// different agency id.
        active_service_ids: HashMap<String, Vec<Id<model::calendar::Service>>>,
    }

    #[async_trait::async_trait]
    impl ScheduleStore for FakeStore {
        async fn health_check(&self) -> StoreResult<()> {
            Ok(())
        }
        async fn get_agency(&self, _id: &Id<Agency>) -> StoreResult<Option<WithId<Agency>>> {
            Ok(None)
        }
        async fn get_route(&self, id: &Id<Route>) -> StoreResult<Option<WithId<Route>>> {
            Ok(self.routes.get(&id.raw()).cloned())
        }
        async fn get_stop(&self, _id: &Id<Stop>) -> StoreResult<Option<WithId<Stop>>> {
            Ok(None)
        }
        async fn get_trip(&self, id: &Id<Trip>) -> StoreResult<Option<WithId<Trip>>> {
            Ok(self.trips.lock().unwrap().get(&id.raw()).cloned())
        }
        async fn get_shape(&self, _id: &Id<model::shape::Shape>) -> StoreResult<Option<Vec<model::shape::ShapePoint>>> {
            Ok(None)
        }
        async fn get_routes(&self, _ids: &[Id<Route>]) -> StoreResult<Vec<WithId<Route>>> {
            Ok(vec![])
        }
        async fn get_stops(&self, _ids: &[Id<Stop>]) -> StoreResult<Vec<WithId<Stop>>> {
            Ok(vec![])
        }
        async fn get_trips(&self, _ids: &[Id<Trip>]) -> StoreResult<Vec<WithId<Trip>>> {
            Ok(vec![])
        }
        async fn get_agencies(&self, _ids: &[Id<Agency>]) -> StoreResult<Vec<WithId<Agency>>> {
            Ok(vec![])
        }
        async fn stops_for_agency(&self, _agency_id: &Id<Agency>) -> StoreResult<Vec<WithId<Stop>>> {
            Ok(vec![])
        }
        async fn routes_for_agency(&self, _agency_id: &Id<Agency>) -> StoreResult<Vec<WithId<Route>>> {
            Ok(vec![])
        }
        async fn stops_in_bounds(&self, _bounds: utility::geo::BoundingBox) -> StoreResult<Vec<WithId<Stop>>> {
            Ok(vec![])
        }
        async fn routes_serving_stop(&self, _stop_id: &Id<Stop>) -> StoreResult<Vec<WithId<Route>>> {
            Ok(vec![])
        }
        async fn stop_times_for_trip(&self, _trip_id: &Id<Trip>) -> StoreResult<Vec<StopTime>> {
            Ok(vec![])
        }
        async fn stop_times_at_stop_in_window(
            &self,
            _stop_id: &Id<Stop>,
            window_start_nanos: i64,
            window_end_nanos: i64,
        ) -> StoreResult<Vec<StopTime>> {
            Ok(self
                .stop_times
                .iter()
                .filter(|st| st.departure_time_nanos >= window_start_nanos && st.departure_time_nanos <= window_end_nanos)
                .cloned()
                .collect())
        }
        async fn calendar_for_service(&self, _service_id: &Id<model::calendar::Service>) -> StoreResult<Option<model::calendar::Calendar>> {
            Ok(None)
        }
        async fn calendar_exceptions_for_service(&self, _service_id: &Id<model::calendar::Service>) -> StoreResult<Vec<model::calendar::CalendarException>> {
            Ok(vec![])
        }
        async fn active_service_ids(&self, agency_id: &Id<Agency>, _date: NaiveDate) -> StoreResult<Vec<Id<model::calendar::Service>>> {
            Ok(self
                .active_service_ids
                .get(&agency_id.raw())
                .map(|ids| ids.iter().map(|id| Id::new(id.raw())).collect())
                .unwrap_or_default())
        }
        async fn trips_for_block(&self, _agency_id: &Id<Agency>, _block_id: &str) -> StoreResult<Vec<crate::store::BlockTripRow>> {
            Ok(vec![])
        }
        async fn search_routes(&self, _sanitized_query: &str, _limit: usize) -> StoreResult<Vec<WithId<Route>>> {
            Ok(vec![])
        }
        async fn search_stops(&self, _sanitized_query: &str, _limit: usize) -> StoreResult<Vec<WithId<Stop>>> {
            Ok(vec![])
        }
    }

    fn route(agency_id: &str) -> Route {
        Route {
            agency_id: Id::new(agency_id.to_owned()),
            short_name: Some("RE83".to_owned()),
            long_name: None,
            description: None,
            kind: RouteType::Rail,
            url: None,
            color: None,
            text_color: None,
            continuous_pickup: Some(ContinuousPolicy::NoneAvailable),
            continuous_drop_off: Some(ContinuousPolicy::NoneAvailable),
        }
    }

    fn stop(agency_id: &str) -> WithId<Stop> {
        WithId::new(
            Id::new("kiel-hbf".to_owned()),
            Stop {
                agency_id: Id::new(agency_id.to_owned()),
                code: None,
                name: Some("Kiel Hbf".to_owned()),
                location: Coordinates::new(54.31, 10.13).unwrap(),
                location_type: LocationType::Stop,
                wheelchair_boarding: None,
                direction: None,
                parent_station: None,
            },
        )
    }

    fn stop_time(trip_id: &str, sequence: i32, departure_nanos: i64) -> StopTime {
        StopTime {
            trip_id: Id::new(trip_id.to_owned()),
            stop_sequence: sequence,
            stop_id: Id::new("kiel-hbf".to_owned()),
            arrival_time_nanos: departure_nanos,
            departure_time_nanos: departure_nanos,
            stop_headsign: None,
            pickup_type: StopTimeAvailability::RegularlyScheduled,
            drop_off_type: StopTimeAvailability::RegularlyScheduled,
            shape_dist_traveled_meters: None,
        }
    }

    #[tokio::test]
    async fn finds_arrivals_within_window_and_sorts_by_departure() {
        let mut trips = std::collections::HashMap::new();
        trips.insert(
            "t1".to_owned(),
            WithId::new(Id::new("t1".to_owned()), model::trip::Trip {
                route_id: Id::new("re83".to_owned()),
                service_id: Id::new("svc".to_owned()),
                headsign: None,
                short_name: None,
                direction_id: None,
                block_id: None,
                shape_id: None,
                wheelchair_accessible: None,
                bikes_allowed: None,
            }),
        );
        let mut routes = HashMap::new();
        routes.insert(
            "re83".to_owned(),
            WithId::new(Id::new("re83".to_owned()), route("erixx")),
        );

        let tz: Tz = "Europe/Berlin".parse().unwrap();
        let stop = stop("erixx");
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 10, 0, 0).unwrap();
        let midnight = service_day_midnight_utc(tz, now.with_timezone(&tz).date_naive()).unwrap();
        let departure_nanos = (now - midnight).num_nanoseconds().unwrap();

        let mut active_service_ids = HashMap::new();
        active_service_ids.insert("erixx".to_owned(), vec![Id::new("svc".to_owned())]);

        let store = FakeStore {
            trips: Mutex::new(trips),
            routes,
            stop_times: vec![stop_time("t1", 1, departure_nanos)],
            active_service_ids,
        };
        let snapshot = Snapshot::default();
        let window = ArrivalsWindow {
            query_time: now,
            minutes_before: 5,
            minutes_after: 35,
        };

        let results = compute_for_stop(&store, &snapshot, &stop, tz, &window).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].trip_id.raw(), "t1");
    }
}
