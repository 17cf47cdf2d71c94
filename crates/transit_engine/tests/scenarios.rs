//! Engine-level end-to-end scenarios (spec.md §8), driven through
//! `Engine<FakeStore>` rather than any single module in isolation — the
//! multi-agency stop and midnight-window cases specifically need an agency,
//! route, stop, and trip wired together, which no single module's unit
//! tests exercise on their own.

use std::{collections::HashMap, sync::Mutex};

use chrono::{NaiveDate, TimeZone, Utc};
use model::{
    agency::Agency,
    calendar::{Calendar, CalendarException, Service},
    route::{ContinuousPolicy, Route, RouteType},
    stop::{Coordinates, LocationType, Stop},
    trip::{StopTime, StopTimeAvailability, Trip},
    WithId,
};
use transit_engine::{
    engine::{Engine, EngineConfig},
    rate_limit::{RateLimiter, RateLimiterConfig},
    snapshot::SnapshotHandle,
    store::{BlockTripRow, ScheduleStore, StoreResult},
};
use utility::{geo::BoundingBox, id::Id};

/// An in-memory `ScheduleStore` built entirely from fixtures assembled per
/// test, standing in for the Postgres-backed `database::PgDatabase` the way
/// `arrivals::tests::FakeStore` already does at the module level — this one
/// carries agencies/routes/stops too, so it can stand in under a whole
/// `Engine`, not just the window query.
#[derive(Default)]
struct FakeStore {
    agencies: HashMap<String, WithId<Agency>>,
    routes: HashMap<String, WithId<Route>>,
    stops: HashMap<String, WithId<Stop>>,
    trips: Mutex<HashMap<String, WithId<Trip>>>,
    stop_times: Vec<StopTime>,
    /// Service ids considered active, keyed by `(agency_id, date)` — mirrors
    /// `database::queries::service`'s `calendars WHERE agency_id = $1`
    /// scoping, so a service registered for one agency is invisible to a
    /// lookup made with a different agency id even on the same date.
    active_service_ids: HashMap<(String, NaiveDate), Vec<String>>,
}

#[async_trait::async_trait]
impl ScheduleStore for FakeStore {
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
    async fn get_agency(&self, id: &Id<Agency>) -> StoreResult<Option<WithId<Agency>>> {
        Ok(self.agencies.get(&id.raw()).cloned())
    }
    async fn get_route(&self, id: &Id<Route>) -> StoreResult<Option<WithId<Route>>> {
        Ok(self.routes.get(&id.raw()).cloned())
    }
    async fn get_stop(&self, id: &Id<Stop>) -> StoreResult<Option<WithId<Stop>>> {
        Ok(self.stops.get(&id.raw()).cloned())
    }
    async fn get_trip(&self, id: &Id<Trip>) -> StoreResult<Option<WithId<Trip>>> {
        Ok(self.trips.lock().unwrap().get(&id.raw()).cloned())
    }
    async fn get_shape(&self, _id: &Id<model::shape::Shape>) -> StoreResult<Option<Vec<model::shape::ShapePoint>>> {
        Ok(None)
    }
    async fn get_routes(&self, ids: &[Id<Route>]) -> StoreResult<Vec<WithId<Route>>> {
        Ok(ids.iter().filter_map(|id| self.routes.get(&id.raw()).cloned()).collect())
    }
    async fn get_stops(&self, ids: &[Id<Stop>]) -> StoreResult<Vec<WithId<Stop>>> {
        Ok(ids.iter().filter_map(|id| self.stops.get(&id.raw()).cloned()).collect())
    }
    async fn get_trips(&self, ids: &[Id<Trip>]) -> StoreResult<Vec<WithId<Trip>>> {
        let trips = self.trips.lock().unwrap();
        Ok(ids.iter().filter_map(|id| trips.get(&id.raw()).cloned()).collect())
    }
    async fn get_agencies(&self, ids: &[Id<Agency>]) -> StoreResult<Vec<WithId<Agency>>> {
        Ok(ids.iter().filter_map(|id| self.agencies.get(&id.raw()).cloned()).collect())
    }
    async fn stops_for_agency(&self, agency_id: &Id<Agency>) -> StoreResult<Vec<WithId<Stop>>> {
        Ok(self
            .stops
            .values()
            .filter(|stop| stop.content.agency_id.raw() == agency_id.raw())
            .cloned()
            .collect())
    }
    async fn routes_for_agency(&self, agency_id: &Id<Agency>) -> StoreResult<Vec<WithId<Route>>> {
        Ok(self
            .routes
            .values()
            .filter(|route| route.content.agency_id.raw() == agency_id.raw())
            .cloned()
            .collect())
    }
    async fn stops_in_bounds(&self, _bounds: BoundingBox) -> StoreResult<Vec<WithId<Stop>>> {
        Ok(vec![])
    }
    async fn routes_serving_stop(&self, _stop_id: &Id<Stop>) -> StoreResult<Vec<WithId<Route>>> {
        Ok(vec![])
    }
    async fn stop_times_for_trip(&self, trip_id: &Id<Trip>) -> StoreResult<Vec<StopTime>> {
        Ok(self
            .stop_times
            .iter()
            .filter(|st| st.trip_id.raw() == trip_id.raw())
            .cloned()
            .collect())
    }
    async fn stop_times_at_stop_in_window(
        &self,
        stop_id: &Id<Stop>,
        window_start_nanos: i64,
        window_end_nanos: i64,
    ) -> StoreResult<Vec<StopTime>> {
        Ok(self
            .stop_times
            .iter()
            .filter(|st| {
                st.stop_id.raw() == stop_id.raw()
                    && st.departure_time_nanos >= window_start_nanos
                    && st.departure_time_nanos <= window_end_nanos
            })
            .cloned()
            .collect())
    }
    async fn calendar_for_service(&self, _service_id: &Id<Service>) -> StoreResult<Option<Calendar>> {
        Ok(None)
    }
    async fn calendar_exceptions_for_service(&self, _service_id: &Id<Service>) -> StoreResult<Vec<CalendarException>> {
        Ok(vec![])
    }
    async fn active_service_ids(&self, agency_id: &Id<Agency>, date: NaiveDate) -> StoreResult<Vec<Id<Service>>> {
        Ok(self
            .active_service_ids
            .get(&(agency_id.raw(), date))
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(Id::new)
            .collect())
    }
    async fn trips_for_block(&self, _agency_id: &Id<Agency>, _block_id: &str) -> StoreResult<Vec<BlockTripRow>> {
        Ok(vec![])
    }
    async fn search_routes(&self, sanitized_query: &str, limit: usize) -> StoreResult<Vec<WithId<Route>>> {
        Ok(self
            .routes
            .values()
            .filter(|route| {
                route
                    .content
                    .short_name
                    .as_deref()
                    .is_some_and(|name| name.eq_ignore_ascii_case(sanitized_query))
            })
            .take(limit)
            .cloned()
            .collect())
    }
    async fn search_stops(&self, sanitized_query: &str, limit: usize) -> StoreResult<Vec<WithId<Stop>>> {
        Ok(self
            .stops
            .values()
            .filter(|stop| {
                stop.content
                    .name
                    .as_deref()
                    .is_some_and(|name| name.eq_ignore_ascii_case(sanitized_query))
            })
            .take(limit)
            .cloned()
            .collect())
    }
}

fn agency(id: &str, timezone: &str) -> WithId<Agency> {
    WithId::new(
        Id::new(id.to_owned()),
        Agency {
            name: format!("{id} transit"),
            url: format!("https://{id}.example.org"),
            timezone: timezone.to_owned(),
            lang: None,
            phone: None,
            email: None,
            fare_url: None,
        },
    )
}

fn stop(id: &str, agency_id: &str) -> WithId<Stop> {
    WithId::new(
        Id::new(id.to_owned()),
        Stop {
            agency_id: Id::new(agency_id.to_owned()),
            code: None,
            name: Some(id.to_owned()),
            location: Coordinates::new(54.31, 10.13).unwrap(),
            location_type: LocationType::Stop,
            wheelchair_boarding: None,
            direction: None,
            parent_station: None,
        },
    )
}

fn route(id: &str, agency_id: &str) -> WithId<Route> {
    WithId::new(
        Id::new(id.to_owned()),
        Route {
            agency_id: Id::new(agency_id.to_owned()),
            short_name: Some(id.to_owned()),
            long_name: None,
            description: None,
            kind: RouteType::Bus,
            url: None,
            color: None,
            text_color: None,
            continuous_pickup: Some(ContinuousPolicy::NoneAvailable),
            continuous_drop_off: Some(ContinuousPolicy::NoneAvailable),
        },
    )
}

fn trip(id: &str, route_id: &str, service_id: &str) -> WithId<Trip> {
    WithId::new(
        Id::new(id.to_owned()),
        Trip {
            route_id: Id::new(route_id.to_owned()),
            service_id: Id::new(service_id.to_owned()),
            headsign: None,
            short_name: None,
            direction_id: None,
            block_id: None,
            shape_id: None,
            wheelchair_accessible: None,
            bikes_allowed: None,
        },
    )
}

fn stop_time(trip_id: &str, stop_id: &str, sequence: i32, nanos: i64) -> StopTime {
    StopTime {
        trip_id: Id::new(trip_id.to_owned()),
        stop_sequence: sequence,
        stop_id: Id::new(stop_id.to_owned()),
        arrival_time_nanos: nanos,
        departure_time_nanos: nanos,
        stop_headsign: None,
        pickup_type: StopTimeAvailability::RegularlyScheduled,
        drop_off_type: StopTimeAvailability::RegularlyScheduled,
        shape_dist_traveled_meters: None,
    }
}

fn engine(store: FakeStore) -> Engine<FakeStore> {
    Engine::new(
        std::sync::Arc::new(store),
        SnapshotHandle::default(),
        RateLimiter::new(RateLimiterConfig::default()),
        EngineConfig::default(),
    )
}

const SECS: i64 = 1_000_000_000;

/// Scenario 1: stop S belongs to agency A, route R (agency B) serves S — the
/// returned arrival's routeId must carry B's prefix, and references must
/// contain both A and B.
#[tokio::test]
async fn multi_agency_stop_references_both_agencies() {
    let mut store = FakeStore::default();
    store.agencies.insert("agency-a".to_owned(), agency("agency-a", "Europe/Berlin"));
    store.agencies.insert("agency-b".to_owned(), agency("agency-b", "Europe/Berlin"));
    store.stops.insert("platform-1".to_owned(), stop("platform-1", "agency-a"));
    store.routes.insert("re83".to_owned(), route("re83", "agency-b"));
    store.trips.lock().unwrap().insert("t1".to_owned(), trip("t1", "re83", "svc"));

    let now = Utc.with_ymd_and_hms(2026, 6, 1, 10, 0, 0).unwrap();
    let today = now.with_timezone(&chrono_tz::Europe::Berlin).date_naive();
    // Keyed by "agency-b", the route's owning agency, not "agency-a", the
    // stop's — reproduces the cross-agency scoping PgDatabase applies.
    store
        .active_service_ids
        .insert(("agency-b".to_owned(), today), vec!["svc".to_owned()]);
    store
        .stop_times
        .push(stop_time("t1", "platform-1", 1, 10 * 3600 * SECS));

    let engine = engine(store);
    let result = engine
        .arrivals_and_departures_for_stop("agency-a_platform-1", now, 5, 35)
        .await
        .unwrap();

    assert_eq!(result.entries.len(), 1);
    assert_eq!(result.entries[0].route_id.raw(), "re83");

    let agency_ids = result.references.agency_combined_ids();
    assert!(agency_ids.contains(&"agency-a".to_owned()));
    assert!(agency_ids.contains(&"agency-b".to_owned()));

    let route_ids = result.references.route_combined_ids();
    assert_eq!(route_ids, vec!["agency-b_re83".to_owned()]);
}

/// Scenario 2: a query at 23:55 local with minutesAfter=15 must surface
/// both the remainder of today's service and trips scheduled just after
/// midnight that belong to tomorrow's active services.
#[tokio::test]
async fn window_spanning_midnight_finds_both_days_trips() {
    let mut store = FakeStore::default();
    store.agencies.insert("agency-a".to_owned(), agency("agency-a", "Europe/Berlin"));
    store.stops.insert("platform-1".to_owned(), stop("platform-1", "agency-a"));
    store.routes.insert("re83".to_owned(), route("re83", "agency-a"));
    store.trips.lock().unwrap().insert("late".to_owned(), trip("late", "re83", "svc-today"));
    store.trips.lock().unwrap().insert("early".to_owned(), trip("early", "re83", "svc-tomorrow"));

    // Query time: 2026-06-01 23:55 Europe/Berlin (CEST, UTC+2).
    let now = chrono_tz::Europe::Berlin
        .with_ymd_and_hms(2026, 6, 1, 23, 55, 0)
        .unwrap()
        .with_timezone(&Utc);

    let today = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
    let tomorrow = NaiveDate::from_ymd_opt(2026, 6, 2).unwrap();
    store
        .active_service_ids
        .insert(("agency-a".to_owned(), today), vec!["svc-today".to_owned()]);
    store
        .active_service_ids
        .insert(("agency-a".to_owned(), tomorrow), vec!["svc-tomorrow".to_owned()]);

    // 23:58 today, well inside today's service day.
    store.stop_times.push(stop_time("late", "platform-1", 1, (23 * 3600 + 58 * 60) * SECS));
    // 00:05 tomorrow, which the window (23:55 +15m = 00:10) must still catch.
    store.stop_times.push(stop_time("early", "platform-1", 1, 5 * 60 * SECS));

    let engine = engine(store);
    let result = engine
        .arrivals_and_departures_for_stop("agency-a_platform-1", now, 5, 15)
        .await
        .unwrap();

    let trip_ids: Vec<String> = result.entries.iter().map(|e| e.trip_id.raw()).collect();
    assert!(trip_ids.contains(&"late".to_owned()), "expected today's late trip in {trip_ids:?}");
    assert!(trip_ids.contains(&"early".to_owned()), "expected tomorrow's early trip in {trip_ids:?}");
}

/// Scenario: the arrivals engine is partial-success — a stop-time whose
/// trip reference is dangling is skipped rather than failing the whole
/// request (§7).
#[tokio::test]
async fn dangling_trip_reference_is_skipped_not_fatal() {
    let mut store = FakeStore::default();
    store.agencies.insert("agency-a".to_owned(), agency("agency-a", "Europe/Berlin"));
    store.stops.insert("platform-1".to_owned(), stop("platform-1", "agency-a"));
    // Note: no trip inserted for "ghost" — get_trip returns None.

    let now = Utc.with_ymd_and_hms(2026, 6, 1, 10, 0, 0).unwrap();
    let today = now.with_timezone(&chrono_tz::Europe::Berlin).date_naive();
    store
        .active_service_ids
        .insert(("agency-a".to_owned(), today), vec!["svc".to_owned()]);
    store
        .stop_times
        .push(stop_time("ghost", "platform-1", 1, 10 * 3600 * SECS));

    let engine = engine(store);
    let result = engine
        .arrivals_and_departures_for_stop("agency-a_platform-1", now, 5, 35)
        .await
        .unwrap();

    assert!(result.entries.is_empty());
}

/// Scenario 6: search sanitization — an injection-shaped query never
/// errors and a query of only special characters returns empty.
#[tokio::test]
async fn search_sanitization_never_errors_on_injection_shaped_input() {
    let mut store = FakeStore::default();
    store.stops.insert("platform-1".to_owned(), stop("platform-1", "agency-a"));

    let engine = engine(store);
    let injected = engine.search_stop(r#"test" OR "1"="1"#).await.unwrap();
    assert!(injected.len() < 50);

    let only_special = engine.search_stop("!!! ??? ///").await.unwrap();
    assert!(only_special.is_empty());
}

/// spec.md §8: every arrival returned has its trip's serviceId active on
/// the reported serviceDate — exercised here by asserting a trip whose
/// service is *not* listed as active for the query's service day never
/// appears, even though its stop-time otherwise falls in the window.
#[tokio::test]
async fn arrivals_exclude_inactive_service_trips() {
    let mut store = FakeStore::default();
    store.agencies.insert("agency-a".to_owned(), agency("agency-a", "Europe/Berlin"));
    store.stops.insert("platform-1".to_owned(), stop("platform-1", "agency-a"));
    store.routes.insert("re83".to_owned(), route("re83", "agency-a"));
    store.trips.lock().unwrap().insert("t1".to_owned(), trip("t1", "re83", "svc-weekday-only"));

    let now = Utc.with_ymd_and_hms(2026, 6, 1, 10, 0, 0).unwrap();
    // Deliberately leave active_service_ids empty for every date: the
    // fixture's single trip's service is never active.
    store
        .stop_times
        .push(stop_time("t1", "platform-1", 1, 10 * 3600 * SECS));

    let engine = engine(store);
    let result = engine
        .arrivals_and_departures_for_stop("agency-a_platform-1", now, 5, 35)
        .await
        .unwrap();

    assert!(result.entries.is_empty());
}
