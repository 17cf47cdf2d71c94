//! The query-fusion facade: one `Engine<S>` per process, composing the
//! schedule store, the real-time snapshot, and every module in this crate
//! into the operations the web layer's handlers call directly. Nothing in
//! here talks HTTP; this is the seam a test can drive without starting a
//! server.

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use model::{
    agency::Agency,
    route::Route,
    shape::Shape,
    stop::Stop,
    trip::Trip,
    WithDistance, WithId,
};
use utility::{
    composite_id,
    geo,
    id::{HasId, Id},
};

use crate::{
    arrivals::{self, ArrivalAndDeparture, ArrivalsWindow},
    block,
    error::{EngineError, EngineResult},
    rate_limit::RateLimiter,
    reference::ReferenceCollector,
    schedule::{self, RouteTripSchedule, StopRouteSchedule},
    search,
    shape as shape_codec,
    snapshot::{Snapshot, SnapshotHandle},
    store::{ScheduleStore, StoreError},
    trip_status::{self, TripStatus},
};

impl From<StoreError> for EngineError {
    fn from(why: StoreError) -> Self {
        match why {
            StoreError::NotFound => EngineError::NotFound,
            StoreError::Unavailable(reason) => EngineError::Unavailable(reason),
            StoreError::Other(why) => EngineError::Internal(why.to_string()),
        }
    }
}

/// Tunables that don't belong in any one module, resolved once at startup
/// from the environment (spec.md §A.4) and threaded through every request.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub stale_vehicle_threshold: Duration,
    pub nearby_stop_radius_meters: f64,
    pub search_result_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stale_vehicle_threshold: Duration::seconds(900),
            nearby_stop_radius_meters: 10_000.0,
            search_result_limit: 50,
        }
    }
}

pub struct Engine<S: ScheduleStore> {
    store: Arc<S>,
    snapshot: SnapshotHandle,
    pub rate_limiter: RateLimiter,
    config: EngineConfig,
}

/// Splits a combined id into its agency id and the `Id<T>` the store
/// expects, rejecting anything that doesn't round-trip through
/// `utility::composite_id`.
fn parse_combined<T: HasId<IdType = String>>(combined: &str) -> EngineResult<(Id<Agency>, Id<T>)> {
    composite_id::parse(combined)
        .map(|(agency_raw, raw_id)| (Id::new(agency_raw.to_owned()), Id::new(raw_id.to_owned())))
        .map_err(|_| EngineError::validation("id", format!("'{combined}' is not a valid combined id")))
}

pub fn resolve_tz(agency: &Agency) -> EngineResult<Tz> {
    agency
        .timezone
        .parse()
        .map_err(|_| EngineError::Internal(format!("agency has unparseable timezone '{}'", agency.timezone)))
}

impl<S: ScheduleStore> Engine<S> {
    pub fn new(store: Arc<S>, snapshot: SnapshotHandle, rate_limiter: RateLimiter, config: EngineConfig) -> Self {
        Self {
            store,
            snapshot,
            rate_limiter,
            config,
        }
    }

    pub async fn health_check(&self) -> EngineResult<()> {
        self.store.health_check().await.map_err(EngineError::from)
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.current()
    }

    pub fn snapshot_handle(&self) -> &SnapshotHandle {
        &self.snapshot
    }

    // ---- entity lookups -------------------------------------------------

    /// Agencies are addressed by their raw id directly (they own the
    /// combined-id namespace rather than living inside it).
    pub async fn agency(&self, agency_id: &str) -> EngineResult<WithId<Agency>> {
        self.store
            .get_agency(&Id::new(agency_id.to_owned()))
            .await?
            .ok_or(EngineError::NotFound)
    }

    pub async fn stop(&self, combined_id: &str) -> EngineResult<WithId<Stop>> {
        let (_, stop_id) = parse_combined::<Stop>(combined_id)?;
        self.store.get_stop(&stop_id).await?.ok_or(EngineError::NotFound)
    }

    pub async fn route(&self, combined_id: &str) -> EngineResult<WithId<Route>> {
        let (_, route_id) = parse_combined::<Route>(combined_id)?;
        self.store.get_route(&route_id).await?.ok_or(EngineError::NotFound)
    }

    pub async fn trip(&self, combined_id: &str) -> EngineResult<WithId<Trip>> {
        let (_, trip_id) = parse_combined::<Trip>(combined_id)?;
        self.store.get_trip(&trip_id).await?.ok_or(EngineError::NotFound)
    }

    pub async fn stops_for_agency(&self, agency_id: &str) -> EngineResult<Vec<WithId<Stop>>> {
        Ok(self.store.stops_for_agency(&Id::new(agency_id.to_owned())).await?)
    }

    pub async fn routes_for_agency(&self, agency_id: &str) -> EngineResult<Vec<WithId<Route>>> {
        Ok(self.store.routes_for_agency(&Id::new(agency_id.to_owned())).await?)
    }

    // ---- location search --------------------------------------------------

    /// Stops within `radius_meters` of `(lat, lon)`, nearest first. The
    /// store's bounding-box query is a coarse pre-filter; the exact radius
    /// cutoff and sort both happen here since a box always over-selects at
    /// the corners.
    pub async fn stops_for_location(
        &self,
        lat: f64,
        lon: f64,
        radius_meters: Option<f64>,
    ) -> EngineResult<Vec<WithDistance<WithId<Stop>>>> {
        let radius = radius_meters.unwrap_or(self.config.nearby_stop_radius_meters);
        let bounds = geo::bounds_from_radius(lat, lon, radius);
        let candidates = self.store.stops_in_bounds(bounds).await?;

        let mut within_radius: Vec<WithDistance<WithId<Stop>>> = candidates
            .into_iter()
            .filter_map(|stop| {
                let distance = geo::distance_m(lat, lon, stop.content.location.latitude, stop.content.location.longitude);
                (distance <= radius).then(|| WithDistance::new(distance, stop))
            })
            .collect();

        within_radius.sort_by(|a, b| a.distance_meters.total_cmp(&b.distance_meters));
        Ok(within_radius)
    }

    /// Routes serving any stop within `radius_meters` of `(lat, lon)`,
    /// deduplicated by combined id.
    pub async fn routes_for_location(
        &self,
        lat: f64,
        lon: f64,
        radius_meters: Option<f64>,
    ) -> EngineResult<Vec<WithId<Route>>> {
        let nearby = self.stops_for_location(lat, lon, radius_meters).await?;
        let mut seen = std::collections::HashSet::new();
        let mut routes = Vec::new();
        for stop in nearby {
            for route in self.store.routes_serving_stop(&stop.content.id).await? {
                if seen.insert((route.content.agency_id.raw(), route.id.raw())) {
                    routes.push(route);
                }
            }
        }
        Ok(routes)
    }

    pub async fn search_stop(&self, query: &str) -> EngineResult<Vec<WithId<Stop>>> {
        match search::sanitize(query) {
            Some(sanitized) => Ok(self.store.search_stops(&sanitized, self.config.search_result_limit).await?),
            None => Ok(Vec::new()),
        }
    }

    pub async fn search_route(&self, query: &str) -> EngineResult<Vec<WithId<Route>>> {
        match search::sanitize(query) {
            Some(sanitized) => Ok(self.store.search_routes(&sanitized, self.config.search_result_limit).await?),
            None => Ok(Vec::new()),
        }
    }

    // ---- arrivals and departures -----------------------------------------

    pub async fn arrivals_and_departures_for_stop(
        &self,
        combined_stop_id: &str,
        query_time: DateTime<Utc>,
        minutes_before: i64,
        minutes_after: i64,
    ) -> EngineResult<ArrivalsAndDeparturesResult> {
        let stop = self.stop(combined_stop_id).await?;
        let agency = self.agency(&stop.content.agency_id.raw()).await?;
        let agency_tz = resolve_tz(&agency.content)?;
        let snapshot = self.snapshot.current();

        let window = ArrivalsWindow {
            query_time,
            minutes_before,
            minutes_after,
        };
        let mut entries = arrivals::compute_for_stop(self.store.as_ref(), &snapshot, &stop, agency_tz, &window)
            .await?;

        let mut references = ReferenceCollector::new();
        references.add_stop(stop.clone());
        references.add_agency(agency.clone());

        let mut routes_by_id: HashMap<String, WithId<Route>> = HashMap::new();
        let mut agencies_by_id: HashMap<String, WithId<Agency>> = HashMap::new();
        agencies_by_id.insert(agency.id.raw(), agency.clone());
        for entry in entries.iter_mut() {
            let route = match routes_by_id.get(&entry.route_id.raw()) {
                Some(route) => route.clone(),
                None => {
                    let Some(route) = self.store.get_route(&entry.route_id).await? else {
                        continue;
                    };
                    routes_by_id.insert(entry.route_id.raw(), route.clone());
                    route
                }
            };
            references.add_route(route.clone());

            // A route's owning agency (§4.6 step 5) may differ from the
            // queried stop's agency in a multi-agency deployment; make sure
            // it's collected too, not just the stop's own agency.
            let route_agency_id = route.content.agency_id.raw();
            if !agencies_by_id.contains_key(&route_agency_id) {
                if let Some(route_agency) = self.store.get_agency(&route.content.agency_id).await? {
                    agencies_by_id.insert(route_agency_id, route_agency.clone());
                    references.add_agency(route_agency);
                }
            }

            self.populate_trip_status(entry, &snapshot, query_time).await;

            if let Ok(Some(trip)) = self.store.get_trip(&entry.trip_id).await {
                references.add_trip(trip, &route.content.agency_id);
            }

            for alert in &snapshot.alerts {
                let applies = alert.content.informed_entities.iter().any(|selector| {
                    selector.matches(&route.content.agency_id, Some(&route.id), Some(&entry.trip_id))
                });
                if applies {
                    references.add_situation(alert.clone(), &route.content.agency_id);
                }
            }
        }

        // §4.6 step 6: up to 5 nearby stops within 10km, combined-id
        // rendered, excluding the queried stop itself.
        let nearby_stop_ids = self
            .stops_for_location(
                stop.content.location.latitude,
                stop.content.location.longitude,
                Some(self.config.nearby_stop_radius_meters),
            )
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|nearby| nearby.content.id.raw() != stop.id.raw())
            .take(5)
            .map(|nearby| composite_id::render(&nearby.content.content.agency_id.raw(), &nearby.content.id.raw()))
            .collect();

        Ok(ArrivalsAndDeparturesResult {
            entries,
            references,
            nearby_stop_ids,
        })
    }

    /// Fills in `entry.trip_status` (§4.6 step 5) whenever the snapshot has
    /// either a trip update or an unexpired vehicle position for this trip;
    /// skipped silently on a store hiccup since the arrival itself is still
    /// usable without a live position.
    async fn populate_trip_status(&self, entry: &mut ArrivalAndDeparture, snapshot: &Snapshot, now: DateTime<Utc>) {
        let trip_update = snapshot.trip_update(&entry.trip_id, entry.service_date);
        let vehicle = entry
            .vehicle_id
            .as_deref()
            .and_then(|id| snapshot.vehicle(id))
            .filter(|vehicle| vehicle.trip_id.as_ref().map(|id| id.raw()) == Some(entry.trip_id.raw()));

        if trip_update.is_none() && vehicle.is_none() {
            return;
        }

        let Ok(status) = self
            .build_trip_status(&entry.trip_id, entry.service_date, trip_update, vehicle, now)
            .await
        else {
            return;
        };
        entry.trip_status = Some(status);
    }

    async fn build_trip_status(
        &self,
        trip_id: &Id<Trip>,
        service_date: NaiveDate,
        trip_update: Option<&model::realtime::RealtimeTripUpdate>,
        vehicle: Option<&model::realtime::RealtimeVehicle>,
        now: DateTime<Utc>,
    ) -> EngineResult<TripStatus> {
        let trip = self.store.get_trip(trip_id).await?.ok_or(EngineError::NotFound)?;
        let route = self.store.get_route(&trip.content.route_id).await?.ok_or(EngineError::NotFound)?;
        let agency = self.agency(&route.content.agency_id.raw()).await?;
        let agency_tz = resolve_tz(&agency.content)?;
        let midnight_utc = crate::time::service_day_midnight_utc(agency_tz, service_date)
            .ok_or_else(|| EngineError::Internal("service date has no local midnight in agency timezone".into()))?;

        let stop_times = self.store.stop_times_for_trip(trip_id).await?;
        let shape_points = match &trip.content.shape_id {
            Some(shape_id) => self.store.get_shape(shape_id).await?,
            None => None,
        };

        let block_sequence = match &trip.content.block_id {
            Some(block_id) => {
                let active = self.store.active_service_ids(&route.content.agency_id, service_date).await?;
                let rows = self.store.trips_for_block(&route.content.agency_id, block_id).await?;
                let mut stop_time_counts = HashMap::new();
                for row in &rows {
                    let count = self.store.stop_times_for_trip(&row.trip_id).await?.len();
                    stop_time_counts.insert(row.trip_id.raw(), count);
                }
                Some(block::resolve_sequence(rows, &active, &stop_time_counts))
            }
            None => None,
        };

        let mut status = trip_status::compute(
            trip_id,
            service_date,
            &stop_times,
            shape_points.as_deref(),
            block_sequence.as_deref(),
            trip_update,
            vehicle,
            now,
            midnight_utc,
            self.config.stale_vehicle_threshold,
        );
        status.situation_ids = self.matching_situation_ids(&route, trip_id);
        Ok(status)
    }

    /// §4.5 step 1: service alerts whose informed-entity selectors match
    /// this (trip, route, agency), rendered as combined ids under the
    /// route's owning agency.
    fn matching_situation_ids(&self, route: &WithId<Route>, trip_id: &Id<Trip>) -> Vec<String> {
        self.snapshot
            .current()
            .alerts
            .iter()
            .filter(|alert| {
                alert.content.informed_entities.iter().any(|selector| {
                    selector.matches(&route.content.agency_id, Some(&route.id), Some(trip_id))
                })
            })
            .map(|alert| composite_id::render(&route.content.agency_id.raw(), &alert.id.raw()))
            .collect()
    }

    pub async fn trip_status_for_trip(
        &self,
        combined_trip_id: &str,
        service_date: NaiveDate,
        now: DateTime<Utc>,
    ) -> EngineResult<TripStatus> {
        let (_, trip_id) = parse_combined::<Trip>(combined_trip_id)?;
        let snapshot = self.snapshot.current();
        let trip_update = snapshot.trip_update(&trip_id, service_date);
        let vehicle = trip_update
            .and_then(|update| update.vehicle_id.as_ref())
            .and_then(|vehicle_id| snapshot.vehicle(&vehicle_id.raw()))
            .or_else(|| {
                snapshot
                    .vehicles
                    .values()
                    .find(|vehicle| vehicle.trip_id.as_ref().map(|id| id.raw()) == Some(trip_id.raw()))
            });
        self.build_trip_status(&trip_id, service_date, trip_update, vehicle, now).await
    }

    /// The trip (if any) a vehicle is currently assigned to, and its status.
    pub async fn trip_for_vehicle(&self, vehicle_id: &str, service_date: NaiveDate, now: DateTime<Utc>) -> EngineResult<TripStatus> {
        let snapshot = self.snapshot.current();
        let vehicle = snapshot.vehicle(vehicle_id).ok_or(EngineError::NotFound)?;
        let trip_id = vehicle.trip_id.clone().ok_or(EngineError::NotFound)?;
        let trip_update = snapshot.trip_update(&trip_id, service_date);
        self.build_trip_status(&trip_id, service_date, trip_update, Some(vehicle), now).await
    }

    /// Raw stop-times for a single trip, sequence-ordered. A thin pass-
    /// through to the store, kept on `Engine` so `trip-for-vehicle`'s
    /// `includeSchedule` flag (§6) doesn't need its own store handle.
    pub async fn stop_times_for_trip(&self, trip_id: &Id<Trip>) -> EngineResult<Vec<model::trip::StopTime>> {
        let mut stop_times = self.store.stop_times_for_trip(trip_id).await?;
        stop_times.sort_by_key(|stop_time| stop_time.stop_sequence);
        Ok(stop_times)
    }

    // ---- schedule -----------------------------------------------------------

    pub async fn schedule_for_stop(&self, combined_stop_id: &str, date: NaiveDate) -> EngineResult<Vec<StopRouteSchedule>> {
        let stop = self.stop(combined_stop_id).await?;
        Ok(schedule::for_stop(self.store.as_ref(), &stop, date).await?)
    }

    pub async fn schedule_for_route(&self, combined_route_id: &str, date: NaiveDate) -> EngineResult<Vec<RouteTripSchedule>> {
        let route = self.route(combined_route_id).await?;
        Ok(schedule::for_route(self.store.as_ref(), &route, date).await?)
    }

    // ---- block and shape ------------------------------------------------

    pub async fn block(
        &self,
        agency_id: &str,
        block_id: &str,
        service_date: NaiveDate,
    ) -> EngineResult<Vec<model::block::BlockTripSummary>> {
        let agency_id = Id::new(agency_id.to_owned());
        let rows = self.store.trips_for_block(&agency_id, block_id).await?;
        let active = self.store.active_service_ids(&agency_id, service_date).await?;
        let mut stop_time_counts = HashMap::new();
        for row in &rows {
            let count = self.store.stop_times_for_trip(&row.trip_id).await?.len();
            stop_time_counts.insert(row.trip_id.raw(), count);
        }
        Ok(block::resolve_sequence(rows, &active, &stop_time_counts))
    }

    pub async fn shape(&self, combined_shape_id: &str) -> EngineResult<shape_codec::EncodedShape> {
        let (_, shape_id) = parse_combined::<Shape>(combined_shape_id)?;
        let points = self.store.get_shape(&shape_id).await?.ok_or(EngineError::NotFound)?;
        shape_codec::encode(&points).map_err(|why| EngineError::Internal(why.to_string()))
    }
}

pub struct ArrivalsAndDeparturesResult {
    pub entries: Vec<ArrivalAndDeparture>,
    pub references: ReferenceCollector,
    pub nearby_stop_ids: Vec<String>,
}

/// Resolves the service date and bounding box a `now()` call in `tz` falls
/// on; the one free function in here, since nothing about it needs a store.
pub fn service_date_for(now: DateTime<Utc>, tz: Tz) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// Converts a local calendar date, noon, to a UTC instant purely for
/// logging/debug display — never used for service-day arithmetic (use
/// `crate::time::service_day_midnight_utc` for that).
pub fn approximate_noon_utc(tz: Tz, date: NaiveDate) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&date.and_hms_opt(12, 0, 0)?)
        .single()
        .map(|local| local.with_timezone(&Utc))
}
