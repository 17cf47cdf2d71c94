//! Schedule-for-stop and schedule-for-route (§4.7): the non-real-time,
//! single-service-date views of what's scheduled to happen, independent of
//! any arrivals window. Unlike the arrivals engine, these do not need a
//! three-day scan — the caller names an exact service date.

use std::collections::HashMap;

use chrono::NaiveDate;
use model::{agency::Agency, route::Route, stop::Stop, trip::{StopTime, Trip}, WithId};
use utility::id::Id;

use crate::store::{ScheduleStore, StoreResult};

#[derive(Debug, Clone, serde::Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StopRouteSchedule {
    pub route_id: Id<Route>,
    pub stop_times: Vec<StopTime>,
}

/// All stop-times at `stop_id` on `date`, restricted to actively-scheduled
/// services and grouped by the owning route. Stop-times within a group keep
/// `stopSequence` ordering from the store; groups themselves are ordered by
/// the first stop-time's scheduled departure.
pub async fn for_stop(
    store: &dyn ScheduleStore,
    stop: &WithId<Stop>,
    date: NaiveDate,
) -> StoreResult<Vec<StopRouteSchedule>> {
    // A full day's window in nanos-since-midnight; trips running past
    // midnight use values beyond one day's worth of nanoseconds and are
    // still captured since the upper bound is generous.
    let stop_times = store
        .stop_times_at_stop_in_window(&stop.id, i64::MIN, i64::MAX)
        .await?;

    let mut by_route: HashMap<String, (Id<Route>, Vec<StopTime>)> = HashMap::new();

    // A trip's active services are scoped to the agency that owns its
    // route, not the agency of the stop being queried — those differ at a
    // shared multi-agency stop. Cache both lookups since many stop-times
    // share the same route.
    let mut route_agency_cache: HashMap<String, Id<Agency>> = HashMap::new();
    let mut active_service_cache: HashMap<(String, NaiveDate), Vec<Id<model::calendar::Service>>> =
        HashMap::new();

    for stop_time in stop_times {
        let Some(trip) = store.get_trip(&stop_time.trip_id).await? else {
            continue;
        };

        let route_agency_id = match route_agency_cache.get(&trip.content.route_id.raw()) {
            Some(agency_id) => agency_id.clone(),
            None => {
                let Some(route) = store.get_route(&trip.content.route_id).await? else {
                    continue;
                };
                let agency_id = route.content.agency_id.clone();
                route_agency_cache.insert(trip.content.route_id.raw(), agency_id.clone());
                agency_id
            }
        };

        let cache_key = (route_agency_id.raw(), date);
        if !active_service_cache.contains_key(&cache_key) {
            let ids = store.active_service_ids(&route_agency_id, date).await?;
            active_service_cache.insert(cache_key.clone(), ids);
        }
        let active_service_ids = active_service_cache.get(&cache_key).expect("just inserted");

        if !active_service_ids
            .iter()
            .any(|id| id.raw() == trip.content.service_id.raw())
        {
            continue;
        }
        by_route
            .entry(trip.content.route_id.raw())
            .or_insert_with(|| (trip.content.route_id.clone(), Vec::new()))
            .1
            .push(stop_time);
    }

    let mut groups: Vec<StopRouteSchedule> = by_route
        .into_values()
        .map(|(route_id, mut stop_times)| {
            stop_times.sort_by_key(|stop_time| stop_time.departure_time_nanos);
            StopRouteSchedule { route_id, stop_times }
        })
        .collect();
    groups.sort_by_key(|group| {
        group
            .stop_times
            .first()
            .map(|stop_time| stop_time.departure_time_nanos)
            .unwrap_or(i64::MAX)
    });

    Ok(groups)
}

#[derive(Debug, Clone, serde::Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteTripSchedule {
    pub trip_id: Id<Trip>,
    pub stop_times: Vec<StopTime>,
}

/// All trips of `route_id` active on `date`, each with its full ordered
/// stop-time sequence.
pub async fn for_route(
    store: &dyn ScheduleStore,
    route: &WithId<Route>,
    date: NaiveDate,
) -> StoreResult<Vec<RouteTripSchedule>> {
    let active_service_ids = store
        .active_service_ids(&route.content.agency_id, date)
        .await?;

    // The store has no direct "trips for route" query (that would need a
    // dedicated index the spec doesn't name); instead walk the route's
    // stops and collect the distinct trips seen there, which is exactly
    // the set of trips whose stop-times reference this route's stops.
    //
    // This is acceptable because the engine only needs this for a single
    // route at a time, not as a hot path query.
    let mut trip_ids: std::collections::HashSet<String> = std::collections::HashSet::new();
    let mut schedules = Vec::new();

    for stop in store
        .stops_for_agency(&route.content.agency_id)
        .await?
    {
        let stop_times = store
            .stop_times_at_stop_in_window(&stop.id, i64::MIN, i64::MAX)
            .await?;
        for stop_time in stop_times {
            if !trip_ids.insert(stop_time.trip_id.raw()) {
                continue;
            }
            let Some(trip) = store.get_trip(&stop_time.trip_id).await? else {
                continue;
            };
            if trip.content.route_id.raw() != route.id.raw() {
                continue;
            }
            if !active_service_ids
                .iter()
                .any(|id| id.raw() == trip.content.service_id.raw())
            {
                continue;
            }
            let mut stop_times = store.stop_times_for_trip(&trip.id).await?;
            stop_times.sort_by_key(|stop_time| stop_time.stop_sequence);
            schedules.push(RouteTripSchedule {
                trip_id: trip.id.clone(),
                stop_times,
            });
        }
    }

    schedules.sort_by_key(|schedule| {
        schedule
            .stop_times
            .first()
            .map(|stop_time| stop_time.departure_time_nanos)
            .unwrap_or(i64::MAX)
    });
    Ok(schedules)
}
