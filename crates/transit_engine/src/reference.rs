//! The reference collector (§4.10): every response entry references other
//! entities by combined id; the `references` block gathers the full
//! records for those ids exactly once each, deduplicated, so a client never
//! has to guess whether an id appears elsewhere in the same response.

use std::collections::HashSet;

use model::{
    agency::Agency, realtime::ServiceAlert, route::Route, stop::Stop, trip::Trip, WithId,
};
use utility::{composite_id, id::Id};

/// Accumulates the set of entities referenced across a response,
/// deduplicated by their *raw* id plus the agency that owns them — a
/// stop's raw id is only unique within its own agency, so the dedup key
/// must include agency, not just raw id.
#[derive(Default)]
pub struct ReferenceCollector {
    agency_ids: HashSet<String>,
    route_keys: HashSet<(String, String)>,
    trip_keys: HashSet<(String, String)>,
    stop_keys: HashSet<(String, String)>,
    situation_keys: HashSet<(String, String)>,

    pub agencies: Vec<WithId<Agency>>,
    pub routes: Vec<WithId<Route>>,
    /// Paired with the *owning route's* agency id — `Trip` carries no
    /// agency field of its own, so the combined id a renderer needs has to
    /// travel alongside the trip rather than be derivable from it.
    pub trips: Vec<(Id<Agency>, WithId<Trip>)>,
    pub stops: Vec<WithId<Stop>>,
    /// Paired with the owning agency id, for the same reason as `trips`.
    pub situations: Vec<(Id<Agency>, WithId<ServiceAlert>)>,
}

impl ReferenceCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// The agency prefix for a referenced route/trip is the *owning
    /// agency's* id, taken from the entity itself — never the agency of
    /// whatever stop or other entity led the collector to it. A trip
    /// reached via a multi-agency stop's stop-times must still be keyed
    /// under its own route's agency, not the stop's.
    pub fn add_agency(&mut self, agency: WithId<Agency>) {
        let raw = agency.id.raw();
        if self.agency_ids.insert(raw) {
            self.agencies.push(agency);
        }
    }

    pub fn add_route(&mut self, route: WithId<Route>) {
        let key = (route.content.agency_id.raw(), route.id.raw());
        if self.route_keys.insert(key) {
            self.routes.push(route);
        }
    }

    pub fn add_trip(&mut self, trip: WithId<Trip>, owning_agency_id: &Id<Agency>) {
        let key = (owning_agency_id.raw(), trip.id.raw());
        if self.trip_keys.insert(key) {
            self.trips.push((owning_agency_id.clone(), trip));
        }
    }

    pub fn add_stop(&mut self, stop: WithId<Stop>) {
        let key = (stop.content.agency_id.raw(), stop.id.raw());
        if self.stop_keys.insert(key) {
            self.stops.push(stop);
        }
    }

    /// Alerts carry no agency field of their own; the owning agency is
    /// whichever route (or trip) led the collector to this alert.
    pub fn add_situation(&mut self, alert: WithId<ServiceAlert>, owning_agency_id: &Id<Agency>) {
        let key = (owning_agency_id.raw(), alert.id.raw());
        if self.situation_keys.insert(key) {
            self.situations.push((owning_agency_id.clone(), alert));
        }
    }

    pub fn agency_combined_ids(&self) -> Vec<String> {
        self.agencies
            .iter()
            .map(|agency| agency.id.raw())
            .collect()
    }

    pub fn route_combined_ids(&self) -> Vec<String> {
        self.routes
            .iter()
            .map(|route| composite_id::render(&route.content.agency_id.raw(), &route.id.raw()))
            .collect()
    }

    pub fn trip_combined_ids(&self) -> Vec<(String, String)> {
        self.trip_keys.iter().cloned().collect()
    }

    pub fn stop_combined_ids(&self) -> Vec<String> {
        self.stops
            .iter()
            .map(|stop| composite_id::render(&stop.content.agency_id.raw(), &stop.id.raw()))
            .collect()
    }

    pub fn situation_combined_ids(&self) -> Vec<String> {
        self.situation_keys
            .iter()
            .map(|(agency_id, raw_id)| composite_id::render(agency_id, raw_id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{
        agency::Agency,
        route::{ContinuousPolicy, Route, RouteType},
        stop::{Coordinates, LocationType, Stop},
    };

    fn agency() -> Agency {
        Agency {
            name: "ERIXX".to_owned(),
            url: "https://erixx.de".to_owned(),
            timezone: "Europe/Berlin".to_owned(),
            lang: None,
            phone: None,
            email: None,
            fare_url: None,
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

    fn stop(agency_id: &str) -> Stop {
        Stop {
            agency_id: Id::new(agency_id.to_owned()),
            code: None,
            name: Some("Kiel Hbf".to_owned()),
            location: Coordinates::new(54.31, 10.13).unwrap(),
            location_type: LocationType::Stop,
            wheelchair_boarding: None,
            direction: None,
            parent_station: None,
        }
    }

    #[test]
    fn routes_dedup_by_agency_and_raw_id() {
        let mut collector = ReferenceCollector::new();
        collector.add_route(WithId::new(Id::new("re83".to_owned()), route("erixx")));
        collector.add_route(WithId::new(Id::new("re83".to_owned()), route("erixx")));
        assert_eq!(collector.routes.len(), 1);
    }

    #[test]
    fn same_raw_id_different_agency_is_not_deduped() {
        let mut collector = ReferenceCollector::new();
        collector.add_stop(WithId::new(Id::new("1".to_owned()), stop("erixx")));
        collector.add_stop(WithId::new(Id::new("1".to_owned()), stop("nah-sh")));
        assert_eq!(collector.stops.len(), 2);
    }

    #[test]
    fn trip_keyed_by_owning_route_agency_not_stop_agency() {
        let mut collector = ReferenceCollector::new();
        let trip = model::trip::Trip {
            route_id: Id::new("re83".to_owned()),
            service_id: Id::new("svc".to_owned()),
            headsign: None,
            short_name: None,
            direction_id: None,
            block_id: None,
            shape_id: None,
            wheelchair_accessible: None,
            bikes_allowed: None,
        };
        // reached while collecting stop-times at a stop owned by a
        // *different* agency than the trip's own route.
        let owning_agency: Id<Agency> = Id::new("erixx".to_owned());
        collector.add_trip(WithId::new(Id::new("t1".to_owned()), trip), &owning_agency);
        assert_eq!(collector.trip_combined_ids(), vec![("erixx".to_owned(), "t1".to_owned())]);

        let _ = agency();
    }

    #[test]
    fn situations_dedup_by_owning_agency_and_raw_id() {
        use model::realtime::{AlertCause, AlertEffect, ServiceAlert};

        let alert = ServiceAlert {
            informed_entities: Vec::new(),
            active_periods: Vec::new(),
            cause: AlertCause::Maintenance,
            effect: AlertEffect::ReducedService,
            header_text: None,
            description_text: None,
        };
        let owning_agency: Id<Agency> = Id::new("erixx".to_owned());

        let mut collector = ReferenceCollector::new();
        collector.add_situation(WithId::new(Id::new("alert-1".to_owned()), alert.clone()), &owning_agency);
        collector.add_situation(WithId::new(Id::new("alert-1".to_owned()), alert), &owning_agency);
        assert_eq!(collector.situations.len(), 1);
        assert_eq!(collector.situation_combined_ids(), vec!["erixx_alert-1".to_owned()]);
    }
}
