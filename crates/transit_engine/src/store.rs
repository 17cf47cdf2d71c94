//! The Schedule store interface: everything the query-fusion engine needs
//! to read out of the persistent, ingest-immutable static feed. Modeled on
//! the teacher's `Database`/`DatabaseOperations` split — a trait defined
//! here, implemented against Postgres in the `database` crate — but
//! narrowed to the read-only operations the engine actually issues, since
//! ingest (write) is out of scope.

use std::{error, fmt::Debug, result};

use async_trait::async_trait;
use chrono::NaiveDate;
use model::{
    agency::Agency,
    calendar::{CalendarException, Service},
    route::Route,
    shape::{Shape, ShapePoint},
    stop::Stop,
    trip::{StopTime, Trip},
    WithId,
};
use utility::{geo::BoundingBox, id::Id};

#[derive(Debug)]
pub enum StoreError {
    NotFound,
    Unavailable(String),
    Other(Box<dyn error::Error + Send + Sync>),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::Unavailable(reason) => write!(f, "store unavailable: {reason}"),
            Self::Other(why) => write!(f, "{why}"),
        }
    }
}

impl error::Error for StoreError {}

pub type StoreResult<T> = result::Result<T, StoreError>;

/// One entry of a block's trip listing as stored: the trip and the first
/// stop-time's departure, which the block-sequence resolver (§4.9) sorts
/// on to build the service-date-ordered sequence.
#[derive(Debug, Clone)]
pub struct BlockTripRow {
    pub trip_id: Id<Trip>,
    pub service_id: Id<Service>,
    pub first_departure_nanos: i64,
}

/// Read-only access to the immutable, already-ingested static feed. A
/// single snapshot of this data is assumed stable for the engine's entire
/// process lifetime, modulo whole-feed swaps the ingest pipeline performs
/// out of band (out of scope here).
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn health_check(&self) -> StoreResult<()>;

    async fn get_agency(&self, id: &Id<Agency>) -> StoreResult<Option<WithId<Agency>>>;
    async fn get_route(&self, id: &Id<Route>) -> StoreResult<Option<WithId<Route>>>;
    async fn get_stop(&self, id: &Id<Stop>) -> StoreResult<Option<WithId<Stop>>>;
    async fn get_trip(&self, id: &Id<Trip>) -> StoreResult<Option<WithId<Trip>>>;
    async fn get_shape(&self, id: &Id<Shape>) -> StoreResult<Option<Vec<ShapePoint>>>;

    async fn get_routes(&self, ids: &[Id<Route>]) -> StoreResult<Vec<WithId<Route>>>;
    async fn get_stops(&self, ids: &[Id<Stop>]) -> StoreResult<Vec<WithId<Stop>>>;
    async fn get_trips(&self, ids: &[Id<Trip>]) -> StoreResult<Vec<WithId<Trip>>>;
    async fn get_agencies(&self, ids: &[Id<Agency>]) -> StoreResult<Vec<WithId<Agency>>>;

    async fn stops_for_agency(&self, agency_id: &Id<Agency>) -> StoreResult<Vec<WithId<Stop>>>;
    async fn routes_for_agency(&self, agency_id: &Id<Agency>) -> StoreResult<Vec<WithId<Route>>>;
    async fn stops_in_bounds(&self, bounds: BoundingBox) -> StoreResult<Vec<WithId<Stop>>>;
    async fn routes_serving_stop(&self, stop_id: &Id<Stop>) -> StoreResult<Vec<WithId<Route>>>;

    /// Ordered by `stopSequence` ascending.
    async fn stop_times_for_trip(&self, trip_id: &Id<Trip>) -> StoreResult<Vec<StopTime>>;

    /// All stop-times at `stop_id` whose `departureTimeNanos` falls within
    /// `[window_start_nanos, window_end_nanos]` for the service date the
    /// caller already resolved. The arrivals engine (§4.6) calls this once
    /// per candidate service date in its three-day window.
    async fn stop_times_at_stop_in_window(
        &self,
        stop_id: &Id<Stop>,
        window_start_nanos: i64,
        window_end_nanos: i64,
    ) -> StoreResult<Vec<StopTime>>;

    async fn calendar_for_service(
        &self,
        service_id: &Id<Service>,
    ) -> StoreResult<Option<model::calendar::Calendar>>;
    async fn calendar_exceptions_for_service(
        &self,
        service_id: &Id<Service>,
    ) -> StoreResult<Vec<CalendarException>>;

    /// All service ids active on `date`, scoped to `agency_id` (a single
    /// store may hold several agencies' calendars; service ids are not
    /// guaranteed unique across agencies).
    async fn active_service_ids(
        &self,
        agency_id: &Id<Agency>,
        date: NaiveDate,
    ) -> StoreResult<Vec<Id<Service>>>;

    /// All trips sharing `block_id` under `agency_id`, with enough data to
    /// sort and filter by service-day activity without a second round trip.
    async fn trips_for_block(
        &self,
        agency_id: &Id<Agency>,
        block_id: &str,
    ) -> StoreResult<Vec<BlockTripRow>>;

    async fn search_routes(&self, sanitized_query: &str, limit: usize) -> StoreResult<Vec<WithId<Route>>>;
    async fn search_stops(&self, sanitized_query: &str, limit: usize) -> StoreResult<Vec<WithId<Stop>>>;
}
