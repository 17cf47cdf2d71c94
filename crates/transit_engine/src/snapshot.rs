//! The real-time snapshot: an in-memory value type holding the last poll
//! of vehicle positions, trip updates, and service alerts, swapped
//! wholesale on each update. Readers hold a read lock only long enough to
//! clone an `Arc` to the current snapshot, then release it — the snapshot
//! value itself is immutable, so "holding the snapshot for the request
//! lifetime" (§5) costs nothing beyond the clone.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use chrono::NaiveDate;
use model::{
    realtime::{RealtimeTripUpdate, RealtimeVehicle, ServiceAlert},
    trip::Trip,
    WithId,
};
use utility::id::Id;

/// One immutable real-time poll result. Replaced wholesale; never mutated
/// in place.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub vehicles: HashMap<String, RealtimeVehicle>,
    pub trip_updates: HashMap<(String, NaiveDate), RealtimeTripUpdate>,
    pub alerts: Vec<WithId<ServiceAlert>>,
}

impl Snapshot {
    pub fn trip_update(
        &self,
        trip_id: &Id<Trip>,
        service_date: NaiveDate,
    ) -> Option<&RealtimeTripUpdate> {
        self.trip_updates.get(&(trip_id.raw(), service_date))
    }

    pub fn vehicle(&self, vehicle_id: &str) -> Option<&RealtimeVehicle> {
        self.vehicles.get(vehicle_id)
    }
}

/// A shared, swappable handle to the current snapshot. Cloning the handle
/// is cheap (an `Arc` bump); cloning the snapshot it points to happens once
/// per read, not once per field access.
#[derive(Clone, Default)]
pub struct SnapshotHandle {
    inner: Arc<RwLock<Arc<Snapshot>>>,
}

impl SnapshotHandle {
    pub fn new(initial: Snapshot) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(initial))),
        }
    }

    /// Takes a consistent view of the snapshot for the lifetime of one
    /// request. Every read within that request sees the same data, even if
    /// a swap happens concurrently (§5's "same snapshot within one
    /// request" guarantee).
    pub fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&self.inner.read().expect("snapshot lock poisoned"))
    }

    /// Atomically replaces the snapshot. Readers already holding an `Arc`
    /// from `current()` keep seeing the old data until they re-call it.
    pub fn swap(&self, new_snapshot: Snapshot) {
        let mut guard = self.inner.write().expect("snapshot lock poisoned");
        *guard = Arc::new(new_snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_replaces_data_for_new_reads() {
        let handle = SnapshotHandle::default();
        assert!(handle.current().vehicles.is_empty());

        let mut snapshot = Snapshot::default();
        snapshot
            .vehicles
            .insert("v1".to_owned(), sample_vehicle());
        handle.swap(snapshot);

        assert_eq!(handle.current().vehicles.len(), 1);
    }

    #[test]
    fn in_flight_reference_unaffected_by_later_swap() {
        let handle = SnapshotHandle::default();
        let held = handle.current();

        let mut snapshot = Snapshot::default();
        snapshot
            .vehicles
            .insert("v1".to_owned(), sample_vehicle());
        handle.swap(snapshot);

        assert!(held.vehicles.is_empty());
        assert_eq!(handle.current().vehicles.len(), 1);
    }

    fn sample_vehicle() -> RealtimeVehicle {
        RealtimeVehicle {
            trip_id: None,
            route_id: None,
            position: None,
            timestamp: None,
            current_stop_sequence: None,
            current_stop_id: None,
            current_status: None,
            schedule_relationship: model::realtime::ScheduleRelationship::Scheduled,
            occupancy_status: None,
        }
    }
}
