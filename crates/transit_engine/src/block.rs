//! The block-sequence resolver (§4.9): orders the trips sharing a block id
//! into the sequence a single vehicle actually drives them in on a given
//! service date, and answers "what trip comes next/previous on this
//! vehicle's block".

use model::{block::BlockTripSummary, trip::Trip};
use utility::id::Id;

use crate::store::BlockTripRow;

/// Resolves `rows` (already scoped to one block id and agency) into a
/// service-date-ordered sequence, keeping only trips whose `service_id` is
/// in `active_service_ids`. `block_sequence` is a bijection onto
/// `[0, result.len())` — ties in `first_departure_nanos` are broken by
/// `trip_id` for a deterministic, if arbitrary, order.
pub fn resolve_sequence(
    mut rows: Vec<BlockTripRow>,
    active_service_ids: &[Id<model::calendar::Service>],
    stop_time_counts: &std::collections::HashMap<String, usize>,
) -> Vec<BlockTripSummary> {
    rows.retain(|row| active_service_ids.iter().any(|id| id.raw() == row.service_id.raw()));
    rows.sort_by(|a, b| {
        a.first_departure_nanos
            .cmp(&b.first_departure_nanos)
            .then_with(|| a.trip_id.raw().cmp(&b.trip_id.raw()))
    });

    let mut accumulated = 0usize;
    rows.into_iter()
        .enumerate()
        .map(|(index, row)| {
            let count = stop_time_counts.get(&row.trip_id.raw()).copied().unwrap_or(0);
            let summary = BlockTripSummary {
                trip_id: row.trip_id,
                block_sequence: index,
                accumulated_stop_time_count: accumulated,
            };
            accumulated += count;
            summary
        })
        .collect()
}

/// Finds `trip_id` in the resolved sequence and returns its predecessor and
/// successor, if any.
pub fn neighbors(
    sequence: &[BlockTripSummary],
    trip_id: &Id<Trip>,
) -> Option<(Option<&BlockTripSummary>, Option<&BlockTripSummary>)> {
    let position = sequence
        .iter()
        .position(|summary| summary.trip_id.raw() == trip_id.raw())?;
    let previous = position.checked_sub(1).and_then(|i| sequence.get(i));
    let next = sequence.get(position + 1);
    Some((previous, next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn row(trip: &str, service: &str, departure: i64) -> BlockTripRow {
        BlockTripRow {
            trip_id: Id::new(trip.to_owned()),
            service_id: Id::new(service.to_owned()),
            first_departure_nanos: departure,
        }
    }

    #[test]
    fn orders_by_first_departure() {
        let rows = vec![row("t2", "svc", 2_000), row("t1", "svc", 1_000)];
        let active = vec![Id::new("svc".to_owned())];
        let sequence = resolve_sequence(rows, &active, &HashMap::new());
        assert_eq!(sequence[0].trip_id.raw(), "t1");
        assert_eq!(sequence[1].trip_id.raw(), "t2");
        assert_eq!(sequence[0].block_sequence, 0);
        assert_eq!(sequence[1].block_sequence, 1);
    }

    #[test]
    fn filters_out_inactive_services() {
        let rows = vec![row("t1", "svc-a", 1_000), row("t2", "svc-b", 2_000)];
        let active = vec![Id::new("svc-a".to_owned())];
        let sequence = resolve_sequence(rows, &active, &HashMap::new());
        assert_eq!(sequence.len(), 1);
        assert_eq!(sequence[0].trip_id.raw(), "t1");
    }

    #[test]
    fn accumulated_stop_time_count_sums_predecessors() {
        let rows = vec![row("t1", "svc", 1_000), row("t2", "svc", 2_000)];
        let active = vec![Id::new("svc".to_owned())];
        let mut counts = HashMap::new();
        counts.insert("t1".to_owned(), 5);
        counts.insert("t2".to_owned(), 7);
        let sequence = resolve_sequence(rows, &active, &counts);
        assert_eq!(sequence[0].accumulated_stop_time_count, 0);
        assert_eq!(sequence[1].accumulated_stop_time_count, 5);
    }

    #[test]
    fn neighbors_finds_predecessor_and_successor() {
        let rows = vec![
            row("t1", "svc", 1_000),
            row("t2", "svc", 2_000),
            row("t3", "svc", 3_000),
        ];
        let active = vec![Id::new("svc".to_owned())];
        let sequence = resolve_sequence(rows, &active, &HashMap::new());
        let (prev, next) = neighbors(&sequence, &Id::new("t2".to_owned())).unwrap();
        assert_eq!(prev.unwrap().trip_id.raw(), "t1");
        assert_eq!(next.unwrap().trip_id.raw(), "t3");
    }
}
