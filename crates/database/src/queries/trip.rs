use model::{trip::StopTime, WithId};
use sqlx::PgPool;
use transit_engine::store::{BlockTripRow, StoreResult};
use utility::id::Id;

use crate::{error::convert_error, rows::{stop_time::StopTimeRow, trip::TripRow}};

const COLUMNS: &str = "id, route_id, service_id, headsign, short_name, direction_id,
                       block_id, shape_id, wheelchair_accessible, bikes_allowed";

pub async fn get(pool: &PgPool, id: &Id<model::trip::Trip>) -> StoreResult<Option<WithId<model::trip::Trip>>> {
    sqlx::query_as::<_, TripRow>(&format!("SELECT {COLUMNS} FROM trips WHERE id = $1"))
        .bind(id.raw())
        .fetch_optional(pool)
        .await
        .map_err(convert_error)
        .map(|row| row.map(WithId::from))
}

pub async fn get_many(pool: &PgPool, ids: &[Id<model::trip::Trip>]) -> StoreResult<Vec<WithId<model::trip::Trip>>> {
    let raw_ids: Vec<String> = ids.iter().map(Id::raw).collect();
    sqlx::query_as::<_, TripRow>(&format!("SELECT {COLUMNS} FROM trips WHERE id = ANY($1)"))
        .bind(raw_ids)
        .fetch_all(pool)
        .await
        .map_err(convert_error)
        .map(|rows| rows.into_iter().map(WithId::from).collect())
}

/// Ordered by `stopSequence` ascending, as the store contract requires.
pub async fn stop_times_for_trip(
    pool: &PgPool,
    trip_id: &Id<model::trip::Trip>,
) -> StoreResult<Vec<StopTime>> {
    let rows = sqlx::query_as::<_, StopTimeRow>(
        "SELECT trip_id, stop_sequence, stop_id, arrival_time_nanos, departure_time_nanos,
                stop_headsign, pickup_type, drop_off_type, shape_dist_traveled_meters
         FROM stop_times WHERE trip_id = $1 ORDER BY stop_sequence ASC",
    )
    .bind(trip_id.raw())
    .fetch_all(pool)
    .await
    .map_err(convert_error)?;
    rows.into_iter()
        .map(StopTime::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(Into::into)
}

pub async fn stop_times_at_stop_in_window(
    pool: &PgPool,
    stop_id: &Id<model::stop::Stop>,
    window_start_nanos: i64,
    window_end_nanos: i64,
) -> StoreResult<Vec<StopTime>> {
    let rows = sqlx::query_as::<_, StopTimeRow>(
        "SELECT trip_id, stop_sequence, stop_id, arrival_time_nanos, departure_time_nanos,
                stop_headsign, pickup_type, drop_off_type, shape_dist_traveled_meters
         FROM stop_times
         WHERE stop_id = $1 AND departure_time_nanos BETWEEN $2 AND $3
         ORDER BY departure_time_nanos ASC",
    )
    .bind(stop_id.raw())
    .bind(window_start_nanos)
    .bind(window_end_nanos)
    .fetch_all(pool)
    .await
    .map_err(convert_error)?;
    rows.into_iter()
        .map(StopTime::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(Into::into)
}

#[derive(sqlx::FromRow)]
struct BlockTripQueryRow {
    trip_id: String,
    service_id: String,
    first_departure_nanos: i64,
}

/// One row per trip sharing `block_id`, carrying each trip's earliest
/// departure so `transit_engine::block::resolve_sequence` can order them
/// without a second round trip.
pub async fn trips_for_block(
    pool: &PgPool,
    agency_id: &Id<model::agency::Agency>,
    block_id: &str,
) -> StoreResult<Vec<BlockTripRow>> {
    let rows = sqlx::query_as::<_, BlockTripQueryRow>(
        "SELECT trips.id AS trip_id, trips.service_id AS service_id,
                MIN(stop_times.departure_time_nanos) AS first_departure_nanos
         FROM trips
         JOIN stop_times ON stop_times.trip_id = trips.id
         WHERE trips.agency_id = $1 AND trips.block_id = $2
         GROUP BY trips.id, trips.service_id",
    )
    .bind(agency_id.raw())
    .bind(block_id)
    .fetch_all(pool)
    .await
    .map_err(convert_error)?;

    Ok(rows
        .into_iter()
        .map(|row| BlockTripRow {
            trip_id: Id::new(row.trip_id),
            service_id: Id::new(row.service_id),
            first_departure_nanos: row.first_departure_nanos,
        })
        .collect())
}
