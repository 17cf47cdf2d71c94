use model::{agency::Agency, route::Route, stop::Stop, WithId};
use sqlx::PgPool;
use transit_engine::store::StoreResult;
use utility::id::Id;

use crate::{error::convert_error, rows::route::RouteRow};

const COLUMNS: &str = "id, agency_id, short_name, long_name, description, route_type,
                       url, color, text_color, continuous_pickup, continuous_drop_off";

pub async fn get(pool: &PgPool, id: &Id<Route>) -> StoreResult<Option<WithId<Route>>> {
    let row = sqlx::query_as::<_, RouteRow>(&format!(
        "SELECT {COLUMNS} FROM routes WHERE id = $1"
    ))
    .bind(id.raw())
    .fetch_optional(pool)
    .await
    .map_err(convert_error)?;
    row.map(WithId::try_from).transpose().map_err(Into::into)
}

pub async fn get_many(pool: &PgPool, ids: &[Id<Route>]) -> StoreResult<Vec<WithId<Route>>> {
    let raw_ids: Vec<String> = ids.iter().map(Id::raw).collect();
    let rows = sqlx::query_as::<_, RouteRow>(&format!(
        "SELECT {COLUMNS} FROM routes WHERE id = ANY($1)"
    ))
    .bind(raw_ids)
    .fetch_all(pool)
    .await
    .map_err(convert_error)?;
    rows.into_iter()
        .map(WithId::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(Into::into)
}

pub async fn for_agency(pool: &PgPool, agency_id: &Id<Agency>) -> StoreResult<Vec<WithId<Route>>> {
    let rows = sqlx::query_as::<_, RouteRow>(&format!(
        "SELECT {COLUMNS} FROM routes WHERE agency_id = $1 ORDER BY short_name NULLS LAST"
    ))
    .bind(agency_id.raw())
    .fetch_all(pool)
    .await
    .map_err(convert_error)?;
    rows.into_iter()
        .map(WithId::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(Into::into)
}

pub async fn serving_stop(pool: &PgPool, stop_id: &Id<Stop>) -> StoreResult<Vec<WithId<Route>>> {
    let rows = sqlx::query_as::<_, RouteRow>(&format!(
        "SELECT DISTINCT {columns} FROM routes
         JOIN trips ON trips.route_id = routes.id
         JOIN stop_times ON stop_times.trip_id = trips.id
         WHERE stop_times.stop_id = $1",
        columns = COLUMNS
            .split(", ")
            .map(|column| format!("routes.{column}"))
            .collect::<Vec<_>>()
            .join(", "),
    ))
    .bind(stop_id.raw())
    .fetch_all(pool)
    .await
    .map_err(convert_error)?;
    rows.into_iter()
        .map(WithId::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(Into::into)
}

/// Postgres full-text search over `short_name`/`long_name`/`description`,
/// ranked by `ts_rank`. `sanitized_query` has already had boolean operators
/// and punctuation stripped by `transit_engine::search::sanitize`.
pub async fn search(pool: &PgPool, sanitized_query: &str, limit: i64) -> StoreResult<Vec<WithId<Route>>> {
    let rows = sqlx::query_as::<_, RouteRow>(&format!(
        "SELECT {COLUMNS} FROM routes
         WHERE search_vector @@ plainto_tsquery('simple', $1)
         ORDER BY ts_rank(search_vector, plainto_tsquery('simple', $1)) DESC
         LIMIT $2"
    ))
    .bind(sanitized_query)
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(convert_error)?;
    rows.into_iter()
        .map(WithId::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(Into::into)
}

