use model::{agency::Agency, stop::Stop, WithId};
use sqlx::PgPool;
use transit_engine::store::StoreResult;
use utility::{geo::BoundingBox, id::Id};

use crate::{error::convert_error, rows::stop::StopRow};

const COLUMNS: &str = "id, agency_id, code, name, latitude, longitude,
                       location_type, wheelchair_boarding, direction, parent_station";

pub async fn get(pool: &PgPool, id: &Id<Stop>) -> StoreResult<Option<WithId<Stop>>> {
    let row = sqlx::query_as::<_, StopRow>(&format!(
        "SELECT {COLUMNS} FROM stops WHERE id = $1"
    ))
    .bind(id.raw())
    .fetch_optional(pool)
    .await
    .map_err(convert_error)?;
    row.map(WithId::try_from).transpose().map_err(Into::into)
}

pub async fn get_many(pool: &PgPool, ids: &[Id<Stop>]) -> StoreResult<Vec<WithId<Stop>>> {
    let raw_ids: Vec<String> = ids.iter().map(Id::raw).collect();
    let rows = sqlx::query_as::<_, StopRow>(&format!(
        "SELECT {COLUMNS} FROM stops WHERE id = ANY($1)"
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

pub async fn for_agency(pool: &PgPool, agency_id: &Id<Agency>) -> StoreResult<Vec<WithId<Stop>>> {
    let rows = sqlx::query_as::<_, StopRow>(&format!(
        "SELECT {COLUMNS} FROM stops WHERE agency_id = $1 ORDER BY name NULLS LAST"
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

/// Bounding-box prefilter only; the engine (§4.1) applies the exact-radius
/// cut itself once it has real distances to sort by.
pub async fn in_bounds(pool: &PgPool, bounds: BoundingBox) -> StoreResult<Vec<WithId<Stop>>> {
    let rows = sqlx::query_as::<_, StopRow>(&format!(
        "SELECT {COLUMNS} FROM stops
         WHERE latitude BETWEEN $1 AND $2 AND longitude BETWEEN $3 AND $4"
    ))
    .bind(bounds.min_lat)
    .bind(bounds.max_lat)
    .bind(bounds.min_lon)
    .bind(bounds.max_lon)
    .fetch_all(pool)
    .await
    .map_err(convert_error)?;
    rows.into_iter()
        .map(WithId::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(Into::into)
}

pub async fn search(pool: &PgPool, sanitized_query: &str, limit: i64) -> StoreResult<Vec<WithId<Stop>>> {
    let rows = sqlx::query_as::<_, StopRow>(&format!(
        "SELECT {COLUMNS} FROM stops
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
