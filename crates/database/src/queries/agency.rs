use model::{agency::Agency, WithId};
use sqlx::PgPool;
use transit_engine::store::StoreResult;
use utility::id::Id;

use crate::{error::convert_error, rows::agency::AgencyRow};

pub async fn get(pool: &PgPool, id: &Id<Agency>) -> StoreResult<Option<WithId<Agency>>> {
    sqlx::query_as::<_, AgencyRow>(
        "SELECT id, name, url, timezone, lang, phone, email, fare_url
         FROM agencies WHERE id = $1",
    )
    .bind(id.raw())
    .fetch_optional(pool)
    .await
    .map_err(convert_error)
    .map(|row| row.map(WithId::from))
}

pub async fn get_many(pool: &PgPool, ids: &[Id<Agency>]) -> StoreResult<Vec<WithId<Agency>>> {
    let raw_ids: Vec<String> = ids.iter().map(Id::raw).collect();
    sqlx::query_as::<_, AgencyRow>(
        "SELECT id, name, url, timezone, lang, phone, email, fare_url
         FROM agencies WHERE id = ANY($1)",
    )
    .bind(raw_ids)
    .fetch_all(pool)
    .await
    .map_err(convert_error)
    .map(|rows| rows.into_iter().map(WithId::from).collect())
}
