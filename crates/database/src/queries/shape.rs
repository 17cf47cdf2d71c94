use model::shape::{Shape, ShapePoint};
use sqlx::PgPool;
use transit_engine::store::StoreResult;
use utility::id::Id;

use crate::{error::convert_error, rows::shape::ShapePointRow};

pub async fn get(pool: &PgPool, id: &Id<Shape>) -> StoreResult<Option<Vec<ShapePoint>>> {
    let rows = sqlx::query_as::<_, ShapePointRow>(
        "SELECT sequence, latitude, longitude, dist_traveled_meters
         FROM shape_points WHERE shape_id = $1 ORDER BY sequence ASC",
    )
    .bind(id.raw())
    .fetch_all(pool)
    .await
    .map_err(convert_error)?;

    if rows.is_empty() {
        return Ok(None);
    }
    Ok(Some(rows.into_iter().map(ShapePoint::from).collect()))
}
