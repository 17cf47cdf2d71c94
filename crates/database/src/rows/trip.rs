use model::{trip::Trip, WithId};
use utility::id::Id;

#[derive(Debug, sqlx::FromRow)]
pub struct TripRow {
    pub id: String,
    pub route_id: String,
    pub service_id: String,
    pub headsign: Option<String>,
    pub short_name: Option<String>,
    pub direction_id: Option<bool>,
    pub block_id: Option<String>,
    pub shape_id: Option<String>,
    pub wheelchair_accessible: Option<bool>,
    pub bikes_allowed: Option<bool>,
}

impl From<TripRow> for WithId<Trip> {
    fn from(row: TripRow) -> Self {
        WithId::new(
            Id::new(row.id),
            Trip {
                route_id: Id::new(row.route_id),
                service_id: Id::new(row.service_id),
                headsign: row.headsign,
                short_name: row.short_name,
                direction_id: row.direction_id,
                block_id: row.block_id,
                shape_id: row.shape_id.map(Id::new),
                wheelchair_accessible: row.wheelchair_accessible,
                bikes_allowed: row.bikes_allowed,
            },
        )
    }
}
