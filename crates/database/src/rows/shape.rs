use model::shape::ShapePoint;

#[derive(Debug, sqlx::FromRow)]
pub struct ShapePointRow {
    pub sequence: i32,
    pub latitude: f64,
    pub longitude: f64,
    pub dist_traveled_meters: Option<f64>,
}

impl From<ShapePointRow> for ShapePoint {
    fn from(row: ShapePointRow) -> Self {
        ShapePoint {
            latitude: row.latitude,
            longitude: row.longitude,
            sequence: row.sequence,
            dist_traveled_meters: row.dist_traveled_meters,
        }
    }
}
