use model::trip::{StopTime, StopTimeAvailability};
use utility::id::Id;

use crate::error::RowDecodeError;

#[derive(Debug, sqlx::FromRow)]
pub struct StopTimeRow {
    pub trip_id: String,
    pub stop_sequence: i32,
    pub stop_id: String,
    pub arrival_time_nanos: i64,
    pub departure_time_nanos: i64,
    pub stop_headsign: Option<String>,
    pub pickup_type: i16,
    pub drop_off_type: i16,
    pub shape_dist_traveled_meters: Option<f64>,
}

fn availability_from_repr(value: i16) -> Result<StopTimeAvailability, RowDecodeError> {
    Ok(match value {
        0 => StopTimeAvailability::RegularlyScheduled,
        1 => StopTimeAvailability::NoneAvailable,
        2 => StopTimeAvailability::PhoneAgency,
        3 => StopTimeAvailability::CoordinateWithDriver,
        other => return Err(RowDecodeError::new("stop_times.pickup_type", other)),
    })
}

impl TryFrom<StopTimeRow> for StopTime {
    type Error = RowDecodeError;

    fn try_from(row: StopTimeRow) -> Result<Self, Self::Error> {
        Ok(StopTime {
            trip_id: Id::new(row.trip_id),
            stop_sequence: row.stop_sequence,
            stop_id: Id::new(row.stop_id),
            arrival_time_nanos: row.arrival_time_nanos,
            departure_time_nanos: row.departure_time_nanos,
            stop_headsign: row.stop_headsign,
            pickup_type: availability_from_repr(row.pickup_type)?,
            drop_off_type: availability_from_repr(row.drop_off_type)?,
            shape_dist_traveled_meters: row.shape_dist_traveled_meters,
        })
    }
}
