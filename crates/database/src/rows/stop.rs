use model::{
    stop::{Coordinates, LocationType, Stop, WheelchairBoarding},
    WithId,
};
use utility::id::Id;

use crate::error::RowDecodeError;

#[derive(Debug, sqlx::FromRow)]
pub struct StopRow {
    pub id: String,
    pub agency_id: String,
    pub code: Option<String>,
    pub name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub location_type: i16,
    pub wheelchair_boarding: Option<i16>,
    pub direction: Option<String>,
    pub parent_station: Option<String>,
}

fn location_type_from_repr(value: i16) -> Result<LocationType, RowDecodeError> {
    Ok(match value {
        0 => LocationType::Stop,
        1 => LocationType::Station,
        2 => LocationType::EntranceOrExit,
        3 => LocationType::GenericNode,
        4 => LocationType::BoardingArea,
        other => return Err(RowDecodeError::new("stops.location_type", other)),
    })
}

fn wheelchair_boarding_from_repr(value: i16) -> Result<WheelchairBoarding, RowDecodeError> {
    Ok(match value {
        0 => WheelchairBoarding::Inherited,
        1 => WheelchairBoarding::Accessible,
        2 => WheelchairBoarding::NotAccessible,
        other => return Err(RowDecodeError::new("stops.wheelchair_boarding", other)),
    })
}

impl TryFrom<StopRow> for WithId<Stop> {
    type Error = RowDecodeError;

    fn try_from(row: StopRow) -> Result<Self, Self::Error> {
        Ok(WithId::new(
            Id::new(row.id),
            Stop {
                agency_id: Id::new(row.agency_id),
                code: row.code,
                name: row.name,
                // Coordinates were validated at ingest time; a row failing
                // that check here would mean corrupted storage, which is
                // out of scope to repair on read.
                location: Coordinates {
                    latitude: row.latitude,
                    longitude: row.longitude,
                },
                location_type: location_type_from_repr(row.location_type)?,
                wheelchair_boarding: row
                    .wheelchair_boarding
                    .map(wheelchair_boarding_from_repr)
                    .transpose()?,
                direction: row.direction,
                parent_station: row.parent_station.map(Id::new),
            },
        ))
    }
}
