use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};
use utility::id::{HasId, Id};

use crate::agency::Agency;

#[derive(Debug, Clone, Copy, Serialize_repr, Deserialize_repr, JsonSchema, PartialEq, Eq)]
#[repr(i16)]
pub enum LocationType {
    Stop = 0,
    Station = 1,
    EntranceOrExit = 2,
    GenericNode = 3,
    BoardingArea = 4,
}

#[derive(Debug, Clone, Copy, Serialize_repr, Deserialize_repr, JsonSchema, PartialEq, Eq)]
#[repr(i16)]
pub enum WheelchairBoarding {
    Inherited = 0,
    Accessible = 1,
    NotAccessible = 2,
}

/// `-90 <= lat <= 90`, `-180 <= lon <= 180`. Constructors reject values
/// outside range rather than storing and hoping nothing downstream reads
/// them — geodesy and shape projection both assume valid coordinates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvalidCoordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, InvalidCoordinates> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude)
        {
            return Err(InvalidCoordinates {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    pub agency_id: Id<Agency>,
    pub code: Option<String>,
    pub name: Option<String>,
    pub location: Coordinates,
    pub location_type: LocationType,
    pub wheelchair_boarding: Option<WheelchairBoarding>,
    pub direction: Option<String>,
    pub parent_station: Option<Id<Stop>>,
}

impl HasId for Stop {
    type IdType = String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_latitude() {
        assert!(Coordinates::new(91.0, 10.0).is_err());
    }

    #[test]
    fn rejects_out_of_range_longitude() {
        assert!(Coordinates::new(54.0, 181.0).is_err());
    }

    #[test]
    fn accepts_boundary_values() {
        assert!(Coordinates::new(90.0, 180.0).is_ok());
        assert!(Coordinates::new(-90.0, -180.0).is_ok());
    }
}
