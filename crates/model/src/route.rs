use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};
use utility::id::{HasId, Id};

use crate::agency::Agency;

/// Numeric route type, following the GTFS `routes.txt` `route_type` values.
#[derive(Debug, Clone, Copy, Serialize_repr, Deserialize_repr, JsonSchema, PartialEq, Eq)]
#[repr(i16)]
pub enum RouteType {
    TramStreetcarOrLightRail = 0,
    SubwayOrMetro = 1,
    Rail = 2,
    Bus = 3,
    Ferry = 4,
    CableTram = 5,
    AerialLiftOrSuspendedCableCar = 6,
    Funicular = 7,
    Trolleybus = 11,
    Monorail = 12,
}

/// Whether continuous pickup/drop-off is offered along a route between
/// stops, independent of individual stop-times (GTFS `continuous_pickup`/
/// `continuous_drop_off`).
#[derive(Debug, Clone, Copy, Serialize_repr, Deserialize_repr, JsonSchema, PartialEq, Eq)]
#[repr(i16)]
pub enum ContinuousPolicy {
    Continuous = 0,
    NoneAvailable = 1,
    PhoneAgency = 2,
    CoordinateWithDriver = 3,
}

/// A route belongs to exactly one agency; its externally-rendered id is
/// `"{agencyId}_{routeId}"` (see `utility::composite_id`).
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub agency_id: Id<Agency>,
    pub short_name: Option<String>,
    pub long_name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: RouteType,
    pub url: Option<String>,
    pub color: Option<String>,
    pub text_color: Option<String>,
    pub continuous_pickup: Option<ContinuousPolicy>,
    pub continuous_drop_off: Option<ContinuousPolicy>,
}

impl HasId for Route {
    type IdType = String;
}

impl Route {
    /// A human-displayable name, preferring the short name the way transit
    /// apps conventionally do for arrival boards.
    pub fn display_name(&self) -> Option<&str> {
        self.short_name
            .as_deref()
            .or(self.long_name.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_prefers_short_name() {
        let route = Route {
            agency_id: Id::new("erixx".to_owned()),
            short_name: Some("RE83".to_owned()),
            long_name: Some("Lübeck - Kiel".to_owned()),
            description: None,
            kind: RouteType::Rail,
            url: None,
            color: None,
            text_color: None,
            continuous_pickup: None,
            continuous_drop_off: None,
        };
        assert_eq!(route.display_name(), Some("RE83"));
    }

    #[test]
    fn route_type_serializes_numerically() {
        let value = serde_json::to_value(RouteType::Bus).unwrap();
        assert_eq!(value, serde_json::json!(3));
    }
}
