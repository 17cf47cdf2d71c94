use model::{
    route::{ContinuousPolicy, Route, RouteType},
    WithId,
};
use utility::id::Id;

use crate::error::RowDecodeError;

#[derive(Debug, sqlx::FromRow)]
pub struct RouteRow {
    pub id: String,
    pub agency_id: String,
    pub short_name: Option<String>,
    pub long_name: Option<String>,
    pub description: Option<String>,
    pub route_type: i16,
    pub url: Option<String>,
    pub color: Option<String>,
    pub text_color: Option<String>,
    pub continuous_pickup: Option<i16>,
    pub continuous_drop_off: Option<i16>,
}

fn route_type_from_repr(value: i16) -> Result<RouteType, RowDecodeError> {
    Ok(match value {
        0 => RouteType::TramStreetcarOrLightRail,
        1 => RouteType::SubwayOrMetro,
        2 => RouteType::Rail,
        3 => RouteType::Bus,
        4 => RouteType::Ferry,
        5 => RouteType::CableTram,
        6 => RouteType::AerialLiftOrSuspendedCableCar,
        7 => RouteType::Funicular,
        11 => RouteType::Trolleybus,
        12 => RouteType::Monorail,
        other => return Err(RowDecodeError::new("routes.route_type", other)),
    })
}

fn continuous_policy_from_repr(value: i16) -> Result<ContinuousPolicy, RowDecodeError> {
    Ok(match value {
        0 => ContinuousPolicy::Continuous,
        1 => ContinuousPolicy::NoneAvailable,
        2 => ContinuousPolicy::PhoneAgency,
        3 => ContinuousPolicy::CoordinateWithDriver,
        other => return Err(RowDecodeError::new("routes.continuous_pickup", other)),
    })
}

impl TryFrom<RouteRow> for WithId<Route> {
    type Error = RowDecodeError;

    fn try_from(row: RouteRow) -> Result<Self, Self::Error> {
        Ok(WithId::new(
            Id::new(row.id),
            Route {
                agency_id: Id::new(row.agency_id),
                short_name: row.short_name,
                long_name: row.long_name,
                description: row.description,
                kind: route_type_from_repr(row.route_type)?,
                url: row.url,
                color: row.color,
                text_color: row.text_color,
                continuous_pickup: row
                    .continuous_pickup
                    .map(continuous_policy_from_repr)
                    .transpose()?,
                continuous_drop_off: row
                    .continuous_drop_off
                    .map(continuous_policy_from_repr)
                    .transpose()?,
            },
        ))
    }
}
