//! Shape polyline encoding (§4.10): the store hands back an ordered list of
//! lat/lon points; this module is the only place that turns those into the
//! encoded polyline string the response envelope carries.

use geo_types::Coord;
use model::shape::ShapePoint;

/// Google's polyline encoding precision (five decimal digits), the
/// convention the wire format commits to.
const PRECISION: u32 = 5;

#[derive(Debug, Clone, thiserror::Error)]
#[error("failed to encode shape polyline: {0}")]
pub struct EncodeError(String);

/// Encodes `points` (already ordered by `sequence`) into a polyline string,
/// along with the point count and total length the envelope reports
/// alongside it.
pub fn encode(points: &[ShapePoint]) -> Result<EncodedShape, EncodeError> {
    let coordinates = points.iter().map(|point| Coord {
        x: point.longitude,
        y: point.latitude,
    });
    let polyline = polyline::encode_coordinates(coordinates, PRECISION).map_err(EncodeError)?;

    let length_meters = points
        .last()
        .and_then(|point| point.dist_traveled_meters)
        .unwrap_or(0.0);

    Ok(EncodedShape {
        points: polyline,
        length: points.len(),
        length_meters,
    })
}

#[derive(Debug, Clone, serde::Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EncodedShape {
    /// The encoded polyline string.
    pub points: String,
    pub length: usize,
    pub length_meters: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_points_in_sequence_order() {
        let points = vec![
            ShapePoint {
                latitude: 54.3233,
                longitude: 10.1228,
                sequence: 1,
                dist_traveled_meters: Some(0.0),
            },
            ShapePoint {
                latitude: 54.3241,
                longitude: 10.1235,
                sequence: 2,
                dist_traveled_meters: Some(95.0),
            },
        ];
        let encoded = encode(&points).unwrap();
        assert_eq!(encoded.length, 2);
        assert_eq!(encoded.length_meters, 95.0);
        assert!(!encoded.points.is_empty());
    }

    #[test]
    fn empty_shape_encodes_to_empty_polyline() {
        let encoded = encode(&[]).unwrap();
        assert_eq!(encoded.length, 0);
        assert_eq!(encoded.points, "");
    }
}
