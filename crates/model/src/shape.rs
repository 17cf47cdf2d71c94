use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::id::HasId;

/// An ordered point on a shape's polyline. `sequence` values are unique and
/// strictly increasing within a shape.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShapePoint {
    pub latitude: f64,
    pub longitude: f64,
    pub sequence: i32,
    pub dist_traveled_meters: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Shape {
    pub points: Vec<ShapePoint>,
}

impl HasId for Shape {
    type IdType = String;
}

impl Shape {
    /// `sequence` values unique and strictly increasing within a shape.
    pub fn has_strictly_increasing_sequence(&self) -> bool {
        self.points
            .windows(2)
            .all(|window| window[0].sequence < window[1].sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_non_increasing_sequence() {
        let shape = Shape {
            points: vec![
                ShapePoint {
                    latitude: 54.3,
                    longitude: 10.1,
                    sequence: 1,
                    dist_traveled_meters: None,
                },
                ShapePoint {
                    latitude: 54.31,
                    longitude: 10.11,
                    sequence: 1,
                    dist_traveled_meters: None,
                },
            ],
        };
        assert!(!shape.has_strictly_increasing_sequence());
    }
}
