//! Geodesy primitives: great-circle distance, bounding boxes, and
//! point-to-segment projection used to place a GPS fix on a shape.

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Below this span the earth looks flat enough that an equirectangular
/// approximation and a haversine calculation agree to sub-meter precision.
const FAST_PATH_DEGREES: f64 = 0.2;

fn to_radians(degrees: f64) -> f64 {
    degrees * std::f64::consts::PI / 180.0
}

fn to_degrees(radians: f64) -> f64 {
    radians * 180.0 / std::f64::consts::PI
}

fn haversine_distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = to_radians(lat1);
    let lon1_rad = to_radians(lon1);
    let lat2_rad = to_radians(lat2);
    let lon2_rad = to_radians(lon2);

    let dlat = lat2_rad - lat1_rad;
    let dlon = lon2_rad - lon1_rad;

    let a = (dlat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

fn equirectangular_distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = to_radians(lat1);
    let lat2_rad = to_radians(lat2);
    let mean_lat = (lat1_rad + lat2_rad) / 2.0;

    let x = to_radians(lon2 - lon1) * mean_lat.cos();
    let y = lat2_rad - lat1_rad;

    EARTH_RADIUS_M * (x * x + y * y).sqrt()
}

/// Distance in meters between two points. Symmetric and non-negative;
/// satisfies the triangle inequality within floating-point tolerance.
///
/// Uses the cheaper equirectangular approximation whenever both the
/// latitude and longitude spans are under [`FAST_PATH_DEGREES`] (roughly
/// 22 km near the equator), falling back to full haversine otherwise.
pub fn distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    if (lat1 - lat2).abs() < FAST_PATH_DEGREES
        && (lon1 - lon2).abs() < FAST_PATH_DEGREES
    {
        equirectangular_distance_m(lat1, lon1, lat2, lon2)
    } else {
        haversine_distance_m(lat1, lon1, lat2, lon2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat
            && lat <= self.max_lat
            && lon >= self.min_lon
            && lon <= self.max_lon
    }
}

/// Bounding box around `(lat, lon)` with the given radius in meters.
/// Longitude span widens toward the poles to keep the box roughly square
/// on the ground.
pub fn bounds_from_radius(lat: f64, lon: f64, radius_m: f64) -> BoundingBox {
    let lat_rad = to_radians(lat);

    let lat_delta = to_degrees(radius_m / EARTH_RADIUS_M);
    // guard against the degenerate pole case where cos(lat) ~ 0.
    let lon_divisor = (EARTH_RADIUS_M * lat_rad.cos()).max(1.0);
    let lon_delta = to_degrees(radius_m / lon_divisor);

    BoundingBox {
        min_lat: lat - lat_delta,
        max_lat: lat + lat_delta,
        min_lon: lon - lon_delta,
        max_lon: lon + lon_delta,
    }
}

/// Whether two bounding boxes overlap at all (true unless one is strictly
/// outside the other on some axis).
pub fn bounds_overlap(a: &BoundingBox, b: &BoundingBox) -> bool {
    a.min_lat <= b.max_lat
        && a.max_lat >= b.min_lat
        && a.min_lon <= b.max_lon
        && a.max_lon >= b.min_lon
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentProjection {
    /// Distance in meters from the point to its projection on the segment.
    pub distance_m: f64,
    /// Parametric position of the projection along the segment, clamped to
    /// [0, 1] (0 = segment start `a`, 1 = segment end `b`).
    pub ratio: f64,
}

/// Projects `(lat, lon)` onto the line segment `a -> b`, working in a local
/// equirectangular plane centered on the segment (accurate for the
/// inter-stop distances shapes are projected over) and reporting the
/// geodesic distance back to the true surface point.
pub fn project_point_to_segment(
    lat: f64,
    lon: f64,
    a_lat: f64,
    a_lon: f64,
    b_lat: f64,
    b_lon: f64,
) -> SegmentProjection {
    let mean_lat = to_radians((a_lat + b_lat) / 2.0);
    let cos_mean_lat = mean_lat.cos();

    // project onto a local tangent plane, x = east-west, y = north-south,
    // in units of degrees-of-latitude.
    let to_plane = |pt_lat: f64, pt_lon: f64| -> (f64, f64) {
        ((pt_lon - a_lon) * cos_mean_lat, pt_lat - a_lat)
    };

    let (px, py) = to_plane(lat, lon);
    let (bx, by) = to_plane(b_lat, b_lon);

    let segment_len_sq = bx * bx + by * by;
    let ratio = if segment_len_sq <= f64::EPSILON {
        0.0
    } else {
        ((px * bx + py * by) / segment_len_sq).clamp(0.0, 1.0)
    };

    let proj_lat = a_lat + ratio * (b_lat - a_lat);
    let proj_lon = a_lon + ratio * (b_lon - a_lon);

    SegmentProjection {
        distance_m: distance_m(lat, lon, proj_lat, proj_lon),
        ratio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_symmetric() {
        let d1 = distance_m(54.32, 10.13, 54.40, 10.20);
        let d2 = distance_m(54.40, 10.20, 54.32, 10.13);
        assert!((d1 - d2).abs() < 1e-6);
    }

    #[test]
    fn distance_is_zero_for_identical_points() {
        assert_eq!(distance_m(54.0, 10.0, 54.0, 10.0), 0.0);
    }

    #[test]
    fn triangle_inequality_holds_with_epsilon() {
        let a = (54.32, 10.13);
        let b = (54.40, 10.20);
        let c = (54.50, 10.05);
        let ab = distance_m(a.0, a.1, b.0, b.1);
        let bc = distance_m(b.0, b.1, c.0, c.1);
        let ac = distance_m(a.0, a.1, c.0, c.1);
        assert!(ac <= ab + bc + 1.0);
    }

    #[test]
    fn fast_path_and_haversine_roughly_agree() {
        let fast = distance_m(54.32, 10.13, 54.33, 10.14);
        let slow = haversine_distance_m(54.32, 10.13, 54.33, 10.14);
        assert!((fast - slow).abs() < 1.0);
    }

    #[test]
    fn bounds_from_radius_contains_center() {
        let bbox = bounds_from_radius(54.32, 10.13, 500.0);
        assert!(bbox.contains(54.32, 10.13));
    }

    #[test]
    fn bounds_overlap_detects_disjoint_boxes() {
        let a = bounds_from_radius(54.32, 10.13, 100.0);
        let far = bounds_from_radius(10.0, 10.0, 100.0);
        assert!(!bounds_overlap(&a, &far));
        assert!(bounds_overlap(&a, &a));
    }

    #[test]
    fn projection_ratio_is_clamped() {
        // point far beyond segment end b.
        let projection =
            project_point_to_segment(54.50, 10.50, 54.32, 10.13, 54.33, 10.14);
        assert_eq!(projection.ratio, 1.0);
        assert!(projection.distance_m >= 0.0);
    }

    #[test]
    fn projection_distance_never_negative() {
        let projection =
            project_point_to_segment(54.325, 10.135, 54.32, 10.13, 54.33, 10.14);
        assert!(projection.distance_m >= 0.0);
        assert!(projection.ratio >= 0.0 && projection.ratio <= 1.0);
    }
}
