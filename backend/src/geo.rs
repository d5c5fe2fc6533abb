use crate::models::Coordinate;

const EARTH_RADIUS_KM: f64 = 6_371.0;
/// Metres per degree of latitude used by the flat-earth approximation.
const METRES_PER_DEGREE: f64 = 111_139.0;

pub fn approximate_distance_km(path: &[Coordinate]) -> f64 {
    path.windows(2).map(|w| haversine_km(w[0], w[1])).sum()
}

pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let sin_dlat = (dlat / 2.0).sin();
    let sin_dlon = (dlon / 2.0).sin();

    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Initial great-circle bearing from `from` to `to`, in degrees within `[0, 360)`.
///
/// North is 0°, east is 90°. Identical points yield 0°.
pub fn bearing_deg(from: Coordinate, to: Coordinate) -> f64 {
    let phi1 = from.lat.to_radians();
    let phi2 = to.lat.to_radians();
    let delta_lon = (to.lon - from.lon).to_radians();

    let x = delta_lon.sin() * phi2.cos();
    let y = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lon.cos();
    let bearing = x.atan2(y).to_degrees();

    (bearing + 360.0) % 360.0
}

/// Short-range distance in metres on a locally flat earth.
///
/// Good enough to tell GPS jitter from movement; the longitude scale uses the
/// latitude of `to`.
pub fn local_distance_m(from: Coordinate, to: Coordinate) -> f64 {
    let dlat = (to.lat - from.lat) * METRES_PER_DEGREE;
    let dlon = (to.lon - from.lon) * METRES_PER_DEGREE * to.lat.to_radians().cos();
    (dlat * dlat + dlon * dlon).sqrt()
}

/// Arithmetic mean of the given points, `None` when empty.
pub fn centroid(points: &[Coordinate]) -> Option<Coordinate> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (lat, lon) = points
        .iter()
        .fold((0.0, 0.0), |(lat, lon), p| (lat + p.lat, lon + p.lon));
    Some(Coordinate {
        lat: lat / n,
        lon: lon / n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(lat: f64, lon: f64) -> Coordinate {
        Coordinate { lat, lon }
    }

    #[test]
    fn test_haversine_same_point() {
        let point = c(45.0, 5.0);
        assert_eq!(haversine_km(point, point), 0.0);
    }

    #[test]
    fn test_haversine_symmetry() {
        let a = c(45.0, 5.0);
        let b = c(46.0, 6.0);
        assert_eq!(haversine_km(a, b), haversine_km(b, a));
    }

    #[test]
    fn test_haversine_delhi_to_chandigarh() {
        let delhi = c(28.6139, 77.2090);
        let chandigarh = c(30.7333, 76.7794);
        let d = haversine_km(delhi, chandigarh);
        assert!((d - 238.0).abs() < 5.0, "got {d}");
    }

    #[test]
    fn test_approximate_distance_empty() {
        assert_eq!(approximate_distance_km(&[]), 0.0);
    }

    #[test]
    fn test_approximate_distance_single_point() {
        assert_eq!(approximate_distance_km(&[c(45.0, 5.0)]), 0.0);
    }

    #[test]
    fn bearing_cardinal_directions() {
        let origin = c(0.0, 0.0);
        assert!((bearing_deg(origin, c(1.0, 0.0)) - 0.0).abs() < 1e-9);
        assert!((bearing_deg(origin, c(0.0, 1.0)) - 90.0).abs() < 1e-9);
        assert!((bearing_deg(origin, c(-1.0, 0.0)) - 180.0).abs() < 1e-9);
        assert!((bearing_deg(origin, c(0.0, -1.0)) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn bearing_between_known_cities() {
        // Paris to London heads roughly north-west.
        let paris = c(48.8566, 2.3522);
        let london = c(51.5074, -0.1278);
        let b = bearing_deg(paris, london);
        assert!((b - 330.0).abs() < 2.0, "got {b}");
    }

    #[test]
    fn bearing_same_point_is_zero() {
        let p = c(30.7, 76.7);
        assert_eq!(bearing_deg(p, p), 0.0);
    }

    #[test]
    fn local_distance_one_metre_north() {
        let a = c(30.0, 76.0);
        let b = c(30.0 + 1.0 / METRES_PER_DEGREE, 76.0);
        assert!((local_distance_m(a, b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn local_distance_shrinks_longitude_with_latitude() {
        let at_equator = local_distance_m(c(0.0, 0.0), c(0.0, 0.001));
        let at_sixty = local_distance_m(c(60.0, 0.0), c(60.0, 0.001));
        assert!((at_sixty - at_equator / 2.0).abs() < 1e-3);
    }

    #[test]
    fn centroid_of_points() {
        assert_eq!(centroid(&[]), None);
        let mid = centroid(&[c(10.0, 20.0), c(20.0, 40.0), c(30.0, 60.0)]).unwrap();
        assert!((mid.lat - 20.0).abs() < 1e-12);
        assert!((mid.lon - 40.0).abs() < 1e-12);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn valid_coord() -> impl Strategy<Value = Coordinate> {
            (-89.0..=89.0, -180.0..=180.0).prop_map(|(lat, lon)| Coordinate { lat, lon })
        }

        proptest! {
            #[test]
            fn prop_haversine_non_negative(a in valid_coord(), b in valid_coord()) {
                prop_assert!(haversine_km(a, b) >= 0.0);
            }

            #[test]
            fn prop_haversine_symmetric(a in valid_coord(), b in valid_coord()) {
                prop_assert!((haversine_km(a, b) - haversine_km(b, a)).abs() < 1e-9);
            }

            #[test]
            fn prop_haversine_triangle_inequality(
                a in valid_coord(),
                b in valid_coord(),
                c in valid_coord()
            ) {
                let dist_ab = haversine_km(a, b);
                let dist_bc = haversine_km(b, c);
                let dist_ac = haversine_km(a, c);
                prop_assert!(dist_ac <= dist_ab + dist_bc + 1e-6);
            }

            #[test]
            fn prop_bearing_in_range(a in valid_coord(), b in valid_coord()) {
                let bearing = bearing_deg(a, b);
                prop_assert!((0.0..360.0).contains(&bearing));
            }

            #[test]
            fn prop_centroid_within_bounds(points in prop::collection::vec(valid_coord(), 1..10)) {
                let mid = centroid(&points).unwrap();
                let min_lat = points.iter().map(|p| p.lat).fold(f64::INFINITY, f64::min);
                let max_lat = points.iter().map(|p| p.lat).fold(f64::NEG_INFINITY, f64::max);
                prop_assert!(mid.lat >= min_lat - 1e-9 && mid.lat <= max_lat + 1e-9);
            }
        }
    }
}
