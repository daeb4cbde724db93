//! Property-based checks for the great-circle helpers and the radius filter.

use proptest::prelude::*;
use rental_scout::geo::{destination_point, distance, GeoPoint, EARTH_RADIUS_M};
use rental_scout::search::is_within_radius;

fn point() -> impl Strategy<Value = GeoPoint> {
    (-89.0f64..89.0, -180.0f64..180.0).prop_map(|(lat, lon)| GeoPoint::new(lat, lon))
}

proptest! {
    #[test]
    fn distance_to_self_is_zero(a in point()) {
        prop_assert!(distance(a, a).abs() < 1e-6);
    }

    #[test]
    fn distance_is_symmetric(a in point(), b in point()) {
        prop_assert!((distance(a, b) - distance(b, a)).abs() < 1e-6);
    }

    #[test]
    fn distance_is_bounded_by_half_circumference(a in point(), b in point()) {
        let d = distance(a, b);
        prop_assert!(d >= 0.0);
        prop_assert!(d <= std::f64::consts::PI * EARTH_RADIUS_M + 1e-3);
    }

    #[test]
    fn triangle_inequality(a in point(), b in point(), c in point()) {
        prop_assert!(distance(a, c) <= distance(a, b) + distance(b, c) + 1e-3);
    }

    #[test]
    fn within_radius_agrees_with_distance(a in point(), b in point(), r in 0.0f64..2.0e7) {
        prop_assert_eq!(is_within_radius(a, b, r), distance(a, b) <= r);
    }

    #[test]
    fn destination_lies_at_requested_distance(
        origin in (-80.0f64..80.0, -180.0f64..180.0).prop_map(|(lat, lon)| GeoPoint::new(lat, lon)),
        meters in 1.0f64..50_000.0,
        bearing in 0.0f64..360.0,
    ) {
        let target = destination_point(origin, meters, bearing);
        prop_assert!((distance(origin, target) - meters).abs() < 1e-3);
        prop_assert!((-180.0..180.0).contains(&target.longitude));
    }
}
