//! Sun geometry: azimuth difference and window-hit test.

use serde::{Deserialize, Serialize};

use crate::config::AutomationConfig;

/// Current sun position from the astronomy feed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SunPosition {
    /// Angle above the horizon (degrees; negative below).
    pub elevation: f64,
    /// Compass angle (degrees, 0 = north).
    pub azimuth: f64,
}

/// Smallest absolute difference between two compass angles, normalized to
/// [0, 180].
pub fn angle_difference(a: f64, b: f64) -> f64 {
    let diff = (a - b).abs().rem_euclid(360.0);
    if diff > 180.0 { 360.0 - diff } else { diff }
}

/// Geometry result for one cover.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunHit {
    /// Sun shines into the window: elevation at or above the threshold and
    /// azimuth difference inside the tolerance.
    pub hitting: bool,
    /// Absolute sun/cover azimuth difference (degrees, 0–180).
    pub azimuth_difference: f64,
}

/// Evaluate whether the sun hits a window facing `cover_azimuth`.
///
/// Below the elevation threshold the sun is never considered hitting,
/// whatever the azimuth difference.
pub fn evaluate_hit(config: &AutomationConfig, sun: SunPosition, cover_azimuth: f64) -> SunHit {
    let azimuth_difference = angle_difference(sun.azimuth, cover_azimuth);
    let hitting = sun.elevation >= config.sun_elevation_threshold
        && azimuth_difference < config.sun_azimuth_tolerance;
    SunHit {
        hitting,
        azimuth_difference,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angle_difference_basic() {
        assert_eq!(angle_difference(180.0, 180.0), 0.0);
        assert_eq!(angle_difference(180.0, 90.0), 90.0);
        assert_eq!(angle_difference(90.0, 180.0), 90.0);
    }

    #[test]
    fn angle_difference_wraps_at_north() {
        assert_eq!(angle_difference(350.0, 10.0), 20.0);
        assert_eq!(angle_difference(10.0, 350.0), 20.0);
        assert_eq!(angle_difference(0.0, 359.0), 1.0);
    }

    #[test]
    fn angle_difference_max_is_opposite() {
        assert_eq!(angle_difference(0.0, 180.0), 180.0);
        assert_eq!(angle_difference(90.0, 270.0), 180.0);
    }

    #[test]
    fn low_sun_never_hits() {
        let config = AutomationConfig::default();
        let sun = SunPosition {
            elevation: config.sun_elevation_threshold - 1.0,
            azimuth: 180.0,
        };
        let hit = evaluate_hit(&config, sun, 180.0);
        assert!(!hit.hitting);
        assert_eq!(hit.azimuth_difference, 0.0);
    }

    #[test]
    fn direct_hit_inside_tolerance() {
        let config = AutomationConfig::default();
        let sun = SunPosition {
            elevation: 35.0,
            azimuth: 180.0,
        };
        assert!(evaluate_hit(&config, sun, 180.0).hitting);
        assert!(evaluate_hit(&config, sun, 180.0 + config.sun_azimuth_tolerance - 1.0).hitting);
    }

    #[test]
    fn outside_tolerance_misses() {
        let config = AutomationConfig::default();
        let sun = SunPosition {
            elevation: 35.0,
            azimuth: 180.0,
        };
        // Difference equal to the tolerance is not a hit (strict less-than).
        assert!(!evaluate_hit(&config, sun, 180.0 + config.sun_azimuth_tolerance).hitting);
        assert!(!evaluate_hit(&config, sun, 0.0).hitting);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn difference_always_in_0_180(a in 0.0f64..360.0, b in 0.0f64..360.0) {
            let d = angle_difference(a, b);
            prop_assert!((0.0..=180.0).contains(&d));
        }

        #[test]
        fn difference_is_symmetric(a in 0.0f64..360.0, b in 0.0f64..360.0) {
            prop_assert!((angle_difference(a, b) - angle_difference(b, a)).abs() < 1e-9);
        }

        #[test]
        fn difference_invariant_under_full_turns(a in 0.0f64..360.0, b in 0.0f64..360.0) {
            prop_assert!((angle_difference(a + 360.0, b) - angle_difference(a, b)).abs() < 1e-9);
        }
    }
}
