//! Great-circle distance/bearing and the steering decision derived from them.
//!
//! Coordinates are carried as `f64` degrees and reduced with `libm` so that
//! legs of a few meters keep their resolution on an FPU-less `f64` path.
//! Angles handed to the helm are `f32` degrees.

use libm::{atan2, cos, sin, sqrt};

/// Mean Earth radius used for waypoint distances (meters).
pub const EARTH_RADIUS_M: f64 = 6_372_795.0;

/// Which way the rudder should swing to reach a bearing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Left,
    Right,
    Straight,
}

/// Haversine distance in meters between two positions given in degrees.
pub fn distance_between(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f32 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();

    let sin_dlat = sin(dlat / 2.0);
    let sin_dlon = sin(dlon / 2.0);
    let a = sin_dlat * sin_dlat + cos(lat1_rad) * cos(lat2_rad) * sin_dlon * sin_dlon;
    // Rounding can push `a` a hair past 1 for antipodal points
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * atan2(sqrt(a), sqrt(1.0 - a));

    (EARTH_RADIUS_M * c) as f32
}

/// Initial great-circle bearing from point 1 to point 2, in [0, 360).
pub fn course_to(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f32 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let dlon = (lon2 - lon1).to_radians();

    let y = sin(dlon) * cos(lat2_rad);
    let x = cos(lat1_rad) * sin(lat2_rad) - sin(lat1_rad) * cos(lat2_rad) * cos(dlon);

    let mut course = atan2(y, x).to_degrees();
    if course < 0.0 {
        course += 360.0;
    }

    let course = course as f32;
    if course >= 360.0 {
        0.0
    } else {
        course
    }
}

/// Decide which way to turn to bring `current` onto `destination`.
///
/// The raw difference is never normalised: its sign together with whether
/// it spans more than half a circle picks the shorter turn.
pub fn direction_to_bearing(destination: f32, current: f32, tolerance: f32) -> Direction {
    let diff = destination - current;
    let abs_diff = if diff < 0.0 { -diff } else { diff };
    let negative = diff < 0.0;
    let large = abs_diff > 180.0;

    if abs_diff <= tolerance {
        return Direction::Straight;
    }

    match (negative, large) {
        (false, false) => Direction::Right,
        (false, true) => Direction::Left,
        (true, false) => Direction::Left,
        (true, true) => Direction::Right,
    }
}

/// Apply magnetic declination to a raw compass heading, wrapping once.
///
/// An east declination is positive. `declination` must lie in (-360, 360).
pub fn correct_heading(raw: f32, declination: f32) -> f32 {
    let mut heading = raw - declination;

    if heading < 0.0 {
        heading += 360.0;
    }
    if heading >= 360.0 {
        heading -= 360.0;
    }

    heading
}
