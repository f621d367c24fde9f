//! Compile-time navigation configuration.
//!
//! Defaults mirror the values the boat was tuned with; the firmware overrides
//! the mission table and anything site specific (declination, home mode).

use embassy_time::Duration;

use crate::error::ConfigError;
use crate::nav::waypoint::{HomeMode, Waypoint, MAX_WAYPOINTS};

/// Navigation loop period.
pub const LOOP_UPDATE_PERIOD: Duration = Duration::from_millis(200);
/// GPS acquisition poll period.
pub const GPS_POLL_PERIOD: Duration = Duration::from_millis(200);
/// Angular window inside which the boat counts as pointed at the target.
pub const DEGREES_TO_BEARING_TOLERANCE: f32 = 10.0;
/// Distance at which a waypoint counts as reached.
pub const SWITCH_WAYPOINT_DISTANCE_M: f32 = 5.0;
/// Seconds to let the receiver settle after the first fix.
pub const GPS_STABILIZE_LOCK_SECS: u16 = 30;
/// Hold after each coarse-alignment rudder command.
pub const TURN_HOLD: Duration = Duration::from_millis(100);
/// Wall time represented by one stabilization countdown unit.
pub const STABILIZE_HOLD: Duration = Duration::from_secs(1);

/// Where the controller takes the boat's heading from.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HeadingSource {
    /// Declination-corrected magnetometer heading only.
    Compass,
    /// GPS course over ground while moving faster than `min_speed_knots`
    /// with a valid fix, compass otherwise.
    CourseOverGround { min_speed_knots: f32 },
}

#[derive(Debug, Clone, Copy)]
pub struct NavConfig<'a> {
    /// Slot 0 is home; see `home_mode`.
    pub waypoints: &'a [Waypoint],
    pub home_mode: HomeMode,
    pub bearing_tolerance_deg: f32,
    pub arrival_threshold_m: f32,
    pub gps_stabilize_secs: u16,
    /// East positive.
    pub declination_deg: f32,
    pub tick_period: Duration,
    pub turn_hold: Duration,
    pub stabilize_hold: Duration,
    pub heading_source: HeadingSource,
    /// Stop in Idle after stabilizing instead of navigating.
    pub gps_test_mode: bool,
}

impl<'a> NavConfig<'a> {
    pub const fn new(waypoints: &'a [Waypoint]) -> Self {
        Self {
            waypoints,
            home_mode: HomeMode::CaptureOnLock,
            bearing_tolerance_deg: DEGREES_TO_BEARING_TOLERANCE,
            arrival_threshold_m: SWITCH_WAYPOINT_DISTANCE_M,
            gps_stabilize_secs: GPS_STABILIZE_LOCK_SECS,
            declination_deg: 0.0,
            tick_period: LOOP_UPDATE_PERIOD,
            turn_hold: TURN_HOLD,
            stabilize_hold: STABILIZE_HOLD,
            heading_source: HeadingSource::Compass,
            gps_test_mode: false,
        }
    }

    pub const fn with_home_mode(mut self, home_mode: HomeMode) -> Self {
        self.home_mode = home_mode;
        self
    }

    pub const fn with_bearing_tolerance(mut self, degrees: f32) -> Self {
        self.bearing_tolerance_deg = degrees;
        self
    }

    pub const fn with_arrival_threshold(mut self, meters: f32) -> Self {
        self.arrival_threshold_m = meters;
        self
    }

    pub const fn with_stabilize_secs(mut self, secs: u16) -> Self {
        self.gps_stabilize_secs = secs;
        self
    }

    pub const fn with_declination(mut self, degrees: f32) -> Self {
        self.declination_deg = degrees;
        self
    }

    pub const fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    pub const fn with_holds(mut self, turn: Duration, stabilize: Duration) -> Self {
        self.turn_hold = turn;
        self.stabilize_hold = stabilize;
        self
    }

    pub const fn with_heading_source(mut self, source: HeadingSource) -> Self {
        self.heading_source = source;
        self
    }

    pub const fn with_gps_test_mode(mut self, enabled: bool) -> Self {
        self.gps_test_mode = enabled;
        self
    }

    /// Reject anything the state machine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.waypoints.is_empty() {
            return Err(ConfigError::NoWaypoints);
        }
        if self.waypoints.len() > MAX_WAYPOINTS {
            return Err(ConfigError::TooManyWaypoints {
                count: self.waypoints.len(),
                max: MAX_WAYPOINTS,
            });
        }

        // The capture-on-lock home slot is a placeholder and is not checked
        let first_checked = match self.home_mode {
            HomeMode::Fixed => 0,
            HomeMode::CaptureOnLock => 1,
        };
        if let Some(index) = self
            .waypoints
            .iter()
            .enumerate()
            .skip(first_checked)
            .find_map(|(i, wp)| (!wp.is_valid()).then_some(i))
        {
            return Err(ConfigError::InvalidWaypoint { index });
        }

        if !(self.bearing_tolerance_deg.is_finite() && self.bearing_tolerance_deg > 0.0) {
            return Err(ConfigError::InvalidTolerance(self.bearing_tolerance_deg));
        }
        if !(self.arrival_threshold_m.is_finite() && self.arrival_threshold_m > 0.0) {
            return Err(ConfigError::InvalidArrivalThreshold(self.arrival_threshold_m));
        }
        if !(self.declination_deg.is_finite()
            && self.declination_deg > -360.0
            && self.declination_deg < 360.0)
        {
            return Err(ConfigError::InvalidDeclination(self.declination_deg));
        }
        if self.tick_period.as_ticks() == 0 {
            return Err(ConfigError::ZeroTickPeriod);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MISSION: [Waypoint; 3] = [
        Waypoint::new(0.0, 0.0),
        Waypoint::new(45.001, -122.001),
        Waypoint::new(45.002, -122.000),
    ];

    #[test]
    fn defaults_are_valid() {
        assert_eq!(NavConfig::new(&MISSION).validate(), Ok(()));
    }

    #[test]
    fn rejects_empty_table() {
        assert_eq!(NavConfig::new(&[]).validate(), Err(ConfigError::NoWaypoints));
    }

    #[test]
    fn rejects_non_positive_tolerance() {
        for bad in [0.0, -5.0, f32::NAN] {
            let cfg = NavConfig::new(&MISSION).with_bearing_tolerance(bad);
            assert!(matches!(cfg.validate(), Err(ConfigError::InvalidTolerance(_))));
        }
    }

    #[test]
    fn rejects_non_positive_arrival_threshold() {
        let cfg = NavConfig::new(&MISSION).with_arrival_threshold(0.0);
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidArrivalThreshold(0.0)));
    }

    #[test]
    fn rejects_full_turn_declination() {
        let cfg = NavConfig::new(&MISSION).with_declination(-360.0);
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidDeclination(-360.0)));
    }

    #[test]
    fn rejects_zero_tick_period() {
        let cfg = NavConfig::new(&MISSION).with_tick_period(Duration::from_ticks(0));
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroTickPeriod));
    }

    #[test]
    fn checks_home_slot_only_when_fixed() {
        let table = [Waypoint::new(f64::NAN, 0.0), Waypoint::new(45.0, 7.0)];
        assert_eq!(NavConfig::new(&table).validate(), Ok(()));

        let fixed = NavConfig::new(&table).with_home_mode(HomeMode::Fixed);
        assert_eq!(fixed.validate(), Err(ConfigError::InvalidWaypoint { index: 0 }));
    }

    #[test]
    fn rejects_out_of_range_leg() {
        let table = [Waypoint::new(0.0, 0.0), Waypoint::new(91.0, 7.0)];
        assert_eq!(
            NavConfig::new(&table).validate(),
            Err(ConfigError::InvalidWaypoint { index: 1 })
        );
    }
}
