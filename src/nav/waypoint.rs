use heapless::Vec;

use crate::error::{ConfigError, WaypointError};
use crate::state::Position;

/// Capacity of the mission table, home slot included.
pub const MAX_WAYPOINTS: usize = 16;

/// Index of the slot that may be overwritten with the launch position.
pub const HOME_SLOT: usize = 0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Waypoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl Waypoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl From<Position> for Waypoint {
    fn from(p: Position) -> Self {
        Self::new(p.latitude, p.longitude)
    }
}

/// How slot 0 of the mission table is filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HomeMode {
    /// Slot 0 holds a surveyed coordinate and is never overwritten.
    Fixed,
    /// Slot 0 is a placeholder replaced by the position at first GPS lock.
    CaptureOnLock,
}

/// Ordered mission table with a cyclic cursor on the current target.
#[derive(Debug, Clone)]
pub struct WaypointStore {
    points: Vec<Waypoint, MAX_WAYPOINTS>,
    target: usize,
    home_mode: HomeMode,
    home_captured: bool,
}

impl WaypointStore {
    pub fn new(points: &[Waypoint], home_mode: HomeMode) -> Result<Self, ConfigError> {
        if points.is_empty() {
            return Err(ConfigError::NoWaypoints);
        }

        let points = Vec::from_slice(points).map_err(|_| ConfigError::TooManyWaypoints {
            count: points.len(),
            max: MAX_WAYPOINTS,
        })?;

        Ok(Self {
            points,
            target: 0,
            home_mode,
            home_captured: false,
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn target_index(&self) -> usize {
        self.target
    }

    pub fn get(&self, index: usize) -> Option<Waypoint> {
        self.points.get(index).copied()
    }

    pub fn current_target(&self) -> Waypoint {
        self.points[self.target]
    }

    pub fn reset_target(&mut self) {
        self.target = 0;
    }

    /// Move the cursor to the next slot, wrapping back to home after the last one.
    pub fn advance_target(&mut self) {
        self.target = (self.target + 1) % self.points.len();
    }

    pub fn home_mode(&self) -> HomeMode {
        self.home_mode
    }

    /// Overwrite the home slot with the vehicle's own position. Allowed once.
    pub fn set_home(&mut self, position: Waypoint) -> Result<(), WaypointError> {
        match (self.home_mode, self.home_captured) {
            (HomeMode::Fixed, _) => Err(WaypointError::HomeFixed),
            (HomeMode::CaptureOnLock, true) => Err(WaypointError::HomeAlreadySet),
            (HomeMode::CaptureOnLock, false) => {
                self.points[HOME_SLOT] = position;
                self.home_captured = true;
                Ok(())
            }
        }
    }
}
