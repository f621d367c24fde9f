//! Shared sensor state between the GPS acquisition task and the navigation loop.
//!
//! The snapshot is `Copy` and lives in a `Cell` behind a blocking mutex, so
//! every read is a whole-group copy-out and every write replaces the group
//! in one critical section.
use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::nav::NavState;

// ── Data types ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// One completed GPS solution as reported by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpsFix {
    pub position: Position,
    pub valid: bool,
    pub speed_knots: f32,
    pub course_deg: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorSnapshot {
    pub position: Position,
    pub speed_knots: f32,
    pub course_deg: f32,
    pub fix_valid: bool,
    /// Declination corrected, [0, 360)
    pub heading_deg: f32,
}

impl SensorSnapshot {
    pub const fn new() -> Self {
        Self {
            position: Position::new(0.0, 0.0),
            speed_knots: 0.0,
            course_deg: 0.0,
            fix_valid: false,
            heading_deg: 0.0,
        }
    }
}

impl Default for SensorSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

/// Navigation values recomputed by the controller, read by status output.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NavInfo {
    pub distance_to_waypoint_m: f32,
    pub bearing_to_waypoint_deg: f32,
    pub current_heading_deg: f32,
}

/// Everything a display needs, published once per navigation tick.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NavStatus {
    pub state: NavState,
    pub info: NavInfo,
    pub target_index: usize,
    pub fix_valid: bool,
    pub position: Position,
}

// ── Lock owner ────────────────────────────────────────────────────────────────

/// Owns the sensor snapshot and the lock around it.
pub struct SensorHub {
    snapshot: Mutex<CriticalSectionRawMutex, Cell<SensorSnapshot>>,
}

impl SensorHub {
    pub const fn new() -> Self {
        Self {
            snapshot: Mutex::new(Cell::new(SensorSnapshot::new())),
        }
    }

    /// Consistent copy of every field as of the last completed write.
    pub fn snapshot(&self) -> SensorSnapshot {
        self.snapshot.lock(|s| s.get())
    }

    /// Handle for the acquisition task; it can publish fixes and nothing else.
    pub fn gps_publisher(&self) -> GpsPublisher<'_> {
        GpsPublisher { hub: self }
    }

    pub(crate) fn store_heading(&self, heading_deg: f32) {
        self.snapshot.lock(|s| {
            let mut snap = s.get();
            snap.heading_deg = heading_deg;
            s.set(snap);
        });
    }

    fn store_fix(&self, fix: &GpsFix) {
        self.snapshot.lock(|s| {
            let mut snap = s.get();
            snap.position = fix.position;
            snap.fix_valid = fix.valid;
            snap.speed_knots = fix.speed_knots;
            snap.course_deg = fix.course_deg;
            s.set(snap);
        });
    }
}

impl Default for SensorHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Write side of [`SensorHub`] handed to the GPS acquisition task.
#[derive(Clone, Copy)]
pub struct GpsPublisher<'a> {
    hub: &'a SensorHub,
}

impl GpsPublisher<'_> {
    /// Replace position, fix flag, speed and course as one group.
    pub fn publish(&self, fix: &GpsFix) {
        self.hub.store_fix(fix);
    }
}
