use thiserror::Error;

/// Rejected navigation configuration. Raised before the controller is built.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    #[error("The waypoint table is empty.")]
    NoWaypoints,
    #[error("The waypoint table holds {count} entries, at most {max} are supported.")]
    TooManyWaypoints { count: usize, max: usize },
    #[error("Bearing tolerance must be a positive number of degrees, got {0}.")]
    InvalidTolerance(f32),
    #[error("Arrival threshold must be a positive number of meters, got {0}.")]
    InvalidArrivalThreshold(f32),
    #[error("Magnetic declination must lie within (-360, 360) degrees, got {0}.")]
    InvalidDeclination(f32),
    #[error("Waypoint {index} is not a valid latitude/longitude pair.")]
    InvalidWaypoint { index: usize },
    #[error("The navigation tick period must be non-zero.")]
    ZeroTickPeriod,
}

#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WaypointError {
    #[error("The home waypoint was fixed at load time.")]
    HomeFixed,
    #[error("The home waypoint has already been captured.")]
    HomeAlreadySet,
}

#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    #[error("The sensor did not answer on its bus.")]
    Bus,
    #[error("The sensor returned a reading outside its valid range.")]
    OutOfRange,
}
