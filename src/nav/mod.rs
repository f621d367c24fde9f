//! Geodesy, the mission table and the navigation state machine.

pub mod bearing;
pub mod controller;
pub mod waypoint;

pub use bearing::Direction;
pub use controller::{NavState, NavigationController};
pub use waypoint::{HomeMode, Waypoint, WaypointStore};
