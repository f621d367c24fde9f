//! GPS waypoint autopilot for a small boat.
//!
//! The navigation core is plain `no_std` code driven by a periodic tick and
//! can be exercised on the host. Everything that touches the STM32F405 board
//! sits behind the `stm32` feature.
#![cfg_attr(not(test), no_std)]

// Must come first so the logging macros are visible to every module below
#[macro_use]
mod fmt;

pub mod config;
pub mod drivers;
pub mod error;
pub mod helm;
pub mod nav;
pub mod sensors;
pub mod state;
pub mod tasks;

#[cfg(feature = "stm32")]
pub mod board;
#[cfg(feature = "stm32")]
pub mod usb;

pub use config::NavConfig;
pub use error::{ConfigError, SensorError, WaypointError};
pub use nav::{NavState, NavigationController, Waypoint};
pub use state::SensorHub;
