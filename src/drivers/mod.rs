pub mod dshot;
pub mod gps;
pub mod hmc5883;
pub mod servo;
