pub mod gps_task;
pub mod nav_task;
pub mod status_task;

#[cfg(feature = "stm32")]
pub mod helm_task;
