//! Hobby servo on the rudder, driven by a 50 Hz software pulse.

pub const SERVO_PERIOD_US: u64 = 20_000;
const PULSE_MIN_US: u64 = 1000;
const PULSE_MAX_US: u64 = 2000;

/// Pulse width for a servo angle in degrees, 0..=180 mapped onto 1000..=2000 µs.
pub fn angle_to_pulse_us(angle: u8) -> u64 {
    let angle = angle.min(180) as u64;
    PULSE_MIN_US + angle * (PULSE_MAX_US - PULSE_MIN_US) / 180
}

#[cfg(feature = "stm32")]
pub use hw::Servo;

#[cfg(feature = "stm32")]
mod hw {
    use embassy_stm32::gpio::{AnyPin, Level, Output, Speed};
    use embassy_time::{Duration, Timer};

    use super::{angle_to_pulse_us, SERVO_PERIOD_US};

    pub struct Servo {
        pin: Output<'static, AnyPin>,
    }

    impl Servo {
        pub fn new(pin: AnyPin) -> Self {
            Self {
                pin: Output::new(pin, Level::Low, Speed::Low),
            }
        }

        /// One full servo period at `angle`.
        pub async fn pulse(&mut self, angle: u8) {
            let high = angle_to_pulse_us(angle);
            self.pin.set_high();
            Timer::after(Duration::from_micros(high)).await;
            self.pin.set_low();
            Timer::after(Duration::from_micros(SERVO_PERIOD_US - high)).await;
        }
    }
}
