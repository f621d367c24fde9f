//! HMC5883L magnetometer as the boat's compass.

use micromath::F32Ext;

use crate::error::SensorError;

pub const HMC5883L_ADDR: u8 = 0x1E;

/// Raw value the part reports on an axis that overflowed the selected gain.
const AXIS_OVERFLOW: i16 = -4096;

/// Heading of the horizontal field vector, clockwise from the sensor X axis,
/// in [0, 360). Assumes the board is mounted level.
pub fn heading_from_mag(x: i16, y: i16) -> Result<f32, SensorError> {
    if x == AXIS_OVERFLOW || y == AXIS_OVERFLOW || (x == 0 && y == 0) {
        return Err(SensorError::OutOfRange);
    }

    let mut heading = (y as f32).atan2(x as f32).to_degrees();
    if heading < 0.0 {
        heading += 360.0;
    }
    if heading >= 360.0 {
        heading -= 360.0;
    }
    Ok(heading)
}

#[cfg(feature = "stm32")]
pub use hw::Hmc5883Compass;

#[cfg(feature = "stm32")]
mod hw {
    use embassy_stm32::i2c::{I2c, Instance};
    use embassy_time::Timer;

    use super::{heading_from_mag, HMC5883L_ADDR};
    use crate::error::SensorError;
    use crate::sensors::Compass;

    pub struct Hmc5883Compass<'d, T: Instance, Tx, Rx> {
        i2c: I2c<'d, T, Tx, Rx>,
    }

    impl<'d, T: Instance, Tx, Rx> Hmc5883Compass<'d, T, Tx, Rx> {
        pub fn new(i2c: I2c<'d, T, Tx, Rx>) -> Self {
            Self { i2c }
        }

        pub async fn init(&mut self) -> Result<(), embassy_stm32::i2c::Error> {
            // Configuration Register A: 8-average, 15Hz, normal measurement
            self.i2c.blocking_write(HMC5883L_ADDR, &[0x00, 0x70])?;
            // Configuration Register B: gain 1.3 Ga
            self.i2c.blocking_write(HMC5883L_ADDR, &[0x01, 0x20])?;
            // Mode Register: continuous measurement
            self.i2c.blocking_write(HMC5883L_ADDR, &[0x02, 0x00])?;

            Timer::after_millis(10).await;
            Ok(())
        }

        fn read_mag(&mut self) -> Result<[i16; 3], embassy_stm32::i2c::Error> {
            let mut data = [0u8; 6];
            self.i2c.blocking_write_read(HMC5883L_ADDR, &[0x03], &mut data)?;

            // Register order is X, Z, Y
            let x = i16::from_be_bytes([data[0], data[1]]);
            let z = i16::from_be_bytes([data[2], data[3]]);
            let y = i16::from_be_bytes([data[4], data[5]]);
            Ok([x, y, z])
        }
    }

    impl<'d, T: Instance, Tx, Rx> Compass for Hmc5883Compass<'d, T, Tx, Rx> {
        fn read_heading_deg(&mut self) -> Result<f32, SensorError> {
            let [x, y, _z] = self.read_mag().map_err(|_| SensorError::Bus)?;
            heading_from_mag(x, y)
        }
    }
}
