//! Sensor capabilities the navigation core depends on.
//!
//! Each trait is implemented by a driver in [`crate::drivers`]; the core never
//! looks at which part is fitted.

use crate::error::SensorError;
use crate::state::GpsFix;

/// Magnetic heading provider.
pub trait Compass {
    /// Heading in [0, 360) degrees, before declination correction.
    fn read_heading_deg(&mut self) -> Result<f32, SensorError>;
}

/// Incremental GPS protocol decoder.
pub trait GpsParser {
    /// Feed one received byte. Returns `true` when it completed a sentence.
    fn feed_byte(&mut self, byte: u8) -> bool;

    /// Solution as of the last completed sentence.
    fn fix(&self) -> GpsFix;
}

/// Non-blocking serial receive side.
pub trait ByteSource {
    /// Copy whatever is already buffered into `buf`; 0 means nothing pending.
    fn read_available(&mut self, buf: &mut [u8]) -> usize;
}

impl<C: Compass + ?Sized> Compass for &mut C {
    fn read_heading_deg(&mut self) -> Result<f32, SensorError> {
        (**self).read_heading_deg()
    }
}
