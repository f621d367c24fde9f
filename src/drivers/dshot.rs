//! DShot300 propulsion ESC output.

/// Zero-throttle frames an ESC must see after power-up before it arms.
pub const ARMING_FRAMES: u16 = 300;

/// 16-bit DShot frame: 11-bit value, telemetry request bit, 4-bit checksum.
pub fn dshot_frame(value: u16, telemetry: bool) -> u16 {
    let mut packet = (value & 0x07ff) << 1;
    if telemetry {
        packet |= 1;
    }

    let csum = (packet ^ (packet >> 4) ^ (packet >> 8)) & 0x000f;
    (packet << 4) | csum
}

/// Holds the throttle at zero for the arming window, then passes it through.
#[derive(Debug, Clone, Copy)]
pub struct EscArming {
    remaining: u16,
}

impl EscArming {
    pub const fn new(frames: u16) -> Self {
        Self { remaining: frames }
    }

    pub fn is_armed(&self) -> bool {
        self.remaining == 0
    }

    /// Value to put on the wire for this frame.
    pub fn next_value(&mut self, requested: u16) -> u16 {
        if self.remaining > 0 {
            self.remaining -= 1;
            if self.remaining == 0 {
                info!("esc: armed");
            }
            return 0;
        }
        requested
    }
}

#[cfg(feature = "stm32")]
pub use hw::Dshot300;

#[cfg(feature = "stm32")]
mod hw {
    use cortex_m::asm;
    use embassy_stm32::gpio::{AnyPin, Level, Output, Speed};

    use super::dshot_frame;

    /// Bit-banged DShot300 at 168 MHz core clock.
    pub struct Dshot300 {
        pin: Output<'static, AnyPin>,
    }

    impl Dshot300 {
        const BIT_TOTAL_CYCLES: u32 = 560;
        const BIT1_HIGH_CYCLES: u32 = 420;
        const BIT1_LOW_CYCLES: u32 = Self::BIT_TOTAL_CYCLES - Self::BIT1_HIGH_CYCLES;
        const BIT0_HIGH_CYCLES: u32 = 210;
        const BIT0_LOW_CYCLES: u32 = Self::BIT_TOTAL_CYCLES - Self::BIT0_HIGH_CYCLES;
        const FRAME_GAP_CYCLES: u32 = 5200;

        pub fn new(pin: AnyPin) -> Self {
            Self {
                pin: Output::new(pin, Level::Low, Speed::VeryHigh),
            }
        }

        pub fn send_value(&mut self, value: u16) {
            self.send_frame(dshot_frame(value, false));
        }

        fn send_frame(&mut self, frame: u16) {
            // Interrupts off for the ~60µs frame so UART/USB ISRs cannot stretch a bit
            critical_section::with(|_cs| {
                for bit in (0..16).rev() {
                    let (high, low) = if (frame >> bit) & 0x1 != 0 {
                        (Self::BIT1_HIGH_CYCLES, Self::BIT1_LOW_CYCLES)
                    } else {
                        (Self::BIT0_HIGH_CYCLES, Self::BIT0_LOW_CYCLES)
                    };
                    self.pin.set_high();
                    asm::delay(high);
                    self.pin.set_low();
                    asm::delay(low);
                }
                asm::delay(Self::FRAME_GAP_CYCLES);
            });
        }
    }
}
