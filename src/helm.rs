//! Rudder and throttle commands.
//!
//! The controller speaks in named settings only. [`HelmCodes`] turns them
//! into a servo angle and a DShot throttle value, and [`SharedHelm`] parks
//! those in atomics for the output tasks to pick up.

use core::sync::atomic::{AtomicU16, AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RudderCommand {
    FullLeft,
    Left,
    Center,
    Right,
    FullRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ThrottleCommand {
    Stop,
    Quarter,
    Half,
    Full,
}

impl ThrottleCommand {
    pub fn fraction(self) -> f32 {
        match self {
            Self::Stop => 0.0,
            Self::Quarter => 0.25,
            Self::Half => 0.5,
            Self::Full => 1.0,
        }
    }
}

/// Fire-and-forget actuator sink.
pub trait Helm {
    fn set_rudder(&mut self, command: RudderCommand);
    fn set_throttle(&mut self, command: ThrottleCommand);
}

// ── Code mapping ──────────────────────────────────────────────────────────────

const DSHOT_MIN: u16 = 48;
const DSHOT_MAX: u16 = 2047;

/// Servo angles (0..=180 degrees) for each rudder setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HelmCodes {
    pub full_left: u8,
    pub left: u8,
    pub center: u8,
    pub right: u8,
    pub full_right: u8,
    /// Mirror every angle around the servo midpoint (linkage mounted backwards).
    pub rudder_reverse: bool,
}

impl HelmCodes {
    pub const fn new() -> Self {
        Self {
            full_left: 45,
            left: 70,
            center: 90,
            right: 110,
            full_right: 135,
            rudder_reverse: false,
        }
    }

    pub const fn reversed(mut self) -> Self {
        self.rudder_reverse = true;
        self
    }

    pub fn rudder_angle(&self, command: RudderCommand) -> u8 {
        let angle = match command {
            RudderCommand::FullLeft => self.full_left,
            RudderCommand::Left => self.left,
            RudderCommand::Center => self.center,
            RudderCommand::Right => self.right,
            RudderCommand::FullRight => self.full_right,
        }
        .min(180);

        if self.rudder_reverse {
            180 - angle
        } else {
            angle
        }
    }

    /// DShot value for a throttle setting. Stop maps to the DShot disarm code 0.
    pub fn throttle_code(&self, command: ThrottleCommand) -> u16 {
        unit_to_dshot(command.fraction())
    }
}

impl Default for HelmCodes {
    fn default() -> Self {
        Self::new()
    }
}

pub fn unit_to_dshot(unit_throttle: f32) -> u16 {
    if unit_throttle <= 0.0 {
        return 0;
    }

    let t = unit_throttle.clamp(0.0, 1.0);
    let value = DSHOT_MIN as f32 + t * (DSHOT_MAX - DSHOT_MIN) as f32;
    value as u16
}

// ── Atomic hand-off to the output tasks ───────────────────────────────────────

/// Latest helm setpoints, written by the navigation loop, read by the servo and ESC tasks.
pub struct SharedHelm {
    codes: HelmCodes,
    rudder_angle: AtomicU8,
    throttle_code: AtomicU16,
}

impl SharedHelm {
    pub const fn new(codes: HelmCodes) -> Self {
        let center = if codes.rudder_reverse {
            180 - codes.center
        } else {
            codes.center
        };
        Self {
            codes,
            rudder_angle: AtomicU8::new(center),
            throttle_code: AtomicU16::new(0),
        }
    }

    pub fn rudder_angle(&self) -> u8 {
        self.rudder_angle.load(Ordering::Relaxed)
    }

    pub fn throttle_code(&self) -> u16 {
        self.throttle_code.load(Ordering::Relaxed)
    }
}

impl Helm for &SharedHelm {
    fn set_rudder(&mut self, command: RudderCommand) {
        self.rudder_angle
            .store(self.codes.rudder_angle(command), Ordering::Relaxed);
    }

    fn set_throttle(&mut self, command: ThrottleCommand) {
        self.throttle_code
            .store(self.codes.throttle_code(command), Ordering::Relaxed);
    }
}
