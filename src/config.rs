//! Vehicle configuration supplied by the supervisor at startup.

use core::fmt;

use crate::hal::PinId;
use crate::time::{dur_from_millis, MillisDuration};

/// Consecutive identical encoder reads required before a level is believed.
pub const ENCODER_MIN_STABLE_COUNT: u16 = 5;

/// No encoder progress for this long means the vehicle is stuck.
pub const STALL_TIMEOUT_MS: u64 = 500;

pub const MAX_SPEED: u8 = 255;

/// Where the PWM duty is applied on the motor driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PwmMode {
    /// Duty goes to the enable pin, forward/reverse select direction.
    EnablePin = 1,
    /// Enable is held high, duty goes to the active direction pin.
    InputPin = 2,
}

impl TryFrom<u32> for PwmMode {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(PwmMode::EnablePin),
            2 => Ok(PwmMode::InputPin),
            other => Err(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorPins {
    pub enable: PinId,
    pub forward: PinId,
    pub reverse: PinId,
    pub encoder: PinId,
}

impl MotorPins {
    pub fn all(&self) -> [PinId; 4] {
        [self.enable, self.forward, self.reverse, self.encoder]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriveTuning {
    /// Cruise speed both wheels start at.
    pub target_speed: u8,
    /// Below this the motors stall, so a correction that would land under it stops the wheel.
    pub minimum_speed: u8,
    /// Speed taken off the leading wheel per transition of lead.
    pub correction_gain: u16,
    pub stall_timeout: MillisDuration,
}

impl DriveTuning {
    pub fn new(target_speed: u8, minimum_speed: u8, correction_gain: u16, stall_timeout_ms: u64) -> Self {
        Self {
            target_speed,
            minimum_speed,
            correction_gain,
            stall_timeout: dur_from_millis(stall_timeout_ms),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleConfig {
    pub pwm_mode: PwmMode,
    pub left: MotorPins,
    pub right: MotorPins,
    pub tuning: DriveTuning,
    pub debounce_count: u16,
}

impl VehicleConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let pins = [self.left.all(), self.right.all()];
        let pins = pins.iter().flatten().copied();
        for (i, pin) in pins.clone().enumerate() {
            if pins.clone().skip(i + 1).any(|other| other == pin) {
                return Err(ConfigError::PinConflict(pin));
            }
        }

        let tuning = &self.tuning;
        if tuning.target_speed == 0 {
            return Err(ConfigError::ZeroTargetSpeed);
        }
        if tuning.minimum_speed > tuning.target_speed {
            return Err(ConfigError::FloorAboveTarget);
        }
        if tuning.stall_timeout.ticks() == 0 {
            return Err(ConfigError::ZeroStallTimeout);
        }
        if self.debounce_count == 0 {
            return Err(ConfigError::ZeroDebounce);
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    PinConflict(PinId),
    ZeroTargetSpeed,
    FloorAboveTarget,
    ZeroStallTimeout,
    ZeroDebounce,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::PinConflict(pin) => write!(f, "pin {} assigned more than once", pin),
            ConfigError::ZeroTargetSpeed => f.write_str("target speed must be non-zero"),
            ConfigError::FloorAboveTarget => f.write_str("minimum speed exceeds target speed"),
            ConfigError::ZeroStallTimeout => f.write_str("stall timeout must be non-zero"),
            ConfigError::ZeroDebounce => f.write_str("debounce count must be non-zero"),
        }
    }
}
