//! Pin and clock seam between the motor logic and the board.
//!
//! Pins are addressed by the numeric id the supervisor uses when it
//! configures a motor, so the same logic runs on any board that can map those
//! ids onto real GPIO and PWM outputs. Writes are fire-and-forget: a board
//! that cannot honor one has no way to report it here.

pub mod mock;

pub use embedded_hal::digital::PinState;

use crate::time::Millis;

pub type PinId = u8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinMode {
    Output,
    Input,
}

pub trait PinIo {
    fn configure_pin(&mut self, pin: PinId, mode: PinMode);
    fn write_digital(&mut self, pin: PinId, level: PinState);
    /// `duty` spans 0 (always low) to 255 (always high).
    fn write_analog(&mut self, pin: PinId, duty: u8);
    fn read_digital(&mut self, pin: PinId) -> PinState;
}

/// Monotonic millisecond clock.
pub trait Clock {
    fn now(&self) -> Millis;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Millis {
        (**self).now()
    }
}

impl<P: PinIo + ?Sized> PinIo for &mut P {
    fn configure_pin(&mut self, pin: PinId, mode: PinMode) {
        (**self).configure_pin(pin, mode)
    }

    fn write_digital(&mut self, pin: PinId, level: PinState) {
        (**self).write_digital(pin, level)
    }

    fn write_analog(&mut self, pin: PinId, duty: u8) {
        (**self).write_analog(pin, duty)
    }

    fn read_digital(&mut self, pin: PinId) -> PinState {
        (**self).read_digital(pin)
    }
}
