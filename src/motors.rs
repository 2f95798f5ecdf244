pub mod channel;
pub mod encoder;

pub use channel::MotorChannel;
pub use encoder::EncoderFilter;

use crate::hal::PinIo;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorDirection {
    #[default]
    Stop,
    Forward,
    Reverse,
}

impl MotorDirection {
    /// Direction implied by a signed speed command.
    pub fn of(speed: i16) -> Self {
        match speed {
            s if s > 0 => MotorDirection::Forward,
            s if s < 0 => MotorDirection::Reverse,
            _ => MotorDirection::Stop,
        }
    }
}

pub trait OpenLoopDrive {
    /// Positive drives forward, negative reverse, zero stops. Magnitude is the duty, 0..=255.
    fn drive<B: PinIo + ?Sized>(&mut self, io: &mut B, speed: i16);
    fn current_direction(&self) -> MotorDirection;
}
