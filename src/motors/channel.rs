use super::{EncoderFilter, MotorDirection, OpenLoopDrive};

use crate::config::{MotorPins, PwmMode, MAX_SPEED};
use crate::hal::{PinIo, PinMode, PinState};

/// One H-bridge channel plus the encoder riding on its wheel.
pub struct MotorChannel {
    pins: MotorPins,
    pwm_mode: PwmMode,
    direction: MotorDirection,
    speed: u8,
    encoder: EncoderFilter,
}

impl MotorChannel {
    pub fn new(pins: MotorPins, pwm_mode: PwmMode, debounce_count: u16) -> Self {
        Self {
            pins,
            pwm_mode,
            direction: MotorDirection::Stop,
            speed: 0,
            encoder: EncoderFilter::new(debounce_count),
        }
    }

    pub fn configure<B: PinIo + ?Sized>(&self, io: &mut B) {
        // In some PWM modes these get analog writes rather than digital ones,
        // declaring them as outputs is harmless either way.
        io.configure_pin(self.pins.forward, PinMode::Output);
        io.configure_pin(self.pins.reverse, PinMode::Output);
        io.configure_pin(self.pins.enable, PinMode::Output);

        io.configure_pin(self.pins.encoder, PinMode::Input);
    }

    pub fn set_speed<B: PinIo + ?Sized>(&mut self, io: &mut B, speed: i16) {
        let speed = speed.clamp(-(MAX_SPEED as i16), MAX_SPEED as i16);
        self.direction = MotorDirection::of(speed);
        self.speed = speed.unsigned_abs() as u8;

        let pins = self.pins;
        let duty = self.speed;
        match (self.direction, self.pwm_mode) {
            (MotorDirection::Stop, _) => {
                io.write_digital(pins.reverse, PinState::Low);
                io.write_digital(pins.forward, PinState::Low);
            }
            (MotorDirection::Forward, PwmMode::EnablePin) => {
                io.write_analog(pins.enable, duty);
                io.write_digital(pins.reverse, PinState::Low);
                io.write_digital(pins.forward, PinState::High);
            }
            (MotorDirection::Reverse, PwmMode::EnablePin) => {
                io.write_analog(pins.enable, duty);
                io.write_digital(pins.forward, PinState::Low);
                io.write_digital(pins.reverse, PinState::High);
            }
            (MotorDirection::Forward, PwmMode::InputPin) => {
                io.write_digital(pins.enable, PinState::High);
                io.write_digital(pins.reverse, PinState::Low);
                io.write_analog(pins.forward, duty);
            }
            (MotorDirection::Reverse, PwmMode::InputPin) => {
                io.write_digital(pins.enable, PinState::High);
                io.write_digital(pins.forward, PinState::Low);
                io.write_analog(pins.reverse, duty);
            }
        }
    }

    /// Stop the motor and drop the enable line, leaving no output driven.
    pub fn release<B: PinIo + ?Sized>(&mut self, io: &mut B) {
        self.set_speed(io, 0);
        io.write_digital(self.pins.enable, PinState::Low);
    }

    /// Magnitude of the last speed command.
    pub fn speed(&self) -> u8 {
        self.speed
    }

    /// Read the encoder pin once and feed the debounce filter.
    pub fn sample_encoder<B: PinIo + ?Sized>(&mut self, io: &mut B) {
        let level = io.read_digital(self.pins.encoder);
        self.encoder.observe(level);
    }

    pub fn raw_transition_count(&self) -> u32 {
        self.encoder.transitions()
    }

    pub fn reset_transitions(&mut self) -> u32 {
        self.encoder.reset()
    }

    pub fn pins(&self) -> &MotorPins {
        &self.pins
    }
}

impl OpenLoopDrive for MotorChannel {
    fn drive<B: PinIo + ?Sized>(&mut self, io: &mut B, speed: i16) {
        self.set_speed(io, speed)
    }

    fn current_direction(&self) -> MotorDirection {
        self.direction
    }
}
