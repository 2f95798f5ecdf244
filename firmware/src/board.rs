//! STM32F407 discovery board behind the `PinIo`/`Clock` traits.
//!
//! The supervisor addresses pins by number. This is the table it addresses:
//!
//! | Pin id | Hardware | Use |
//! | ------ | -------- | --- |
//! | 0..=3 | PC6..PC9, TIM3 CH1..CH4 | PWM (or full on/off) |
//! | 4..=7 | PB6..PB9, TIM4 CH1..CH4 | PWM (or full on/off) |
//! | 8..=11 | PE7..PE10 | push-pull output |
//! | 12..=15 | PE11..PE14 | pulled-up input (encoders) |

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::convert::Infallible;

use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::pwm::SetDutyCycle;
use log::warn;
use rtic_monotonics::{stm32::Tim2, Monotonic};
use stm32f4xx_hal::{
    gpio::{gpiob, gpioc, gpioe},
    pac::{TIM3, TIM4},
    prelude::*,
    rcc::Clocks,
    timer::{Timer3, Timer4},
};

use rpc_motor::hal::{Clock, PinId, PinIo, PinMode, PinState};
use rpc_motor::time::{instant_from_millis, Millis};

const PWM_PINS: PinId = 8;
const OUTPUT_PINS: PinId = 4;
const INPUT_PINS: PinId = 4;

const PWM_FREQUENCY_KHZ: u32 = 10;

type PwmPin = Box<dyn SetDutyCycle<Error = Infallible> + Send>;
type OutPin = Box<dyn OutputPin<Error = Infallible> + Send>;
type InPin = Box<dyn InputPin<Error = Infallible> + Send>;

enum Slot {
    Pwm(usize),
    Output(usize),
    Input(usize),
    Missing,
}

fn slot(pin: PinId) -> Slot {
    if pin < PWM_PINS {
        Slot::Pwm(pin.into())
    } else if pin < PWM_PINS + OUTPUT_PINS {
        Slot::Output((pin - PWM_PINS).into())
    } else if pin < PWM_PINS + OUTPUT_PINS + INPUT_PINS {
        Slot::Input((pin - PWM_PINS - OUTPUT_PINS).into())
    } else {
        Slot::Missing
    }
}

pub struct Board {
    pwm: Vec<PwmPin>,
    outputs: Vec<OutPin>,
    inputs: Vec<InPin>,
}

impl Board {
    pub fn new(
        tim3: TIM3,
        tim4: TIM4,
        gpiob: gpiob::Parts,
        gpioc: gpioc::Parts,
        gpioe: gpioe::Parts,
        clocks: &Clocks,
    ) -> Self {
        let tim3_pins = (
            gpioc.pc6.into_alternate(),
            gpioc.pc7.into_alternate(),
            gpioc.pc8.into_alternate(),
            gpioc.pc9.into_alternate(),
        );
        let (mut c0, mut c1, mut c2, mut c3) = Timer3::new(tim3, clocks)
            .pwm_hz(tim3_pins, PWM_FREQUENCY_KHZ.kHz())
            .split();

        let tim4_pins = (
            gpiob.pb6.into_alternate(),
            gpiob.pb7.into_alternate(),
            gpiob.pb8.into_alternate(),
            gpiob.pb9.into_alternate(),
        );
        let (mut c4, mut c5, mut c6, mut c7) = Timer4::new(tim4, clocks)
            .pwm_hz(tim4_pins, PWM_FREQUENCY_KHZ.kHz())
            .split();

        c0.enable();
        c1.enable();
        c2.enable();
        c3.enable();
        c4.enable();
        c5.enable();
        c6.enable();
        c7.enable();

        let mut pwm: Vec<PwmPin> = Vec::with_capacity(PWM_PINS.into());
        pwm.push(Box::new(c0));
        pwm.push(Box::new(c1));
        pwm.push(Box::new(c2));
        pwm.push(Box::new(c3));
        pwm.push(Box::new(c4));
        pwm.push(Box::new(c5));
        pwm.push(Box::new(c6));
        pwm.push(Box::new(c7));

        let mut outputs: Vec<OutPin> = Vec::with_capacity(OUTPUT_PINS.into());
        outputs.push(Box::new(gpioe.pe7.into_push_pull_output()));
        outputs.push(Box::new(gpioe.pe8.into_push_pull_output()));
        outputs.push(Box::new(gpioe.pe9.into_push_pull_output()));
        outputs.push(Box::new(gpioe.pe10.into_push_pull_output()));

        let mut inputs: Vec<InPin> = Vec::with_capacity(INPUT_PINS.into());
        inputs.push(Box::new(gpioe.pe11.into_pull_up_input()));
        inputs.push(Box::new(gpioe.pe12.into_pull_up_input()));
        inputs.push(Box::new(gpioe.pe13.into_pull_up_input()));
        inputs.push(Box::new(gpioe.pe14.into_pull_up_input()));

        let mut board = Self {
            pwm,
            outputs,
            inputs,
        };
        board.release_all();
        board
    }

    fn release_all(&mut self) {
        for ch in self.pwm.iter_mut() {
            ch.set_duty_cycle_fully_off().ok();
        }
        for out in self.outputs.iter_mut() {
            out.set_low().ok();
        }
    }
}

impl PinIo for Board {
    fn configure_pin(&mut self, pin: PinId, mode: PinMode) {
        let fits = match (slot(pin), mode) {
            (Slot::Pwm(_) | Slot::Output(_), PinMode::Output) => true,
            (Slot::Input(_), PinMode::Input) => true,
            _ => false,
        };
        if !fits {
            warn!("pin {} cannot be used as {:?}", pin, mode);
        }
    }

    fn write_digital(&mut self, pin: PinId, level: PinState) {
        match slot(pin) {
            Slot::Pwm(i) => {
                let ch = &mut self.pwm[i];
                match level {
                    PinState::High => ch.set_duty_cycle_fully_on().ok(),
                    PinState::Low => ch.set_duty_cycle_fully_off().ok(),
                };
            }
            Slot::Output(i) => {
                self.outputs[i].set_state(level).ok();
            }
            Slot::Input(_) | Slot::Missing => warn!("digital write to non-output pin {}", pin),
        }
    }

    fn write_analog(&mut self, pin: PinId, duty: u8) {
        match slot(pin) {
            Slot::Pwm(i) => {
                self.pwm[i]
                    .set_duty_cycle_fraction(duty.into(), u8::MAX.into())
                    .ok();
            }
            // No timer behind these, so anything but zero is full on.
            Slot::Output(i) => {
                let level = if duty > 0 {
                    PinState::High
                } else {
                    PinState::Low
                };
                self.outputs[i].set_state(level).ok();
            }
            Slot::Input(_) | Slot::Missing => warn!("analog write to non-output pin {}", pin),
        }
    }

    fn read_digital(&mut self, pin: PinId) -> PinState {
        match slot(pin) {
            Slot::Input(i) => match self.inputs[i].is_high() {
                Ok(true) => PinState::High,
                _ => PinState::Low,
            },
            _ => PinState::Low,
        }
    }
}

/// Milliseconds from the TIM2 monotonic.
#[derive(Clone, Copy)]
pub struct MonoClock;

impl Clock for MonoClock {
    fn now(&self) -> Millis {
        instant_from_millis(Tim2::now().ticks() / 1_000)
    }
}
