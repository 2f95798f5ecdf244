//! Host-side stand-ins for the board and its clock.

use alloc::vec::Vec;
use core::cell::Cell;

use super::{Clock, PinId, PinIo, PinMode, PinState};
use crate::time::{instant_from_millis, Millis};

const PIN_COUNT: usize = PinId::MAX as usize + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinWrite {
    Digital(PinId, PinState),
    Analog(PinId, u8),
}

/// Board that remembers every pin it was asked to touch.
pub struct MockBoard {
    modes: [Option<PinMode>; PIN_COUNT],
    levels: [PinState; PIN_COUNT],
    duties: [Option<u8>; PIN_COUNT],
    writes: Vec<PinWrite>,
}

impl MockBoard {
    pub fn new() -> Self {
        Self {
            modes: [None; PIN_COUNT],
            levels: [PinState::Low; PIN_COUNT],
            duties: [None; PIN_COUNT],
            writes: Vec::new(),
        }
    }

    /// Drive an input pin as seen by the next `read_digital`.
    pub fn set_input(&mut self, pin: PinId, level: PinState) {
        self.levels[pin as usize] = level;
    }

    pub fn mode(&self, pin: PinId) -> Option<PinMode> {
        self.modes[pin as usize]
    }

    pub fn level(&self, pin: PinId) -> PinState {
        self.levels[pin as usize]
    }

    /// Last analog duty written, cleared by a later digital write.
    pub fn duty(&self, pin: PinId) -> Option<u8> {
        self.duties[pin as usize]
    }

    pub fn writes(&self) -> &[PinWrite] {
        &self.writes
    }

    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }
}

impl Default for MockBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl PinIo for MockBoard {
    fn configure_pin(&mut self, pin: PinId, mode: PinMode) {
        self.modes[pin as usize] = Some(mode);
    }

    fn write_digital(&mut self, pin: PinId, level: PinState) {
        self.levels[pin as usize] = level;
        self.duties[pin as usize] = None;
        self.writes.push(PinWrite::Digital(pin, level));
    }

    fn write_analog(&mut self, pin: PinId, duty: u8) {
        self.levels[pin as usize] = if duty > 0 {
            PinState::High
        } else {
            PinState::Low
        };
        self.duties[pin as usize] = Some(duty);
        self.writes.push(PinWrite::Analog(pin, duty));
    }

    fn read_digital(&mut self, pin: PinId) -> PinState {
        self.levels[pin as usize]
    }
}

/// Millisecond clock that only moves when told to.
#[derive(Debug, Default)]
pub struct MockClock {
    current_ms: Cell<u64>,
}

impl MockClock {
    pub fn new() -> Self {
        Self {
            current_ms: Cell::new(0),
        }
    }

    pub fn set(&self, ms: u64) {
        self.current_ms.set(ms);
    }

    pub fn advance(&self, ms: u64) {
        self.current_ms.set(self.current_ms.get() + ms);
    }
}

impl Clock for MockClock {
    fn now(&self) -> Millis {
        instant_from_millis(self.current_ms.get())
    }
}
