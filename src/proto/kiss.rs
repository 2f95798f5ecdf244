//! KISS framing for the serial command link.
//!
//! Every frame is wrapped in FEND bytes; FEND and FESC inside the payload are
//! escaped as FESC TFEND and FESC TFESC.

use alloc::vec::Vec;

pub const FEND: u8 = 0xC0;
pub const FESC: u8 = 0xDB;
pub const TFEND: u8 = 0xDC;
pub const TFESC: u8 = 0xDD;

/// Frames longer than this are dropped.
pub const MAX_FRAME_LEN: usize = 100;

pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(payload.len() + 2);
    frame.push(FEND);
    for &b in payload {
        match b {
            FEND => frame.extend_from_slice(&[FESC, TFEND]),
            FESC => frame.extend_from_slice(&[FESC, TFESC]),
            other => frame.push(other),
        }
    }
    frame.push(FEND);
    frame
}

enum State {
    Idle,
    InFrame,
    Escaped,
    // Overlong or badly escaped, skipped until the next FEND.
    Discarding,
}

/// Reassembles payloads from a byte stream, one byte at a time.
pub struct FrameDecoder {
    state: State,
    buf: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            buf: Vec::new(),
        }
    }

    /// Returns `Some(payload)` when `byte` closes a non-empty frame.
    pub fn push(&mut self, byte: u8) -> Option<Vec<u8>> {
        match self.state {
            State::Idle => {
                if byte == FEND {
                    self.state = State::InFrame;
                    self.buf.clear();
                }
            }
            State::InFrame => match byte {
                FEND => {
                    // A closing FEND also opens the next frame.
                    if !self.buf.is_empty() {
                        return Some(core::mem::take(&mut self.buf));
                    }
                }
                FESC => self.state = State::Escaped,
                other => self.store(other),
            },
            State::Escaped => match byte {
                TFEND => {
                    self.state = State::InFrame;
                    self.store(FEND);
                }
                TFESC => {
                    self.state = State::InFrame;
                    self.store(FESC);
                }
                FEND => {
                    self.buf.clear();
                    self.state = State::InFrame;
                }
                _ => self.discard(),
            },
            State::Discarding => {
                if byte == FEND {
                    self.buf.clear();
                    self.state = State::InFrame;
                }
            }
        }
        None
    }

    fn store(&mut self, byte: u8) {
        if self.buf.len() >= MAX_FRAME_LEN {
            self.discard();
        } else {
            self.buf.push(byte);
        }
    }

    fn discard(&mut self) {
        self.buf.clear();
        self.state = State::Discarding;
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}
