//! Closed-loop differential drive for a supervised motor controller.
//!
//! The supervisor asks for a movement ("forward 40 transitions", "turn left
//! 12", "stop") over the serial link; this crate turns it into PWM on two
//! H-bridge channels, counts debounced encoder edges, keeps the wheels level
//! and reports how the movement ended.
//!
//! | Module | Purpose |
//! | ------ | ------- |
//! | [`hal`] | Pin/clock traits the board implements, plus host mocks |
//! | [`motors`] | Motor channel and encoder debounce |
//! | [`navigation`] | The movement state machine |
//! | [`controls`] | Left/right drift correction |
//! | [`config`] | Vehicle configuration and validation |
//! | [`proto`] | Wire messages and KISS framing |
//! | [`vehicle`] | Command dispatch and the periodic tick |

#![no_std]

extern crate alloc;

pub mod config;
pub mod controls;
pub mod hal;
pub mod motors;
pub mod navigation;
pub mod proto;
pub mod time;
pub mod vehicle;

pub use vehicle::{CommandError, Vehicle};
