//! Supervisor command link messages.
//!
//! Requests and responses are protobuf encoded and carried in KISS frames
//! (see [`kiss`]).

pub mod kiss;

use alloc::vec::Vec;

use prost::{DecodeError, Message};

use log::Level;

use crate::navigation;

#[derive(Clone, PartialEq, Message)]
pub struct ConfigureVehicle {
    /// 1 = PWM on enable pin, 2 = PWM on direction pins.
    #[prost(uint32, tag = "1")]
    pub pwm_mode: u32,
    #[prost(uint32, tag = "2")]
    pub target_speed: u32,
    #[prost(uint32, tag = "3")]
    pub minimum_speed: u32,
    #[prost(uint32, tag = "4")]
    pub correction_gain: u32,
    #[prost(uint32, tag = "5")]
    pub stall_timeout_ms: u32,
    #[prost(uint32, tag = "6")]
    pub debounce_count: u32,
}

#[derive(Clone, PartialEq, Message)]
pub struct ConfigureMotor {
    #[prost(enumeration = "Side", tag = "1")]
    pub side: i32,
    #[prost(uint32, tag = "2")]
    pub enable_pin: u32,
    #[prost(uint32, tag = "3")]
    pub forward_pin: u32,
    #[prost(uint32, tag = "4")]
    pub reverse_pin: u32,
    #[prost(uint32, tag = "5")]
    pub encoder_pin: u32,
}

#[derive(Clone, PartialEq, Message)]
pub struct ActionStart {
    #[prost(enumeration = "ActionKind", tag = "1")]
    pub kind: i32,
    #[prost(uint32, tag = "2")]
    pub transitions_goal: u32,
}

#[derive(Clone, PartialEq, Message)]
pub struct ActionStatusRequest {}

#[derive(Clone, PartialEq, Message)]
pub struct Stop {}

#[derive(Clone, PartialEq, Message)]
pub struct SetLogLevel {
    #[prost(enumeration = "LogLevel", tag = "1")]
    pub level: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct Request {
    #[prost(oneof = "request::Cmd", tags = "1, 2, 3, 4, 5, 6")]
    pub cmd: Option<request::Cmd>,
}

pub mod request {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Cmd {
        #[prost(message, tag = "1")]
        ConfigureVehicle(super::ConfigureVehicle),
        #[prost(message, tag = "2")]
        ConfigureMotor(super::ConfigureMotor),
        #[prost(message, tag = "3")]
        ActionStart(super::ActionStart),
        #[prost(message, tag = "4")]
        ActionStatus(super::ActionStatusRequest),
        #[prost(message, tag = "5")]
        Stop(super::Stop),
        #[prost(message, tag = "6")]
        SetLogLevel(super::SetLogLevel),
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct ActionStatus {
    #[prost(enumeration = "ActionState", tag = "1")]
    pub state: i32,
    #[prost(uint32, tag = "2")]
    pub left_transitions: u32,
    #[prost(uint32, tag = "3")]
    pub left_speed: u32,
    #[prost(uint32, tag = "4")]
    pub right_transitions: u32,
    #[prost(uint32, tag = "5")]
    pub right_speed: u32,
}

#[derive(Clone, PartialEq, Message)]
pub struct ErrorReport {
    #[prost(enumeration = "ErrorCode", tag = "1")]
    pub code: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct Response {
    #[prost(oneof = "response::Msg", tags = "1, 2")]
    pub msg: Option<response::Msg>,
}

pub mod response {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Msg {
        #[prost(message, tag = "1")]
        Status(super::ActionStatus),
        #[prost(message, tag = "2")]
        Error(super::ErrorReport),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum Side {
    Left = 0,
    Right = 1,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ActionKind {
    Stop = 0,
    Forward = 1,
    Reverse = 2,
    Left = 3,
    Right = 4,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ActionState {
    Idle = 0,
    Active = 1,
    TimedOut = 2,
    Interrupted = 3,
    Succeeded = 4,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ErrorCode {
    Decode = 0,
    EmptyRequest = 1,
    NotConfigured = 2,
    InvalidConfig = 3,
    UnknownActionKind = 4,
    UnknownPwmMode = 5,
    UnknownSide = 6,
    UnknownLogLevel = 7,
    InvalidPin = 8,
    OutOfRange = 9,
}

impl From<ActionKind> for navigation::ActionKind {
    fn from(kind: ActionKind) -> Self {
        match kind {
            ActionKind::Stop => navigation::ActionKind::Stop,
            ActionKind::Forward => navigation::ActionKind::Forward,
            ActionKind::Reverse => navigation::ActionKind::Reverse,
            ActionKind::Left => navigation::ActionKind::Left,
            ActionKind::Right => navigation::ActionKind::Right,
        }
    }
}

impl From<navigation::ActionState> for ActionState {
    fn from(state: navigation::ActionState) -> Self {
        match state {
            navigation::ActionState::Idle => ActionState::Idle,
            navigation::ActionState::Active => ActionState::Active,
            navigation::ActionState::TimedOut => ActionState::TimedOut,
            navigation::ActionState::Interrupted => ActionState::Interrupted,
            navigation::ActionState::Succeeded => ActionState::Succeeded,
        }
    }
}

impl From<navigation::ActionStatus> for ActionStatus {
    fn from(status: navigation::ActionStatus) -> Self {
        Self {
            state: ActionState::from(status.state) as i32,
            left_transitions: status.left_transitions,
            left_speed: status.left_speed.into(),
            right_transitions: status.right_transitions,
            right_speed: status.right_speed.into(),
        }
    }
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::Trace,
            LogLevel::Debug => Level::Debug,
            LogLevel::Info => Level::Info,
            LogLevel::Warn => Level::Warn,
            LogLevel::Error => Level::Error,
        }
    }
}

pub fn decode_proto_msg<M: Message + Default>(buf: &[u8]) -> Result<M, DecodeError> {
    M::decode(buf)
}

pub fn encode_proto<M: Message>(msg: &M) -> Vec<u8> {
    // Vec grows on demand, so encoding cannot run out of room.
    msg.encode_to_vec()
}
