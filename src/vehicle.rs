//! The one place supervisor commands and the periodic tick reach the drive.
//!
//! The firmware serializes every call into a `Vehicle` (RTIC resource lock),
//! so the navigation action is only ever touched from one context at a time.

use alloc::vec::Vec;
use core::fmt;

use log::{error, info, warn};
use prost::DecodeError;

use crate::config::{ConfigError, DriveTuning, MotorPins, PwmMode, VehicleConfig};
use crate::hal::{Clock, PinId, PinIo};
use crate::navigation::{ActionState, ActionStatus, NavAction, Outcome};
use crate::proto::{self, kiss, request::Cmd, response, ErrorCode, Request, Response};

#[derive(Debug)]
pub enum CommandError {
    Decode(DecodeError),
    EmptyRequest,
    NotConfigured,
    InvalidConfig(ConfigError),
    UnknownActionKind(i32),
    UnknownPwmMode(u32),
    UnknownSide(i32),
    UnknownLogLevel(i32),
    InvalidPin(u32),
    OutOfRange(&'static str, u32),
}

impl CommandError {
    pub fn code(&self) -> ErrorCode {
        match self {
            CommandError::Decode(_) => ErrorCode::Decode,
            CommandError::EmptyRequest => ErrorCode::EmptyRequest,
            CommandError::NotConfigured => ErrorCode::NotConfigured,
            CommandError::InvalidConfig(_) => ErrorCode::InvalidConfig,
            CommandError::UnknownActionKind(_) => ErrorCode::UnknownActionKind,
            CommandError::UnknownPwmMode(_) => ErrorCode::UnknownPwmMode,
            CommandError::UnknownSide(_) => ErrorCode::UnknownSide,
            CommandError::UnknownLogLevel(_) => ErrorCode::UnknownLogLevel,
            CommandError::InvalidPin(_) => ErrorCode::InvalidPin,
            CommandError::OutOfRange(..) => ErrorCode::OutOfRange,
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Decode(e) => write!(f, "undecodable request: {}", e),
            CommandError::EmptyRequest => f.write_str("request carries no command"),
            CommandError::NotConfigured => f.write_str("vehicle is not configured yet"),
            CommandError::InvalidConfig(e) => write!(f, "invalid configuration: {}", e),
            CommandError::UnknownActionKind(k) => write!(f, "unknown action kind {}", k),
            CommandError::UnknownPwmMode(m) => write!(f, "unknown pwm mode {}", m),
            CommandError::UnknownSide(s) => write!(f, "unknown motor side {}", s),
            CommandError::UnknownLogLevel(l) => write!(f, "unknown log level {}", l),
            CommandError::InvalidPin(p) => write!(f, "pin {} out of range", p),
            CommandError::OutOfRange(field, v) => write!(f, "{} {} out of range", field, v),
        }
    }
}

impl From<DecodeError> for CommandError {
    fn from(e: DecodeError) -> Self {
        CommandError::Decode(e)
    }
}

impl From<ConfigError> for CommandError {
    fn from(e: ConfigError) -> Self {
        CommandError::InvalidConfig(e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct VehicleSettings {
    pwm_mode: PwmMode,
    tuning: DriveTuning,
    debounce_count: u16,
}

// Configuration arrives in three separate requests.
#[derive(Debug, Clone, Copy, Default)]
struct PendingConfig {
    settings: Option<VehicleSettings>,
    left: Option<MotorPins>,
    right: Option<MotorPins>,
}

impl PendingConfig {
    fn complete(&self) -> Option<VehicleConfig> {
        let settings = self.settings?;
        Some(VehicleConfig {
            pwm_mode: settings.pwm_mode,
            left: self.left?,
            right: self.right?,
            tuning: settings.tuning,
            debounce_count: settings.debounce_count,
        })
    }
}

pub struct Vehicle<B: PinIo, C: Clock + Clone> {
    board: B,
    clock: C,
    pending: PendingConfig,
    nav: Option<NavAction<C>>,
}

impl<B: PinIo, C: Clock + Clone> Vehicle<B, C> {
    pub fn new(board: B, clock: C) -> Self {
        Self {
            board,
            clock,
            pending: PendingConfig::default(),
            nav: None,
        }
    }

    /// Build the drive directly from a complete configuration.
    pub fn with_config(board: B, clock: C, config: &VehicleConfig) -> Result<Self, ConfigError> {
        let mut vehicle = Self::new(board, clock);
        vehicle.pending = PendingConfig {
            settings: Some(VehicleSettings {
                pwm_mode: config.pwm_mode,
                tuning: config.tuning,
                debounce_count: config.debounce_count,
            }),
            left: Some(config.left),
            right: Some(config.right),
        };
        vehicle.apply(config)?;
        Ok(vehicle)
    }

    /// Periodic tick: one encoder read per wheel, then one action update.
    pub fn poll(&mut self) {
        if let Some(nav) = self.nav.as_mut() {
            nav.sample_encoders(&mut self.board);
            nav.update(&mut self.board);
        }
    }

    /// Decode one framed payload, act on it and return the framed reply.
    pub fn handle_frame(&mut self, payload: &[u8]) -> Vec<u8> {
        let response = match proto::decode_proto_msg::<Request>(payload) {
            Ok(request) => self.handle(request),
            Err(e) => {
                error!("Proto decode error: {}", e);
                error_response(&CommandError::from(e))
            }
        };
        kiss::encode_frame(&proto::encode_proto(&response))
    }

    pub fn handle(&mut self, request: Request) -> Response {
        match self.dispatch(request) {
            Ok(status) => Response {
                msg: Some(response::Msg::Status(status.into())),
            },
            Err(e) => {
                warn!("command rejected: {}", e);
                error_response(&e)
            }
        }
    }

    fn dispatch(&mut self, request: Request) -> Result<ActionStatus, CommandError> {
        match request.cmd.ok_or(CommandError::EmptyRequest)? {
            Cmd::ConfigureVehicle(c) => {
                let pwm_mode =
                    PwmMode::try_from(c.pwm_mode).map_err(CommandError::UnknownPwmMode)?;
                let settings = VehicleSettings {
                    pwm_mode,
                    tuning: DriveTuning::new(
                        in_range("target speed", c.target_speed)?,
                        in_range("minimum speed", c.minimum_speed)?,
                        in_range("correction gain", c.correction_gain)?,
                        u64::from(c.stall_timeout_ms),
                    ),
                    debounce_count: in_range("debounce count", c.debounce_count)?,
                };
                self.try_build(PendingConfig {
                    settings: Some(settings),
                    ..self.pending
                })?;
            }
            Cmd::ConfigureMotor(m) => {
                let side = proto::Side::from_i32(m.side).ok_or(CommandError::UnknownSide(m.side))?;
                let pins = MotorPins {
                    enable: pin_id(m.enable_pin)?,
                    forward: pin_id(m.forward_pin)?,
                    reverse: pin_id(m.reverse_pin)?,
                    encoder: pin_id(m.encoder_pin)?,
                };
                let mut candidate = self.pending;
                match side {
                    proto::Side::Left => candidate.left = Some(pins),
                    proto::Side::Right => candidate.right = Some(pins),
                }
                self.try_build(candidate)?;
            }
            Cmd::ActionStart(a) => {
                let kind = proto::ActionKind::from_i32(a.kind)
                    .ok_or(CommandError::UnknownActionKind(a.kind))?;
                let nav = self.nav.as_mut().ok_or(CommandError::NotConfigured)?;
                nav.start(&mut self.board, kind.into(), a.transitions_goal);
            }
            Cmd::ActionStatus(_) => {
                self.nav.as_ref().ok_or(CommandError::NotConfigured)?;
            }
            Cmd::Stop(_) => {
                let nav = self.nav.as_mut().ok_or(CommandError::NotConfigured)?;
                nav.terminate(&mut self.board, Outcome::Interrupted);
            }
            Cmd::SetLogLevel(l) => {
                let level = proto::LogLevel::from_i32(l.level)
                    .ok_or(CommandError::UnknownLogLevel(l.level))?;
                let level: log::Level = level.into();
                log::set_max_level(level.to_level_filter());
                info!("log level set to {}", level);
            }
        }

        Ok(self.status())
    }

    // Rebuilds the drive once every piece of configuration has arrived. A
    // rejected candidate leaves both the pending pieces and the drive as they were.
    fn try_build(&mut self, candidate: PendingConfig) -> Result<(), CommandError> {
        if let Some(config) = candidate.complete() {
            self.apply(&config)?;
        }
        self.pending = candidate;
        Ok(())
    }

    fn apply(&mut self, config: &VehicleConfig) -> Result<(), ConfigError> {
        if let Err(e) = config.validate() {
            warn!("rejected vehicle config: {}", e);
            return Err(e);
        }

        if let Some(mut old) = self.nav.take() {
            if old.state() == ActionState::Active {
                old.terminate(&mut self.board, Outcome::Interrupted);
            }
            old.release(&mut self.board);
        }

        let nav = NavAction::from_config(self.clock.clone(), config);
        nav.configure(&mut self.board);
        self.nav = Some(nav);
        info!(
            "vehicle configured: {:?}, target speed {}",
            config.pwm_mode, config.tuning.target_speed
        );
        Ok(())
    }

    /// Current action status, all zeros before the vehicle is configured.
    pub fn status(&self) -> ActionStatus {
        self.nav.as_ref().map(NavAction::status).unwrap_or_default()
    }

    pub fn is_configured(&self) -> bool {
        self.nav.is_some()
    }

    pub fn nav(&self) -> Option<&NavAction<C>> {
        self.nav.as_ref()
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut B {
        &mut self.board
    }
}

fn error_response(e: &CommandError) -> Response {
    Response {
        msg: Some(response::Msg::Error(proto::ErrorReport {
            code: e.code() as i32,
        })),
    }
}

fn in_range<T: TryFrom<u32>>(field: &'static str, value: u32) -> Result<T, CommandError> {
    T::try_from(value).map_err(|_| CommandError::OutOfRange(field, value))
}

fn pin_id(value: u32) -> Result<PinId, CommandError> {
    PinId::try_from(value).map_err(|_| CommandError::InvalidPin(value))
}
