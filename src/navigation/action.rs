//! A single supervised movement of the differential drive.
//!
//! `NavAction` is created once per vehicle and re-armed by every `start`. It
//! drives both wheels toward a transition goal, keeps them level with
//! [`DriftCorrection`], and gives up when neither encoder moves for the stall
//! timeout. Every path out of `Active` goes through [`NavAction::terminate`],
//! which is what stops the motors.

use log::{debug, info, warn};

use crate::config::{DriveTuning, VehicleConfig};
use crate::controls::DriftCorrection;
use crate::hal::{Clock, PinIo};
use crate::motors::{MotorChannel, OpenLoopDrive};
use crate::time::{elapsed, Millis, MillisDuration};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActionKind {
    #[default]
    Stop,
    Forward,
    Reverse,
    Left,
    Right,
}

impl ActionKind {
    /// Direction multipliers for the (left, right) wheels.
    ///
    /// Turns pivot in place by running the wheels against each other.
    pub fn wheel_signs(self) -> (i16, i16) {
        match self {
            ActionKind::Stop => (0, 0),
            ActionKind::Forward => (1, 1),
            ActionKind::Reverse => (-1, -1),
            ActionKind::Left => (-1, 1),
            ActionKind::Right => (1, -1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    Succeeded,
    TimedOut,
    Interrupted,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActionState {
    #[default]
    Idle,
    Active,
    Succeeded,
    TimedOut,
    Interrupted,
}

impl ActionState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ActionState::Succeeded | ActionState::TimedOut | ActionState::Interrupted
        )
    }
}

impl From<Outcome> for ActionState {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Succeeded => ActionState::Succeeded,
            Outcome::TimedOut => ActionState::TimedOut,
            Outcome::Interrupted => ActionState::Interrupted,
        }
    }
}

/// Snapshot reported back to the supervisor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ActionStatus {
    pub state: ActionState,
    pub left_speed: u8,
    pub right_speed: u8,
    pub left_transitions: u32,
    pub right_transitions: u32,
}

pub struct NavAction<C: Clock> {
    clock: C,
    left: MotorChannel,
    right: MotorChannel,
    drift: DriftCorrection,
    target_speed: u8,
    stall_timeout: MillisDuration,

    kind: ActionKind,
    transitions_goal: u32,
    left_speed: u8,
    right_speed: u8,
    // counts seen at the last update that showed progress
    left_transitions: u32,
    right_transitions: u32,
    last_update: Millis,
    state: ActionState,
}

impl<C: Clock> NavAction<C> {
    pub fn new(clock: C, left: MotorChannel, right: MotorChannel, tuning: &DriveTuning) -> Self {
        let last_update = clock.now();
        Self {
            clock,
            left,
            right,
            drift: DriftCorrection::new(tuning),
            target_speed: tuning.target_speed,
            stall_timeout: tuning.stall_timeout,
            kind: ActionKind::Stop,
            transitions_goal: 0,
            left_speed: 0,
            right_speed: 0,
            left_transitions: 0,
            right_transitions: 0,
            last_update,
            state: ActionState::Idle,
        }
    }

    pub fn from_config(clock: C, config: &VehicleConfig) -> Self {
        let left = MotorChannel::new(config.left, config.pwm_mode, config.debounce_count);
        let right = MotorChannel::new(config.right, config.pwm_mode, config.debounce_count);
        Self::new(clock, left, right, &config.tuning)
    }

    /// Declare both motors' pins on the board.
    pub fn configure<B: PinIo + ?Sized>(&self, io: &mut B) {
        self.left.configure(io);
        self.right.configure(io);
    }

    /// Begin a new movement, stopping whatever was in flight first.
    pub fn start<B: PinIo + ?Sized>(&mut self, io: &mut B, kind: ActionKind, transitions_goal: u32) {
        if self.state == ActionState::Active {
            self.terminate(io, Outcome::Interrupted);
        }

        self.left.reset_transitions();
        self.right.reset_transitions();

        self.kind = kind;
        self.transitions_goal = transitions_goal;
        self.left_transitions = 0;
        self.right_transitions = 0;
        self.left_speed = self.target_speed;
        self.right_speed = self.target_speed;
        self.last_update = self.clock.now();
        self.state = ActionState::Active;

        info!("action {:?} started, goal {} transitions", kind, transitions_goal);

        if kind == ActionKind::Stop || transitions_goal == 0 {
            self.terminate(io, Outcome::Succeeded);
            return;
        }

        self.drive_wheels(io);
    }

    /// Advance the action by one tick. Does nothing unless an action is active.
    pub fn update<B: PinIo + ?Sized>(&mut self, io: &mut B) {
        if self.state != ActionState::Active {
            return;
        }

        let left = self.left.raw_transition_count();
        let right = self.right.raw_transition_count();
        let now = self.clock.now();

        if left == self.left_transitions && right == self.right_transitions {
            let idle = elapsed(now, self.last_update);
            if idle > self.stall_timeout {
                warn!(
                    "action {:?} stalled for {} ms at {}/{} transitions",
                    self.kind,
                    idle.ticks(),
                    left,
                    right
                );
                self.terminate(io, Outcome::TimedOut);
            }
            return;
        }

        self.left_transitions = left;
        self.right_transitions = right;
        self.last_update = now;

        if self.goal_reached() {
            self.terminate(io, Outcome::Succeeded);
            return;
        }

        let (left_speed, right_speed) = self.drift.correct(left, right);
        if (left_speed, right_speed) != (self.left_speed, self.right_speed) {
            debug!(
                "drift {}/{}: speeds {}/{} -> {}/{}",
                left, right, self.left_speed, self.right_speed, left_speed, right_speed
            );
        }
        self.left_speed = left_speed;
        self.right_speed = right_speed;

        self.drive_wheels(io);
    }

    /// Finish the action and stop both motors, whatever state it was in.
    pub fn terminate<B: PinIo + ?Sized>(&mut self, io: &mut B, outcome: Outcome) {
        self.state = outcome.into();
        self.left_speed = 0;
        self.right_speed = 0;

        self.left.drive(io, 0);
        self.right.drive(io, 0);

        info!(
            "action {:?} finished {:?} at {}/{} transitions",
            self.kind, outcome, self.left_transitions, self.right_transitions
        );
    }

    /// Let go of both motors' pins before this action is replaced.
    pub fn release<B: PinIo + ?Sized>(&mut self, io: &mut B) {
        self.left.release(io);
        self.right.release(io);
    }

    /// Take one encoder reading on each wheel.
    pub fn sample_encoders<B: PinIo + ?Sized>(&mut self, io: &mut B) {
        self.left.sample_encoder(io);
        self.right.sample_encoder(io);
    }

    pub fn status(&self) -> ActionStatus {
        ActionStatus {
            state: self.state,
            left_speed: self.left_speed,
            right_speed: self.right_speed,
            left_transitions: self.left_transitions,
            right_transitions: self.right_transitions,
        }
    }

    pub fn state(&self) -> ActionState {
        self.state
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn left(&self) -> &MotorChannel {
        &self.left
    }

    pub fn right(&self) -> &MotorChannel {
        &self.right
    }

    // The two wheels together have to cover twice the goal, so a wheel that
    // lags is made up for by the other.
    fn goal_reached(&self) -> bool {
        let travelled = u64::from(self.left_transitions) + u64::from(self.right_transitions);
        travelled >= 2 * u64::from(self.transitions_goal)
    }

    fn drive_wheels<B: PinIo + ?Sized>(&mut self, io: &mut B) {
        let (left_sign, right_sign) = self.kind.wheel_signs();
        self.left.drive(io, left_sign * i16::from(self.left_speed));
        self.right.drive(io, right_sign * i16::from(self.right_speed));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MotorPins, PwmMode};
    use crate::hal::mock::{MockBoard, MockClock};
    use crate::hal::PinState;
    use crate::motors::MotorDirection;

    const LEFT: MotorPins = MotorPins {
        enable: 9,
        forward: 7,
        reverse: 8,
        encoder: 2,
    };
    const RIGHT: MotorPins = MotorPins {
        enable: 6,
        forward: 4,
        reverse: 5,
        encoder: 3,
    };

    fn action(clock: &MockClock) -> NavAction<&MockClock> {
        NavAction::new(
            clock,
            MotorChannel::new(LEFT, PwmMode::EnablePin, 1),
            MotorChannel::new(RIGHT, PwmMode::EnablePin, 1),
            &DriveTuning::new(200, 0, 255, 500),
        )
    }

    // With a debounce of 1, two identical reads accept a level.
    fn pulse(board: &mut MockBoard, nav: &mut NavAction<&MockClock>, left: bool, right: bool) {
        for level in [PinState::High, PinState::Low] {
            if left {
                board.set_input(LEFT.encoder, level);
            }
            if right {
                board.set_input(RIGHT.encoder, level);
            }
            nav.sample_encoders(board);
            nav.sample_encoders(board);
        }
    }

    #[test]
    fn starts_idle_and_ignores_updates() {
        let clock = MockClock::new();
        let mut board = MockBoard::new();
        let mut nav = action(&clock);

        clock.advance(10_000);
        nav.update(&mut board);
        assert_eq!(nav.state(), ActionState::Idle);
        assert!(board.writes().is_empty());
    }

    #[test]
    fn start_drives_both_wheels_at_target() {
        let clock = MockClock::new();
        let mut board = MockBoard::new();
        let mut nav = action(&clock);

        nav.start(&mut board, ActionKind::Reverse, 4);
        let status = nav.status();
        assert_eq!(status.state, ActionState::Active);
        assert_eq!((status.left_speed, status.right_speed), (200, 200));
        assert_eq!(nav.left().current_direction(), MotorDirection::Reverse);
        assert_eq!(nav.right().current_direction(), MotorDirection::Reverse);
        assert_eq!(board.duty(LEFT.enable), Some(200));
        assert_eq!(board.duty(RIGHT.enable), Some(200));
    }

    #[test]
    fn right_turn_spins_wheels_apart() {
        let clock = MockClock::new();
        let mut board = MockBoard::new();
        let mut nav = action(&clock);

        nav.start(&mut board, ActionKind::Right, 3);
        assert_eq!(nav.left().current_direction(), MotorDirection::Forward);
        assert_eq!(nav.right().current_direction(), MotorDirection::Reverse);
    }

    #[test]
    fn stop_and_zero_goal_finish_immediately() {
        let clock = MockClock::new();
        let mut board = MockBoard::new();
        let mut nav = action(&clock);

        nav.start(&mut board, ActionKind::Stop, 10);
        assert_eq!(nav.state(), ActionState::Succeeded);
        assert_eq!(nav.left().current_direction(), MotorDirection::Stop);

        nav.start(&mut board, ActionKind::Forward, 0);
        assert_eq!(nav.state(), ActionState::Succeeded);
        assert_eq!(nav.right().current_direction(), MotorDirection::Stop);
    }

    #[test]
    fn progress_resets_the_stall_timer() {
        let clock = MockClock::new();
        let mut board = MockBoard::new();
        let mut nav = action(&clock);
        nav.start(&mut board, ActionKind::Forward, 50);

        for _ in 0..5 {
            clock.advance(400);
            pulse(&mut board, &mut nav, true, true);
            nav.update(&mut board);
            assert_eq!(nav.state(), ActionState::Active);
        }

        clock.advance(500);
        nav.update(&mut board);
        assert_eq!(nav.state(), ActionState::Active);

        clock.advance(1);
        nav.update(&mut board);
        assert_eq!(nav.state(), ActionState::TimedOut);
        assert_eq!(nav.status().left_transitions, 5);
    }

    #[test]
    fn terminate_is_final_until_restarted() {
        let clock = MockClock::new();
        let mut board = MockBoard::new();
        let mut nav = action(&clock);
        nav.start(&mut board, ActionKind::Forward, 50);

        nav.terminate(&mut board, Outcome::Interrupted);
        assert_eq!(nav.state(), ActionState::Interrupted);
        assert_eq!(board.level(LEFT.forward), PinState::Low);
        assert_eq!(board.level(RIGHT.forward), PinState::Low);

        board.clear_writes();
        pulse(&mut board, &mut nav, true, true);
        clock.advance(10_000);
        nav.update(&mut board);
        assert_eq!(nav.state(), ActionState::Interrupted);
        assert!(board.writes().is_empty());

        nav.start(&mut board, ActionKind::Forward, 50);
        assert_eq!(nav.state(), ActionState::Active);
        assert_eq!(nav.status().left_transitions, 0);
        assert_eq!(nav.left().raw_transition_count(), 0);
    }

    #[test]
    fn lagging_wheel_is_made_up_by_the_other() {
        let clock = MockClock::new();
        let mut board = MockBoard::new();
        let mut nav = action(&clock);
        nav.start(&mut board, ActionKind::Forward, 3);

        for _ in 0..4 {
            pulse(&mut board, &mut nav, true, false);
        }
        pulse(&mut board, &mut nav, false, true);
        nav.update(&mut board);
        assert_eq!(nav.state(), ActionState::Active);

        pulse(&mut board, &mut nav, false, true);
        nav.update(&mut board);
        assert_eq!(nav.state(), ActionState::Succeeded);
        assert_eq!(nav.status().left_transitions, 4);
        assert_eq!(nav.status().right_transitions, 2);
    }
}
