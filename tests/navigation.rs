use rpc_motor::config::{
    DriveTuning, MotorPins, PwmMode, VehicleConfig, ENCODER_MIN_STABLE_COUNT, STALL_TIMEOUT_MS,
};
use rpc_motor::hal::mock::{MockBoard, MockClock, PinWrite};
use rpc_motor::hal::{PinId, PinState};
use rpc_motor::motors::{MotorDirection, OpenLoopDrive};
use rpc_motor::navigation::{ActionKind, ActionState, NavAction, Outcome};

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

fn config(pwm_mode: PwmMode) -> VehicleConfig {
    VehicleConfig {
        pwm_mode,
        left: LEFT,
        right: RIGHT,
        tuning: DriveTuning::new(255, 0, 255, STALL_TIMEOUT_MS),
        debounce_count: ENCODER_MIN_STABLE_COUNT,
    }
}

struct Rig {
    board: MockBoard,
}

impl Rig {
    fn new(nav: &NavAction<&MockClock>) -> Self {
        let mut board = MockBoard::new();
        nav.configure(&mut board);
        Self { board }
    }

    /// Hold the given encoder pins at `level` for one full debounce window, updating every tick.
    fn hold(&mut self, nav: &mut NavAction<&MockClock>, pins: &[PinId], level: PinState) {
        for &pin in pins {
            self.board.set_input(pin, level);
        }
        for _ in 0..=ENCODER_MIN_STABLE_COUNT {
            nav.sample_encoders(&mut self.board);
            nav.update(&mut self.board);
        }
    }

    fn edge(&mut self, nav: &mut NavAction<&MockClock>, pins: &[PinId]) {
        self.hold(nav, pins, PinState::High);
        self.hold(nav, pins, PinState::Low);
    }
}

fn assert_stopped(board: &MockBoard, pins: &MotorPins) {
    assert_eq!(board.level(pins.forward), PinState::Low);
    assert_eq!(board.level(pins.reverse), PinState::Low);
}

#[test]
fn forward_reaches_goal_when_both_wheels_count_ten() {
    let clock = MockClock::new();
    let mut nav = NavAction::from_config(&clock, &config(PwmMode::EnablePin));
    let mut rig = Rig::new(&nav);

    nav.start(&mut rig.board, ActionKind::Forward, 10);
    for _ in 0..10 {
        clock.advance(20);
        rig.edge(&mut nav, &[LEFT.encoder, RIGHT.encoder]);
    }

    let status = nav.status();
    assert_eq!(status.state, ActionState::Succeeded);
    assert_eq!(status.left_transitions, 10);
    assert_eq!(status.right_transitions, 10);
    assert_eq!((status.left_speed, status.right_speed), (0, 0));
    assert_stopped(&rig.board, &LEFT);
    assert_stopped(&rig.board, &RIGHT);
    assert_eq!(nav.left().current_direction(), MotorDirection::Stop);
    assert_eq!(nav.right().current_direction(), MotorDirection::Stop);
}

#[test]
fn one_wheel_stalling_out_times_the_action_out() {
    let clock = MockClock::new();
    let mut nav = NavAction::from_config(&clock, &config(PwmMode::EnablePin));
    let mut rig = Rig::new(&nav);

    nav.start(&mut rig.board, ActionKind::Forward, 20);
    for _ in 0..3 {
        clock.advance(50);
        rig.edge(&mut nav, &[LEFT.encoder]);
    }
    assert_eq!(nav.state(), ActionState::Active);
    assert_eq!(nav.status().left_transitions, 3);

    clock.advance(STALL_TIMEOUT_MS);
    nav.update(&mut rig.board);
    assert_eq!(nav.state(), ActionState::Active);

    clock.advance(1);
    nav.update(&mut rig.board);
    assert_eq!(nav.state(), ActionState::TimedOut);
    assert_stopped(&rig.board, &LEFT);
    assert_stopped(&rig.board, &RIGHT);
}

#[test]
fn left_turn_reverses_left_wheel_only() {
    let clock = MockClock::new();
    let mut nav = NavAction::from_config(&clock, &config(PwmMode::EnablePin));
    let mut rig = Rig::new(&nav);

    nav.start(&mut rig.board, ActionKind::Left, 5);
    assert_eq!(nav.left().current_direction(), MotorDirection::Reverse);
    assert_eq!(nav.right().current_direction(), MotorDirection::Forward);
    assert_eq!(rig.board.level(LEFT.reverse), PinState::High);
    assert_eq!(rig.board.level(RIGHT.forward), PinState::High);
}

#[test]
fn leading_wheel_is_held_back_until_the_other_catches_up() {
    let clock = MockClock::new();
    let mut nav = NavAction::from_config(&clock, &config(PwmMode::InputPin));
    let mut rig = Rig::new(&nav);

    nav.start(&mut rig.board, ActionKind::Forward, 50);
    rig.edge(&mut nav, &[LEFT.encoder]);

    let status = nav.status();
    assert_eq!(status.state, ActionState::Active);
    assert_eq!((status.left_speed, status.right_speed), (0, 255));
    assert_eq!(rig.board.duty(RIGHT.forward), Some(255));
    assert_eq!(nav.left().current_direction(), MotorDirection::Stop);

    rig.edge(&mut nav, &[RIGHT.encoder]);
    let status = nav.status();
    assert_eq!((status.left_speed, status.right_speed), (255, 255));
    assert_eq!(rig.board.duty(LEFT.forward), Some(255));
    assert_eq!(rig.board.duty(RIGHT.forward), Some(255));
}

#[test]
fn commanded_speeds_stay_in_range_under_any_drift() {
    let clock = MockClock::new();
    let mut cfg = config(PwmMode::EnablePin);
    cfg.tuning = DriveTuning::new(180, 60, 7, STALL_TIMEOUT_MS);
    let mut nav = NavAction::from_config(&clock, &cfg);
    let mut rig = Rig::new(&nav);

    nav.start(&mut rig.board, ActionKind::Reverse, 1_000);
    for i in 0..40 {
        let pins: &[PinId] = match i % 5 {
            0 | 1 | 2 => &[LEFT.encoder],
            3 => &[RIGHT.encoder],
            _ => &[LEFT.encoder, RIGHT.encoder],
        };
        rig.edge(&mut nav, pins);

        let status = nav.status();
        assert!(status.left_speed <= 180 && status.right_speed <= 180);
        for write in rig.board.writes() {
            if let PinWrite::Analog(pin, duty) = *write {
                assert!(pin == LEFT.enable || pin == RIGHT.enable);
                assert!(duty <= 180);
            }
        }
    }
    assert_eq!(nav.state(), ActionState::Active);
}

#[test]
fn restart_stops_motors_before_new_command() {
    let clock = MockClock::new();
    let mut nav = NavAction::from_config(&clock, &config(PwmMode::EnablePin));
    let mut rig = Rig::new(&nav);

    nav.start(&mut rig.board, ActionKind::Forward, 30);
    rig.edge(&mut nav, &[LEFT.encoder, RIGHT.encoder]);
    rig.board.clear_writes();

    nav.start(&mut rig.board, ActionKind::Reverse, 30);
    let writes = rig.board.writes();
    let stop = [
        PinWrite::Digital(LEFT.reverse, PinState::Low),
        PinWrite::Digital(LEFT.forward, PinState::Low),
        PinWrite::Digital(RIGHT.reverse, PinState::Low),
        PinWrite::Digital(RIGHT.forward, PinState::Low),
    ];
    assert_eq!(&writes[..4], &stop);
    assert!(writes[4..].contains(&PinWrite::Digital(LEFT.reverse, PinState::High)));
    assert!(writes[4..].contains(&PinWrite::Digital(RIGHT.reverse, PinState::High)));

    assert_eq!(nav.state(), ActionState::Active);
    assert_eq!(nav.status().left_transitions, 0);
    assert_eq!(nav.left().raw_transition_count(), 0);
}

#[test]
fn updates_after_terminate_do_nothing() {
    let clock = MockClock::new();
    let mut nav = NavAction::from_config(&clock, &config(PwmMode::EnablePin));
    let mut rig = Rig::new(&nav);

    nav.start(&mut rig.board, ActionKind::Forward, 30);
    nav.terminate(&mut rig.board, Outcome::Interrupted);
    rig.board.clear_writes();

    rig.edge(&mut nav, &[LEFT.encoder, RIGHT.encoder]);
    clock.advance(5_000);
    nav.update(&mut rig.board);

    assert_eq!(nav.state(), ActionState::Interrupted);
    assert!(rig.board.writes().is_empty());
}
