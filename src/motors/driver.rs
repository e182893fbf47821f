// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Dual H-bridge wheel driver.
//!
//! Each wheel is driven by two PWM legs. Driving one leg while the other is low turns the wheel;
//! both legs low lets it coast; both legs at full duty shorts the motor for a hard stop (brake).
//! Both legs at any other non-zero combination is never commanded.
//!
//! Wiring on the reference board:
//! - Bridge A (right wheel): forward leg AIN2, reverse leg AIN1
//! - Bridge B (left wheel):  forward leg BIN2, reverse leg BIN1
//!
//! Timed motions (`move_one_step`, `turn_one_step`) block for a duration derived from
//! [`Kinematics`] and the current battery voltage, then brake.

use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::pwm::SetDutyCycle;
use log::debug;

use crate::drivers::battery::VoltageSource;
use crate::hw::{self, DUTY_MAX};
use crate::motors::kinematics::Kinematics;
use crate::motors::speed::map_speed;

/// Default granularity of cancellable holds.
pub const DEFAULT_HOLD_SLICE: Duration = Duration::from_millis(10);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Wheel {
    Left,
    Right,
}

/// Straight-line direction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// In-place rotation direction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Turn {
    Left,
    Right,
}

/// Logical state of one wheel's bridge.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WheelState {
    /// Both legs low, wheel spins down freely.
    Coast,
    Forward(u16),
    Backward(u16),
    /// Both legs at full duty, motor leads shorted.
    Brake,
}

/// Last duty written to each of the four legs.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MotorState {
    pub a_fwd: u16,
    pub a_rev: u16,
    pub b_fwd: u16,
    pub b_rev: u16,
}

impl MotorState {
    fn legs(&self, wheel: Wheel) -> (u16, u16) {
        match wheel {
            Wheel::Right => (self.a_fwd, self.a_rev),
            Wheel::Left => (self.b_fwd, self.b_rev),
        }
    }

    /// Decode the legs of one wheel back into a [`WheelState`].
    ///
    /// `None` when both legs are driven at anything other than full duty, which is never a valid
    /// bridge state.
    pub fn wheel(&self, wheel: Wheel) -> Option<WheelState> {
        match self.legs(wheel) {
            (0, 0) => Some(WheelState::Coast),
            (DUTY_MAX, DUTY_MAX) => Some(WheelState::Brake),
            (fwd, 0) => Some(WheelState::Forward(fwd)),
            (0, rev) => Some(WheelState::Backward(rev)),
            _ => None,
        }
    }

    pub fn is_braked(&self) -> bool {
        self.wheel(Wheel::Left) == Some(WheelState::Brake)
            && self.wheel(Wheel::Right) == Some(WheelState::Brake)
    }

    pub fn is_coasting(&self) -> bool {
        *self == MotorState::default()
    }
}

/// Outcome of a cancellable timed motion.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Motion {
    Completed,
    Cancelled,
}

/// The four PWM legs of the two bridges.
pub struct MotorLegs<P> {
    /// AIN2, right wheel forward
    pub a_fwd: P,
    /// AIN1, right wheel reverse
    pub a_rev: P,
    /// BIN2, left wheel forward
    pub b_fwd: P,
    /// BIN1, left wheel reverse
    pub b_rev: P,
}

/// Differential drive built from four PWM legs, a delay and a battery voltage source.
pub struct MotorDriver<P, D, B> {
    legs: MotorLegs<P>,
    delay: D,
    battery: B,
    kinematics: Kinematics,
    state: MotorState,
    hold_slice: Duration,
}

impl<P, D, B> MotorDriver<P, D, B>
where
    P: SetDutyCycle,
    D: DelayNs,
    B: VoltageSource,
{
    /// Take ownership of the legs and start with both wheels coasting.
    pub fn new(legs: MotorLegs<P>, delay: D, battery: B, kinematics: Kinematics) -> Self {
        let mut driver = Self {
            legs,
            delay,
            battery,
            kinematics,
            state: MotorState::default(),
            hold_slice: DEFAULT_HOLD_SLICE,
        };
        driver.coast();
        driver
    }

    /// Change how often cancellable holds check their flag.
    pub fn with_hold_slice(mut self, slice: Duration) -> Self {
        if slice > Duration::ZERO {
            self.hold_slice = slice;
        }
        self
    }

    /// Tear down the driver and return its constituent parts.
    pub fn free(self) -> (MotorLegs<P>, D, B) {
        (self.legs, self.delay, self.battery)
    }

    #[inline]
    pub fn state(&self) -> MotorState {
        self.state
    }

    #[inline]
    pub fn kinematics(&self) -> &Kinematics {
        &self.kinematics
    }

    /// Current battery voltage as reported by the voltage source.
    pub fn battery_voltage(&mut self) -> f32 {
        self.battery.voltage()
    }

    fn write(pwm: &mut P, duty: u16) {
        pwm.set_duty_cycle_fraction(duty, DUTY_MAX).ok();
    }

    /// Command one wheel. The leg being released is always written first.
    pub fn set_wheel(&mut self, wheel: Wheel, target: WheelState) {
        let (fwd, rev) = match target {
            WheelState::Coast => (0, 0),
            WheelState::Forward(d) => (d, 0),
            WheelState::Backward(d) => (0, d),
            WheelState::Brake => (DUTY_MAX, DUTY_MAX),
        };

        let (fwd_pin, rev_pin, fwd_slot, rev_slot) = match wheel {
            Wheel::Right => (
                &mut self.legs.a_fwd,
                &mut self.legs.a_rev,
                &mut self.state.a_fwd,
                &mut self.state.a_rev,
            ),
            Wheel::Left => (
                &mut self.legs.b_fwd,
                &mut self.legs.b_rev,
                &mut self.state.b_fwd,
                &mut self.state.b_rev,
            ),
        };

        if fwd == 0 {
            Self::write(fwd_pin, fwd);
            Self::write(rev_pin, rev);
        } else {
            Self::write(rev_pin, rev);
            Self::write(fwd_pin, fwd);
        }
        *fwd_slot = fwd;
        *rev_slot = rev;
    }

    fn drive(&mut self, left: WheelState, right: WheelState) {
        self.set_wheel(Wheel::Right, right);
        self.set_wheel(Wheel::Left, left);
    }

    /// Both wheels forward.
    pub fn move_forward(&mut self, speed: f32) {
        let duty = map_speed(speed);
        self.drive(WheelState::Forward(duty), WheelState::Forward(duty));
    }

    /// Both wheels backward.
    pub fn move_backward(&mut self, speed: f32) {
        let duty = map_speed(speed);
        self.drive(WheelState::Backward(duty), WheelState::Backward(duty));
    }

    /// Pivot left: right wheel forward, left wheel backward.
    pub fn turn_left(&mut self, speed: f32) {
        let duty = map_speed(speed);
        self.drive(WheelState::Backward(duty), WheelState::Forward(duty));
    }

    /// Pivot right: left wheel forward, right wheel backward.
    pub fn turn_right(&mut self, speed: f32) {
        let duty = map_speed(speed);
        self.drive(WheelState::Forward(duty), WheelState::Backward(duty));
    }

    /// Zero-radius turn with counter-rotating wheels.
    pub fn turn_in_place(&mut self, speed: f32, turn: Turn) {
        match turn {
            Turn::Left => self.turn_left(speed),
            Turn::Right => self.turn_right(speed),
        }
    }

    /// Drive a single wheel forward, leaving the other wheel as it is.
    pub fn spin_wheel_forward(&mut self, wheel: Wheel, speed: f32) {
        self.set_wheel(wheel, WheelState::Forward(map_speed(speed)));
    }

    /// Drive a single wheel backward, leaving the other wheel as it is.
    pub fn spin_wheel_backward(&mut self, wheel: Wheel, speed: f32) {
        self.set_wheel(wheel, WheelState::Backward(map_speed(speed)));
    }

    /// Hard stop: all four legs at full duty.
    pub fn stop(&mut self) {
        self.drive(WheelState::Brake, WheelState::Brake);
    }

    /// Release drive entirely: all four legs at zero.
    pub fn coast(&mut self) {
        self.drive(WheelState::Coast, WheelState::Coast);
    }

    /// Block for `duration` with the current outputs held.
    pub fn hold(&mut self, duration: Duration) {
        hw::sleep(&mut self.delay, duration);
    }

    /// Block for `duration` in slices, returning early once `cancel` is set.
    pub fn hold_cancellable(&mut self, duration: Duration, cancel: &AtomicBool) -> Motion {
        let mut remaining = duration;
        while remaining > Duration::ZERO {
            if cancel.load(Ordering::Relaxed) {
                return Motion::Cancelled;
            }
            let slice = remaining.min(self.hold_slice);
            hw::sleep(&mut self.delay, slice);
            remaining -= slice;
        }
        if cancel.load(Ordering::Relaxed) {
            Motion::Cancelled
        } else {
            Motion::Completed
        }
    }

    fn start_step(&mut self, direction: Direction) {
        match direction {
            Direction::Forward => {
                self.drive(WheelState::Forward(DUTY_MAX), WheelState::Forward(DUTY_MAX))
            }
            Direction::Backward => {
                self.drive(WheelState::Backward(DUTY_MAX), WheelState::Backward(DUTY_MAX))
            }
        }
    }

    fn start_turn(&mut self, turn: Turn) {
        match turn {
            Turn::Left => self.drive(WheelState::Backward(DUTY_MAX), WheelState::Forward(DUTY_MAX)),
            Turn::Right => {
                self.drive(WheelState::Forward(DUTY_MAX), WheelState::Backward(DUTY_MAX))
            }
        }
    }

    /// Duration a straight step of `distance_cm` would take at the current battery voltage.
    pub fn step_duration(&mut self, distance_cm: f32) -> Duration {
        let volts = self.battery.voltage();
        self.kinematics.step_duration(distance_cm, volts)
    }

    /// Duration an in-place turn of `angle_deg` would take at the current battery voltage.
    pub fn turn_duration(&mut self, angle_deg: f32) -> Duration {
        let volts = self.battery.voltage();
        self.kinematics.turn_duration(angle_deg, volts)
    }

    /// Drive `distance_cm` at full duty, then brake. Returns the time the motors were on.
    pub fn move_one_step(&mut self, direction: Direction, distance_cm: f32) -> Duration {
        let duration = self.step_duration(distance_cm);
        debug!("step {:?} {} cm for {:?}", direction, distance_cm, duration);
        self.start_step(direction);
        self.hold(duration);
        self.stop();
        duration
    }

    /// Pivot by `angle_deg` at full duty, then brake. Returns the time the motors were on.
    pub fn turn_one_step(&mut self, turn: Turn, angle_deg: f32) -> Duration {
        let duration = self.turn_duration(angle_deg);
        debug!("turn {:?} {} deg for {:?}", turn, angle_deg, duration);
        self.start_turn(turn);
        self.hold(duration);
        self.stop();
        duration
    }

    /// [`move_one_step`](Self::move_one_step) that can be aborted. Always ends braked.
    pub fn move_one_step_cancellable(
        &mut self,
        direction: Direction,
        distance_cm: f32,
        cancel: &AtomicBool,
    ) -> Motion {
        let duration = self.step_duration(distance_cm);
        self.start_step(direction);
        let motion = self.hold_cancellable(duration, cancel);
        self.stop();
        motion
    }

    /// [`turn_one_step`](Self::turn_one_step) that can be aborted. Always ends braked.
    pub fn turn_one_step_cancellable(
        &mut self,
        turn: Turn,
        angle_deg: f32,
        cancel: &AtomicBool,
    ) -> Motion {
        let duration = self.turn_duration(angle_deg);
        self.start_turn(turn);
        let motion = self.hold_cancellable(duration, cancel);
        self.stop();
        motion
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hw::mock::{EventKind, MockDelay, MockPwm, Timeline};
    use alloc::rc::Rc;
    use core::cell::Cell;

    type Driver = MotorDriver<MockPwm, MockDelay, fn() -> f32>;

    struct Rig {
        timeline: Timeline,
        a_fwd: Rc<Cell<u16>>,
        a_rev: Rc<Cell<u16>>,
        b_fwd: Rc<Cell<u16>>,
        b_rev: Rc<Cell<u16>>,
        driver: Driver,
    }

    fn four_volts() -> f32 {
        4.0
    }

    fn rig() -> Rig {
        let timeline = Timeline::new();
        let legs = MotorLegs {
            a_fwd: MockPwm::new(&timeline, "ain2"),
            a_rev: MockPwm::new(&timeline, "ain1"),
            b_fwd: MockPwm::new(&timeline, "bin2"),
            b_rev: MockPwm::new(&timeline, "bin1"),
        };
        let (a_fwd, a_rev, b_fwd, b_rev) = (
            legs.a_fwd.duty(),
            legs.a_rev.duty(),
            legs.b_fwd.duty(),
            legs.b_rev.duty(),
        );
        let driver = MotorDriver::new(
            legs,
            MockDelay::new(&timeline),
            four_volts as fn() -> f32,
            Kinematics::default(),
        );
        Rig {
            timeline,
            a_fwd,
            a_rev,
            b_fwd,
            b_rev,
            driver,
        }
    }

    impl Rig {
        fn legs(&self) -> [u16; 4] {
            [
                self.a_fwd.get(),
                self.a_rev.get(),
                self.b_fwd.get(),
                self.b_rev.get(),
            ]
        }
    }

    #[test]
    fn starts_coasting() {
        let r = rig();
        assert_eq!(r.legs(), [0, 0, 0, 0]);
        assert!(r.driver.state().is_coasting());
    }

    #[test]
    fn forward_and_backward_use_mapped_duty() {
        let mut r = rig();
        let duty = map_speed(60.0);
        r.driver.move_forward(60.0);
        assert_eq!(r.legs(), [duty, 0, duty, 0]);
        r.driver.move_backward(60.0);
        assert_eq!(r.legs(), [0, duty, 0, duty]);
        assert_eq!(
            r.driver.state().wheel(Wheel::Left),
            Some(WheelState::Backward(duty))
        );
    }

    #[test]
    fn pivots_counter_rotate() {
        let mut r = rig();
        let duty = map_speed(50.0);
        r.driver.turn_left(50.0);
        assert_eq!(r.legs(), [duty, 0, 0, duty]);
        r.driver.turn_in_place(50.0, Turn::Right);
        assert_eq!(r.legs(), [0, duty, duty, 0]);
    }

    #[test]
    fn brake_and_coast_are_distinct() {
        let mut r = rig();
        r.driver.move_forward(80.0);
        r.driver.stop();
        assert_eq!(r.legs(), [DUTY_MAX; 4]);
        assert!(r.driver.state().is_braked());
        r.driver.coast();
        assert_eq!(r.legs(), [0; 4]);
    }

    #[test]
    fn half_driven_leg_pair_has_no_wheel_state() {
        let state = MotorState {
            a_fwd: 30_000,
            a_rev: 10_000,
            b_fwd: DUTY_MAX,
            b_rev: DUTY_MAX,
        };
        assert_eq!(state.wheel(Wheel::Right), None);
        assert_eq!(state.wheel(Wheel::Left), Some(WheelState::Brake));
        assert!(!state.is_braked());

        let lopsided = MotorState {
            b_fwd: DUTY_MAX,
            b_rev: 1,
            ..MotorState::default()
        };
        assert_eq!(lopsided.wheel(Wheel::Left), None);
    }

    #[test]
    fn single_wheel_spin_leaves_other_wheel_alone() {
        let mut r = rig();
        r.driver.stop();
        r.driver.spin_wheel_forward(Wheel::Right, 60.0);
        let duty = map_speed(60.0);
        assert_eq!(r.legs(), [duty, 0, DUTY_MAX, DUTY_MAX]);
        r.driver.spin_wheel_backward(Wheel::Left, 60.0);
        assert_eq!(r.legs(), [duty, 0, 0, duty]);
    }

    #[test]
    fn reversing_never_drives_both_legs() {
        let mut r = rig();
        r.driver.move_forward(100.0);
        r.timeline.clear_events();
        r.driver.move_backward(100.0);

        // Replay the writes and check the bridge after each one.
        let mut ain1 = 0u16;
        let mut ain2 = DUTY_MAX;
        for e in r.timeline.events() {
            if let EventKind::Duty(d) = e.kind {
                match e.source {
                    "ain1" => ain1 = d,
                    "ain2" => ain2 = d,
                    _ => continue,
                }
                assert!(ain1 == 0 || ain2 == 0, "both A legs driven");
            }
        }
    }

    #[test]
    fn turn_one_step_brakes_after_computed_duration() {
        let mut r = rig();
        let expected = Kinematics::default().turn_duration(90.0, 4.0);
        let start = r.timeline.now();
        let used = r.driver.turn_one_step(Turn::Left, 90.0);
        assert_eq!(used, expected);

        let events = r.timeline.events();
        let turn_cmd = events
            .iter()
            .find(|e| e.source == "ain2" && e.kind == EventKind::Duty(DUTY_MAX))
            .expect("turn command");
        let brake = events
            .iter()
            .rev()
            .find(|e| e.source == "bin2" && e.kind == EventKind::Duty(DUTY_MAX))
            .expect("brake command");
        assert_eq!(turn_cmd.at, start);
        let elapsed = (brake.at - turn_cmd.at).as_secs_f64();
        assert!((elapsed - 0.427_36).abs() < 1e-3, "elapsed {elapsed}");
        assert!(r.driver.state().is_braked());
    }

    #[test]
    fn move_one_step_runs_full_duty_then_brakes() {
        let mut r = rig();
        let used = r.driver.move_one_step(Direction::Forward, 15.0);
        assert_eq!(r.timeline.now(), Duration::from_micros(used.as_micros() as u64));
        assert!(r.driver.state().is_braked());
        let forward_writes = r
            .timeline
            .events()
            .iter()
            .filter(|e| e.kind == EventKind::Duty(DUTY_MAX) && e.at == Duration::ZERO)
            .count();
        assert_eq!(forward_writes, 2);
    }

    #[test]
    fn cancelled_step_stops_early_and_brakes() {
        let mut r = rig();
        let cancel = AtomicBool::new(true);
        let motion = r
            .driver
            .move_one_step_cancellable(Direction::Backward, 30.0, &cancel);
        assert_eq!(motion, Motion::Cancelled);
        assert_eq!(r.timeline.now(), Duration::ZERO);
        assert!(r.driver.state().is_braked());
    }

    #[test]
    fn uncancelled_turn_completes() {
        let mut r = rig();
        let cancel = AtomicBool::new(false);
        let motion = r
            .driver
            .turn_one_step_cancellable(Turn::Right, 45.0, &cancel);
        assert_eq!(motion, Motion::Completed);
        let expected = Kinematics::default().turn_duration(45.0, 4.0);
        let diff = r.timeline.now().as_secs_f64() - expected.as_secs_f64();
        assert!(diff.abs() < 1e-3);
    }

    #[test]
    fn coarse_channels_are_scaled() {
        let timeline = Timeline::new();
        let a_fwd = MockPwm::with_max(&timeline, "ain2", 1000);
        let duty = a_fwd.duty();
        let legs = MotorLegs {
            a_fwd,
            a_rev: MockPwm::with_max(&timeline, "ain1", 1000),
            b_fwd: MockPwm::with_max(&timeline, "bin2", 1000),
            b_rev: MockPwm::with_max(&timeline, "bin1", 1000),
        };
        let mut driver = MotorDriver::new(
            legs,
            MockDelay::new(&timeline),
            four_volts as fn() -> f32,
            Kinematics::default(),
        );
        driver.stop();
        assert_eq!(duty.get(), 1000);
    }
}
