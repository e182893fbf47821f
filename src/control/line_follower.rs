// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Reactive line-following policy.
//!
//! Once per tick the five line sensors are sampled and the first matching rule wins:
//!
//! | Priority | Condition (reading < threshold) | Action |
//! | -------- | ------------------------------- | ------ |
//! | 1 | center (2) | both wheels forward |
//! | 2 | far left (0) | stop, right wheel forward, pause |
//! | 3 | near left (1) | stop, right wheel forward |
//! | 4 | near right (3) | stop, left wheel forward |
//! | 5 | far right (4) | stop, left wheel forward, pause |
//! | 6 | none | stop |
//!
//! Far corrections hold the spin for an extra pause to undo the larger overshoot. Near corrections
//! do not.
//!
//! A reading below the threshold is "line seen", which assumes a line darker than the floor.

use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::drivers::battery::VoltageSource;
use crate::drivers::reflectance::{ReflectanceArray, LINE_SENSOR_COUNT};
use crate::hw::AnalogIn;
use crate::motors::{Motion, MotorDriver, Wheel};
use crate::storage::{CalibrationStore, ConfigStore};

const FAR_LEFT: usize = 0;
const NEAR_LEFT: usize = 1;
const CENTER: usize = 2;
const NEAR_RIGHT: usize = 3;
const FAR_RIGHT: usize = 4;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Straight-ahead speed (percent)
    pub forward_speed: f32,
    /// Single-wheel correction speed (percent)
    pub correction_speed: f32,
    /// Extra hold after a far correction (ms)
    pub far_pause_ms: u32,
    /// Wait after applying each action (ms)
    pub tick_ms: u32,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            forward_speed: 60.0,
            correction_speed: 60.0,
            far_pause_ms: 100,
            tick_ms: 100,
        }
    }
}

impl PolicyConfig {
    #[inline]
    pub fn far_pause(&self) -> Duration {
        Duration::from_millis(self.far_pause_ms as u64)
    }

    #[inline]
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms as u64)
    }
}

/// How far off-center the line was seen.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Reach {
    Near,
    Far,
}

/// Motor action chosen for one tick.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Forward,
    /// Brake, then drive `wheel` forward alone.
    Steer { wheel: Wheel, reach: Reach },
    Stop,
}

/// Pure decision rule: map one snapshot to an action.
pub fn decide(readings: &[i32; LINE_SENSOR_COUNT], threshold: f32) -> Action {
    let seen = |i: usize| (readings[i] as f32) < threshold;

    if seen(CENTER) {
        Action::Forward
    } else if seen(FAR_LEFT) {
        Action::Steer {
            wheel: Wheel::Right,
            reach: Reach::Far,
        }
    } else if seen(NEAR_LEFT) {
        Action::Steer {
            wheel: Wheel::Right,
            reach: Reach::Near,
        }
    } else if seen(NEAR_RIGHT) {
        Action::Steer {
            wheel: Wheel::Left,
            reach: Reach::Near,
        }
    } else if seen(FAR_RIGHT) {
        Action::Steer {
            wheel: Wheel::Left,
            reach: Reach::Far,
        }
    } else {
        Action::Stop
    }
}

/// Calibrated line follower.
pub struct LineFollower {
    threshold: f32,
    config: PolicyConfig,
}

impl LineFollower {
    pub fn new(threshold: f32, config: PolicyConfig) -> Self {
        Self { threshold, config }
    }

    /// Load the persisted threshold, falling back to the default record.
    pub fn from_store<S: ConfigStore>(store: &mut CalibrationStore<S>, config: PolicyConfig) -> Self {
        let threshold = store.load_or_default();
        info!("Line follower threshold {}", threshold);
        Self::new(threshold, config)
    }

    #[inline]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    #[inline]
    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    pub fn decide(&self, readings: &[i32; LINE_SENSOR_COUNT]) -> Action {
        decide(readings, self.threshold)
    }

    /// Sample, decide, act, then wait out the tick. Returns the action taken.
    pub fn tick<P, D, B, A, E, SD>(
        &self,
        motors: &mut MotorDriver<P, D, B>,
        sensors: &mut ReflectanceArray<A, E, SD, LINE_SENSOR_COUNT>,
    ) -> Action
    where
        P: SetDutyCycle,
        D: DelayNs,
        B: VoltageSource,
        A: AnalogIn,
        E: OutputPin,
        SD: DelayNs,
    {
        let (action, _) = self.step(motors, sensors, None);
        action
    }

    /// Tick until `cancel` is set, then brake. Returns the number of completed ticks.
    pub fn run<P, D, B, A, E, SD>(
        &self,
        motors: &mut MotorDriver<P, D, B>,
        sensors: &mut ReflectanceArray<A, E, SD, LINE_SENSOR_COUNT>,
        cancel: &AtomicBool,
    ) -> u32
    where
        P: SetDutyCycle,
        D: DelayNs,
        B: VoltageSource,
        A: AnalogIn,
        E: OutputPin,
        SD: DelayNs,
    {
        let mut ticks = 0;
        while !cancel.load(Ordering::Relaxed) {
            let (_, motion) = self.step(motors, sensors, Some(cancel));
            if motion == Motion::Cancelled {
                break;
            }
            ticks += 1;
        }
        motors.stop();
        info!("Line following stopped after {} ticks", ticks);
        ticks
    }

    fn step<P, D, B, A, E, SD>(
        &self,
        motors: &mut MotorDriver<P, D, B>,
        sensors: &mut ReflectanceArray<A, E, SD, LINE_SENSOR_COUNT>,
        cancel: Option<&AtomicBool>,
    ) -> (Action, Motion)
    where
        P: SetDutyCycle,
        D: DelayNs,
        B: VoltageSource,
        A: AnalogIn,
        E: OutputPin,
        SD: DelayNs,
    {
        let readings = sensors.read_all();
        let action = self.decide(&readings);
        debug!("line {:?} -> {:?}", readings, action);

        let mut motion = self.apply(motors, action, cancel);
        if motion == Motion::Completed {
            motion = wait(motors, self.config.tick(), cancel);
        }
        (action, motion)
    }

    fn apply<P, D, B>(
        &self,
        motors: &mut MotorDriver<P, D, B>,
        action: Action,
        cancel: Option<&AtomicBool>,
    ) -> Motion
    where
        P: SetDutyCycle,
        D: DelayNs,
        B: VoltageSource,
    {
        match action {
            Action::Forward => {
                motors.move_forward(self.config.forward_speed);
                Motion::Completed
            }
            Action::Steer { wheel, reach } => {
                motors.stop();
                motors.spin_wheel_forward(wheel, self.config.correction_speed);
                match reach {
                    Reach::Near => Motion::Completed,
                    Reach::Far => wait(motors, self.config.far_pause(), cancel),
                }
            }
            Action::Stop => {
                motors.stop();
                Motion::Completed
            }
        }
    }
}

fn wait<P, D, B>(
    motors: &mut MotorDriver<P, D, B>,
    duration: Duration,
    cancel: Option<&AtomicBool>,
) -> Motion
where
    P: SetDutyCycle,
    D: DelayNs,
    B: VoltageSource,
{
    match cancel {
        Some(flag) => motors.hold_cancellable(duration, flag),
        None => {
            motors.hold(duration);
            Motion::Completed
        }
    }
}
