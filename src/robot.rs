// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! One owned robot: drive train, line sensors, calibration store and the two control loops.
//!
//! Typical usage pattern:
//!
//! ```ignore
//! let mut robot = Robot::new(motors, line, CalibrationStore::new(store), &config);
//! robot.calibrate()?;
//! robot.follow_line(&stop_requested);
//! ```

use core::sync::atomic::AtomicBool;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;

use crate::config::RobotConfig;
use crate::control::{Action, CalibrationReport, Calibrator, LineFollower};
use crate::drivers::battery::VoltageSource;
use crate::drivers::reflectance::{ReflectanceArray, LINE_SENSOR_COUNT};
use crate::error::Result;
use crate::hw::AnalogIn;
use crate::motors::MotorDriver;
use crate::storage::{CalibrationStore, ConfigStore};

pub struct Robot<P, D, B, A, E: OutputPin, SD, S> {
    motors: MotorDriver<P, D, B>,
    line: ReflectanceArray<A, E, SD, LINE_SENSOR_COUNT>,
    store: CalibrationStore<S>,
    calibrator: Calibrator,
    follower: LineFollower,
}

impl<P, D, B, A, E, SD, S> Robot<P, D, B, A, E, SD, S>
where
    P: SetDutyCycle,
    D: DelayNs,
    B: VoltageSource,
    A: AnalogIn,
    E: OutputPin,
    SD: DelayNs,
    S: ConfigStore,
{
    /// Assemble the robot. The line threshold is loaded from `store` (or defaulted) right away.
    pub fn new(
        motors: MotorDriver<P, D, B>,
        line: ReflectanceArray<A, E, SD, LINE_SENSOR_COUNT>,
        mut store: CalibrationStore<S>,
        config: &RobotConfig,
    ) -> Self {
        let follower = LineFollower::from_store(&mut store, config.policy);
        Self {
            motors,
            line,
            store,
            calibrator: Calibrator::new(config.calibration),
            follower,
        }
    }

    /// Tear down the robot and return its constituent parts.
    pub fn free(
        self,
    ) -> (
        MotorDriver<P, D, B>,
        ReflectanceArray<A, E, SD, LINE_SENSOR_COUNT>,
        CalibrationStore<S>,
    ) {
        (self.motors, self.line, self.store)
    }

    #[inline]
    pub fn threshold(&self) -> f32 {
        self.follower.threshold()
    }

    pub fn motors(&mut self) -> &mut MotorDriver<P, D, B> {
        &mut self.motors
    }

    pub fn line(&mut self) -> &mut ReflectanceArray<A, E, SD, LINE_SENSOR_COUNT> {
        &mut self.line
    }

    pub fn store(&mut self) -> &mut CalibrationStore<S> {
        &mut self.store
    }

    /// Run a calibration and start following with the new threshold.
    pub fn calibrate(&mut self) -> Result<CalibrationReport> {
        let report = self
            .calibrator
            .run(&mut self.motors, &mut self.line, &mut self.store)?;
        self.follower = LineFollower::new(report.threshold(), *self.follower.config());
        Ok(report)
    }

    /// One line-following tick.
    pub fn follow_line_tick(&mut self) -> Action {
        self.follower.tick(&mut self.motors, &mut self.line)
    }

    /// Follow the line until `cancel` is set. Returns the number of completed ticks.
    pub fn follow_line(&mut self, cancel: &AtomicBool) -> u32 {
        self.follower.run(&mut self.motors, &mut self.line, cancel)
    }
}
