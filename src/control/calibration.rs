// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Line threshold calibration.
//!
//! The robot moves over the line in a known pattern while sampling the whole reflectance array.
//! Every snapshot is kept so the reduction can be robust:
//!
//! 1. per sensor, the maximum and minimum of its samples;
//! 2. across sensors, the median of the maxima and the median of the minima;
//! 3. `threshold = median_min + (median_max - median_min) / 2`.
//!
//! The median keeps one stuck or noisy sensor from dragging the threshold. The threshold is
//! persisted as soon as it is known. After a rotational sweep the robot keeps turning until the
//! center sensor sees the line again, so it ends up aligned and ready to follow. That alignment is
//! bounded by `max_align_steps`.

use alloc::vec::Vec;
use core::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::control::median::median;
use crate::drivers::battery::VoltageSource;
use crate::drivers::reflectance::ReflectanceArray;
use crate::error::CalibrationError;
use crate::hw::AnalogIn;
use crate::motors::{Direction, MotorDriver, Turn};
use crate::storage::{CalibrationStore, ConfigStore};

/// Motion pattern driven while sampling.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Sweep {
    /// Pivot in place for `steps` bursts of `step_ms`, sampling after each.
    Rotational { steps: u32, step_ms: u32, speed: f32 },
    /// Alternate forward/backward legs of `distance_cm`, sampling after each.
    Linear { legs: u32, distance_cm: f32 },
}

impl Default for Sweep {
    fn default() -> Self {
        Sweep::Rotational {
            steps: 30,
            step_ms: 50,
            speed: 60.0,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    pub sweep: Sweep,
    /// Re-rotate onto the line after a rotational sweep
    pub align: bool,
    /// Pivot burst between center checks while aligning (ms)
    pub align_step_ms: u32,
    pub align_speed: f32,
    /// Upper bound on alignment bursts before giving up
    pub max_align_steps: u32,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            sweep: Sweep::default(),
            align: true,
            align_step_ms: 50,
            align_speed: 60.0,
            max_align_steps: 120,
        }
    }
}

/// Reduced calibration statistics.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Extrema {
    pub median_min: f32,
    pub median_max: f32,
    pub threshold: f32,
}

/// What happened after the threshold was stored.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Alignment {
    /// Linear sweep, or alignment disabled.
    NotAttempted,
    /// Center sensor on the line after `steps` bursts.
    Aligned { steps: u32 },
    /// Gave up after `max_align_steps` bursts.
    LineNotFound,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CalibrationReport {
    pub extrema: Extrema,
    /// Number of array snapshots reduced
    pub samples: usize,
    pub alignment: Alignment,
}

impl CalibrationReport {
    #[inline]
    pub fn threshold(&self) -> f32 {
        self.extrema.threshold
    }

    #[inline]
    pub fn aligned(&self) -> bool {
        matches!(self.alignment, Alignment::Aligned { .. })
    }
}

/// Midpoint between the two medians.
#[inline]
pub fn threshold_between(median_min: f32, median_max: f32) -> f32 {
    median_min + (median_max - median_min) / 2.0
}

/// Reduce array snapshots to a threshold.
pub fn reduce<const N: usize>(snapshots: &[[i32; N]]) -> Result<Extrema, CalibrationError> {
    if snapshots.is_empty() || N == 0 {
        return Err(CalibrationError::NoSamples);
    }

    let mut maxima = [i32::MIN; N];
    let mut minima = [i32::MAX; N];
    for snapshot in snapshots {
        for (i, &value) in snapshot.iter().enumerate() {
            maxima[i] = maxima[i].max(value);
            minima[i] = minima[i].min(value);
        }
    }

    let (Some(median_max), Some(median_min)) = (median(&maxima), median(&minima)) else {
        return Err(CalibrationError::NoSamples);
    };
    if median_max <= median_min {
        return Err(CalibrationError::Degenerate {
            min: median_min,
            max: median_max,
        });
    }

    Ok(Extrema {
        median_min,
        median_max,
        threshold: threshold_between(median_min, median_max),
    })
}

/// Drives a calibration run.
pub struct Calibrator {
    config: CalibrationConfig,
}

impl Calibrator {
    pub fn new(config: CalibrationConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    /// Sweep, reduce, persist, then (rotational only) align on the line.
    ///
    /// Ends with the motors braked. On error nothing is persisted.
    pub fn run<P, D, B, A, E, SD, S, const N: usize>(
        &self,
        motors: &mut MotorDriver<P, D, B>,
        sensors: &mut ReflectanceArray<A, E, SD, N>,
        store: &mut CalibrationStore<S>,
    ) -> Result<CalibrationReport, CalibrationError>
    where
        P: SetDutyCycle,
        D: DelayNs,
        B: VoltageSource,
        A: AnalogIn,
        E: OutputPin,
        SD: DelayNs,
        S: ConfigStore,
    {
        let snapshots = self.sweep(motors, sensors);
        motors.stop();

        let extrema = reduce(&snapshots)?;
        info!(
            "Calibration: {} snapshots, median min {}, median max {}, threshold {}",
            snapshots.len(),
            extrema.median_min,
            extrema.median_max,
            extrema.threshold
        );
        store.save(extrema.threshold)?;

        let alignment = match self.config.sweep {
            Sweep::Rotational { .. } if self.config.align => {
                self.align(motors, sensors, extrema.threshold)
            }
            _ => Alignment::NotAttempted,
        };
        if alignment == Alignment::LineNotFound {
            warn!(
                "Line not found after {} alignment steps",
                self.config.max_align_steps
            );
        }

        Ok(CalibrationReport {
            extrema,
            samples: snapshots.len(),
            alignment,
        })
    }

    fn sweep<P, D, B, A, E, SD, const N: usize>(
        &self,
        motors: &mut MotorDriver<P, D, B>,
        sensors: &mut ReflectanceArray<A, E, SD, N>,
    ) -> Vec<[i32; N]>
    where
        P: SetDutyCycle,
        D: DelayNs,
        B: VoltageSource,
        A: AnalogIn,
        E: OutputPin,
        SD: DelayNs,
    {
        let mut snapshots = Vec::new();
        match self.config.sweep {
            Sweep::Rotational {
                steps,
                step_ms,
                speed,
            } => {
                let step = Duration::from_millis(step_ms as u64);
                for _ in 0..steps {
                    motors.turn_in_place(speed, Turn::Right);
                    motors.hold(step);
                    motors.stop();
                    let snapshot = sensors.read_all();
                    debug!("calibration sample {:?}", snapshot);
                    snapshots.push(snapshot);
                }
            }
            Sweep::Linear { legs, distance_cm } => {
                for leg in 0..legs {
                    let direction = if leg % 2 == 0 {
                        Direction::Forward
                    } else {
                        Direction::Backward
                    };
                    motors.move_one_step(direction, distance_cm);
                    let snapshot = sensors.read_all();
                    debug!("calibration sample {:?}", snapshot);
                    snapshots.push(snapshot);
                }
            }
        }
        snapshots
    }

    fn align<P, D, B, A, E, SD, const N: usize>(
        &self,
        motors: &mut MotorDriver<P, D, B>,
        sensors: &mut ReflectanceArray<A, E, SD, N>,
        threshold: f32,
    ) -> Alignment
    where
        P: SetDutyCycle,
        D: DelayNs,
        B: VoltageSource,
        A: AnalogIn,
        E: OutputPin,
        SD: DelayNs,
    {
        let step = Duration::from_millis(self.config.align_step_ms as u64);
        let center = sensors.center();
        let mut steps = 0;

        let alignment = loop {
            if (sensors.read_sensor(center) as f32) < threshold {
                break Alignment::Aligned { steps };
            }
            if steps >= self.config.max_align_steps {
                break Alignment::LineNotFound;
            }
            motors.turn_in_place(self.config.align_speed, Turn::Right);
            motors.hold(step);
            motors.stop();
            steps += 1;
        };
        motors.stop();
        alignment
    }
}
