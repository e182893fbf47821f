// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Active-illumination reflectance array (line sensors).
//!
//! Each measurement is differential: sample the photosensor with the IR emitter on, then again
//! with it off, and return `ambient - lit`. Room light contributes equally to both samples and
//! cancels; what remains is the robot's own IR bouncing off the floor.
//!
//! The settle wait after each toggle ([`DEFAULT_SETTLE`], 20 ms) is enforced by the [`Emitter`];
//! shorter waits measure the transient.
//!
//! Sensor indices run left to right, `0..N`, with the center at `N / 2`.

use core::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::trace;
use serde::{Deserialize, Serialize};

pub use crate::hw::emitter::DEFAULT_SETTLE;
use crate::hw::{AnalogIn, Emitter};

/// Number of line sensors on the reference board.
pub const LINE_SENSOR_COUNT: usize = 5;

/// How a full-array snapshot is taken.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadMode {
    /// One full lit/dark cycle per sensor: `2 * settle * N` per snapshot.
    #[default]
    PerSensor,
    /// One lit/dark cycle for the whole array: `2 * settle` per snapshot.
    Batched,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Wait after each emitter toggle (ms)
    pub settle_ms: u32,
    pub read_mode: ReadMode,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            settle_ms: DEFAULT_SETTLE.as_millis() as u32,
            read_mode: ReadMode::PerSensor,
        }
    }
}

impl SensorConfig {
    #[inline]
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms as u64)
    }
}

/// `N` photosensors sharing one IR emitter.
pub struct ReflectanceArray<A, E: OutputPin, D, const N: usize> {
    inputs: [A; N],
    emitter: Emitter<E>,
    delay: D,
    config: SensorConfig,
}

impl<A, E, D, const N: usize> ReflectanceArray<A, E, D, N>
where
    A: AnalogIn,
    E: OutputPin,
    D: DelayNs,
{
    /// Build the array. The emitter's settle time is taken from `config`.
    pub fn new(inputs: [A; N], mut emitter: Emitter<E>, delay: D, config: SensorConfig) -> Self {
        assert!(N > 0, "reflectance array needs at least one sensor");
        emitter.set_settle(config.settle());
        Self {
            inputs,
            emitter,
            delay,
            config,
        }
    }

    /// Release the inputs, emitter and delay.
    pub fn free(self) -> ([A; N], Emitter<E>, D) {
        (self.inputs, self.emitter, self.delay)
    }

    #[inline]
    pub const fn len(&self) -> usize {
        N
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// Index of the middle sensor.
    #[inline]
    pub const fn center(&self) -> usize {
        N / 2
    }

    #[inline]
    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    /// Ambient-subtracted reading for one sensor. Blocks for two settle periods.
    ///
    /// Panics if `index >= N`.
    pub fn read_sensor(&mut self, index: usize) -> i32 {
        assert!(
            index < N,
            "line sensor index {} out of range (0..{})",
            index,
            N
        );

        let input = &mut self.inputs[index];
        let (lit, ambient) = self.emitter.measure(&mut self.delay, || input.read());

        let value = ambient as i32 - lit as i32;
        trace!("line[{}] lit={} ambient={} -> {}", index, lit, ambient, value);
        value
    }

    /// Snapshot of every sensor, left to right, using the configured [`ReadMode`].
    pub fn read_all(&mut self) -> [i32; N] {
        match self.config.read_mode {
            ReadMode::PerSensor => core::array::from_fn(|i| self.read_sensor(i)),
            ReadMode::Batched => {
                let inputs = &mut self.inputs;
                let (lit, ambient) = self.emitter.measure(&mut self.delay, || -> [u16; N] {
                    core::array::from_fn(|i| inputs[i].read())
                });
                core::array::from_fn(|i| ambient[i] as i32 - lit[i] as i32)
            }
        }
    }
}
