// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Analog proximity (obstacle) sensors.
//!
//! The receivers pull their output down when something reflects the robot's IR back, so a reading
//! below the threshold means an obstacle is close.

use log::trace;
use serde::{Deserialize, Serialize};

use crate::hw::AnalogIn;

/// Number of obstacle sensors on the reference board.
pub const OBSTACLE_SENSOR_COUNT: usize = 4;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleConfig {
    /// Raw readings strictly below this count as an obstacle
    pub threshold: u16,
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self { threshold: 10_000 }
    }
}

pub struct ObstacleArray<A, const N: usize> {
    inputs: [A; N],
    config: ObstacleConfig,
}

impl<A: AnalogIn, const N: usize> ObstacleArray<A, N> {
    pub fn new(inputs: [A; N], config: ObstacleConfig) -> Self {
        Self { inputs, config }
    }

    pub fn free(self) -> [A; N] {
        self.inputs
    }

    /// Raw sample of sensor `index`. Panics if `index >= N`.
    pub fn read_raw(&mut self, index: usize) -> u16 {
        assert!(
            index < N,
            "obstacle sensor index {} out of range (0..{})",
            index,
            N
        );
        self.inputs[index].read()
    }

    pub fn is_obstacle(&mut self, index: usize) -> bool {
        let raw = self.read_raw(index);
        trace!("obstacle[{}] raw={}", index, raw);
        raw < self.config.threshold
    }

    /// Obstacle flags for every sensor.
    pub fn scan(&mut self) -> [bool; N] {
        core::array::from_fn(|i| self.is_obstacle(i))
    }
}
