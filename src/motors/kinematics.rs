// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Open-loop drive model used to turn distances and angles into motor-on durations.
//!
//! The robot has no wheel encoders. Wheel speed is estimated from battery voltage with a linear
//! motor constant, so timed steps get shorter as the battery charges and longer as it sags.

use core::f32::consts::PI;
use core::time::Duration;

use serde::{Deserialize, Serialize};

/// Geometry and motor constants.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Kinematics {
    /// Wheel diameter (mm)
    pub wheel_diameter_mm: f32,
    /// Distance between the two wheel contact points (mm)
    pub wheel_separation_mm: f32,
    /// Unloaded motor speed per battery volt (rpm/V)
    pub rpm_per_volt: f32,
    /// Voltage floor applied before estimating wheel speed (V)
    pub min_battery_voltage: f32,
}

impl Default for Kinematics {
    fn default() -> Self {
        Self {
            wheel_diameter_mm: 33.5,
            wheel_separation_mm: 77.5,
            rpm_per_volt: 20.3,
            min_battery_voltage: 2.0,
        }
    }
}

impl Kinematics {
    /// Ground distance covered by one wheel revolution (cm).
    #[inline]
    pub fn distance_per_revolution_cm(&self) -> f32 {
        PI * self.wheel_diameter_mm / 10.0
    }

    /// Estimated wheel revolutions per second at full duty.
    ///
    /// Readings below `min_battery_voltage` (including a dead or disconnected sense line) are
    /// treated as the floor so the result never collapses to zero.
    pub fn revolutions_per_second(&self, battery_voltage: f32) -> f32 {
        let volts = battery_voltage.max(self.min_battery_voltage);
        (self.rpm_per_volt * volts) / 60.0
    }

    /// Ratio applied to in-place turns: the wheels travel along the separation circle.
    #[inline]
    pub fn turn_ratio(&self) -> f32 {
        self.wheel_separation_mm / self.wheel_diameter_mm
    }

    /// Motor-on time to travel `distance_cm` in a straight line.
    pub fn step_duration(&self, distance_cm: f32, battery_voltage: f32) -> Duration {
        let revolutions = distance_cm / self.distance_per_revolution_cm();
        secs(revolutions / self.revolutions_per_second(battery_voltage))
    }

    /// Motor-on time to pivot in place by `angle_deg`.
    pub fn turn_duration(&self, angle_deg: f32, battery_voltage: f32) -> Duration {
        let rps = self.revolutions_per_second(battery_voltage);
        secs((angle_deg / (360.0 * rps)) * self.turn_ratio())
    }
}

/// Non-finite or negative durations mean "don't move".
fn secs(value: f32) -> Duration {
    Duration::try_from_secs_f32(value).unwrap_or(Duration::ZERO)
}
