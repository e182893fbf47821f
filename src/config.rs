// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Tunable parameters for the whole robot.
//!
//! Every section has board defaults and missing fields fall back to them, so a config file only
//! needs the values that differ:
//!
//! ```
//! let config = elio::RobotConfig::from_json(r#"{ "policy": { "forward_speed": 45.0 } }"#).unwrap();
//! assert_eq!(config.policy.forward_speed, 45.0);
//! assert_eq!(config.policy.correction_speed, 60.0);
//! ```

use alloc::string::String;

use serde::{Deserialize, Serialize};

use crate::control::{CalibrationConfig, PolicyConfig};
use crate::drivers::{BatteryConfig, ObstacleConfig, SensorConfig};
use crate::error::ConfigError;
use crate::motors::Kinematics;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    pub kinematics: Kinematics,
    pub sensors: SensorConfig,
    pub policy: PolicyConfig,
    pub calibration: CalibrationConfig,
    pub battery: BatteryConfig,
    pub obstacles: ObstacleConfig,
}

impl RobotConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load from a JSON file.
    #[cfg(feature = "std")]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}
