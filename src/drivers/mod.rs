// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Device Drivers
//!
//! Peripherals built on top of [`crate::hw`]. Each driver owns the pins and channels it was given.
//!
//! ## Modules
//!
//! - [`reflectance`] - Ambient-subtracted line sensor array sharing one IR emitter.
//! - [`obstacle`] - Analog proximity sensors with a raw threshold.
//! - [`battery`] - Battery voltage and VBUS sensing.
//! - [`buzzer`] - Square-wave tones and simple melodies.

pub mod battery;
pub mod buzzer;
pub mod obstacle;
pub mod reflectance;

pub use battery::{BatteryConfig, BatteryMonitor, VoltageSource};
pub use buzzer::{notes, Buzzer, Note};
pub use obstacle::{ObstacleArray, ObstacleConfig};
pub use reflectance::{ReadMode, ReflectanceArray, SensorConfig};
