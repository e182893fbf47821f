// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Elio Control Library
//!
//! This crate contains the control components for the Elio differential-drive educational robot:
//! motor actuation, ambient-subtracted line sensing, obstacle sensing, buzzer playback and the
//! calibrated line-following loop.
//!
//! ## Crate Structure
//!
//! | Module | Purpose |
//! | ------ | -------- |
//! | [`hw`] | Hardware-facing traits and thin pin wrappers (ADC readers, IR emitter) |
//! | [`drivers`] | Device-level peripherals (reflectance array, obstacle array, battery, buzzer) |
//! | [`motors`] | Speed mapping, H-bridge motor driver and drive kinematics |
//! | [`control`] | Calibration engine and line-following policy |
//! | [`storage`] | Calibration persistence on top of a key-value store |
//! | [`config`] | Tunable parameters, loadable from JSON |
//! | [`robot`] | Composition of the above into one owned robot |
//!
//! Peripherals are never global: every component takes already-initialized HAL handles
//! (`embedded-hal` pins, PWM channels and delays) in its constructor.
//!
//! ## Features
//!
//! - `std` (default): file-backed calibration store and config loading from disk
//! - `mock`: simulated HAL (recording PWM channels and a simulated clock) in [`hw::mock`]
//!
//! ## License
//!
//! Licensed under the **MIT License**.
//! See the `LICENSE` file in the repository root for full terms.
//!
//! © 2025–2026 Christopher Liu

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod config;
pub mod control;
pub mod drivers;
pub mod error;
pub mod hw;
pub mod motors;
pub mod robot;
pub mod storage;

pub use config::RobotConfig;
pub use error::{CalibrationError, ConfigError, Error, Result};
pub use robot::Robot;

#[cfg(test)]
mod fixtures;
#[cfg(test)]
mod tests;
