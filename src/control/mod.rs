// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Control Algorithms
//!
//! The two loops that turn line readings into motion.
//!
//! ## Modules
//!
//! - [`median`] - Order statistic used to reduce calibration extrema.
//! - [`calibration`] - Sweep, threshold derivation, persistence and alignment.
//! - [`line_follower`] - Priority-ordered line-following policy and its control loop.

pub mod calibration;
pub mod line_follower;
pub mod median;

pub use calibration::{
    Alignment, CalibrationConfig, CalibrationReport, Calibrator, Extrema, Sweep,
};
pub use line_follower::{decide, Action, LineFollower, PolicyConfig, Reach};
pub use median::median;
