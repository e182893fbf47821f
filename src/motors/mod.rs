// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Drive Train
//!
//! Everything between a speed request and the four H-bridge PWM legs.
//!
//! ## Modules
//!
//! - [`speed`] - Percent speed to 16-bit duty mapping with the stall offset.
//! - [`kinematics`] - Wheel geometry and battery-based wheel speed estimate.
//! - [`driver`] - [`MotorDriver`], directional primitives and timed steps/turns.

pub mod driver;
pub mod kinematics;
pub mod speed;

pub use driver::{
    Direction, Motion, MotorDriver, MotorLegs, MotorState, Turn, Wheel, WheelState,
};
pub use kinematics::Kinematics;
pub use speed::map_speed;
