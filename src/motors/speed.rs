// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Percent speed to 16-bit duty conversion.
//!
//! Below [`STALL_THRESHOLD`] percent the motors do not turn at all, so low requests are lifted by
//! adding [`STALL_OFFSET`] rather than clamped to it. A request of 10% therefore drives at 25%.
//! Existing calibration constants were tuned against this additive floor, so keep it.
//!
//! The conversion truncates toward zero.

use crate::hw::DUTY_MAX;

/// Requests strictly below this percentage receive the stall offset.
pub const STALL_THRESHOLD: f32 = 15.0;

/// Percentage added to requests below [`STALL_THRESHOLD`].
pub const STALL_OFFSET: f32 = 15.0;

/// Map a 0..=100 percent request to a duty in 0..=65535.
///
/// Inputs above 100 behave as 100. Negative or NaN inputs saturate to 0 after the offset is
/// applied.
pub fn map_speed(speed: f32) -> u16 {
    let mut speed = speed;
    if speed > 100.0 {
        speed = 100.0;
    }
    if speed < STALL_THRESHOLD {
        speed += STALL_OFFSET;
    }
    // `as` saturates and truncates.
    (speed / 100.0 * DUTY_MAX as f32) as u16
}
