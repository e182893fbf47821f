// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Hardware Interface
//!
//! The narrow surface the rest of the crate uses to touch the board. Digital outputs, PWM duty and
//! delays come straight from `embedded-hal` 1.0; analog reads and PWM frequency have no
//! `embedded-hal` trait, so they are defined here.
//!
//! ## Modules
//!
//! - [`adc`] - Multi-channel ADC trait and per-channel readers over a shared converter.
//! - [`emitter`] - Line-array IR emitter, lit only for a settled lit/dark measurement.
//! - [`mock`] - Simulated HAL for host tests (`test` or the `mock` feature).

use core::time::Duration;

use embedded_hal::delay::DelayNs;

pub mod adc;
pub mod emitter;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use adc::{make_reader, AnalogRead};
pub use emitter::{ActiveLevel, Emitter, DEFAULT_SETTLE};

/// Full-scale duty in the 16-bit convention used throughout the crate.
pub const DUTY_MAX: u16 = u16::MAX;

/// A single bound analog input returning a raw 16-bit sample.
pub trait AnalogIn {
    fn read(&mut self) -> u16;
}

impl<F> AnalogIn for F
where
    F: FnMut() -> u16,
{
    #[inline]
    fn read(&mut self) -> u16 {
        self()
    }
}

/// PWM output whose carrier frequency can be changed at runtime (buzzer).
pub trait SetFrequency {
    fn set_frequency(&mut self, hz: u32);
}

/// Block for `duration` using any `DelayNs`, at microsecond resolution.
pub fn sleep<D: DelayNs>(delay: &mut D, duration: Duration) {
    let mut remaining = duration.as_micros();
    while remaining > 0 {
        let chunk = remaining.min(u32::MAX as u128) as u32;
        delay.delay_us(chunk);
        remaining -= chunk as u128;
    }
}
