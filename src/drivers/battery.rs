// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Battery voltage and USB power sensing.
//!
//! The battery sense pin sits behind an on-board divider, so the voltage is a fixed linear
//! transform of the raw sample: `volts = raw / divisor`. The divisor depends on the board and is
//! configurable; the default matches the reference board, where a full 1S LiPo reads about 4.2 V.

use embedded_hal::digital::InputPin;
use serde::{Deserialize, Serialize};

use crate::hw::AnalogIn;

/// Anything that can report the current battery voltage.
pub trait VoltageSource {
    fn voltage(&mut self) -> f32;
}

impl<F> VoltageSource for F
where
    F: FnMut() -> f32,
{
    #[inline]
    fn voltage(&mut self) -> f32 {
        self()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatteryConfig {
    /// Raw ADC counts per volt at the battery terminal
    pub divisor: f32,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self { divisor: 5371.0 }
    }
}

/// Input type for boards without a VBUS sense line.
pub struct NoVbus;

impl embedded_hal::digital::ErrorType for NoVbus {
    type Error = core::convert::Infallible;
}

impl InputPin for NoVbus {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(false)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

/// Battery sense channel plus an optional VBUS-present input.
pub struct BatteryMonitor<A, V = NoVbus> {
    sense: A,
    vbus: Option<V>,
    config: BatteryConfig,
}

impl<A: AnalogIn> BatteryMonitor<A, NoVbus> {
    pub fn new(sense: A, config: BatteryConfig) -> Self {
        Self {
            sense,
            vbus: None,
            config,
        }
    }
}

impl<A: AnalogIn, V: InputPin> BatteryMonitor<A, V> {
    pub fn with_vbus(sense: A, vbus: V, config: BatteryConfig) -> Self {
        Self {
            sense,
            vbus: Some(vbus),
            config,
        }
    }

    #[inline]
    pub fn raw(&mut self) -> u16 {
        self.sense.read()
    }

    /// Approximate battery voltage.
    pub fn voltage(&mut self) -> f32 {
        self.raw() as f32 / self.config.divisor
    }

    /// Whether USB power is present, or `None` when no sense line is wired.
    pub fn vbus_present(&mut self) -> Option<bool> {
        self.vbus.as_mut().and_then(|pin| pin.is_high().ok())
    }
}

impl<A: AnalogIn, V: InputPin> VoltageSource for BatteryMonitor<A, V> {
    fn voltage(&mut self) -> f32 {
        BatteryMonitor::voltage(self)
    }
}
