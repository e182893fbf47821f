// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! IR emitter for the line sensor array.
//!
//! The emitter and photosensors need a settle period after every toggle before a sample reflects
//! steady state. [`Emitter::measure`] is the only way to light the emitter: it lights, settles,
//! samples, goes dark, settles and samples again. Outside a measurement the emitter is always
//! dark. The obstacle receivers are on a separate net and never see this line toggle.

use core::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::trace;
use serde::{Deserialize, Serialize};

use crate::hw;

/// Emitter/photosensor settle time after each toggle.
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(20);

/// Pin level that lights the emitter.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum ActiveLevel {
    #[default]
    High,
    Low,
}

pub struct Emitter<PIN: OutputPin> {
    pin: PIN,
    active: ActiveLevel,
    settle: Duration,
}

impl<PIN: OutputPin> Emitter<PIN> {
    /// Take the pin and drive it dark.
    pub fn new(pin: PIN, active: ActiveLevel) -> Self {
        let mut emitter = Self {
            pin,
            active,
            settle: DEFAULT_SETTLE,
        };
        emitter.drive(false);
        emitter
    }

    pub fn active_high(pin: PIN) -> Self {
        Self::new(pin, ActiveLevel::High)
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    #[inline]
    pub fn settle(&self) -> Duration {
        self.settle
    }

    pub fn set_settle(&mut self, settle: Duration) {
        self.settle = settle;
    }

    #[inline]
    pub fn active_level(&self) -> ActiveLevel {
        self.active
    }

    fn drive(&mut self, lit: bool) {
        let high = lit == (self.active == ActiveLevel::High);
        if high {
            self.pin.set_high().ok();
        } else {
            self.pin.set_low().ok();
        }
    }

    /// One illumination cycle. Returns `(lit, ambient)`, each taken one settle period after the
    /// toggle before it. Blocks for two settle periods and leaves the emitter dark.
    pub fn measure<D, T>(&mut self, delay: &mut D, mut sample: impl FnMut() -> T) -> (T, T)
    where
        D: DelayNs,
    {
        self.drive(true);
        hw::sleep(delay, self.settle);
        let lit = sample();

        self.drive(false);
        hw::sleep(delay, self.settle);
        let ambient = sample();

        trace!("emitter cycle, settle {:?}", self.settle);
        (lit, ambient)
    }

    pub fn free(self) -> PIN {
        self.pin
    }
}
