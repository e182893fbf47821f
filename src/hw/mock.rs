// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Simulated HAL for host tests.
//!
//! Every mock peripheral shares one [`Timeline`]: delays advance its simulated clock, and PWM or pin
//! writes are recorded against it with the time they happened. Tests can then assert both the
//! final output state and when it was commanded.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::convert::Infallible;
use core::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, InputPin, OutputPin};
use embedded_hal::pwm::{self, SetDutyCycle};

use super::SetFrequency;

/// What a recorded write did.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EventKind {
    Duty(u16),
    Frequency(u32),
    Level(bool),
}

/// One recorded write.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub at: Duration,
    pub source: &'static str,
    pub kind: EventKind,
}

#[derive(Default)]
struct Inner {
    now: Duration,
    events: Vec<Event>,
}

/// Shared simulated clock plus write log.
#[derive(Clone, Default)]
pub struct Timeline {
    inner: Rc<RefCell<Inner>>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.inner.borrow().now
    }

    pub fn advance(&self, by: Duration) {
        self.inner.borrow_mut().now += by;
    }

    pub fn record(&self, source: &'static str, kind: EventKind) {
        let mut inner = self.inner.borrow_mut();
        let at = inner.now;
        inner.events.push(Event { at, source, kind });
    }

    pub fn events(&self) -> Vec<Event> {
        self.inner.borrow().events.clone()
    }

    pub fn clear_events(&self) {
        self.inner.borrow_mut().events.clear();
    }
}

/// PWM channel that records every duty and frequency change.
pub struct MockPwm {
    timeline: Timeline,
    name: &'static str,
    max: u16,
    duty: Rc<Cell<u16>>,
    frequency: Rc<Cell<u32>>,
}

impl MockPwm {
    pub fn new(timeline: &Timeline, name: &'static str) -> Self {
        Self::with_max(timeline, name, u16::MAX)
    }

    /// Channel with a coarser resolution than the crate's 16-bit convention.
    pub fn with_max(timeline: &Timeline, name: &'static str, max: u16) -> Self {
        Self {
            timeline: timeline.clone(),
            name,
            max,
            duty: Rc::new(Cell::new(0)),
            frequency: Rc::new(Cell::new(0)),
        }
    }

    /// Handle that keeps observing the duty after the channel is moved into a driver.
    pub fn duty(&self) -> Rc<Cell<u16>> {
        self.duty.clone()
    }

    pub fn frequency(&self) -> Rc<Cell<u32>> {
        self.frequency.clone()
    }
}

impl pwm::ErrorType for MockPwm {
    type Error = Infallible;
}

impl SetDutyCycle for MockPwm {
    fn max_duty_cycle(&self) -> u16 {
        self.max
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.duty.set(duty);
        self.timeline.record(self.name, EventKind::Duty(duty));
        Ok(())
    }
}

impl SetFrequency for MockPwm {
    fn set_frequency(&mut self, hz: u32) {
        self.frequency.set(hz);
        self.timeline.record(self.name, EventKind::Frequency(hz));
    }
}

/// Digital pin usable as output (emitter) or input (VBUS sense).
pub struct MockPin {
    timeline: Timeline,
    name: &'static str,
    level: Rc<Cell<bool>>,
}

impl MockPin {
    pub fn new(timeline: &Timeline, name: &'static str) -> Self {
        Self {
            timeline: timeline.clone(),
            name,
            level: Rc::new(Cell::new(false)),
        }
    }

    /// Shared handle on the electrical level, also usable to drive an input.
    pub fn level(&self) -> Rc<Cell<bool>> {
        self.level.clone()
    }
}

impl digital::ErrorType for MockPin {
    type Error = Infallible;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.level.set(false);
        self.timeline.record(self.name, EventKind::Level(false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.level.set(true);
        self.timeline.record(self.name, EventKind::Level(true));
        Ok(())
    }
}

impl InputPin for MockPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.level.get())
    }
}

/// Delay that advances the simulated clock instead of blocking.
#[derive(Clone)]
pub struct MockDelay {
    timeline: Timeline,
}

impl MockDelay {
    pub fn new(timeline: &Timeline) -> Self {
        Self {
            timeline: timeline.clone(),
        }
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.timeline.advance(Duration::from_nanos(ns as u64));
    }

    fn delay_us(&mut self, us: u32) {
        self.timeline.advance(Duration::from_micros(us as u64));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.timeline.advance(Duration::from_millis(ms as u64));
    }
}
