// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Shared simulated bench for the crate's own tests.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::Cell;

use crate::drivers::reflectance::{ReflectanceArray, SensorConfig, LINE_SENSOR_COUNT};
use crate::hw::mock::{MockDelay, MockPin, MockPwm, Timeline};
use crate::hw::{AnalogIn, Emitter};
use crate::motors::{Kinematics, MotorDriver, MotorLegs};

/// Ambient level returned by scripted photosensors while the emitter is dark.
pub const AMBIENT: u16 = 60_000;

pub type TestMotors = MotorDriver<MockPwm, MockDelay, fn() -> f32>;
pub type TestLine<A> = ReflectanceArray<A, MockPin, MockDelay, LINE_SENSOR_COUNT>;

pub fn four_volts() -> f32 {
    4.0
}

/// Motor driver on mock legs named after the board nets (`ain1`, `ain2`, `bin1`, `bin2`).
pub fn motors(timeline: &Timeline) -> TestMotors {
    let legs = MotorLegs {
        a_fwd: MockPwm::new(timeline, "ain2"),
        a_rev: MockPwm::new(timeline, "ain1"),
        b_fwd: MockPwm::new(timeline, "bin2"),
        b_rev: MockPwm::new(timeline, "bin1"),
    };
    MotorDriver::new(
        legs,
        MockDelay::new(timeline),
        four_volts as fn() -> f32,
        Kinematics::default(),
    )
}

/// Photosensor producing `readings` (ambient minus lit) in a cycle, one per lit sample.
pub fn scripted(emitter: Rc<Cell<bool>>, readings: Vec<i32>) -> impl FnMut() -> u16 {
    let mut next = readings.into_iter().cycle();
    move || {
        if emitter.get() {
            let reading = next.next().unwrap_or(0);
            (AMBIENT as i32 - reading).clamp(0, u16::MAX as i32) as u16
        } else {
            AMBIENT
        }
    }
}

/// Line array whose sensor `i` cycles through `readings[i]`.
pub fn line(
    timeline: &Timeline,
    readings: [Vec<i32>; LINE_SENSOR_COUNT],
    config: SensorConfig,
) -> TestLine<impl FnMut() -> u16> {
    let pin = MockPin::new(timeline, "ir");
    let level = pin.level();
    let inputs = readings.map(|r| scripted(level.clone(), r));
    line_with(timeline, pin, inputs, config)
}

pub fn line_with<A: AnalogIn>(
    timeline: &Timeline,
    pin: MockPin,
    inputs: [A; LINE_SENSOR_COUNT],
    config: SensorConfig,
) -> TestLine<A> {
    ReflectanceArray::new(
        inputs,
        Emitter::active_high(pin),
        MockDelay::new(timeline),
        config,
    )
}
