// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Shared ADC access.
//!
//! The line array, obstacle array and battery monitor all sample the same converter. Each of them
//! takes an [`AnalogIn`](super::AnalogIn), and [`make_reader`] hands out one per channel from a
//! single `RefCell`-wrapped converter.
//!
//! Example:
//! ```
//! use core::cell::RefCell;
//! use elio::hw::{make_reader, AnalogIn, AnalogRead};
//!
//! struct Fixed;
//! impl AnalogRead for Fixed {
//!     fn read_channel(&mut self, ch: u8) -> u16 {
//!         1000 * ch as u16
//!     }
//! }
//!
//! let adc = RefCell::new(Fixed);
//! let mut left = make_reader(&adc, 3);
//! assert_eq!(left.read(), 3000);
//! ```

use core::cell::RefCell;

/// Trait for reading a single channel from an ADC peripheral.
pub trait AnalogRead {
    fn read_channel(&mut self, ch: u8) -> u16;
}

/// Create a closure that reads the given channel from the ADC reference.
pub fn make_reader<'a, ADC>(adc_ref: &'a RefCell<ADC>, channel: u8) -> impl FnMut() -> u16 + 'a
where
    ADC: AnalogRead,
{
    move || adc_ref.borrow_mut().read_channel(channel)
}
