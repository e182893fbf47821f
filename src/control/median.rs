// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

use alloc::vec::Vec;

/// Median of `values`: the middle element for odd lengths, the mean of the two middle elements
/// for even lengths. `None` when empty.
pub fn median(values: &[i32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }

    let mut sorted: Vec<i32> = values.to_vec();
    sorted.sort_unstable();

    let mid = sorted.len() / 2;
    let value = if sorted.len() % 2 == 1 {
        sorted[mid] as f64
    } else {
        (sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0
    };
    Some(value as f32)
}
