// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Error types for the Elio control library.
//!
//! Only recoverable conditions live here. Programming errors such as an out-of-range sensor index
//! panic at the call site instead.

use thiserror::Error;

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;

/// Failures of the persisted calibration record or of a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Backing file could not be read or written.
    #[cfg(feature = "std")]
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Contents are not valid JSON for the expected schema.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Record carries a schema version this build does not understand.
    #[error("Unsupported calibration schema version {0}")]
    UnsupportedVersion(u32),

    /// Record decoded but holds a threshold that cannot be used.
    #[error("Invalid threshold in record: {0}")]
    InvalidThreshold(f64),
}

/// Failures of a calibration run.
#[derive(Debug, Error)]
pub enum CalibrationError {
    /// The sweep produced no samples to reduce.
    #[error("Calibration produced no samples")]
    NoSamples,

    /// Median maximum is not above median minimum, e.g. a stuck sensor or no line in view.
    #[error("Degenerate calibration: median max {max} <= median min {min}")]
    Degenerate {
        /// Median of the per-sensor minima
        min: f32,
        /// Median of the per-sensor maxima
        max: f32,
    },

    /// Threshold was computed but could not be stored.
    #[error("Failed to persist threshold: {0}")]
    Persist(#[from] ConfigError),
}

/// Top-level error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Calibration(#[from] CalibrationError),
}
