// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Calibration Persistence
//!
//! The calibrated threshold is the only durable state the robot keeps. It is stored as a small JSON
//! record through a [`ConfigStore`], which can be anything that loads and saves a string: a file on
//! the host, a flash page on the robot, or memory in tests.
//!
//! ## Record schema
//!
//! - Current: `{"version": 2, "threshold": 25000.0}`
//! - Legacy: `{"min": 10000, "max": 40000}`, converted to `min + (max - min) / 2`
//!
//! A missing or unreadable record falls back to the legacy defaults (threshold 25000) with a warning.

use alloc::string::String;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[cfg(feature = "std")]
mod file;

#[cfg(feature = "std")]
pub use file::FileStore;

/// Schema version written by this crate.
pub const SCHEMA_VERSION: u32 = 2;

/// Legacy fallback extrema.
pub const DEFAULT_MIN: f64 = 10_000.0;
pub const DEFAULT_MAX: f64 = 40_000.0;

/// Threshold used when no usable record exists.
pub const DEFAULT_THRESHOLD: f32 = 25_000.0;

/// Durable storage for one small text record.
pub trait ConfigStore {
    /// Current contents, or `None` if nothing has been saved yet.
    fn load(&mut self) -> Result<Option<String>, ConfigError>;

    /// Replace the contents.
    fn save(&mut self, contents: &str) -> Result<(), ConfigError>;
}

impl<T: ConfigStore + ?Sized> ConfigStore for &mut T {
    fn load(&mut self) -> Result<Option<String>, ConfigError> {
        (**self).load()
    }

    fn save(&mut self, contents: &str) -> Result<(), ConfigError> {
        (**self).save(contents)
    }
}

/// In-memory store.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    contents: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Some(contents.into()),
        }
    }

    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }
}

impl ConfigStore for MemoryStore {
    fn load(&mut self) -> Result<Option<String>, ConfigError> {
        Ok(self.contents.clone())
    }

    fn save(&mut self, contents: &str) -> Result<(), ConfigError> {
        self.contents = Some(String::from(contents));
        Ok(())
    }
}

fn schema_v2() -> u32 {
    SCHEMA_VERSION
}

/// On-disk shapes of the calibration record.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum Record {
    Versioned {
        #[serde(default = "schema_v2")]
        version: u32,
        threshold: f64,
    },
    Legacy {
        min: f64,
        max: f64,
    },
}

/// Decode a record into a threshold.
pub fn decode_record(contents: &str) -> Result<f32, ConfigError> {
    let threshold = match serde_json::from_str::<Record>(contents)? {
        Record::Versioned { version, threshold } => {
            if version != SCHEMA_VERSION {
                return Err(ConfigError::UnsupportedVersion(version));
            }
            threshold
        }
        Record::Legacy { min, max } => min + (max - min) / 2.0,
    };

    if !threshold.is_finite() || threshold.abs() > f32::MAX as f64 {
        return Err(ConfigError::InvalidThreshold(threshold));
    }
    Ok(threshold as f32)
}

/// Encode a threshold as a current-schema record.
pub fn encode_record(threshold: f32) -> Result<String, ConfigError> {
    if !threshold.is_finite() {
        return Err(ConfigError::InvalidThreshold(threshold as f64));
    }
    let record = Record::Versioned {
        version: SCHEMA_VERSION,
        threshold: threshold as f64,
    };
    Ok(serde_json::to_string(&record)?)
}

/// Typed access to the calibration record kept in a [`ConfigStore`].
pub struct CalibrationStore<S> {
    store: S,
}

impl<S: ConfigStore> CalibrationStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Stored threshold, `Ok(None)` if nothing was saved yet.
    pub fn load(&mut self) -> Result<Option<f32>, ConfigError> {
        match self.store.load()? {
            Some(contents) => decode_record(&contents).map(Some),
            None => Ok(None),
        }
    }

    /// Stored threshold, or [`DEFAULT_THRESHOLD`] if the record is absent or unusable.
    pub fn load_or_default(&mut self) -> f32 {
        match self.load() {
            Ok(Some(threshold)) => threshold,
            Ok(None) => {
                warn!(
                    "No calibration record, using default threshold {}",
                    DEFAULT_THRESHOLD
                );
                DEFAULT_THRESHOLD
            }
            Err(e) => {
                warn!(
                    "Unreadable calibration record ({}), using default threshold {}",
                    e, DEFAULT_THRESHOLD
                );
                DEFAULT_THRESHOLD
            }
        }
    }

    pub fn save(&mut self, threshold: f32) -> Result<(), ConfigError> {
        let contents = encode_record(threshold)?;
        self.store.save(&contents)?;
        info!("Saved calibration threshold {}", threshold);
        Ok(())
    }
}
