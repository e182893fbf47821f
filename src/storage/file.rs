// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::ConfigStore;
use crate::error::ConfigError;

/// Record kept in a single file. A missing file reads as "nothing saved".
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for FileStore {
    fn load(&mut self) -> Result<Option<String>, ConfigError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, contents: &str) -> Result<(), ConfigError> {
        fs::write(&self.path, contents)?;
        Ok(())
    }
}
