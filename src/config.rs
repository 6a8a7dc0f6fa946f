use crate::debugger::Error;
use crate::{muted_error, weak_error};
use serde::Deserialize;
use std::fs::read_to_string;
use std::path::Path;

/// Per session settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Instructions a single build may execute before the run is aborted.
    /// Guards against infinite loops in student programs.
    pub instruction_limit: u64,
    /// Deepest call stack decoded for the backtrace view.
    pub max_backtrace_frames: usize,
    /// Linear memory size (in 64 KiB pages) the engine is instantiated with.
    pub initial_pages: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            instruction_limit: 10_000_000,
            max_backtrace_frames: 1024,
            initial_pages: 7,
        }
    }
}

impl SessionConfig {
    /// Parse a TOML document, missing keys take default values.
    pub fn from_toml(data: &str) -> Result<Self, Error> {
        Ok(toml::de::from_str(data)?)
    }

    /// Load configuration from file. Return [`None`] if file is missing or malformed.
    pub fn from_file(path: impl AsRef<Path>) -> Option<Self> {
        let data = muted_error!(read_to_string(path.as_ref()))?;
        weak_error!(Self::from_toml(&data))
    }
}
