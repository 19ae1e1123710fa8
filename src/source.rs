//! Raw counter table sources.
//!
//! The [`CounterSource`] trait lets the sampler read `/proc/net/dev` in
//! production and a scripted in-memory table in tests.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Default location of the kernel's interface counter table.
pub const PROC_NET_DEV: &str = "/proc/net/dev";

/// Supplier of the current counter table text.
pub trait CounterSource {
    /// Read the whole table as it is right now.
    ///
    /// Any failure is reported as [`Error::SourceUnavailable`].
    fn read_current_text(&mut self) -> Result<String>;

    /// Human-readable location, used in logs.
    fn location(&self) -> &Path;
}

/// File-backed counter table (normally `/proc/net/dev`).
#[derive(Debug, Clone)]
pub struct ProcNetDev {
    path: PathBuf,
}

impl ProcNetDev {
    /// Read counters from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for ProcNetDev {
    fn default() -> Self {
        Self::new(PROC_NET_DEV)
    }
}

impl CounterSource for ProcNetDev {
    /// Interface names may hold arbitrary bytes; invalid UTF-8 is replaced
    /// so only the offending line fails to parse.
    fn read_current_text(&mut self) -> Result<String> {
        let bytes = std::fs::read(&self.path).map_err(|source| Error::SourceUnavailable {
            path: self.path.clone(),
            source,
        })?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn location(&self) -> &Path {
        &self.path
    }
}
