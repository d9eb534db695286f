//! Platform-specific directory resolution.

use std::path::PathBuf;
use crate::constants::APP_NAME;
use crate::error::{FlockError, FlockResult};

/// Detected operating system platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

impl Platform {
    /// Detect the current platform at compile time.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }

    /// Get the application data directory (database, logs).
    ///
    /// - Windows: `%APPDATA%/Flock`
    /// - macOS: `~/Library/Application Support/Flock`
    /// - Linux: `~/.local/share/Flock`
    pub fn data_dir() -> FlockResult<PathBuf> {
        let base = dirs::data_dir()
            .ok_or_else(|| FlockError::Config("could not determine data directory".into()))?;
        Ok(base.join(APP_NAME))
    }

    /// Get the configuration directory.
    ///
    /// - Windows: `%APPDATA%/Flock`
    /// - macOS: `~/Library/Application Support/Flock`
    /// - Linux: `~/.config/Flock`
    pub fn config_dir() -> FlockResult<PathBuf> {
        let base = dirs::config_dir()
            .ok_or_else(|| FlockError::Config("could not determine config directory".into()))?;
        Ok(base.join(APP_NAME))
    }

    /// Get a human-readable platform name.
    pub fn name(&self) -> &'static str {
        match self {
            Platform::Windows => "Windows",
            Platform::MacOs => "macOS",
            Platform::Linux => "Linux",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
