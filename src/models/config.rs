// Network Manager - Dispatcher Configuration
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Dispatcher configuration model.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::error::{Error, Result};

/// System-wide configuration file.
pub const SYSTEM_CONFIG_FILE: &str = "/etc/NetworkManager/nm-dispatch.toml";

/// Configuration file name under the XDG config directory.
pub const CONFIG_FILE_NAME: &str = "nm-dispatch.toml";

/// Configuration directory name (under XDG_CONFIG_HOME).
pub const CONFIG_DIR_NAME: &str = "nm-dispatch";

/// Dispatcher configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DispatcherConfig {
    /// Script directories whose contents gate dispatching.
    #[serde(default = "default_script_dirs")]
    pub script_dirs: [PathBuf; 3],

    /// Bus name of the dispatcher service.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Object path of the dispatcher service.
    #[serde(default = "default_object_path")]
    pub object_path: String,

    /// Interface of the dispatcher service.
    #[serde(default = "default_interface")]
    pub interface: String,

    /// How often script directories are checked for changes.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_script_dirs() -> [PathBuf; 3] {
    [
        PathBuf::from("/etc/NetworkManager/dispatcher.d"),
        PathBuf::from("/etc/NetworkManager/dispatcher.d/pre-up.d"),
        PathBuf::from("/etc/NetworkManager/dispatcher.d/pre-down.d"),
    ]
}

fn default_service_name() -> String {
    "org.freedesktop.nm_dispatcher".to_string()
}

fn default_object_path() -> String {
    "/org/freedesktop/nm_dispatcher".to_string()
}

fn default_interface() -> String {
    "org.freedesktop.nm_dispatcher".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            script_dirs: default_script_dirs(),
            service_name: default_service_name(),
            object_path: default_object_path(),
            interface: default_interface(),
            poll_interval_ms: default_poll_interval_ms(),
            log_level: default_log_level(),
        }
    }
}

impl DispatcherConfig {
    /// Load configuration from TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigReadFailed(format!("{}: {}", path.display(), e)))?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Default configuration file location: the system file if present,
    /// otherwise the per-user file.
    pub fn default_path() -> PathBuf {
        let system = PathBuf::from(SYSTEM_CONFIG_FILE);
        if system.exists() {
            return system;
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Load from `path`, or from the default location. A missing file
    /// yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);
        if !path.exists() {
            debug!("No configuration at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        debug!("Loading configuration from {:?}", path);
        Self::load_from_file(&path)
    }
}
