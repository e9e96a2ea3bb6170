//! Device node configuration
//!
//! A [`NodeConfig`] can be built in code, loaded from a TOML file:
//!
//! ```toml
//! [node]
//! device_name = "spidev1.0"
//! fs_name = "vspidev"
//! allow_other = true
//! ```
//!
//! or adjusted with `key=value` options (`name=`, `fsname=`, `banner=`,
//! `allow_other=`, `max_capture=`).

use std::path::Path;

use crate::error::{NodeError, Result};

/// Default device file name
pub const DEFAULT_DEVICE_NAME: &str = "spidev0.0";

/// Default filesystem name shown in the mount table
pub const DEFAULT_FS_NAME: &str = "vspidev";

/// What `read(2)` on the device returns
pub const DEFAULT_BANNER: &str = "Its an SPI device, dont read, use ioctl\n";

/// Largest amount of written data kept in memory (4 MiB)
pub const DEFAULT_MAX_CAPTURE: usize = 4 * 1024 * 1024;

/// Configuration for the emulated device node
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NodeConfig {
    /// File name of the device inside the mount (e.g. "spidev0.0")
    pub device_name: String,
    /// Filesystem name passed to the kernel
    pub fs_name: String,
    /// Contents served to `read(2)`
    pub banner: String,
    /// Let other users access the mount
    pub allow_other: bool,
    /// Upper bound on the capture buffer behind `write(2)`
    pub max_capture: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            device_name: DEFAULT_DEVICE_NAME.to_string(),
            fs_name: DEFAULT_FS_NAME.to_string(),
            banner: DEFAULT_BANNER.to_string(),
            allow_other: false,
            max_capture: DEFAULT_MAX_CAPTURE,
        }
    }
}

/// Top-level layout of a node config file
#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlNodeFile {
    #[serde(default)]
    node: NodeConfig,
}

impl NodeConfig {
    /// Create a configuration for the given device file name
    pub fn new(device_name: impl Into<String>) -> Self {
        Self {
            device_name: device_name.into(),
            ..Default::default()
        }
    }

    /// Set the filesystem name
    pub fn with_fs_name(mut self, fs_name: impl Into<String>) -> Self {
        self.fs_name = fs_name.into();
        self
    }

    /// Set the read banner
    pub fn with_banner(mut self, banner: impl Into<String>) -> Self {
        self.banner = banner.into();
        self
    }

    /// Allow other users to access the mount
    pub fn with_allow_other(mut self, allow_other: bool) -> Self {
        self.allow_other = allow_other;
        self
    }

    /// Set the capture buffer limit
    pub fn with_max_capture(mut self, max_capture: usize) -> Self {
        self.max_capture = max_capture;
        self
    }

    /// Parse a TOML config
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let file: TomlNodeFile = toml::from_str(s)?;
        file.node.validate()?;
        Ok(file.node)
    }

    /// Load a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| NodeError::ConfigRead {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply `key=value` options on top of this configuration
    pub fn apply_options(&mut self, options: &[(&str, &str)]) -> Result<()> {
        for (key, value) in options {
            match *key {
                "name" | "dev" => {
                    self.device_name = value.to_string();
                }
                "fsname" => {
                    self.fs_name = value.to_string();
                }
                "banner" => {
                    self.banner = value.to_string();
                }
                "allow_other" => {
                    self.allow_other = parse_bool(value).ok_or_else(|| {
                        NodeError::InvalidOption(format!("Invalid allow_other value: {}", value))
                    })?;
                }
                "max_capture" => {
                    self.max_capture = value.parse().map_err(|_| {
                        NodeError::InvalidOption(format!("Invalid max_capture value: {}", value))
                    })?;
                }
                _ => {
                    log::warn!("vspidev: Unknown option: {}={}", key, value);
                }
            }
        }
        self.validate()
    }

    /// Check that the device name is a single path component
    pub fn validate(&self) -> Result<()> {
        let name = self.device_name.as_str();
        let reserved = matches!(name, "" | "." | "..");
        if reserved || name.contains('/') || name.contains('\0') {
            return Err(NodeError::InvalidOption(format!(
                "Invalid device name: {:?}",
                name
            )));
        }
        if self.fs_name.is_empty() {
            return Err(NodeError::InvalidOption("Empty fsname".to_string()));
        }
        Ok(())
    }
}

/// Split "a=1,b=2" into key/value pairs
///
/// A bare key is treated as `key=1`.
pub fn split_options(s: &str) -> Vec<(&str, &str)> {
    s.split(',')
        .map(str::trim)
        .filter(|opt| !opt.is_empty())
        .map(|opt| opt.split_once('=').unwrap_or((opt, "1")))
        .collect()
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
