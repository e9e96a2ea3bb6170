//! vspidev-fuse - emulated spidev node over FUSE
//!
//! This crate exposes a fake `/dev/spidevX.Y` as a file inside a FUSE
//! mount, so programs that drive spidev through open/read/write/ioctl can
//! run without SPI hardware.
//!
//! # Overview
//!
//! The mount contains a single device file. `read(2)` returns a short
//! banner, `write(2)` is accepted and discarded at unmount, and `ioctl(2)`
//! is classified by [`vspidev_core::CommandRegistry`] and logged. Transfer
//! batches of one and two records return their count; everything else
//! returns 0.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use vspidev_fuse::{mount, NodeConfig};
//!
//! let config = NodeConfig::new("spidev0.0").with_allow_other(true);
//! mount(config, Path::new("/tmp/spi"))?;
//! # Ok::<(), vspidev_fuse::NodeError>(())
//! ```
//!
//! # System Requirements
//!
//! - Linux with FUSE support and `fusermount3` in `PATH`
//! - `user_allow_other` in `/etc/fuse.conf` for `allow_other`

pub mod config;
pub mod error;
pub mod fs;
pub mod ioctl;
pub mod node;

// Re-exports
pub use config::{split_options, NodeConfig};
pub use error::{NodeError, Result};
pub use fs::{mount, VirtualSpiFs};
pub use ioctl::{IoctlHandler, IoctlOutcome};
pub use node::DeviceNode;
