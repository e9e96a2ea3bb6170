//! vspidev-core - spidev ioctl codec and command registry
//!
//! This crate holds everything needed to understand the control traffic a
//! program sends to a Linux `/dev/spidevX.Y` node, without touching any
//! device. It is `no_std` and allocation-free.
//!
//! - [`ioc`] packs and unpacks ioctl request codes (`_IOC` layout)
//! - [`spi`] defines the spidev magic, command numbers, mode bits and the
//!   `spi_ioc_transfer` record
//! - [`registry`] maps observed codes to [`CommandKind`]s
//!
//! # Features
//!
//! - `std` - Implement `std::error::Error` for [`Error`]
//!
//! # Example
//!
//! ```
//! use vspidev_core::{CommandKind, CommandRegistry};
//!
//! let registry = CommandRegistry::new()?;
//! assert_eq!(registry.resolve(0x4001_6B01), CommandKind::WriteMode);
//! assert_eq!(registry.resolve(0x4040_6B00), CommandKind::TransferBatch(2));
//! assert_eq!(registry.resolve(0x4021_6B00), CommandKind::Unknown);
//! # Ok::<(), vspidev_core::Error>(())
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod command;
pub mod error;
pub mod ioc;
pub mod registry;
pub mod spi;

pub use command::{CommandKind, CommandSpec, SizeDescriptor};
pub use error::{Error, Field, Result};
pub use ioc::{
    batch_payload_size, decode, encode, sizeof_record, Direction, IocFields, Payload, RequestCode,
};
pub use registry::CommandRegistry;
