//! Error types for vspidev-core
//!
//! This module provides a no_std compatible error type shared by the
//! request-code codec and the command registry.

use core::fmt;

/// One of the four bit fields of an ioctl request code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Transfer direction (2 bits)
    Direction,
    /// Subsystem magic (8 bits)
    Type,
    /// Command number within the subsystem (8 bits)
    Number,
    /// Payload size in bytes (14 bits)
    Size,
}

impl Field {
    /// Largest value that fits in this field
    pub const fn max(self) -> u32 {
        use crate::ioc;
        match self {
            Self::Direction => ioc::DIRMASK,
            Self::Type => ioc::TYPEMASK,
            Self::Number => ioc::NRMASK,
            Self::Size => ioc::SIZEMASK,
        }
    }

    /// Short lowercase name used in messages
    pub const fn name(self) -> &'static str {
        match self {
            Self::Direction => "direction",
            Self::Type => "type",
            Self::Number => "number",
            Self::Size => "size",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A value passed to the encoder does not fit its bit field
    InvalidField {
        /// Which field was out of range
        field: Field,
        /// The rejected value
        value: u32,
    },
    /// A transfer batch of `count` records does not fit the 14-bit size field
    Overflow {
        /// Requested number of transfer records
        count: u32,
    },
    /// The static command tables do not fit the registry's storage
    TableFull,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidField { field, value } => write!(
                f,
                "invalid ioctl {} value {} (max {})",
                field,
                value,
                field.max()
            ),
            Self::Overflow { count } => write!(
                f,
                "transfer batch of {} records exceeds the ioctl size field",
                count
            ),
            Self::TableFull => f.write_str("command table exceeds registry capacity"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
