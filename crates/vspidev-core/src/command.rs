//! spidev command definitions
//!
//! [`CommandKind`] is the closed set of operations the emulated device
//! understands. [`SIMPLE_COMMANDS`] and [`TRANSFER_BATCH`] describe how each
//! one is encoded; the registry turns them into concrete request codes.

use core::fmt;

use crate::error::Result;
use crate::ioc::{self, Direction, Payload, RequestCode};
use crate::spi::{
    SPI_IOC_MAGIC, SPI_IOC_NR_BITS_PER_WORD, SPI_IOC_NR_LSB_FIRST, SPI_IOC_NR_MAX_SPEED_HZ,
    SPI_IOC_NR_MESSAGE, SPI_IOC_NR_MODE,
};

/// A recognized (or unrecognized) device operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// `SPI_IOC_RD_MODE`
    ReadMode,
    /// `SPI_IOC_WR_MODE`
    WriteMode,
    /// `SPI_IOC_RD_LSB_FIRST`
    ReadLsbFirst,
    /// `SPI_IOC_WR_LSB_FIRST`
    WriteLsbFirst,
    /// `SPI_IOC_RD_BITS_PER_WORD`
    ReadBitsPerWord,
    /// `SPI_IOC_WR_BITS_PER_WORD`
    WriteBitsPerWord,
    /// `SPI_IOC_RD_MAX_SPEED_HZ`
    ReadMaxSpeedHz,
    /// `SPI_IOC_WR_MAX_SPEED_HZ`
    WriteMaxSpeedHz,
    /// `SPI_IOC_MESSAGE(N)` with N transfer records
    TransferBatch(u32),
    /// No registered command matches
    Unknown,
}

impl CommandKind {
    /// Name of the matching `<linux/spi/spidev.h>` macro
    pub const fn label(self) -> &'static str {
        match self {
            Self::ReadMode => "SPI_IOC_RD_MODE",
            Self::WriteMode => "SPI_IOC_WR_MODE",
            Self::ReadLsbFirst => "SPI_IOC_RD_LSB_FIRST",
            Self::WriteLsbFirst => "SPI_IOC_WR_LSB_FIRST",
            Self::ReadBitsPerWord => "SPI_IOC_RD_BITS_PER_WORD",
            Self::WriteBitsPerWord => "SPI_IOC_WR_BITS_PER_WORD",
            Self::ReadMaxSpeedHz => "SPI_IOC_RD_MAX_SPEED_HZ",
            Self::WriteMaxSpeedHz => "SPI_IOC_WR_MAX_SPEED_HZ",
            Self::TransferBatch(_) => "SPI_IOC_MESSAGE",
            Self::Unknown => "unknown",
        }
    }

    /// Whether this is a registered command
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransferBatch(count) => write!(f, "{}({})", self.label(), count),
            _ => f.write_str(self.label()),
        }
    }
}

/// How a command's payload size is determined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeDescriptor {
    /// Exactly one record of the given kind
    Fixed(Payload),
    /// N transfer records, N supplied at runtime
    PerTransfer,
}

/// Encoding recipe for one logical device operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    /// Operation this entry identifies
    pub kind: CommandKind,
    /// Payload direction
    pub direction: Direction,
    /// Subsystem magic
    pub ty: u8,
    /// Command number
    pub number: u8,
    /// Payload size rule
    pub size: SizeDescriptor,
}

impl CommandSpec {
    const fn simple(kind: CommandKind, direction: Direction, number: u8, payload: Payload) -> Self {
        Self {
            kind,
            direction,
            ty: SPI_IOC_MAGIC,
            number,
            size: SizeDescriptor::Fixed(payload),
        }
    }

    /// Payload size for a batch of `count` (ignored for fixed-size commands)
    pub const fn payload_size(&self, count: u32) -> Result<u32> {
        match self.size {
            SizeDescriptor::Fixed(payload) => Ok(ioc::sizeof_record(payload)),
            SizeDescriptor::PerTransfer => ioc::batch_payload_size(count),
        }
    }

    /// Request code for this command
    ///
    /// `count` only matters for [`SizeDescriptor::PerTransfer`].
    pub const fn code(&self, count: u32) -> Result<RequestCode> {
        match self.payload_size(count) {
            Ok(size) => ioc::encode(
                self.direction.bits(),
                self.ty as u32,
                self.number as u32,
                size,
            ),
            Err(e) => Err(e),
        }
    }

    /// Whether `code` carries this command's direction, type and number
    pub const fn matches_prefix(&self, code: RequestCode) -> bool {
        code.direction().bits() == self.direction.bits()
            && code.ty() == self.ty
            && code.number() == self.number
    }
}

/// Fixed-size get/set commands
pub const SIMPLE_COMMANDS: [CommandSpec; 8] = [
    CommandSpec::simple(CommandKind::ReadMode, Direction::Read, SPI_IOC_NR_MODE, Payload::U8),
    CommandSpec::simple(CommandKind::WriteMode, Direction::Write, SPI_IOC_NR_MODE, Payload::U8),
    CommandSpec::simple(
        CommandKind::ReadLsbFirst,
        Direction::Read,
        SPI_IOC_NR_LSB_FIRST,
        Payload::U8,
    ),
    CommandSpec::simple(
        CommandKind::WriteLsbFirst,
        Direction::Write,
        SPI_IOC_NR_LSB_FIRST,
        Payload::U8,
    ),
    CommandSpec::simple(
        CommandKind::ReadBitsPerWord,
        Direction::Read,
        SPI_IOC_NR_BITS_PER_WORD,
        Payload::U8,
    ),
    CommandSpec::simple(
        CommandKind::WriteBitsPerWord,
        Direction::Write,
        SPI_IOC_NR_BITS_PER_WORD,
        Payload::U8,
    ),
    CommandSpec::simple(
        CommandKind::ReadMaxSpeedHz,
        Direction::Read,
        SPI_IOC_NR_MAX_SPEED_HZ,
        Payload::U32,
    ),
    CommandSpec::simple(
        CommandKind::WriteMaxSpeedHz,
        Direction::Write,
        SPI_IOC_NR_MAX_SPEED_HZ,
        Payload::U32,
    ),
];

/// `SPI_IOC_MESSAGE(N)`; the kind carries a placeholder count of 0
pub const TRANSFER_BATCH: CommandSpec = CommandSpec {
    kind: CommandKind::TransferBatch(0),
    direction: Direction::Write,
    ty: SPI_IOC_MAGIC,
    number: SPI_IOC_NR_MESSAGE,
    size: SizeDescriptor::PerTransfer,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_simple_command_codes() {
        let codes: [u32; 8] = [
            0x8001_6B01,
            0x4001_6B01,
            0x8001_6B02,
            0x4001_6B02,
            0x8001_6B03,
            0x4001_6B03,
            0x8004_6B04,
            0x4004_6B04,
        ];
        for (spec, expected) in SIMPLE_COMMANDS.iter().zip(codes) {
            assert_eq!(spec.code(0).unwrap().raw(), expected, "{}", spec.kind);
        }
    }

    #[test]
    fn test_simple_commands_are_distinct() {
        for (i, a) in SIMPLE_COMMANDS.iter().enumerate() {
            for b in &SIMPLE_COMMANDS[i + 1..] {
                assert_ne!(a.kind, b.kind);
                assert_ne!(a.code(0).unwrap(), b.code(0).unwrap());
            }
        }
    }

    #[test]
    fn test_transfer_batch_spec() {
        assert_eq!(TRANSFER_BATCH.payload_size(3), Ok(96));
        assert_eq!(TRANSFER_BATCH.code(2).unwrap().raw(), 0x4040_6B00);
        assert_eq!(TRANSFER_BATCH.code(600), Err(Error::Overflow { count: 600 }));
        assert!(TRANSFER_BATCH.matches_prefix(RequestCode::from_raw(0x4021_6B00)));
        assert!(!TRANSFER_BATCH.matches_prefix(RequestCode::from_raw(0x8020_6B00)));
    }

    #[test]
    fn test_labels() {
        assert_eq!(CommandKind::WriteMode.label(), "SPI_IOC_WR_MODE");
        assert_eq!(
            std::format!("{}", CommandKind::TransferBatch(2)),
            "SPI_IOC_MESSAGE(2)"
        );
        assert!(!CommandKind::Unknown.is_known());
        assert!(CommandKind::TransferBatch(1).is_known());
    }
}
