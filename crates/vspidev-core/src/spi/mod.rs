//! spidev protocol definitions
//!
//! Constants and record layouts from `<linux/spi/spidev.h>`: the ioctl
//! magic, the per-setting command numbers, SPI mode bits and the
//! `spi_ioc_transfer` record used by `SPI_IOC_MESSAGE(N)`.

mod mode;
mod transfer;

pub use mode::SpiModeFlags;
pub use transfer::{spi_ioc_message, SpiIocTransfer};

/// ioctl magic for spidev (`'k'`)
pub const SPI_IOC_MAGIC: u8 = b'k';

// ============================================================================
// Command numbers
// ============================================================================

/// `SPI_IOC_MESSAGE(N)`, write direction only
pub const SPI_IOC_NR_MESSAGE: u8 = 0;
/// `SPI_IOC_{RD,WR}_MODE` (u8)
pub const SPI_IOC_NR_MODE: u8 = 1;
/// `SPI_IOC_{RD,WR}_LSB_FIRST` (u8)
pub const SPI_IOC_NR_LSB_FIRST: u8 = 2;
/// `SPI_IOC_{RD,WR}_BITS_PER_WORD` (u8)
pub const SPI_IOC_NR_BITS_PER_WORD: u8 = 3;
/// `SPI_IOC_{RD,WR}_MAX_SPEED_HZ` (u32)
pub const SPI_IOC_NR_MAX_SPEED_HZ: u8 = 4;
