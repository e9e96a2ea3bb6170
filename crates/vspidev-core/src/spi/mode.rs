//! SPI mode bits

use bitflags::bitflags;

bitflags! {
    /// Mode byte exchanged by `SPI_IOC_{RD,WR}_MODE`
    ///
    /// Bit names follow `<linux/spi/spidev.h>`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SpiModeFlags: u8 {
        /// Clock phase
        const CPHA      = 0x01;
        /// Clock polarity
        const CPOL      = 0x02;
        /// Chip select active high
        const CS_HIGH   = 0x04;
        /// Per-word bits-on-wire, LSB first
        const LSB_FIRST = 0x08;
        /// SI/SO signals shared
        const THREE_WIRE = 0x10;
        /// Loopback mode
        const LOOP      = 0x20;
        /// One device per bus, no chip select
        const NO_CS     = 0x40;
        /// Slave pulls low to pause
        const READY     = 0x80;

        /// CPOL=0, CPHA=0
        const MODE_0 = 0;
        /// CPOL=0, CPHA=1
        const MODE_1 = Self::CPHA.bits();
        /// CPOL=1, CPHA=0
        const MODE_2 = Self::CPOL.bits();
        /// CPOL=1, CPHA=1
        const MODE_3 = Self::CPOL.bits() | Self::CPHA.bits();
    }
}

impl Default for SpiModeFlags {
    fn default() -> Self {
        SpiModeFlags::MODE_0
    }
}

impl SpiModeFlags {
    /// Clock mode number (0-3) encoded in the CPOL/CPHA bits
    pub const fn clock_mode(self) -> u8 {
        self.bits() & Self::MODE_3.bits()
    }
}
