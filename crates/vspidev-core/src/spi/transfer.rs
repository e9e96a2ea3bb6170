//! `struct spi_ioc_transfer` and `SPI_IOC_MESSAGE(N)`

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::{SPI_IOC_MAGIC, SPI_IOC_NR_MESSAGE};
use crate::error::Result;
use crate::ioc::{self, Direction, RequestCode};

/// One transfer of a `SPI_IOC_MESSAGE(N)` batch
///
/// Field order and widths are fixed by the protocol; the batch size
/// arithmetic depends on this record being exactly 32 bytes with no
/// implicit padding.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct SpiIocTransfer {
    /// Userspace address of the transmit buffer (0 for none)
    pub tx_buf: u64,
    /// Userspace address of the receive buffer (0 for none)
    pub rx_buf: u64,
    /// Length of both buffers in bytes
    pub len: u32,
    /// Clock override for this transfer (0 = device default)
    pub speed_hz: u32,
    /// Delay after the last bit, before deselecting
    pub delay_usecs: u16,
    /// Word size override (0 = device default)
    pub bits_per_word: u8,
    /// Deselect the device before the next transfer
    pub cs_change: u8,
    /// Reserved
    pub pad: u32,
}

const _: () = assert!(core::mem::size_of::<SpiIocTransfer>() == 32);

impl SpiIocTransfer {
    /// Split an ioctl input payload into transfer records
    ///
    /// A trailing partial record is ignored.
    pub fn records(payload: &[u8]) -> impl Iterator<Item = SpiIocTransfer> + '_ {
        payload
            .chunks_exact(core::mem::size_of::<Self>())
            .filter_map(|chunk| Self::read_from_bytes(chunk).ok())
    }
}

/// Request code for `SPI_IOC_MESSAGE(count)`
///
/// Fails with [`Error::Overflow`](crate::Error::Overflow) when `count`
/// records do not fit the size field.
pub const fn spi_ioc_message(count: u32) -> Result<RequestCode> {
    match ioc::batch_payload_size(count) {
        Ok(size) => ioc::encode(
            Direction::Write.bits(),
            SPI_IOC_MAGIC as u32,
            SPI_IOC_NR_MESSAGE as u32,
            size,
        ),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use core::mem::offset_of;

    #[test]
    fn test_field_offsets() {
        assert_eq!(offset_of!(SpiIocTransfer, tx_buf), 0);
        assert_eq!(offset_of!(SpiIocTransfer, rx_buf), 8);
        assert_eq!(offset_of!(SpiIocTransfer, len), 16);
        assert_eq!(offset_of!(SpiIocTransfer, speed_hz), 20);
        assert_eq!(offset_of!(SpiIocTransfer, delay_usecs), 24);
        assert_eq!(offset_of!(SpiIocTransfer, bits_per_word), 26);
        assert_eq!(offset_of!(SpiIocTransfer, cs_change), 27);
        assert_eq!(offset_of!(SpiIocTransfer, pad), 28);
    }

    #[test]
    fn test_records_from_payload() {
        let a = SpiIocTransfer {
            tx_buf: 0x1000,
            len: 4,
            speed_hz: 2_000_000,
            bits_per_word: 8,
            ..Default::default()
        };
        let b = SpiIocTransfer {
            rx_buf: 0x2000,
            len: 16,
            cs_change: 1,
            ..Default::default()
        };

        let mut payload = [0u8; 70];
        payload[..32].copy_from_slice(a.as_bytes());
        payload[32..64].copy_from_slice(b.as_bytes());

        let mut records = SpiIocTransfer::records(&payload);
        assert_eq!(records.next(), Some(a));
        assert_eq!(records.next(), Some(b));
        assert_eq!(records.next(), None);
    }

    #[test]
    fn test_spi_ioc_message() {
        // Matches the hand-computed formula used by spidev clients:
        // (1 << 30) | (n * 32) << 16 | ('k' << 8)
        for n in 1..=6u32 {
            let expected = (1u32 << 30) | ((n * 32) << 16) | ((b'k' as u32) << 8);
            assert_eq!(spi_ioc_message(n).unwrap().raw(), expected);
        }
        assert_eq!(spi_ioc_message(511).unwrap().size(), 16352);
        assert_eq!(spi_ioc_message(512), Err(Error::Overflow { count: 512 }));
    }
}
