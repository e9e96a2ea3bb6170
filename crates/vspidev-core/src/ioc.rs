//! ioctl request-code codec
//!
//! Linux (asm-generic) packs every ioctl command into a single 32-bit word:
//!
//! ```text
//!  31 30 29                        16 15           8 7            0
//! +-----+----------------------------+--------------+--------------+
//! | dir |            size            |     type     |    number    |
//! +-----+----------------------------+--------------+--------------+
//! ```
//!
//! The layout is an external protocol constant. Driver clients compute their
//! codes with the `_IOC` macros, so [`encode`] and [`decode`] must agree with
//! those bit for bit.

use core::fmt;

use crate::error::{Error, Field, Result};
use crate::spi::SpiIocTransfer;

// ============================================================================
// Field widths, masks and shifts
// ============================================================================

/// Width of the command number field
pub const NRBITS: u32 = 8;
/// Width of the type (magic) field
pub const TYPEBITS: u32 = 8;
/// Width of the payload size field
pub const SIZEBITS: u32 = 14;
/// Width of the direction field
pub const DIRBITS: u32 = 2;

/// Mask for the command number field (after shifting)
pub const NRMASK: u32 = (1 << NRBITS) - 1;
/// Mask for the type field (after shifting)
pub const TYPEMASK: u32 = (1 << TYPEBITS) - 1;
/// Mask for the size field (after shifting)
pub const SIZEMASK: u32 = (1 << SIZEBITS) - 1;
/// Mask for the direction field (after shifting)
pub const DIRMASK: u32 = (1 << DIRBITS) - 1;

/// Bit offset of the command number field
pub const NRSHIFT: u32 = 0;
/// Bit offset of the type field
pub const TYPESHIFT: u32 = NRSHIFT + NRBITS;
/// Bit offset of the size field
pub const SIZESHIFT: u32 = TYPESHIFT + TYPEBITS;
/// Bit offset of the direction field
pub const DIRSHIFT: u32 = SIZESHIFT + SIZEBITS;

// ============================================================================
// Direction
// ============================================================================

/// Direction of an ioctl payload, seen from the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    /// No payload (`_IO`)
    None = 0,
    /// Caller writes, device reads (`_IOW`)
    Write = 1,
    /// Caller reads, device writes (`_IOR`)
    Read = 2,
    /// Both directions (`_IOWR`)
    ReadWrite = 3,
}

impl Direction {
    /// Interpret the low two bits of `bits` as a direction
    ///
    /// Higher bits are ignored, so every input maps to some direction.
    pub const fn from_bits(bits: u32) -> Self {
        match bits & DIRMASK {
            0 => Self::None,
            1 => Self::Write,
            2 => Self::Read,
            _ => Self::ReadWrite,
        }
    }

    /// Raw field value
    pub const fn bits(self) -> u32 {
        self as u32
    }

    /// Whether the caller hands a payload to the device
    pub const fn is_write(self) -> bool {
        self.bits() & Self::Write.bits() != 0
    }

    /// Whether the device hands a payload back to the caller
    pub const fn is_read(self) -> bool {
        self.bits() & Self::Read.bits() != 0
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Write => "write",
            Self::Read => "read",
            Self::ReadWrite => "read|write",
        })
    }
}

// ============================================================================
// Request codes
// ============================================================================

/// The four logical fields of a request code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IocFields {
    /// Payload direction
    pub direction: Direction,
    /// Subsystem magic
    pub ty: u8,
    /// Command number within the subsystem
    pub number: u8,
    /// Payload size in bytes (14 bits)
    pub size: u16,
}

/// A packed ioctl request code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestCode(u32);

impl RequestCode {
    /// Wrap a raw code observed on the wire
    ///
    /// Every 32-bit pattern is a syntactically valid code.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The packed integer
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Split the code into its fields
    pub const fn fields(self) -> IocFields {
        decode(self.0)
    }

    /// Payload direction
    pub const fn direction(self) -> Direction {
        Direction::from_bits(self.0 >> DIRSHIFT)
    }

    /// Subsystem magic
    pub const fn ty(self) -> u8 {
        ((self.0 >> TYPESHIFT) & TYPEMASK) as u8
    }

    /// Command number
    pub const fn number(self) -> u8 {
        ((self.0 >> NRSHIFT) & NRMASK) as u8
    }

    /// Payload size in bytes
    pub const fn size(self) -> u16 {
        ((self.0 >> SIZESHIFT) & SIZEMASK) as u16
    }
}

impl From<RequestCode> for u32 {
    fn from(code: RequestCode) -> Self {
        code.raw()
    }
}

impl fmt::Display for RequestCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "0x{:08X} (dir={} type={} nr={} size={})",
            self.0,
            self.direction(),
            self.ty(),
            self.number(),
            self.size()
        )
    }
}

/// Pack the four fields into a request code
///
/// Each value must fit its bit field; the first one that does not is
/// reported as [`Error::InvalidField`]. Nothing is truncated.
pub const fn encode(direction: u32, ty: u32, number: u32, size: u32) -> Result<RequestCode> {
    if direction > DIRMASK {
        return Err(Error::InvalidField {
            field: Field::Direction,
            value: direction,
        });
    }
    if ty > TYPEMASK {
        return Err(Error::InvalidField {
            field: Field::Type,
            value: ty,
        });
    }
    if number > NRMASK {
        return Err(Error::InvalidField {
            field: Field::Number,
            value: number,
        });
    }
    if size > SIZEMASK {
        return Err(Error::InvalidField {
            field: Field::Size,
            value: size,
        });
    }

    Ok(RequestCode(
        (direction << DIRSHIFT) | (ty << TYPESHIFT) | (number << NRSHIFT) | (size << SIZESHIFT),
    ))
}

/// Split a raw code into its fields
///
/// Total over the whole `u32` domain.
pub const fn decode(code: u32) -> IocFields {
    let code = RequestCode(code);
    IocFields {
        direction: code.direction(),
        ty: code.ty(),
        number: code.number(),
        size: code.size(),
    }
}

/// `_IOC` with an explicit payload type size
const fn ioc_sized<T>(direction: Direction, ty: u8, nr: u8) -> Result<RequestCode> {
    let size = core::mem::size_of::<T>();
    if size > SIZEMASK as usize {
        return Err(Error::InvalidField {
            field: Field::Size,
            value: if size > u32::MAX as usize {
                u32::MAX
            } else {
                size as u32
            },
        });
    }
    encode(direction.bits(), ty as u32, nr as u32, size as u32)
}

/// `_IO(type, nr)`: command without payload
pub const fn io(ty: u8, nr: u8) -> RequestCode {
    RequestCode(((ty as u32) << TYPESHIFT) | ((nr as u32) << NRSHIFT))
}

/// `_IOR(type, nr, T)`: device returns a `T`
pub const fn ior<T>(ty: u8, nr: u8) -> Result<RequestCode> {
    ioc_sized::<T>(Direction::Read, ty, nr)
}

/// `_IOW(type, nr, T)`: caller passes a `T`
pub const fn iow<T>(ty: u8, nr: u8) -> Result<RequestCode> {
    ioc_sized::<T>(Direction::Write, ty, nr)
}

/// `_IOWR(type, nr, T)`: `T` flows both ways
pub const fn iowr<T>(ty: u8, nr: u8) -> Result<RequestCode> {
    ioc_sized::<T>(Direction::ReadWrite, ty, nr)
}

// ============================================================================
// Payload sizes
// ============================================================================

/// Payload record kinds known to the spidev protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Payload {
    /// A single `__u8` (mode, lsb-first, bits-per-word)
    U8,
    /// A single `__u32` (max speed, 32-bit mode)
    U32,
    /// One `struct spi_ioc_transfer`
    Transfer,
}

/// Byte size of one record of the given kind
pub const fn sizeof_record(kind: Payload) -> u32 {
    match kind {
        Payload::U8 => core::mem::size_of::<u8>() as u32,
        Payload::U32 => core::mem::size_of::<u32>() as u32,
        Payload::Transfer => core::mem::size_of::<SpiIocTransfer>() as u32,
    }
}

/// Payload size of a batch of `count` transfer records
///
/// The kernel header silently turns an oversized batch into size 0, which
/// collides with a valid code. Here it is an [`Error::Overflow`] instead.
pub const fn batch_payload_size(count: u32) -> Result<u32> {
    match count.checked_mul(sizeof_record(Payload::Transfer)) {
        Some(size) if size <= SIZEMASK => Ok(size),
        _ => Err(Error::Overflow { count }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIRECTIONS: [Direction; 4] = [
        Direction::None,
        Direction::Write,
        Direction::Read,
        Direction::ReadWrite,
    ];

    #[test]
    fn test_layout_constants() {
        assert_eq!(NRSHIFT, 0);
        assert_eq!(TYPESHIFT, 8);
        assert_eq!(SIZESHIFT, 16);
        assert_eq!(DIRSHIFT, 30);
        assert_eq!(DIRSHIFT + DIRBITS, 32);
        assert_eq!(SIZEMASK, 16383);
    }

    #[test]
    fn test_encode_known_spidev_codes() {
        // Values as produced by <linux/spi/spidev.h> on x86_64/arm64
        assert_eq!(encode(2, 107, 1, 1).unwrap().raw(), 0x8001_6B01);
        assert_eq!(encode(1, 107, 1, 1).unwrap().raw(), 0x4001_6B01);
        assert_eq!(encode(2, 107, 4, 4).unwrap().raw(), 0x8004_6B04);
        assert_eq!(encode(1, 107, 4, 4).unwrap().raw(), 0x4004_6B04);
        assert_eq!(encode(1, 107, 0, 32).unwrap().raw(), 0x4020_6B00);
        assert_eq!(encode(1, 107, 0, 64).unwrap().raw(), 0x4040_6B00);
    }

    #[test]
    fn test_round_trip() {
        for dir in DIRECTIONS {
            for ty in [0u32, 1, 0x6B, 0x7F, 0xFF] {
                for number in [0u32, 1, 4, 0x80, 0xFF] {
                    for size in (0..=SIZEMASK).step_by(97).chain([SIZEMASK]) {
                        let code = encode(dir.bits(), ty, number, size).unwrap();
                        let fields = decode(code.raw());
                        assert_eq!(fields.direction, dir);
                        assert_eq!(fields.ty as u32, ty);
                        assert_eq!(fields.number as u32, number);
                        assert_eq!(fields.size as u32, size);
                        assert_eq!(code.fields(), fields);
                    }
                }
            }
        }
    }

    #[test]
    fn test_decode_is_total() {
        // Walk the 32-bit space with a fixed-stride LCG plus the edges
        let mut x: u32 = 0x1234_5678;
        let edges = [0u32, 1, 0xFF, 0xFFFF, 0x3FFF_FFFF, 0x4000_0000, u32::MAX];
        for raw in edges.into_iter().chain((0..100_000).map(|_| {
            x = x.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            x
        })) {
            let f = decode(raw);
            assert!(f.direction.bits() <= DIRMASK);
            assert!(f.size as u32 <= SIZEMASK);
            // Re-encoding a decoded code is lossless
            let back = encode(
                f.direction.bits(),
                f.ty as u32,
                f.number as u32,
                f.size as u32,
            )
            .unwrap();
            assert_eq!(back.raw(), raw);
        }
    }

    #[test]
    fn test_encode_rejects_out_of_range_fields() {
        assert_eq!(
            encode(1, 107, 0, 16384),
            Err(Error::InvalidField {
                field: Field::Size,
                value: 16384
            })
        );
        assert_eq!(
            encode(1, 256, 0, 0),
            Err(Error::InvalidField {
                field: Field::Type,
                value: 256
            })
        );
        assert_eq!(
            encode(4, 107, 0, 0),
            Err(Error::InvalidField {
                field: Field::Direction,
                value: 4
            })
        );
        assert_eq!(
            encode(0, 0, 256, 0),
            Err(Error::InvalidField {
                field: Field::Number,
                value: 256
            })
        );
    }

    #[test]
    fn test_typed_helpers() {
        assert_eq!(io(b'k', 9).raw(), 0x0000_6B09);
        assert_eq!(ior::<u8>(b'k', 1).unwrap().raw(), 0x8001_6B01);
        assert_eq!(iow::<u32>(b'k', 4).unwrap().raw(), 0x4004_6B04);
        assert_eq!(
            iowr::<u32>(b'k', 5).unwrap().direction(),
            Direction::ReadWrite
        );
        assert!(matches!(
            iow::<[u8; 16384]>(b'k', 0),
            Err(Error::InvalidField {
                field: Field::Size,
                ..
            })
        ));
    }

    #[test]
    fn test_direction_bits() {
        assert!(!Direction::None.is_write());
        assert!(!Direction::None.is_read());
        assert!(Direction::Write.is_write());
        assert!(!Direction::Write.is_read());
        assert!(Direction::Read.is_read());
        assert!(Direction::ReadWrite.is_read() && Direction::ReadWrite.is_write());
        assert_eq!(Direction::from_bits(0b111), Direction::ReadWrite);
    }

    #[test]
    fn test_sizeof_record() {
        assert_eq!(sizeof_record(Payload::U8), 1);
        assert_eq!(sizeof_record(Payload::U32), 4);
        assert_eq!(sizeof_record(Payload::Transfer), 32);
    }

    #[test]
    fn test_batch_payload_size_boundary() {
        assert_eq!(batch_payload_size(0), Ok(0));
        assert_eq!(batch_payload_size(1), Ok(32));
        assert_eq!(batch_payload_size(511), Ok(16352));
        assert_eq!(
            batch_payload_size(512),
            Err(Error::Overflow { count: 512 })
        );
        assert_eq!(
            batch_payload_size(u32::MAX),
            Err(Error::Overflow { count: u32::MAX })
        );
    }
}
