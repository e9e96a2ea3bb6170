//! Command registry and dispatcher
//!
//! The registry is built once at startup from the static command tables and
//! is read-only afterwards, so a shared reference can be handed to any
//! number of threads. Storage is fixed-capacity; nothing here allocates.

use heapless::Vec;

use crate::command::{CommandKind, CommandSpec, SIMPLE_COMMANDS, TRANSFER_BATCH};
use crate::error::{Error, Result};
use crate::ioc::{self, Payload, RequestCode};

/// Number of `SPI_IOC_MESSAGE(N)` codes computed up front (N = 1..=6)
pub const PRECOMPUTED_BATCHES: usize = 6;

/// A registered request code and the command it selects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    /// Encoded request code
    pub code: RequestCode,
    /// Command selected by this code
    pub kind: CommandKind,
}

/// Lookup table from request codes to spidev commands
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    simple: Vec<Entry, { SIMPLE_COMMANDS.len() }>,
    batches: Vec<Entry, PRECOMPUTED_BATCHES>,
}

impl CommandRegistry {
    /// Encode every known command
    ///
    /// An error here means the static tables are wrong; callers should treat
    /// it as fatal.
    pub fn new() -> Result<Self> {
        let mut simple = Vec::new();
        for spec in &SIMPLE_COMMANDS {
            let entry = Entry {
                code: spec.code(0)?,
                kind: spec.kind,
            };
            log::trace!("registry: {} = {}", entry.kind, entry.code);
            simple.push(entry).map_err(|_| Error::TableFull)?;
        }

        let mut batches = Vec::new();
        for count in 1..=PRECOMPUTED_BATCHES as u32 {
            let entry = Entry {
                code: TRANSFER_BATCH.code(count)?,
                kind: CommandKind::TransferBatch(count),
            };
            log::trace!("registry: {} = {}", entry.kind, entry.code);
            batches.push(entry).map_err(|_| Error::TableFull)?;
        }

        Ok(Self { simple, batches })
    }

    /// Classify an observed request code
    ///
    /// Simple commands must match exactly. Anything written to magic `'k'`,
    /// number 0 whose size is a positive multiple of the transfer record
    /// size is a transfer batch. Everything else is [`CommandKind::Unknown`].
    pub fn resolve(&self, raw: u32) -> CommandKind {
        let code = RequestCode::from_raw(raw);

        if let Some(entry) = self.simple.iter().find(|e| e.code == code) {
            return entry.kind;
        }
        if let Some(entry) = self.batches.iter().find(|e| e.code == code) {
            return entry.kind;
        }

        if TRANSFER_BATCH.matches_prefix(code) {
            let size = code.size() as u32;
            let record = ioc::sizeof_record(Payload::Transfer);
            if size % record == 0 && size / record > 0 {
                return CommandKind::TransferBatch(size / record);
            }
            log::debug!(
                "registry: size {} of {} is not a whole number of transfers",
                size,
                code
            );
        }

        CommandKind::Unknown
    }

    /// Resolve a typed request code
    pub fn resolve_code(&self, code: RequestCode) -> CommandKind {
        self.resolve(code.raw())
    }

    /// `SPI_IOC_MESSAGE(count)` for any count, precomputed or not
    pub fn message_code(&self, count: u32) -> Result<RequestCode> {
        match self.batches.iter().find(|e| e.kind == CommandKind::TransferBatch(count)) {
            Some(entry) => Ok(entry.code),
            None => TRANSFER_BATCH.code(count),
        }
    }

    /// Fixed-size get/set entries, in table order
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.simple.iter()
    }

    /// Precomputed transfer batch entries, N = 1..=6
    pub fn batch_entries(&self) -> impl Iterator<Item = &Entry> {
        self.batches.iter()
    }

    /// The encoding recipe behind a command kind
    pub fn spec_for(kind: CommandKind) -> Option<&'static CommandSpec> {
        match kind {
            CommandKind::TransferBatch(_) => Some(&TRANSFER_BATCH),
            CommandKind::Unknown => None,
            _ => SIMPLE_COMMANDS.iter().find(|spec| spec.kind == kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ioc::{encode, Direction};

    const W: u32 = Direction::Write.bits();
    const R: u32 = Direction::Read.bits();

    fn registry() -> CommandRegistry {
        CommandRegistry::new().unwrap()
    }

    #[test]
    fn test_new_registers_every_table_entry() {
        let reg = registry();
        assert_eq!(reg.entries().count(), SIMPLE_COMMANDS.len());
        assert_eq!(reg.batch_entries().count(), PRECOMPUTED_BATCHES);
        assert_eq!(
            std::format!("{}", Error::TableFull),
            "command table exceeds registry capacity"
        );
    }

    #[test]
    fn test_resolve_simple_commands() {
        let reg = registry();
        assert_eq!(
            reg.resolve(encode(W, 107, 1, 1).unwrap().raw()),
            CommandKind::WriteMode
        );
        assert_eq!(
            reg.resolve(encode(R, 107, 4, 4).unwrap().raw()),
            CommandKind::ReadMaxSpeedHz
        );
        for entry in reg.entries() {
            assert_eq!(reg.resolve_code(entry.code), entry.kind);
        }
    }

    #[test]
    fn test_resolve_transfer_batches() {
        let reg = registry();
        assert_eq!(
            reg.resolve(encode(W, 107, 0, 32).unwrap().raw()),
            CommandKind::TransferBatch(1)
        );
        assert_eq!(
            reg.resolve(encode(W, 107, 0, 64).unwrap().raw()),
            CommandKind::TransferBatch(2)
        );
        // Beyond the precomputed set
        assert_eq!(
            reg.resolve(encode(W, 107, 0, 511 * 32).unwrap().raw()),
            CommandKind::TransferBatch(511)
        );
    }

    #[test]
    fn test_resolve_rejects_malformed_batches() {
        let reg = registry();
        // Not a multiple of the record size
        assert_eq!(
            reg.resolve(encode(W, 107, 0, 33).unwrap().raw()),
            CommandKind::Unknown
        );
        // Zero records
        assert_eq!(
            reg.resolve(encode(W, 107, 0, 0).unwrap().raw()),
            CommandKind::Unknown
        );
        // Wrong direction, magic or number
        assert_eq!(
            reg.resolve(encode(R, 107, 0, 32).unwrap().raw()),
            CommandKind::Unknown
        );
        assert_eq!(
            reg.resolve(encode(3, 107, 0, 32).unwrap().raw()),
            CommandKind::Unknown
        );
        assert_eq!(
            reg.resolve(encode(W, 108, 0, 32).unwrap().raw()),
            CommandKind::Unknown
        );
        assert_eq!(
            reg.resolve(encode(W, 107, 5, 32).unwrap().raw()),
            CommandKind::Unknown
        );
    }

    #[test]
    fn test_resolve_requires_exact_simple_match() {
        let reg = registry();
        // Right number, wrong size
        assert_eq!(
            reg.resolve(encode(W, 107, 1, 4).unwrap().raw()),
            CommandKind::Unknown
        );
        // Right number, no direction
        assert_eq!(
            reg.resolve(encode(0, 107, 3, 0).unwrap().raw()),
            CommandKind::Unknown
        );
        assert_eq!(reg.resolve(0), CommandKind::Unknown);
        assert_eq!(reg.resolve(u32::MAX), CommandKind::Unknown);
    }

    #[test]
    fn test_no_false_positives() {
        let reg = registry();
        let mut x: u32 = 0xDEAD_BEEF;
        for _ in 0..200_000 {
            x = x.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let code = RequestCode::from_raw(x);
            let simple = reg.entries().any(|e| e.code == code);
            let batch = code.direction() == Direction::Write
                && code.ty() == 107
                && code.number() == 0
                && code.size() > 0
                && code.size() % 32 == 0;
            let kind = reg.resolve(x);
            assert_eq!(kind.is_known(), simple || batch, "{}", code);
        }
    }

    #[test]
    fn test_precomputed_batches() {
        let reg = registry();
        let counts: std::vec::Vec<_> = reg.batch_entries().map(|e| e.kind).collect();
        assert_eq!(
            counts,
            (1..=6).map(CommandKind::TransferBatch).collect::<std::vec::Vec<_>>()
        );
        assert_eq!(reg.message_code(2).unwrap().raw(), 0x4040_6B00);
        assert_eq!(reg.message_code(100).unwrap().size(), 3200);
        assert_eq!(reg.message_code(512), Err(Error::Overflow { count: 512 }));
    }

    #[test]
    fn test_spec_for() {
        assert_eq!(
            CommandRegistry::spec_for(CommandKind::ReadMaxSpeedHz).unwrap().number,
            4
        );
        assert_eq!(
            CommandRegistry::spec_for(CommandKind::TransferBatch(9)).unwrap().number,
            0
        );
        assert!(CommandRegistry::spec_for(CommandKind::Unknown).is_none());
    }
}
