//! ioctl dispatch for the device node
//!
//! There is no hardware behind the node, so every recognized command is
//! logged and answered with a neutral result. Unrecognized codes are not
//! errors: programs probing the device during discovery must keep working.

use vspidev_core::spi::{SpiIocTransfer, SpiModeFlags};
use vspidev_core::{CommandKind, CommandRegistry, RequestCode};

use crate::error::Result;

/// Reply to one ioctl call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoctlOutcome {
    /// Return value of `ioctl(2)`
    pub result: i32,
    /// Bytes copied back to the caller
    pub data: Vec<u8>,
}

/// Classifies ioctl calls and produces their replies
#[derive(Debug, Clone)]
pub struct IoctlHandler {
    registry: CommandRegistry,
}

impl IoctlHandler {
    /// Build a handler with a fresh command registry
    pub fn new() -> Result<Self> {
        Ok(Self::with_registry(CommandRegistry::new()?))
    }

    /// Build a handler around an existing registry
    pub fn with_registry(registry: CommandRegistry) -> Self {
        Self { registry }
    }

    /// The registry used for classification
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Handle `ioctl(cmd)` with the caller's input payload
    ///
    /// `out_size` is the number of bytes the kernel will copy back for
    /// read-direction commands.
    pub fn handle(&self, cmd: u32, in_data: &[u8], out_size: u32) -> IoctlOutcome {
        let code = RequestCode::from_raw(cmd);
        log::debug!(
            "ioctl: cmd=0x{:08X} in={} bytes out={} bytes",
            cmd,
            in_data.len(),
            out_size
        );

        let kind = self.registry.resolve(cmd);
        if code.direction().is_write() && in_data.len() < code.size() as usize {
            log::warn!(
                "ioctl: {} expects {} input bytes, got {}",
                kind,
                code.size(),
                in_data.len()
            );
        }

        match kind {
            CommandKind::Unknown => {
                log::info!("ioctl: unrecognized {}", code);
                IoctlOutcome {
                    result: 0,
                    data: Vec::new(),
                }
            }
            CommandKind::TransferBatch(count) => {
                log::info!("ioctl: {}", kind);
                log_transfers(in_data);
                IoctlOutcome {
                    result: batch_result(count),
                    data: Vec::new(),
                }
            }
            _ => {
                log::info!("ioctl: {}", kind);
                log_setting(kind, in_data);
                let data = if code.direction().is_read() {
                    vec![0u8; out_size.min(code.size() as u32) as usize]
                } else {
                    Vec::new()
                };
                IoctlOutcome { result: 0, data }
            }
        }
    }
}

/// One- and two-transfer batches echo their count so callers can tell the
/// call reached the emulator; everything else reports 0.
fn batch_result(count: u32) -> i32 {
    match count {
        1 | 2 => count as i32,
        _ => 0,
    }
}

fn log_transfers(in_data: &[u8]) {
    for (i, xfer) in SpiIocTransfer::records(in_data).enumerate() {
        log::debug!(
            "ioctl:   [{}] len={} tx=0x{:x} rx=0x{:x} speed={} Hz bpw={} delay={} us cs_change={}",
            i,
            xfer.len,
            xfer.tx_buf,
            xfer.rx_buf,
            xfer.speed_hz,
            xfer.bits_per_word,
            xfer.delay_usecs,
            xfer.cs_change
        );
    }
}

fn log_setting(kind: CommandKind, in_data: &[u8]) {
    match kind {
        CommandKind::WriteMode => {
            if let Some(&mode) = in_data.first() {
                let flags = SpiModeFlags::from_bits_truncate(mode);
                log::debug!("ioctl:   mode {} ({:?})", flags.clock_mode(), flags);
            }
        }
        CommandKind::WriteLsbFirst | CommandKind::WriteBitsPerWord => {
            if let Some(&value) = in_data.first() {
                log::debug!("ioctl:   value {}", value);
            }
        }
        CommandKind::WriteMaxSpeedHz => {
            if let Some(bytes) = in_data.get(..4).and_then(|b| <[u8; 4]>::try_from(b).ok()) {
                log::debug!("ioctl:   speed {} Hz", u32::from_ne_bytes(bytes));
            }
        }
        _ => {}
    }
}
