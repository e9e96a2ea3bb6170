//! CLI command implementations
//!
//! `mount` runs the FUSE device node; the other commands are offline tools
//! for working with spidev request codes.

mod inspect;
mod list;
mod mount;

pub use inspect::{cmd_decode, cmd_encode, cmd_message};
pub use list::list_commands;
pub use mount::{cmd_mount, MountArgs};
