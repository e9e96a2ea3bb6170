//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Parse an ioctl direction by name or raw field value
fn parse_direction(s: &str) -> Result<u32, String> {
    match s.to_ascii_lowercase().as_str() {
        "none" | "n" => Ok(0),
        "write" | "w" => Ok(1),
        "read" | "r" => Ok(2),
        "read-write" | "readwrite" | "rw" => Ok(3),
        _ => parse_hex_u32(s),
    }
}

#[derive(Parser)]
#[command(name = "vspidev")]
#[command(author, version, about = "Emulated spidev device node", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Mount the emulated device and serve it until unmounted
    Mount {
        /// Directory to mount on
        mountpoint: PathBuf,

        /// Device file name inside the mount (default: spidev0.0)
        #[arg(short, long)]
        name: Option<String>,

        /// Filesystem name shown in the mount table
        #[arg(long)]
        fsname: Option<String>,

        /// Allow other users to access the mount
        #[arg(long)]
        allow_other: bool,

        /// Node config file (TOML format)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Node options (e.g., -o name=spidev1.0,banner=hi)
        #[arg(short = 'o', long = "option", value_delimiter = ',')]
        options: Vec<String>,
    },

    /// Decode an ioctl request code
    Decode {
        /// Request code (hex, e.g., 0x40016b01, or decimal)
        #[arg(value_parser = parse_hex_u32)]
        code: u32,
    },

    /// Encode an ioctl request code from its fields
    Encode {
        /// Direction: none, write, read, rw (or 0-3)
        #[arg(value_parser = parse_direction)]
        direction: u32,

        /// Type (magic), e.g., 0x6b
        #[arg(value_parser = parse_hex_u32)]
        ty: u32,

        /// Command number
        #[arg(value_parser = parse_hex_u32)]
        number: u32,

        /// Payload size in bytes
        #[arg(value_parser = parse_hex_u32)]
        size: u32,
    },

    /// Show the SPI_IOC_MESSAGE(N) request code for a batch of N transfers
    Message {
        /// Number of transfer records
        count: u32,
    },

    /// List the registered spidev commands
    List,
}
