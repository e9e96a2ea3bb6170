//! vspidev - An emulated Linux spidev device
//!
//! Mounts a FUSE filesystem containing a fake `spidevX.Y` node so programs
//! written against the spidev ioctl interface can run without SPI
//! hardware. Every ioctl is decoded and logged.
//!
//! # Architecture
//!
//! - `vspidev-core` decodes ioctl request codes and classifies them
//! - `vspidev-fuse` serves the device node and answers each call
//!
//! The remaining subcommands (`decode`, `encode`, `message`, `list`) work
//! offline on request codes.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use commands::MountArgs;
use vspidev_core::CommandRegistry;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // -v/-vv raise the default level; RUST_LOG still overrides it
    env_logger::Builder::new()
        .filter_level(log_level(cli.verbose))
        .parse_env(env_logger::Env::default())
        .init();

    // The command tables are static; failing here is a build defect
    let registry = match CommandRegistry::new() {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Failed to build command registry: {}", e);
            std::process::exit(1);
        }
    };

    log::debug!(
        "Registered {} commands",
        registry.entries().count() + registry.batch_entries().count()
    );

    match cli.command {
        Commands::Mount {
            mountpoint,
            name,
            fsname,
            allow_other,
            config,
            options,
        } => commands::cmd_mount(MountArgs {
            mountpoint,
            name,
            fsname,
            allow_other,
            config,
            options,
        }),
        Commands::Decode { code } => commands::cmd_decode(&registry, code),
        Commands::Encode {
            direction,
            ty,
            number,
            size,
        } => commands::cmd_encode(&registry, direction, ty, number, size),
        Commands::Message { count } => commands::cmd_message(&registry, count),
        Commands::List => {
            commands::list_commands(&registry);
            Ok(())
        }
    }
}

fn log_level(verbose: u8) -> log::LevelFilter {
    match verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level() {
        assert_eq!(log_level(0), log::LevelFilter::Info);
        assert_eq!(log_level(1), log::LevelFilter::Debug);
        assert_eq!(log_level(2), log::LevelFilter::Trace);
        assert_eq!(log_level(7), log::LevelFilter::Trace);
    }

    #[test]
    fn test_verbose_flag_enables_debug() {
        let cli = Cli::try_parse_from(["vspidev", "-v", "list"]).unwrap();
        let logger = env_logger::Builder::new()
            .filter_level(log_level(cli.verbose))
            .build();
        assert_eq!(logger.filter(), log::LevelFilter::Debug);
        let record = log::Metadata::builder()
            .level(log::Level::Debug)
            .target("vspidev_fuse::ioctl")
            .build();
        assert!(log::Log::enabled(&logger, &record));
    }
}
