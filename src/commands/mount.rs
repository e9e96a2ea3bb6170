//! Mount command implementation

use std::path::PathBuf;

use vspidev_fuse::{split_options, NodeConfig};

/// Arguments of the `mount` subcommand
pub struct MountArgs {
    /// Directory to mount on
    pub mountpoint: PathBuf,
    /// `--name`
    pub name: Option<String>,
    /// `--fsname`
    pub fsname: Option<String>,
    /// `--allow-other`
    pub allow_other: bool,
    /// `--config`
    pub config: Option<PathBuf>,
    /// `-o key=value` options
    pub options: Vec<String>,
}

/// Build the node configuration
///
/// Later sources win: defaults, config file, `-o` options, dedicated flags.
fn build_config(args: &MountArgs) -> Result<NodeConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => {
            log::debug!("Loading node config from {}", path.display());
            NodeConfig::from_file(path)?
        }
        None => NodeConfig::default(),
    };

    let joined = args.options.join(",");
    config.apply_options(&split_options(&joined))?;

    if let Some(name) = &args.name {
        config.device_name = name.clone();
    }
    if let Some(fsname) = &args.fsname {
        config.fs_name = fsname.clone();
    }
    if args.allow_other {
        config.allow_other = true;
    }
    config.validate()?;

    Ok(config)
}

/// Mount the emulated device and block until it is unmounted
pub fn cmd_mount(args: MountArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config(&args)?;

    if !args.mountpoint.is_dir() {
        return Err(format!("Mount point not found: {}", args.mountpoint.display()).into());
    }

    log::info!(
        "Emulating /{} in {} (fsname={})",
        config.device_name,
        args.mountpoint.display(),
        config.fs_name
    );
    vspidev_fuse::mount(config, &args.mountpoint)?;
    Ok(())
}
