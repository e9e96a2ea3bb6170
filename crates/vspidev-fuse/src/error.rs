//! Error types for the device node

use thiserror::Error;

/// Device node errors
#[derive(Debug, Error)]
pub enum NodeError {
    /// No node with this inode number or name
    #[error("No such node: {0}")]
    NotFound(String),

    /// Directory operation on a regular file
    #[error("Inode {0} is not a directory")]
    NotADirectory(u64),

    /// File operation on a directory
    #[error("Inode {0} is a directory")]
    IsADirectory(u64),

    /// Extended attribute not set
    #[error("No attribute {name} on inode {ino}")]
    NoAttribute { ino: u64, name: String },

    /// Negative or unrepresentable file offset
    #[error("Invalid offset {0}")]
    InvalidOffset(i64),

    /// Write or truncate would grow the capture buffer past its limit
    #[error("Capture of {requested} bytes exceeds the {limit} byte limit")]
    CaptureFull { requested: u64, limit: usize },

    /// Invalid node option
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// Failed to read a config file
    #[error("Failed to read {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for a node
    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The FUSE session could not be started
    #[error("Failed to mount at {path}: {source}")]
    MountFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Command registry construction failed
    #[error("Command registry: {0}")]
    Registry(#[from] vspidev_core::Error),
}

impl NodeError {
    /// errno reported to the kernel for this error
    pub fn errno(&self) -> libc::c_int {
        match self {
            Self::NotFound(_) => libc::ENOENT,
            Self::NotADirectory(_) => libc::ENOTDIR,
            Self::IsADirectory(_) => libc::EISDIR,
            Self::NoAttribute { .. } => libc::ENODATA,
            Self::InvalidOffset(_) | Self::InvalidOption(_) => libc::EINVAL,
            Self::CaptureFull { .. } => libc::EFBIG,
            Self::ConfigRead { .. } | Self::ConfigParse(_) | Self::MountFailed { .. } => libc::EIO,
            Self::Registry(_) => libc::EINVAL,
        }
    }
}

/// Result type for device node operations
pub type Result<T> = std::result::Result<T, NodeError>;
