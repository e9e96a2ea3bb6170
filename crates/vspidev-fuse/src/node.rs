//! In-memory node table
//!
//! The mount holds exactly two nodes: the root directory and the device
//! file. Reads of the device always return the configured banner; writes
//! are accepted and kept in memory so tools that write to the node keep
//! working, but nothing is persisted.

use std::collections::{BTreeMap, HashMap};
use std::time::SystemTime;

use crate::config::NodeConfig;
use crate::error::{NodeError, Result};

/// Inode of the mount root
pub const ROOT_INODE: u64 = 1;
/// Inode of the device file
pub const DEVICE_INODE: u64 = 2;

/// Block size reported by `statfs` and `getattr`
pub const BLOCK_SIZE: u32 = 512;

/// Type of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// The mount root
    Directory,
    /// The device file
    RegularFile,
}

/// Attributes of a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeAttr {
    /// Inode number
    pub ino: u64,
    /// Node type
    pub kind: NodeKind,
    /// Permission bits (no file type bits)
    pub perm: u16,
    /// Link count
    pub nlink: u32,
    /// Size in bytes
    pub size: u64,
    /// Owner
    pub uid: u32,
    /// Group
    pub gid: u32,
    /// Last access
    pub atime: SystemTime,
    /// Last modification
    pub mtime: SystemTime,
    /// Last status change
    pub ctime: SystemTime,
}

impl NodeAttr {
    fn new(ino: u64, kind: NodeKind, perm: u16, nlink: u32, size: u64) -> Self {
        let now = SystemTime::now();
        Self {
            ino,
            kind,
            perm,
            nlink,
            size,
            uid: 0,
            gid: 0,
            atime: now,
            mtime: now,
            ctime: now,
        }
    }

    /// Number of 512-byte blocks covering `size`
    pub fn blocks(&self) -> u64 {
        self.size.div_ceil(BLOCK_SIZE as u64)
    }
}

/// One `readdir` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Inode number
    pub ino: u64,
    /// Node type
    pub kind: NodeKind,
    /// Entry name
    pub name: String,
}

/// Attribute changes requested by `setattr`
#[derive(Debug, Clone, Default)]
pub struct SetAttr {
    /// New mode; file type bits are ignored
    pub mode: Option<u32>,
    /// New owner
    pub uid: Option<u32>,
    /// New group
    pub gid: Option<u32>,
    /// Truncate or extend the written data
    pub size: Option<u64>,
    /// New access time
    pub atime: Option<SystemTime>,
    /// New modification time
    pub mtime: Option<SystemTime>,
}

/// Filesystem statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatFs {
    /// Total blocks
    pub blocks: u64,
    /// Free blocks
    pub bfree: u64,
    /// Blocks available to unprivileged users
    pub bavail: u64,
    /// Total inodes
    pub files: u64,
    /// Free inodes
    pub ffree: u64,
    /// Block size
    pub bsize: u32,
    /// Maximum name length
    pub namelen: u32,
    /// Fragment size
    pub frsize: u32,
}

/// The emulated device node and its root directory
#[derive(Debug)]
pub struct DeviceNode {
    config: NodeConfig,
    root: NodeAttr,
    device: NodeAttr,
    written: Vec<u8>,
    xattrs: HashMap<u64, BTreeMap<String, Vec<u8>>>,
    next_handle: u64,
}

impl DeviceNode {
    /// Create the node table for `config`
    pub fn new(config: NodeConfig) -> Self {
        let banner_len = config.banner.len() as u64;
        Self {
            root: NodeAttr::new(ROOT_INODE, NodeKind::Directory, 0o755, 2, 0),
            device: NodeAttr::new(DEVICE_INODE, NodeKind::RegularFile, 0o444, 1, banner_len),
            config,
            written: Vec::new(),
            xattrs: HashMap::new(),
            next_handle: 0,
        }
    }

    /// Configuration the node was built from
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Give both nodes to `uid:gid`
    pub fn set_owner(&mut self, uid: u32, gid: u32) {
        for attr in [&mut self.root, &mut self.device] {
            attr.uid = uid;
            attr.gid = gid;
        }
    }

    /// Data written to the device since mount
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    fn attr(&self, ino: u64) -> Result<&NodeAttr> {
        match ino {
            ROOT_INODE => Ok(&self.root),
            DEVICE_INODE => Ok(&self.device),
            _ => Err(NodeError::NotFound(format!("inode {}", ino))),
        }
    }

    fn attr_mut(&mut self, ino: u64) -> Result<&mut NodeAttr> {
        match ino {
            ROOT_INODE => Ok(&mut self.root),
            DEVICE_INODE => Ok(&mut self.device),
            _ => Err(NodeError::NotFound(format!("inode {}", ino))),
        }
    }

    fn capture_len(&self, requested: u64) -> Result<usize> {
        let limit = self.config.max_capture;
        match usize::try_from(requested) {
            Ok(len) if len <= limit => Ok(len),
            _ => {
                log::warn!(
                    "vspidev: Refusing to grow capture buffer to {} bytes (limit {})",
                    requested,
                    limit
                );
                Err(NodeError::CaptureFull { requested, limit })
            }
        }
    }

    fn require_device(&self, ino: u64) -> Result<()> {
        match self.attr(ino)?.kind {
            NodeKind::RegularFile => Ok(()),
            NodeKind::Directory => Err(NodeError::IsADirectory(ino)),
        }
    }

    /// Resolve `name` inside directory `parent`
    pub fn lookup(&self, parent: u64, name: &str) -> Result<NodeAttr> {
        if self.attr(parent)?.kind != NodeKind::Directory {
            return Err(NodeError::NotADirectory(parent));
        }
        if name == self.config.device_name {
            Ok(self.device.clone())
        } else {
            Err(NodeError::NotFound(name.to_string()))
        }
    }

    /// Attributes of `ino`
    pub fn getattr(&self, ino: u64) -> Result<NodeAttr> {
        self.attr(ino).cloned()
    }

    /// Apply `changes` to `ino` and return the updated attributes
    pub fn setattr(&mut self, ino: u64, changes: &SetAttr) -> Result<NodeAttr> {
        if let Some(size) = changes.size {
            self.require_device(ino)?;
            let size = self.capture_len(size)?;
            self.written.resize(size, 0);
            log::debug!("vspidev: Truncated written data to {} bytes", size);
        }

        let attr = self.attr_mut(ino)?;
        if let Some(mode) = changes.mode {
            attr.perm = (mode & 0o7777) as u16;
        }
        if let Some(uid) = changes.uid {
            attr.uid = uid;
        }
        if let Some(gid) = changes.gid {
            attr.gid = gid;
        }
        if let Some(atime) = changes.atime {
            attr.atime = atime;
        }
        if let Some(mtime) = changes.mtime {
            attr.mtime = mtime;
        }
        attr.ctime = SystemTime::now();
        Ok(attr.clone())
    }

    /// Entries of directory `ino`
    pub fn readdir(&self, ino: u64) -> Result<Vec<DirEntry>> {
        if self.attr(ino)?.kind != NodeKind::Directory {
            return Err(NodeError::NotADirectory(ino));
        }
        Ok(vec![
            DirEntry {
                ino: ROOT_INODE,
                kind: NodeKind::Directory,
                name: ".".to_string(),
            },
            DirEntry {
                ino: ROOT_INODE,
                kind: NodeKind::Directory,
                name: "..".to_string(),
            },
            DirEntry {
                ino: DEVICE_INODE,
                kind: NodeKind::RegularFile,
                name: self.config.device_name.clone(),
            },
        ])
    }

    /// Open `ino` and return a fresh handle
    pub fn open(&mut self, ino: u64) -> Result<u64> {
        self.attr(ino)?;
        self.next_handle += 1;
        log::debug!("vspidev: Opened inode {} as handle {}", ino, self.next_handle);
        Ok(self.next_handle)
    }

    /// Read up to `size` bytes of the banner starting at `offset`
    pub fn read(&mut self, ino: u64, offset: i64, size: u32) -> Result<&[u8]> {
        self.require_device(ino)?;
        let offset = usize::try_from(offset).map_err(|_| NodeError::InvalidOffset(offset))?;
        self.device.atime = SystemTime::now();

        let banner = self.config.banner.as_bytes();
        let start = offset.min(banner.len());
        let end = start.saturating_add(size as usize).min(banner.len());
        Ok(&banner[start..end])
    }

    /// Store `data` at `offset` and return the number of bytes accepted
    pub fn write(&mut self, ino: u64, offset: i64, data: &[u8]) -> Result<u32> {
        self.require_device(ino)?;
        let offset = usize::try_from(offset).map_err(|_| NodeError::InvalidOffset(offset))?;
        let end = offset
            .checked_add(data.len())
            .ok_or(NodeError::InvalidOffset(offset as i64))?;
        let end = self.capture_len(end as u64)?;

        if self.written.len() < end {
            self.written.resize(end, 0);
        }
        self.written[offset..end].copy_from_slice(data);

        let now = SystemTime::now();
        self.device.mtime = now;
        self.device.ctime = now;
        log::debug!("vspidev: Wrote {} bytes at offset {}", data.len(), offset);
        Ok(data.len() as u32)
    }

    /// Close a handle returned by [`open`](Self::open)
    pub fn release(&mut self, ino: u64, fh: u64) {
        log::debug!("vspidev: Released handle {} of inode {}", fh, ino);
    }

    /// Set extended attribute `name` on `ino`
    pub fn setxattr(&mut self, ino: u64, name: &str, value: &[u8]) -> Result<()> {
        self.attr(ino)?;
        self.xattrs
            .entry(ino)
            .or_default()
            .insert(name.to_string(), value.to_vec());
        Ok(())
    }

    /// Value of extended attribute `name` on `ino`
    pub fn getxattr(&self, ino: u64, name: &str) -> Result<&[u8]> {
        self.attr(ino)?;
        self.xattrs
            .get(&ino)
            .and_then(|attrs| attrs.get(name))
            .map(Vec::as_slice)
            .ok_or_else(|| NodeError::NoAttribute {
                ino,
                name: name.to_string(),
            })
    }

    /// NUL-separated attribute names of `ino`, as `listxattr(2)` returns them
    pub fn listxattr(&self, ino: u64) -> Result<Vec<u8>> {
        self.attr(ino)?;
        let mut names = Vec::new();
        if let Some(attrs) = self.xattrs.get(&ino) {
            for name in attrs.keys() {
                names.extend_from_slice(name.as_bytes());
                names.push(0);
            }
        }
        Ok(names)
    }

    /// Remove extended attribute `name` from `ino`
    pub fn removexattr(&mut self, ino: u64, name: &str) -> Result<()> {
        self.attr(ino)?;
        self.xattrs
            .get_mut(&ino)
            .and_then(|attrs| attrs.remove(name))
            .map(|_| ())
            .ok_or_else(|| NodeError::NoAttribute {
                ino,
                name: name.to_string(),
            })
    }

    /// Filesystem statistics
    pub fn statfs(&self) -> StatFs {
        StatFs {
            blocks: 4096,
            bfree: 2048,
            bavail: 2048,
            files: 2,
            ffree: 0,
            bsize: BLOCK_SIZE,
            namelen: 255,
            frsize: BLOCK_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node() -> DeviceNode {
        DeviceNode::new(NodeConfig::default())
    }

    #[test]
    fn test_getattr() {
        let node = node();
        let root = node.getattr(ROOT_INODE).unwrap();
        assert_eq!(root.kind, NodeKind::Directory);
        assert_eq!(root.perm, 0o755);
        assert_eq!(root.nlink, 2);

        let dev = node.getattr(DEVICE_INODE).unwrap();
        assert_eq!(dev.kind, NodeKind::RegularFile);
        assert_eq!(dev.perm, 0o444);
        assert_eq!(dev.size, 40);
        assert_eq!(dev.blocks(), 1);

        assert!(matches!(node.getattr(3), Err(NodeError::NotFound(_))));
    }

    #[test]
    fn test_lookup() {
        let node = node();
        assert_eq!(node.lookup(ROOT_INODE, "spidev0.0").unwrap().ino, DEVICE_INODE);
        assert!(matches!(
            node.lookup(ROOT_INODE, "spidev0.1"),
            Err(NodeError::NotFound(_))
        ));
        assert!(matches!(
            node.lookup(DEVICE_INODE, "x"),
            Err(NodeError::NotADirectory(DEVICE_INODE))
        ));
    }

    #[test]
    fn test_readdir() {
        let node = DeviceNode::new(NodeConfig::new("spidev3.1"));
        let names: Vec<_> = node
            .readdir(ROOT_INODE)
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, [".", "..", "spidev3.1"]);
        assert!(node.readdir(DEVICE_INODE).is_err());
    }

    #[test]
    fn test_open_returns_fresh_handles() {
        let mut node = node();
        let a = node.open(DEVICE_INODE).unwrap();
        let b = node.open(DEVICE_INODE).unwrap();
        assert_ne!(a, b);
        assert!(node.open(42).is_err());
    }

    #[test]
    fn test_read_serves_banner() {
        let mut node = node();
        assert_eq!(
            node.read(DEVICE_INODE, 0, 4096).unwrap(),
            b"Its an SPI device, dont read, use ioctl\n"
        );
        assert_eq!(node.read(DEVICE_INODE, 7, 3).unwrap(), b"SPI");
        assert!(node.read(DEVICE_INODE, 1000, 10).unwrap().is_empty());
        assert!(matches!(
            node.read(DEVICE_INODE, -1, 10),
            Err(NodeError::InvalidOffset(-1))
        ));
        assert!(matches!(
            node.read(ROOT_INODE, 0, 10),
            Err(NodeError::IsADirectory(ROOT_INODE))
        ));
    }

    #[test]
    fn test_write_is_kept_but_not_read_back() {
        let mut node = node();
        assert_eq!(node.write(DEVICE_INODE, 0, b"hello").unwrap(), 5);
        assert_eq!(node.write(DEVICE_INODE, 8, b"xy").unwrap(), 2);
        assert_eq!(node.written(), b"hello\0\0\0xy");
        assert_eq!(node.write(DEVICE_INODE, 1, b"EL").unwrap(), 2);
        assert_eq!(node.written(), b"hELlo\0\0\0xy");
        assert_eq!(node.read(DEVICE_INODE, 0, 3).unwrap(), b"Its");
    }

    #[test]
    fn test_setattr() {
        let mut node = node();
        node.write(DEVICE_INODE, 0, b"abcdef").unwrap();
        let attr = node
            .setattr(
                DEVICE_INODE,
                &SetAttr {
                    mode: Some(0o100_600),
                    uid: Some(1000),
                    size: Some(2),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(attr.perm, 0o600);
        assert_eq!(attr.kind, NodeKind::RegularFile);
        assert_eq!(attr.uid, 1000);
        assert_eq!(node.written(), b"ab");

        assert!(matches!(
            node.setattr(
                ROOT_INODE,
                &SetAttr {
                    size: Some(0),
                    ..Default::default()
                }
            ),
            Err(NodeError::IsADirectory(ROOT_INODE))
        ));
    }

    #[test]
    fn test_capture_limit() {
        let mut node = DeviceNode::new(NodeConfig::default().with_max_capture(16));
        assert_eq!(node.write(DEVICE_INODE, 10, b"abcdef").unwrap(), 6);
        assert!(matches!(
            node.write(DEVICE_INODE, 11, b"abcdef"),
            Err(NodeError::CaptureFull { requested: 17, limit: 16 })
        ));
        assert_eq!(node.written().len(), 16);

        let huge = SetAttr {
            size: Some(1 << 40),
            ..Default::default()
        };
        assert!(matches!(
            node.setattr(DEVICE_INODE, &huge),
            Err(NodeError::CaptureFull { .. })
        ));
        assert_eq!(node.written().len(), 16);
    }

    #[test]
    fn test_huge_offset_is_refused() {
        let mut node = node();
        let err = node.write(DEVICE_INODE, 1 << 36, b"x").unwrap_err();
        assert_eq!(err.errno(), libc::EFBIG);
        assert!(node.written().is_empty());

        let huge = SetAttr {
            size: Some(u64::MAX),
            ..Default::default()
        };
        assert_eq!(node.setattr(DEVICE_INODE, &huge).unwrap_err().errno(), libc::EFBIG);
        assert!(node.written().is_empty());
    }

    #[test]
    fn test_set_owner() {
        let mut node = node();
        node.set_owner(1000, 100);
        assert_eq!(node.getattr(ROOT_INODE).unwrap().uid, 1000);
        assert_eq!(node.getattr(DEVICE_INODE).unwrap().gid, 100);
    }

    #[test]
    fn test_xattrs() {
        let mut node = node();
        assert!(matches!(
            node.getxattr(DEVICE_INODE, "user.bus"),
            Err(NodeError::NoAttribute { .. })
        ));
        node.setxattr(DEVICE_INODE, "user.bus", b"0").unwrap();
        node.setxattr(DEVICE_INODE, "user.cs", b"1").unwrap();
        assert_eq!(node.getxattr(DEVICE_INODE, "user.bus").unwrap(), b"0");
        assert_eq!(node.listxattr(DEVICE_INODE).unwrap(), b"user.bus\0user.cs\0");
        assert!(node.listxattr(ROOT_INODE).unwrap().is_empty());

        node.removexattr(DEVICE_INODE, "user.bus").unwrap();
        assert!(node.removexattr(DEVICE_INODE, "user.bus").is_err());
        assert_eq!(node.listxattr(DEVICE_INODE).unwrap(), b"user.cs\0");
        assert!(node.setxattr(9, "user.x", b"").is_err());
    }

    #[test]
    fn test_statfs() {
        let stat = node().statfs();
        assert_eq!(stat.bsize, 512);
        assert_eq!(stat.blocks, 4096);
        assert_eq!(stat.bavail, 2048);
    }
}
