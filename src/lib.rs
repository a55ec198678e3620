#![crate_type = "lib"]
#![crate_name = "ecs150fs"]

//! A simple FAT-style filesystem hosted inside a single flat disk image.
//!
//! Files are stored as singly-linked chains of fixed-size blocks, tracked by
//! a File Allocation Table, with a flat 128-entry root directory and a
//! bounded table of open file handles. The on-disk layout is based on the
//! classic FAT design (http://wiki.osdev.org/FAT) simplified to a single
//! fixed block size, a `u16` FAT, and no subdirectories.

#[macro_use]
extern crate log;

mod dir;
mod disk;
mod error;
mod fs;
mod oft;
mod superblock;
mod table;

pub use disk::{BlockDevice, FileBlockDevice, MemBlockDevice};
pub use dir::DirEntryInfo;
pub use error::{Error, Result};
pub use fs::{format, FileSystem, FileSystemInfo};

/// Size in bytes of a single block, the unit of disk I/O.
pub const BLOCK_SIZE: usize = 4096;
/// FAT cell value marking the end of a chain.
pub const FAT_EOC: u16 = 0xFFFF;
/// Maximum length of a filename, including the NUL terminator.
pub const FS_FILENAME_LEN: usize = 16;
/// Number of entries in the root directory.
pub const FS_FILE_MAX_COUNT: usize = 128;
/// Number of simultaneously open file handles.
pub const FS_OPEN_MAX_COUNT: usize = 32;

pub(crate) const SIGNATURE: &[u8; 8] = b"ECS150FS";
