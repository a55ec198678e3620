use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::BLOCK_SIZE;

/// A block-addressed backing store for a mounted filesystem.
///
/// This is the "disk gateway" the filesystem mounts on top of: blocks are
/// read and written whole, by index, and the device reports how many
/// blocks it holds. `FileSystem` is generic over any `T: BlockDevice`, so
/// an in-memory device can back unit tests without touching the real
/// filesystem.
pub trait BlockDevice {
    /// Total number of fixed-size blocks the device holds.
    fn block_count(&self) -> io::Result<u16>;
    /// Reads the block at `index` into `buf`.
    fn read_block(&mut self, index: u16, buf: &mut [u8; BLOCK_SIZE]) -> io::Result<()>;
    /// Overwrites the block at `index` with `buf`.
    fn write_block(&mut self, index: u16, buf: &[u8; BLOCK_SIZE]) -> io::Result<()>;
}

/// A `BlockDevice` backed by a flat disk image file on the host filesystem.
pub struct FileBlockDevice {
    file: File,
    block_count: u16,
}

impl FileBlockDevice {
    /// Opens an existing disk image for reading and writing.
    ///
    /// Fails if the file's length is not a positive multiple of
    /// [`BLOCK_SIZE`] or exceeds what a `u16` block count can address.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Self::from_file(file)
    }

    fn from_file(file: File) -> io::Result<Self> {
        let len = file.metadata()?.len();
        if len == 0 || len % BLOCK_SIZE as u64 != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "disk image length is not a positive multiple of the block size",
            ));
        }
        let blocks = len / BLOCK_SIZE as u64;
        if blocks > u16::MAX as u64 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "disk image has more blocks than a u16 can address",
            ));
        }
        Ok(FileBlockDevice {
            file,
            block_count: blocks as u16,
        })
    }

    /// Creates a new disk image of `block_count` zeroed blocks, truncating
    /// any existing file at `path`.
    pub fn create<P: AsRef<Path>>(path: P, block_count: u16) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.set_len(block_count as u64 * BLOCK_SIZE as u64)?;
        Ok(FileBlockDevice { file, block_count })
    }

    fn seek_to(&mut self, index: u16) -> io::Result<()> {
        self.file
            .seek(SeekFrom::Start(index as u64 * BLOCK_SIZE as u64))?;
        Ok(())
    }
}

impl BlockDevice for FileBlockDevice {
    fn block_count(&self) -> io::Result<u16> {
        Ok(self.block_count)
    }

    fn read_block(&mut self, index: u16, buf: &mut [u8; BLOCK_SIZE]) -> io::Result<()> {
        self.seek_to(index)?;
        self.file.read_exact(buf)
    }

    fn write_block(&mut self, index: u16, buf: &[u8; BLOCK_SIZE]) -> io::Result<()> {
        self.seek_to(index)?;
        self.file.write_all(buf)
    }
}

/// A `BlockDevice` backed by an in-memory buffer, for tests and tooling.
pub struct MemBlockDevice {
    blocks: Vec<[u8; BLOCK_SIZE]>,
}

impl MemBlockDevice {
    /// Creates a device of `block_count` zeroed blocks.
    pub fn new(block_count: u16) -> Self {
        MemBlockDevice {
            blocks: vec![[0u8; BLOCK_SIZE]; block_count as usize],
        }
    }
}

impl BlockDevice for MemBlockDevice {
    fn block_count(&self) -> io::Result<u16> {
        Ok(self.blocks.len() as u16)
    }

    fn read_block(&mut self, index: u16, buf: &mut [u8; BLOCK_SIZE]) -> io::Result<()> {
        let block = self.blocks.get(index as usize).ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "block index out of range")
        })?;
        buf.copy_from_slice(block);
        Ok(())
    }

    fn write_block(&mut self, index: u16, buf: &[u8; BLOCK_SIZE]) -> io::Result<()> {
        let block = self.blocks.get_mut(index as usize).ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "block index out of range")
        })?;
        block.copy_from_slice(buf);
        Ok(())
    }
}
