use std::fmt;

use crate::dir::{DirEntryInfo, RootDir};
use crate::disk::BlockDevice;
use crate::error::{Error, Result};
use crate::oft::OpenFileTable;
use crate::superblock::SuperBlock;
use crate::table::Fat;
use crate::{BLOCK_SIZE, FAT_EOC, FS_FILE_MAX_COUNT};

/// A mounted ECS150FS volume.
///
/// `FileSystem` is generic over any [`BlockDevice`], so an in-memory device
/// can back unit tests without touching a real disk image. Every mutation
/// stays in memory until [`FileSystem::umount`] flushes the FAT, root
/// directory, and superblock back to the device in that order.
pub struct FileSystem<T: BlockDevice> {
    // `None` only during the brief window inside `umount`, after ownership
    // of the device has already been handed back to the caller; `Drop`
    // treats that as "already flushed, nothing to do".
    device: Option<T>,
    sb: SuperBlock,
    fat: Fat,
    root: RootDir,
    oft: OpenFileTable,
}

/// A snapshot of volume geometry and free-space ratios, formatted exactly
/// as the textual `info` report.
#[derive(Debug, Clone, Copy)]
pub struct FileSystemInfo {
    pub total_block_count: u16,
    pub fat_block_count: u8,
    pub root_dir_block: u16,
    pub data_block_start: u16,
    pub data_block_count: u16,
    pub fat_free_count: u16,
    pub root_dir_free_count: u16,
}

impl fmt::Display for FileSystemInfo {
    /// Renders the exact `FS Info:` line-oriented report.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "FS Info:")?;
        writeln!(f, "total_blk_count={}", self.total_block_count)?;
        writeln!(f, "fat_blk_count={}", self.fat_block_count)?;
        writeln!(f, "rdir_blk={}", self.root_dir_block)?;
        writeln!(f, "data_blk={}", self.data_block_start)?;
        writeln!(f, "data_blk_count={}", self.data_block_count)?;
        writeln!(
            f,
            "fat_free_ratio={}/{}",
            self.fat_free_count, self.data_block_count
        )?;
        write!(f, "rdir_free_ratio={}/128", self.root_dir_free_count)
    }
}

impl<T: BlockDevice> FileSystem<T> {
    /// Opens the backing device, validates the superblock, and loads the
    /// FAT and root directory into memory.
    pub fn mount(mut device: T) -> Result<Self> {
        let mut block0 = [0u8; BLOCK_SIZE];
        device.read_block(0, &mut block0).map_err(|_| Error::BadDisk)?;
        let sb = SuperBlock::deserialize(&block0)?;

        let disk_block_count = device.block_count().map_err(|_| Error::BadDisk)?;
        if sb.total_blocks != disk_block_count {
            return Err(Error::BadGeometry);
        }

        let mut fat_bytes = vec![0u8; sb.fat_block_count as usize * BLOCK_SIZE];
        for i in 0..sb.fat_block_count as u16 {
            let mut block = [0u8; BLOCK_SIZE];
            device.read_block(1 + i, &mut block).map_err(|_| Error::BadDisk)?;
            let start = i as usize * BLOCK_SIZE;
            fat_bytes[start..start + BLOCK_SIZE].copy_from_slice(&block);
        }
        let fat = Fat::deserialize(&fat_bytes, sb.data_block_count);

        let mut root_block = [0u8; BLOCK_SIZE];
        device
            .read_block(sb.root_dir_block, &mut root_block)
            .map_err(|_| Error::BadDisk)?;
        let root = RootDir::deserialize(&root_block);

        info!(
            "mounted volume: {} data blocks, {} free",
            sb.data_block_count,
            fat.count_free()
        );

        Ok(FileSystem {
            device: Some(device),
            sb,
            fat,
            root,
            oft: OpenFileTable::new(),
        })
    }

    fn device_mut(&mut self) -> &mut T {
        self.device.as_mut().expect("device is only None after umount consumes self")
    }

    /// Flushes the FAT, root directory, and superblock back to the device,
    /// in that order, and hands ownership of the device back to the caller.
    ///
    /// Any still-open descriptors are implicitly invalidated; this does not
    /// fail on busy handles (see design notes on the source's disagreement
    /// here).
    pub fn umount(mut self) -> Result<T> {
        if self.oft.any_open() {
            warn!("unmounting with open file descriptors still held");
        }
        self.flush()?;
        self.oft.clear_all();
        info!("unmounted volume");
        Ok(self.device.take().expect("device present until umount"))
    }

    fn flush(&mut self) -> Result<()> {
        let fat_bytes = self.fat.serialize(self.sb.fat_block_count);
        let sb_bytes = self.sb.serialize();
        let root_bytes = self.root.serialize();
        let fat_block_count = self.sb.fat_block_count;
        let root_dir_block = self.sb.root_dir_block;

        let device = self.device_mut();
        for i in 0..fat_block_count as u16 {
            let start = i as usize * BLOCK_SIZE;
            let mut block = [0u8; BLOCK_SIZE];
            block.copy_from_slice(&fat_bytes[start..start + BLOCK_SIZE]);
            device.write_block(1 + i, &block)?;
        }

        let mut root_block = [0u8; BLOCK_SIZE];
        root_block.copy_from_slice(&root_bytes);
        device.write_block(root_dir_block, &root_block)?;

        device.write_block(0, &sb_bytes)?;
        Ok(())
    }

    /// Volume geometry and free-space ratios.
    pub fn info(&self) -> FileSystemInfo {
        let root_dir_free_count = (FS_FILE_MAX_COUNT - self.root.list().len()) as u16;
        FileSystemInfo {
            total_block_count: self.sb.total_blocks,
            fat_block_count: self.sb.fat_block_count,
            root_dir_block: self.sb.root_dir_block,
            data_block_start: self.sb.data_block_start,
            data_block_count: self.sb.data_block_count,
            fat_free_count: self.fat.count_free(),
            root_dir_free_count,
        }
    }

    /// Creates a new, empty file named `name`.
    pub fn create(&mut self, name: &str) -> Result<()> {
        let encoded = RootDir::encode_name(name)?;
        self.root.create(&encoded)?;
        Ok(())
    }

    /// Deletes the file named `name` and frees its chain.
    pub fn delete(&mut self, name: &str) -> Result<()> {
        let encoded = RootDir::encode_name(name)?;
        let index = self.root.find_index(&encoded).ok_or(Error::NotFound)?;
        if self.oft.is_busy(index) {
            return Err(Error::Busy);
        }
        let head = self.root.entry(index).first_data_block;
        if head != FAT_EOC {
            self.fat.chain_free(head);
        }
        self.root.clear(index);
        debug!("deleted {}", name);
        Ok(())
    }

    /// Non-empty root-directory entries in physical slot order.
    pub fn ls(&self) -> Vec<DirEntryInfo> {
        self.root.list()
    }

    /// Renders the exact `FS Ls:` line-oriented report.
    pub fn ls_report(&self) -> String {
        let mut out = String::from("FS Ls:\n");
        for entry in self.ls() {
            out.push_str(&format!(
                "file: {}, size: {}, data_blk: {}\n",
                entry.name, entry.size, entry.first_data_block
            ));
        }
        out
    }

    /// Opens `name` and returns a file descriptor.
    pub fn open(&mut self, name: &str) -> Result<usize> {
        let encoded = RootDir::encode_name(name)?;
        let index = self.root.find_index(&encoded).ok_or(Error::NotFound)?;
        self.oft.open(index)
    }

    /// Closes `fd`.
    pub fn close(&mut self, fd: usize) -> Result<()> {
        self.oft.close(fd)
    }

    /// Returns the byte size of the file open on `fd`.
    pub fn stat(&self, fd: usize) -> Result<u32> {
        let slot = self.oft.get(fd)?;
        Ok(self.root.entry(slot.dir_index).file_size)
    }

    /// Repositions the cursor for `fd` to byte offset `offset`.
    ///
    /// Fails `BadOffset` unless `0 <= offset <= file_size`.
    pub fn lseek(&mut self, fd: usize, offset: u32) -> Result<()> {
        let dir_index = self.oft.get(fd)?.dir_index;
        let file_size = self.root.entry(dir_index).file_size;
        if offset > file_size {
            return Err(Error::BadOffset);
        }
        self.oft.get_mut(fd)?.offset = offset;
        Ok(())
    }

    /// Reads up to `buf.len()` bytes from `fd` at its current cursor,
    /// returning the number of bytes actually read. A read entirely past
    /// EOF returns `0`, never an error.
    pub fn read(&mut self, fd: usize, buf: &mut [u8]) -> Result<usize> {
        let slot = *self.oft.get(fd)?;
        let dir_index = slot.dir_index;
        let file_size = self.root.entry(dir_index).file_size;

        let mut remaining = (file_size.saturating_sub(slot.offset) as usize).min(buf.len());
        if remaining == 0 {
            return Ok(0);
        }

        let head = self.root.entry(dir_index).first_data_block;
        let (mut block, mut intra, _) = self.fat.resolve(head, slot.offset);
        let data_block_start = self.sb.data_block_start;

        let mut out_pos = 0usize;
        let mut offset = slot.offset;
        while remaining > 0 && block != FAT_EOC {
            let mut scratch = [0u8; BLOCK_SIZE];
            self.device_mut().read_block(data_block_start + block, &mut scratch)?;

            let n = (BLOCK_SIZE - intra).min(remaining);
            buf[out_pos..out_pos + n].copy_from_slice(&scratch[intra..intra + n]);

            out_pos += n;
            offset += n as u32;
            remaining -= n;
            intra += n;

            if intra == BLOCK_SIZE {
                block = self.fat.chain_walk(block, 1).unwrap_or(FAT_EOC);
                intra = 0;
            }
        }

        self.oft.get_mut(fd)?.offset = offset;
        Ok(out_pos)
    }

    /// Writes `buf` to `fd` at its current cursor, returning the number of
    /// bytes actually persisted. Short writes occur only when the FAT runs
    /// out of free cells; they are not errors.
    pub fn write(&mut self, fd: usize, buf: &[u8]) -> Result<usize> {
        let slot = *self.oft.get(fd)?;
        let dir_index = slot.dir_index;

        let head = self.root.entry(dir_index).first_data_block;
        let (mut block, mut intra) = if head == FAT_EOC {
            let new_block = match self.fat.allocate_one() {
                Ok(b) => b,
                Err(Error::Full) => return Ok(0),
                Err(e) => return Err(e),
            };
            self.root.entry_mut(dir_index).first_data_block = new_block;
            (new_block, 0usize)
        } else {
            let (block, intra, _) = self.fat.resolve(head, slot.offset);
            (block, intra)
        };

        let data_block_start = self.sb.data_block_start;
        let mut remaining = buf.len();
        let mut in_pos = 0usize;
        let mut offset = slot.offset;
        let mut file_size = self.root.entry(dir_index).file_size;

        while remaining > 0 {
            // The cursor may have been resolved sitting exactly at the end
            // of an already-full block (intra == BLOCK_SIZE); advance into
            // the next block before doing any more read-modify-write.
            if intra == BLOCK_SIZE {
                match self.fat.chain_walk(block, 1) {
                    Some(next_block) => {
                        block = next_block;
                        intra = 0;
                    }
                    None => match self.fat.extend_chain(block) {
                        Ok(next_block) => {
                            block = next_block;
                            intra = 0;
                        }
                        Err(Error::Full) => break,
                        Err(e) => return Err(e),
                    },
                }
            }

            let k = (BLOCK_SIZE - intra).min(remaining);

            let mut scratch = [0u8; BLOCK_SIZE];
            self.device_mut().read_block(data_block_start + block, &mut scratch)?;
            scratch[intra..intra + k].copy_from_slice(&buf[in_pos..in_pos + k]);
            self.device_mut().write_block(data_block_start + block, &scratch)?;

            in_pos += k;
            offset += k as u32;
            remaining -= k;
            if offset > file_size {
                file_size = offset;
                self.root.entry_mut(dir_index).file_size = file_size;
            }

            intra += k;
        }

        self.oft.get_mut(fd)?.offset = offset;
        Ok(in_pos)
    }
}

impl<T: BlockDevice> Drop for FileSystem<T> {
    fn drop(&mut self) {
        if self.device.is_none() {
            return;
        }
        if let Err(err) = self.flush() {
            error!("flush on drop failed: {}", err);
        }
    }
}

/// Formats `device` as a fresh, empty volume with `data_block_count` data
/// blocks: zeroes the root directory, initializes the FAT (cell 0 set to
/// `FAT_EOC`, every other cell free), and writes the superblock.
pub fn format<T: BlockDevice>(device: &mut T, data_block_count: u16) -> Result<()> {
    let sb = SuperBlock::for_data_block_count(data_block_count);
    let disk_block_count = device.block_count().map_err(|_| Error::BadDisk)?;
    if sb.total_blocks != disk_block_count {
        return Err(Error::BadGeometry);
    }

    let fat = Fat::new(data_block_count);
    let fat_bytes = fat.serialize(sb.fat_block_count);
    for i in 0..sb.fat_block_count as u16 {
        let start = i as usize * BLOCK_SIZE;
        let mut block = [0u8; BLOCK_SIZE];
        block.copy_from_slice(&fat_bytes[start..start + BLOCK_SIZE]);
        device.write_block(1 + i, &block)?;
    }

    let root = RootDir::new();
    let root_bytes = root.serialize();
    let mut root_block = [0u8; BLOCK_SIZE];
    root_block.copy_from_slice(&root_bytes);
    device.write_block(sb.root_dir_block, &root_block)?;

    device.write_block(0, &sb.serialize())?;
    Ok(())
}
