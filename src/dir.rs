use crate::error::{Error, Result};
use crate::{FAT_EOC, FS_FILENAME_LEN, FS_FILE_MAX_COUNT};

const ENTRY_SIZE: usize = 32;

/// One 32-byte slot of the root directory. `filename[0] == 0` means empty.
#[derive(Clone, Copy)]
pub(crate) struct DirEntry {
    pub filename: [u8; FS_FILENAME_LEN],
    pub file_size: u32,
    pub first_data_block: u16,
}

impl DirEntry {
    fn empty() -> Self {
        DirEntry {
            filename: [0u8; FS_FILENAME_LEN],
            file_size: 0,
            first_data_block: FAT_EOC,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.filename[0] == 0
    }

    fn name_matches(&self, name: &[u8; FS_FILENAME_LEN]) -> bool {
        self.filename == *name
    }

    fn serialize(&self, buf: &mut [u8]) {
        buf[0..FS_FILENAME_LEN].copy_from_slice(&self.filename);
        let off = FS_FILENAME_LEN;
        buf[off..off + 4].copy_from_slice(&self.file_size.to_le_bytes());
        buf[off + 4..off + 6].copy_from_slice(&self.first_data_block.to_le_bytes());
        // remaining 10 bytes stay zero padding.
    }

    fn deserialize(buf: &[u8]) -> Self {
        let mut filename = [0u8; FS_FILENAME_LEN];
        filename.copy_from_slice(&buf[0..FS_FILENAME_LEN]);
        let off = FS_FILENAME_LEN;
        let file_size = u32::from_le_bytes([buf[off], buf[off + 1], buf[off + 2], buf[off + 3]]);
        let first_data_block = u16::from_le_bytes([buf[off + 4], buf[off + 5]]);
        DirEntry {
            filename,
            file_size,
            first_data_block,
        }
    }
}

/// A name, or contents that survive a round of `ls`/`stat` formatting.
#[derive(Debug, Clone)]
pub struct DirEntryInfo {
    /// The filename, with the terminating NUL and any trailing padding stripped.
    pub name: String,
    /// Byte length of the file.
    pub size: u32,
    /// First data-block index of the file's chain, or `FAT_EOC` if empty.
    pub first_data_block: u16,
}

/// The flat, fixed 128-entry root directory.
pub(crate) struct RootDir {
    entries: [DirEntry; FS_FILE_MAX_COUNT],
}

impl RootDir {
    pub fn new() -> Self {
        RootDir {
            entries: [DirEntry::empty(); FS_FILE_MAX_COUNT],
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = vec![0u8; FS_FILE_MAX_COUNT * ENTRY_SIZE];
        for (i, entry) in self.entries.iter().enumerate() {
            entry.serialize(&mut buf[i * ENTRY_SIZE..(i + 1) * ENTRY_SIZE]);
        }
        buf
    }

    pub fn deserialize(buf: &[u8]) -> Self {
        let mut entries = [DirEntry::empty(); FS_FILE_MAX_COUNT];
        for (i, entry) in entries.iter_mut().enumerate() {
            *entry = DirEntry::deserialize(&buf[i * ENTRY_SIZE..(i + 1) * ENTRY_SIZE]);
        }
        RootDir { entries }
    }

    /// Encodes `name` as a NUL-terminated, zero-padded `FS_FILENAME_LEN` array.
    /// Fails `BadName` if `name` is empty or does not strictly fit with its
    /// terminator.
    pub(crate) fn encode_name(name: &str) -> Result<[u8; FS_FILENAME_LEN]> {
        let bytes = name.as_bytes();
        if bytes.is_empty() || bytes.len() >= FS_FILENAME_LEN {
            return Err(Error::BadName);
        }
        let mut out = [0u8; FS_FILENAME_LEN];
        out[..bytes.len()].copy_from_slice(bytes);
        Ok(out)
    }

    pub(crate) fn find_index(&self, name: &[u8; FS_FILENAME_LEN]) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| !e.is_empty() && e.name_matches(name))
    }

    pub(crate) fn entry(&self, index: usize) -> &DirEntry {
        &self.entries[index]
    }

    pub(crate) fn entry_mut(&mut self, index: usize) -> &mut DirEntry {
        &mut self.entries[index]
    }

    /// Allocates the first empty slot for `name`. Fails `Exists` if `name`
    /// is already present, `DirFull` if no slot is free.
    pub(crate) fn create(&mut self, name: &[u8; FS_FILENAME_LEN]) -> Result<usize> {
        if self.find_index(name).is_some() {
            return Err(Error::Exists);
        }
        let index = self
            .entries
            .iter()
            .position(DirEntry::is_empty)
            .ok_or(Error::DirFull)?;
        self.entries[index] = DirEntry {
            filename: *name,
            file_size: 0,
            first_data_block: FAT_EOC,
        };
        debug!("created directory entry {} at slot {}", name_display(name), index);
        Ok(index)
    }

    pub(crate) fn clear(&mut self, index: usize) {
        self.entries[index] = DirEntry::empty();
    }

    /// All occupied entries in physical slot order, for `ls`.
    pub fn list(&self) -> Vec<DirEntryInfo> {
        self.entries
            .iter()
            .filter(|e| !e.is_empty())
            .map(|e| DirEntryInfo {
                name: name_display(&e.filename),
                size: e.file_size,
                first_data_block: e.first_data_block,
            })
            .collect()
    }
}

fn name_display(filename: &[u8; FS_FILENAME_LEN]) -> String {
    let end = filename.iter().position(|&b| b == 0).unwrap_or(filename.len());
    String::from_utf8_lossy(&filename[..end]).into_owned()
}
