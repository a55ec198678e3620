use crate::error::{Error, Result};
use crate::FS_OPEN_MAX_COUNT;

/// A per-handle cursor: the directory entry it was opened on, plus the
/// current byte offset. `lseek`/`read`/`write` re-resolve the offset into a
/// chain block on every call rather than caching the walk.
#[derive(Clone, Copy)]
pub(crate) struct OftSlot {
    pub dir_index: usize,
    pub offset: u32,
}

/// The bounded, 32-slot table of open file handles. Slot index doubles as
/// the file descriptor.
pub(crate) struct OpenFileTable {
    slots: [Option<OftSlot>; FS_OPEN_MAX_COUNT],
}

impl OpenFileTable {
    pub fn new() -> Self {
        OpenFileTable {
            slots: [None; FS_OPEN_MAX_COUNT],
        }
    }

    /// Opens a new handle on the directory entry at `dir_index`. Fails
    /// `TooManyOpen` if no slot is free.
    pub fn open(&mut self, dir_index: usize) -> Result<usize> {
        let fd = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(Error::TooManyOpen)?;
        self.slots[fd] = Some(OftSlot { dir_index, offset: 0 });
        trace!("opened fd {} for directory entry {}", fd, dir_index);
        Ok(fd)
    }

    pub fn close(&mut self, fd: usize) -> Result<()> {
        let slot = self.slots.get_mut(fd).ok_or(Error::BadFd)?;
        if slot.is_none() {
            return Err(Error::BadFd);
        }
        *slot = None;
        trace!("closed fd {}", fd);
        Ok(())
    }

    pub fn get(&self, fd: usize) -> Result<&OftSlot> {
        self.slots
            .get(fd)
            .and_then(Option::as_ref)
            .ok_or(Error::BadFd)
    }

    pub fn get_mut(&mut self, fd: usize) -> Result<&mut OftSlot> {
        self.slots
            .get_mut(fd)
            .and_then(Option::as_mut)
            .ok_or(Error::BadFd)
    }

    /// Whether any slot currently references `dir_index` (used by `delete`).
    pub fn is_busy(&self, dir_index: usize) -> bool {
        self.slots
            .iter()
            .flatten()
            .any(|slot| slot.dir_index == dir_index)
    }

    /// Invalidates every slot, as happens implicitly at `umount`.
    pub fn clear_all(&mut self) {
        self.slots = [None; FS_OPEN_MAX_COUNT];
    }

    pub fn any_open(&self) -> bool {
        self.slots.iter().any(Option::is_some)
    }
}
