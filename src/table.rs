use crate::error::{Error, Result};
use crate::{BLOCK_SIZE, FAT_EOC};

/// In-memory File Allocation Table: one `u16` cell per data block.
///
/// Cell 0 is reserved and always holds `FAT_EOC`; it is never allocated to
/// a file. A cell holding `0` is free, `FAT_EOC` terminates a chain, and any
/// other value is the data-block index of the next cell in the chain.
pub(crate) struct Fat {
    cells: Vec<u16>,
}

impl Fat {
    pub fn new(data_block_count: u16) -> Self {
        let mut cells = vec![0u16; data_block_count as usize];
        cells[0] = FAT_EOC;
        Fat { cells }
    }

    /// Rebuilds a `Fat` from the padded byte image of `fat_block_count` blocks.
    pub fn deserialize(bytes: &[u8], data_block_count: u16) -> Self {
        let mut cells = Vec::with_capacity(data_block_count as usize);
        for i in 0..data_block_count as usize {
            let off = i * 2;
            cells.push(u16::from_le_bytes([bytes[off], bytes[off + 1]]));
        }
        if cells[0] != FAT_EOC {
            warn!("FAT cell 0 was {}, correcting to FAT_EOC", cells[0]);
            cells[0] = FAT_EOC;
        }
        Fat { cells }
    }

    /// Serializes the table into `fat_block_count` blocks worth of bytes,
    /// zero-padded past the last cell.
    pub fn serialize(&self, fat_block_count: u8) -> Vec<u8> {
        let mut bytes = vec![0u8; fat_block_count as usize * BLOCK_SIZE];
        for (i, cell) in self.cells.iter().enumerate() {
            let off = i * 2;
            bytes[off..off + 2].copy_from_slice(&cell.to_le_bytes());
        }
        bytes
    }

    fn get(&self, index: u16) -> u16 {
        self.cells[index as usize]
    }

    /// Number of cells currently holding `0`, i.e. unallocated (cell 0 excluded).
    pub fn count_free(&self) -> u16 {
        self.cells.iter().skip(1).filter(|&&c| c == 0).count() as u16
    }

    /// Finds the first free cell (scanning from index 1), marks it `FAT_EOC`
    /// and returns its index.
    pub fn allocate_one(&mut self) -> Result<u16> {
        for i in 1..self.cells.len() {
            if self.cells[i] == 0 {
                self.cells[i] = FAT_EOC;
                trace!("allocated data block {}", i);
                return Ok(i as u16);
            }
        }
        Err(Error::Full)
    }

    /// Extends the chain whose current tail is `tail` (which must hold
    /// `FAT_EOC`) by one cell. Does not mutate `tail` if allocation fails.
    pub fn extend_chain(&mut self, tail: u16) -> Result<u16> {
        let new = self.allocate_one()?;
        self.cells[tail as usize] = new;
        trace!("extended chain: {} -> {}", tail, new);
        Ok(new)
    }

    /// Walks `n` steps from `head`. Returns the n-th cell, or `None` if the
    /// chain ends (`FAT_EOC`) before `n` steps complete. Never follows cell 0.
    pub fn chain_walk(&self, head: u16, n: u32) -> Option<u16> {
        let mut cur = head;
        for _ in 0..n {
            if cur == FAT_EOC {
                return None;
            }
            cur = self.get(cur);
        }
        if cur == FAT_EOC {
            None
        } else {
            Some(cur)
        }
    }

    /// Frees every cell in the chain starting at `head`, including the
    /// terminating `FAT_EOC` cell.
    pub fn chain_free(&mut self, head: u16) {
        let mut cur = head;
        while cur != FAT_EOC {
            let next = self.get(cur);
            self.cells[cur as usize] = 0;
            cur = next;
        }
    }

    /// Resolves a byte offset within a chain starting at `head` (whose file
    /// has size `file_size`) to `(block_id, intra_block_offset, blocks_skipped)`.
    ///
    /// At `offset == file_size` and `file_size` a multiple of `BLOCK_SIZE`
    /// (including the empty-file case `file_size == 0`), the resolver yields
    /// the last block of the chain with `intra == BLOCK_SIZE` (or, for an
    /// empty file, `(FAT_EOC, 0, 0)`), representing "the cell that would be
    /// appended next" without a separate pending-allocation flag.
    pub fn resolve(&self, head: u16, offset: u32) -> (u16, usize, u32) {
        if head == FAT_EOC {
            return (FAT_EOC, 0, 0);
        }
        let block_hops = offset / BLOCK_SIZE as u32;
        let intra = (offset % BLOCK_SIZE as u32) as usize;
        match self.chain_walk(head, block_hops) {
            Some(block) => (block, intra, block_hops),
            // offset == file_size and file_size is an exact multiple of
            // BLOCK_SIZE: the chain has no (block_hops)-th cell, so we
            // represent "the cell that would be appended next" as the last
            // existing block with intra == BLOCK_SIZE.
            None => {
                let last = self
                    .chain_walk(head, block_hops - 1)
                    .expect("offset within file_size implies this hop exists");
                (last, BLOCK_SIZE, block_hops - 1)
            }
        }
    }
}
