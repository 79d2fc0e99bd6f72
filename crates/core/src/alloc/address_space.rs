//! Address space: an ordered partition of `[0, memory_size)` into blocks.
//!
//! The block vector is kept sorted by `start` and always covers the whole range with no
//! gaps and no overlaps. Only the allocation engine mutates it, through `place` (split on
//! allocation) and `release` (free and coalesce on deallocation).

use serde::{Deserialize, Serialize};

use crate::common::{BlockId, ProcessId};

/// Id carried by the single free block of a freshly reset address space.
pub const INITIAL_BLOCK: BlockId = BlockId(0);

/// Allocation state of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockStatus {
    /// Available for allocation.
    Free,
    /// Owned by a process.
    Allocated,
}

/// A contiguous run of address-space bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Unique block identifier.
    pub id: BlockId,
    /// First byte of the block.
    pub start: u64,
    /// Length in bytes (always positive).
    pub size: u64,
    /// Free or allocated.
    pub status: BlockStatus,
    /// Owning process; present iff the block is allocated.
    pub owner: Option<ProcessId>,
}

impl Block {
    /// Creates a free block.
    pub const fn free(id: BlockId, start: u64, size: u64) -> Self {
        Self {
            id,
            start,
            size,
            status: BlockStatus::Free,
            owner: None,
        }
    }

    /// One past the last byte of the block.
    #[inline]
    pub const fn end(&self) -> u64 {
        self.start + self.size
    }

    /// Returns `true` if the block is free.
    #[inline]
    pub const fn is_free(&self) -> bool {
        matches!(self.status, BlockStatus::Free)
    }

    /// Returns `true` if `addr` falls inside the block.
    #[inline]
    pub const fn contains(&self, addr: u64) -> bool {
        self.start <= addr && addr < self.end()
    }
}

/// Fragmentation figures for the current free-block layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FragmentationReport {
    /// Number of free blocks.
    pub free_blocks: usize,
    /// Total free bytes.
    pub free_bytes: u64,
    /// Size of the largest free block.
    pub largest_free: u64,
    /// Free blocks smaller than the usable threshold.
    pub fragment_count: usize,
    /// Bytes held in those fragments.
    pub fragment_bytes: u64,
    /// External fragmentation: `(1 - largest_free / free_bytes) * 100`, 0 with no free memory.
    pub external_pct: f64,
}

/// Index of the block containing `addr` in an address-ordered, contiguous block list.
///
/// `None` when `addr` lies past the last block.
pub fn index_containing(blocks: &[Block], addr: u64) -> Option<usize> {
    // The containing block is the last one starting at or before `addr`.
    let idx = blocks.partition_point(|b| b.start <= addr);
    idx.checked_sub(1).filter(|&i| blocks[i].contains(addr))
}

/// Ordered block partition of a fixed-size memory range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressSpace {
    memory_size: u64,
    blocks: Vec<Block>,
}

impl AddressSpace {
    /// Creates an address space holding one free block spanning all memory.
    pub fn new(memory_size: u64) -> Self {
        Self {
            memory_size,
            blocks: vec![Block::free(INITIAL_BLOCK, 0, memory_size)],
        }
    }

    /// Rebuilds an address space from a persisted block list.
    ///
    /// # Errors
    ///
    /// Returns a description of the first structural violation found.
    pub fn from_blocks(memory_size: u64, blocks: Vec<Block>) -> Result<Self, String> {
        let space = Self { memory_size, blocks };
        space.check_invariants()?;
        Ok(space)
    }

    /// Total size of the address space.
    #[inline]
    pub const fn memory_size(&self) -> u64 {
        self.memory_size
    }

    /// Blocks in address order.
    #[inline]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Index of the block with the given id.
    pub fn position(&self, id: BlockId) -> Option<usize> {
        self.blocks.iter().position(|b| b.id == id)
    }

    /// Allocates `size` bytes at the start of the free block at `index`.
    ///
    /// The allocated part takes `new_id`; any remainder stays free directly after it and
    /// keeps the id of the block it was cut from. Returns the allocated block.
    pub(crate) fn place(
        &mut self,
        index: usize,
        size: u64,
        owner: ProcessId,
        new_id: BlockId,
    ) -> Block {
        let chosen = &mut self.blocks[index];
        debug_assert!(chosen.is_free() && chosen.size >= size && size > 0);

        let remainder = (chosen.size > size)
            .then(|| Block::free(chosen.id, chosen.start + size, chosen.size - size));

        chosen.id = new_id;
        chosen.size = size;
        chosen.status = BlockStatus::Allocated;
        chosen.owner = Some(owner);
        let allocated = chosen.clone();

        if let Some(rest) = remainder {
            self.blocks.insert(index + 1, rest);
        }
        allocated
    }

    /// Frees the allocated block at `index` and coalesces it with free neighbours.
    ///
    /// Both sides are merged in the same call, so at most one free block results.
    /// Returns the index of the resulting free block.
    pub(crate) fn release(&mut self, index: usize) -> usize {
        let block = &mut self.blocks[index];
        block.status = BlockStatus::Free;
        block.owner = None;

        if index + 1 < self.blocks.len() && self.blocks[index + 1].is_free() {
            let next = self.blocks.remove(index + 1);
            self.blocks[index].size += next.size;
        }
        if index > 0 && self.blocks[index - 1].is_free() {
            let current = self.blocks.remove(index);
            self.blocks[index - 1].size += current.size;
            return index - 1;
        }
        index
    }

    /// Bytes currently allocated.
    pub fn allocated_bytes(&self) -> u64 {
        self.blocks
            .iter()
            .filter(|b| !b.is_free())
            .map(|b| b.size)
            .sum()
    }

    /// Computes the fragmentation report with the given usable-size threshold.
    pub fn fragmentation(&self, threshold: u64) -> FragmentationReport {
        let mut report = FragmentationReport::default();
        for block in self.blocks.iter().filter(|b| b.is_free()) {
            report.free_blocks += 1;
            report.free_bytes += block.size;
            report.largest_free = report.largest_free.max(block.size);
            if block.size < threshold {
                report.fragment_count += 1;
                report.fragment_bytes += block.size;
            }
        }
        if report.free_bytes > 0 {
            report.external_pct =
                (1.0 - report.largest_free as f64 / report.free_bytes as f64) * 100.0;
        }
        report
    }

    /// Verifies the partition invariants.
    ///
    /// Checks complete, ordered, non-overlapping coverage of `[0, memory_size)`, positive
    /// sizes, owner iff allocated, unique ids and no two adjacent free blocks.
    ///
    /// # Errors
    ///
    /// Returns a description of the first violation found.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.memory_size == 0 {
            return Err("memory size must be positive".into());
        }
        let mut expected_start = 0;
        let mut seen = std::collections::BTreeSet::new();
        let mut prev_free = false;
        for block in &self.blocks {
            if block.start != expected_start {
                return Err(format!(
                    "block {} starts at {} but the previous block ends at {}",
                    block.id, block.start, expected_start
                ));
            }
            if block.size == 0 {
                return Err(format!("block {} has zero size", block.id));
            }
            if !seen.insert(block.id) {
                return Err(format!("duplicate block id {}", block.id));
            }
            match (block.status, block.owner) {
                (BlockStatus::Free, Some(owner)) => {
                    return Err(format!("free block {} has owner {}", block.id, owner));
                }
                (BlockStatus::Allocated, None) => {
                    return Err(format!("allocated block {} has no owner", block.id));
                }
                _ => {}
            }
            if prev_free && block.is_free() {
                return Err(format!("block {} is free next to another free block", block.id));
            }
            prev_free = block.is_free();
            expected_start = block.end();
        }
        if expected_start != self.memory_size {
            return Err(format!(
                "blocks cover [0, {}) but memory size is {}",
                expected_start, self.memory_size
            ));
        }
        Ok(())
    }
}
