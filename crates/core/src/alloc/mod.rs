//! Contiguous allocation engine.
//!
//! This module owns the address space and carries out allocation requests under one of
//! four placement policies. It provides:
//! 1. **Placement:** Policy selection through [`policies::placement`].
//! 2. **Splitting:** An allocated block of exactly the requested size plus a free remainder.
//! 3. **Coalescing:** Freed blocks merge with both free neighbours in one step.
//! 4. **Next-fit cursor:** The resume address carried between next-fit allocations.

/// Address space partition and block types.
pub mod address_space;

/// Placement policy implementations (first, best, worst, next fit).
pub mod policies;

use tracing::{debug, trace, warn};

use self::address_space::{AddressSpace, Block, FragmentationReport};
use crate::common::{AllocationFailure, BlockId, IdCounter, ProcessId, SimError, SimResult};
use crate::config::AllocationPolicy;

/// Allocation engine over a single address space.
#[derive(Debug, Clone)]
pub struct AllocationEngine {
    space: AddressSpace,
    policy: AllocationPolicy,
    next_fit_cursor: u64,
    block_ids: IdCounter,
}

impl AllocationEngine {
    /// Creates an engine with one free block spanning `memory_size` bytes.
    pub fn new(memory_size: u64, policy: AllocationPolicy) -> Self {
        Self {
            space: AddressSpace::new(memory_size),
            policy,
            next_fit_cursor: 0,
            block_ids: IdCounter::default(),
        }
    }

    /// Rebuilds an engine from persisted parts.
    ///
    /// `block_ids` must already be past every id present in `space`.
    pub(crate) const fn from_parts(
        space: AddressSpace,
        policy: AllocationPolicy,
        next_fit_cursor: u64,
        block_ids: IdCounter,
    ) -> Self {
        Self {
            space,
            policy,
            next_fit_cursor,
            block_ids,
        }
    }

    /// The address space being managed.
    #[inline]
    pub const fn space(&self) -> &AddressSpace {
        &self.space
    }

    /// Blocks in address order.
    #[inline]
    pub fn blocks(&self) -> &[Block] {
        self.space.blocks()
    }

    /// Current placement policy.
    #[inline]
    pub const fn policy(&self) -> AllocationPolicy {
        self.policy
    }

    /// Selects the placement policy used by [`Self::allocate_current`].
    pub fn set_policy(&mut self, policy: AllocationPolicy) {
        debug!(from = %self.policy, to = %policy, "placement policy changed");
        self.policy = policy;
    }

    /// Address the next next-fit scan starts from.
    #[inline]
    pub const fn next_fit_cursor(&self) -> u64 {
        self.next_fit_cursor
    }

    /// Id counter for the next allocated block.
    #[inline]
    pub const fn block_ids(&self) -> IdCounter {
        self.block_ids
    }

    /// Allocates `size` bytes for `owner` with an explicit policy.
    ///
    /// The cursor only moves on next-fit allocations.
    ///
    /// # Errors
    ///
    /// * `InvalidSize` - `size` is zero.
    /// * `AllocationFailed(ExceedsMemory)` - `size` is larger than the whole address space.
    /// * `AllocationFailed(NoSuitableBlock)` - no free block satisfies the policy.
    pub fn allocate(
        &mut self,
        size: u64,
        owner: ProcessId,
        policy: AllocationPolicy,
    ) -> SimResult<Block> {
        if size == 0 {
            warn!(process = %owner, "rejected zero-sized allocation");
            return Err(SimError::InvalidSize);
        }
        if size > self.space.memory_size() {
            warn!(process = %owner, size, memory = self.space.memory_size(), "request exceeds memory");
            return Err(SimError::AllocationFailed(AllocationFailure::ExceedsMemory));
        }

        let selected = policies::placement(policy).select(
            self.space.blocks(),
            size,
            self.next_fit_cursor,
        );
        let Some(index) = selected else {
            warn!(process = %owner, size, %policy, "no suitable free block");
            return Err(SimError::AllocationFailed(AllocationFailure::NoSuitableBlock));
        };
        trace!(%policy, index, size, "placement selected");

        let id = BlockId::new(self.block_ids.mint());
        let block = self.space.place(index, size, owner, id);
        if policy == AllocationPolicy::NextFit {
            self.next_fit_cursor = block.end() % self.space.memory_size();
        }

        debug!(block = %block.id, process = %owner, start = block.start, size, %policy, "allocated");
        Ok(block)
    }

    /// Allocates with the engine's current policy.
    ///
    /// # Errors
    ///
    /// Same as [`Self::allocate`].
    pub fn allocate_current(&mut self, size: u64, owner: ProcessId) -> SimResult<Block> {
        self.allocate(size, owner, self.policy)
    }

    /// Frees an allocated block and coalesces it with its free neighbours.
    ///
    /// Returns the block as it was before being freed.
    ///
    /// # Errors
    ///
    /// `InvalidBlock` if `id` is unknown or names a free block.
    pub fn deallocate(&mut self, id: BlockId) -> SimResult<Block> {
        let index = self
            .space
            .position(id)
            .filter(|&i| !self.space.blocks()[i].is_free())
            .ok_or_else(|| {
                warn!(block = %id, "deallocation target is not allocated");
                SimError::InvalidBlock(id)
            })?;

        let freed = self.space.blocks()[index].clone();
        let merged_at = self.space.release(index);
        let merged = &self.space.blocks()[merged_at];
        debug!(
            block = %id,
            merged = %merged.id,
            start = merged.start,
            size = merged.size,
            "deallocated"
        );
        Ok(freed)
    }

    /// Frees every block owned by `owner`.
    ///
    /// Returns the freed blocks in address order.
    ///
    /// # Errors
    ///
    /// `InvalidProcess` if `owner` holds no block.
    pub fn deallocate_process(&mut self, owner: ProcessId) -> SimResult<Vec<Block>> {
        let ids = self.blocks_of(owner);
        if ids.is_empty() {
            warn!(process = %owner, "process owns no blocks");
            return Err(SimError::InvalidProcess(owner));
        }
        ids.into_iter().map(|id| self.deallocate(id)).collect()
    }

    /// Ids of the blocks owned by `owner`, in address order.
    pub fn blocks_of(&self, owner: ProcessId) -> Vec<BlockId> {
        self.space
            .blocks()
            .iter()
            .filter(|b| b.owner == Some(owner))
            .map(|b| b.id)
            .collect()
    }

    /// Bytes currently allocated.
    pub fn allocated_bytes(&self) -> u64 {
        self.space.allocated_bytes()
    }

    /// Fragmentation report for the current layout.
    pub fn fragmentation(&self, threshold: u64) -> FragmentationReport {
        self.space.fragmentation(threshold)
    }

    /// Restores a single free block spanning memory and rewinds the cursor and id counter.
    pub fn reset(&mut self) {
        self.resize(self.space.memory_size());
    }

    /// Reinitialises the address space with a new size.
    pub fn resize(&mut self, memory_size: u64) {
        self.space = AddressSpace::new(memory_size);
        self.next_fit_cursor = 0;
        self.block_ids = IdCounter::default();
        debug!(memory_size, "address space reset");
    }
}
