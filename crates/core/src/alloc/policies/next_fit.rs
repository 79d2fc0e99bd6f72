//! Next-Fit Placement.
//!
//! First-fit that resumes where the previous next-fit allocation ended. The cursor is an
//! address, not a block index, so it stays meaningful across splits and merges.
//!
//! The scan starts at the block containing the cursor and visits every block exactly
//! once, wrapping past the end of memory back to address 0. A cursor equal to the memory
//! size is treated as 0.

use super::PlacementPolicy;
use crate::alloc::address_space::{Block, index_containing};

/// Next-fit selection.
#[derive(Debug, Clone, Copy, Default)]
pub struct NextFit;

impl PlacementPolicy for NextFit {
    fn select(&self, blocks: &[Block], request: u64, cursor: u64) -> Option<usize> {
        let n = blocks.len();
        let origin = index_containing(blocks, cursor).unwrap_or(0);

        (0..n)
            .map(|step| (origin + step) % n)
            .find(|&i| blocks[i].is_free() && blocks[i].size >= request)
    }
}
