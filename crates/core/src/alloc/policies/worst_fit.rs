//! Worst-Fit Placement.
//!
//! Picks the largest free block, so the remainder of the split stays as large as possible.

use std::cmp::Reverse;

use super::{PlacementPolicy, candidates};
use crate::alloc::address_space::Block;

/// Worst-fit selection.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorstFit;

impl PlacementPolicy for WorstFit {
    /// Maximum `size` among fitting blocks; equal sizes resolve to the lowest `start`.
    fn select(&self, blocks: &[Block], request: u64, _cursor: u64) -> Option<usize> {
        candidates(blocks, request)
            .max_by_key(|(_, b)| (b.size, Reverse(b.start)))
            .map(|(i, _)| i)
    }
}
