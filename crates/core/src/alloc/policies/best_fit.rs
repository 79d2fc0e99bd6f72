//! Best-Fit Placement.
//!
//! Picks the smallest free block that can hold the request, which keeps large blocks
//! intact at the cost of leaving small remainders behind.

use super::{PlacementPolicy, candidates};
use crate::alloc::address_space::Block;

/// Best-fit selection.
#[derive(Debug, Clone, Copy, Default)]
pub struct BestFit;

impl PlacementPolicy for BestFit {
    /// Minimum `size` among fitting blocks; equal sizes resolve to the lowest `start`.
    fn select(&self, blocks: &[Block], request: u64, _cursor: u64) -> Option<usize> {
        candidates(blocks, request)
            .min_by_key(|(_, b)| (b.size, b.start))
            .map(|(i, _)| i)
    }
}
