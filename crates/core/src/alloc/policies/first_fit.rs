//! First-Fit Placement.
//!
//! Scans from address 0 and takes the first free block large enough for the request.

use super::{PlacementPolicy, candidates};
use crate::alloc::address_space::Block;

/// First-fit selection.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstFit;

impl PlacementPolicy for FirstFit {
    fn select(&self, blocks: &[Block], request: u64, _cursor: u64) -> Option<usize> {
        candidates(blocks, request).map(|(i, _)| i).next()
    }
}
