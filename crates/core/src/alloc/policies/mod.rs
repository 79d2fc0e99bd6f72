//! Placement Policies.
//!
//! Each policy is one pure selection function over the current block list: given the
//! blocks in address order and a request size, it returns the index of the free block to
//! allocate from, or `None` when nothing fits. Splitting and cursor bookkeeping are left to
//! the allocation engine.
//!
//! # Policies
//!
//! - `FirstFit`: lowest-addressed block that fits.
//! - `BestFit`: smallest block that fits, lowest address on ties.
//! - `WorstFit`: largest block that fits, lowest address on ties.
//! - `NextFit`: first block that fits, scanning from a cursor and wrapping.

/// Best-fit placement.
pub mod best_fit;

/// First-fit placement.
pub mod first_fit;

/// Next-fit placement.
pub mod next_fit;

/// Worst-fit placement.
pub mod worst_fit;

pub use best_fit::BestFit;
pub use first_fit::FirstFit;
pub use next_fit::NextFit;
pub use worst_fit::WorstFit;

use super::address_space::Block;
use crate::config::AllocationPolicy;

/// Trait for contiguous placement policies.
pub trait PlacementPolicy {
    /// Selects the block to carve a `request`-byte allocation from.
    ///
    /// # Arguments
    ///
    /// * `blocks` - Every block in address order (free and allocated).
    /// * `request` - Requested size in bytes; always positive.
    /// * `cursor` - Next-fit resume address. Ignored by the other policies.
    ///
    /// # Returns
    ///
    /// The index into `blocks` of a free block with `size >= request`.
    fn select(&self, blocks: &[Block], request: u64, cursor: u64) -> Option<usize>;
}

/// Returns the selection function for a configured policy.
pub fn placement(policy: AllocationPolicy) -> &'static dyn PlacementPolicy {
    match policy {
        AllocationPolicy::FirstFit => &FirstFit,
        AllocationPolicy::BestFit => &BestFit,
        AllocationPolicy::WorstFit => &WorstFit,
        AllocationPolicy::NextFit => &NextFit,
    }
}

/// Free blocks large enough for `request`, with their indices, in address order.
fn candidates(blocks: &[Block], request: u64) -> impl Iterator<Item = (usize, &Block)> {
    blocks
        .iter()
        .enumerate()
        .filter(move |(_, b)| b.is_free() && b.size >= request)
}
