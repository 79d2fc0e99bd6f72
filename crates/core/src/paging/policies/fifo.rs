//! First-In, First-Out (FIFO) Replacement Policy.
//!
//! Evicts the page loaded longest ago across all processes. Hits do not reorder pages,
//! so a heavily used page is evicted as soon as it becomes the oldest load.
//!
//! # Performance
//!
//! - **Time Complexity:** `select_victim()`: O(R) over the resident set
//! - **Best Case:** Streaming accesses where all pages have equal importance
//! - **Worst Case:** Workloads with strong temporal locality (Belady's anomaly applies)

use super::{ReplacementPolicy, ResidentPage};

/// FIFO policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct FifoPolicy;

impl ReplacementPolicy for FifoPolicy {
    /// Returns the page with the smallest `loaded_tick`.
    fn select_victim(&self, resident: &[ResidentPage]) -> usize {
        resident
            .iter()
            .enumerate()
            .min_by_key(|(_, p)| p.loaded_tick)
            .map_or(0, |(i, _)| i)
    }
}
