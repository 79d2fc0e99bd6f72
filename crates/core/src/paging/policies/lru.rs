//! Least Recently Used (LRU) Replacement Policy.
//!
//! Evicts the resident page whose last access is the oldest. Every hit and every load
//! stamps the page with the current tick, and ticks are unique per event, so the victim
//! is always well defined.
//!
//! # Performance
//!
//! - **Time Complexity:** `select_victim()`: O(R) over the resident set
//! - **Best Case:** Accesses with good temporal locality
//! - **Worst Case:** Cyclic scans larger than the frame pool (thrashing)

use super::{ReplacementPolicy, ResidentPage};

/// LRU policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct LruPolicy;

impl ReplacementPolicy for LruPolicy {
    fn select_victim(&self, resident: &[ResidentPage]) -> usize {
        resident
            .iter()
            .enumerate()
            .min_by_key(|(_, p)| p.last_access_tick)
            .map_or(0, |(i, _)| i)
    }
}
