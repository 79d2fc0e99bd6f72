//! Page Replacement Policies.
//!
//! Selects the resident page to evict when a fault finds every frame occupied. Both
//! policies are pure functions of the resident set, ordered by the simulation clock.
//!
//! # Policies
//!
//! - `Fifo`: First-In, First-Out, system-wide load order.
//! - `Lru`: Least Recently Used.

/// First-In, First-Out replacement policy.
pub mod fifo;

/// Least Recently Used replacement policy.
pub mod lru;

pub use fifo::FifoPolicy;
pub use lru::LruPolicy;

use crate::common::{FrameId, ProcessId, Tick};
use crate::paging::frame_table::PageRef;

/// A page that currently occupies a frame, as seen by a replacement policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResidentPage {
    /// Owning process.
    pub process: ProcessId,
    /// Virtual page number.
    pub page: u64,
    /// Frame holding the page.
    pub frame: FrameId,
    /// Tick at which the page was loaded.
    pub loaded_tick: Tick,
    /// Tick of the page's latest access.
    pub last_access_tick: Tick,
}

impl ResidentPage {
    /// The `(process, page)` pair.
    pub const fn page_ref(&self) -> PageRef {
        PageRef::new(self.process, self.page)
    }
}

/// Trait for page replacement policies.
pub trait ReplacementPolicy: Send + Sync {
    /// Selects the page to evict.
    ///
    /// # Arguments
    ///
    /// * `resident` - Every resident page, ordered by process then page. Never empty.
    ///
    /// # Returns
    ///
    /// The index into `resident` of the victim.
    fn select_victim(&self, resident: &[ResidentPage]) -> usize;
}
