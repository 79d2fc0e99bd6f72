//! Mock replacement policy.
//!
//! Lets a test decide which resident page is evicted and assert how often the paging
//! engine asks.

use memsim_core::paging::policies::{ReplacementPolicy, ResidentPage};
use mockall::mock;

mock! {
    pub Replacement {}

    impl ReplacementPolicy for Replacement {
        fn select_victim(&self, resident: &[ResidentPage]) -> usize;
    }
}
