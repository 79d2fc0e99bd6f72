//! Configuration system for the memory simulator.
//!
//! This module defines all configuration structures and enums used to parameterize
//! the simulator. It provides:
//! 1. **Defaults:** Baseline memory size, page size, frame count and fragment threshold.
//! 2. **Structures:** `SimConfig` for the whole simulator and `PagingConfig` for the paging engine.
//! 3. **Enums:** Allocation (placement) policy and page replacement policy.
//!
//! Configuration is supplied as JSON (from the Python front end or a scenario file) or
//! built with `SimConfig::default()`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::common::constants::{MAX_FRAMES, MAX_MEMORY_SIZE};
use crate::common::{SimError, SimResult};

/// Default configuration constants for the simulator.
mod defaults {
    /// Total size of the simulated address space.
    pub const MEMORY_SIZE: u64 = 100;

    /// Size of one virtual page / physical frame.
    pub const PAGE_SIZE: u64 = 10;

    /// Number of physical frames available to the paging engine.
    pub const NUM_FRAMES: u32 = 10;

    /// Free blocks strictly smaller than this are reported as fragments.
    pub const FRAGMENT_THRESHOLD: u64 = 10;
}

/// Contiguous allocation (placement) policies.
///
/// Each policy scans the free blocks in address order and differs only in which
/// candidate it picks; see `crate::alloc::policies`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationPolicy {
    /// First block large enough, scanning from address 0.
    #[default]
    #[serde(alias = "FirstFit")]
    FirstFit,
    /// Smallest block large enough; lowest address on ties.
    #[serde(alias = "BestFit")]
    BestFit,
    /// Largest block large enough; lowest address on ties.
    #[serde(alias = "WorstFit")]
    WorstFit,
    /// Like first-fit, but the scan resumes after the previous allocation and wraps.
    #[serde(alias = "NextFit")]
    NextFit,
}

impl AllocationPolicy {
    /// All policies, in the order they are reported.
    pub const ALL: [Self; 4] = [Self::FirstFit, Self::BestFit, Self::WorstFit, Self::NextFit];

    /// Stable snake-case name (matches the serialized form).
    pub const fn name(self) -> &'static str {
        match self {
            Self::FirstFit => "first_fit",
            Self::BestFit => "best_fit",
            Self::WorstFit => "worst_fit",
            Self::NextFit => "next_fit",
        }
    }
}

impl fmt::Display for AllocationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Page replacement policy algorithms.
///
/// Specifies the algorithm used to select which resident page to evict
/// when a fault occurs and every frame is occupied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReplacementPolicy {
    /// First In First Out replacement policy.
    ///
    /// Evicts the page that was loaded longest ago, system-wide, regardless of hits.
    #[default]
    #[serde(alias = "Fifo")]
    Fifo,
    /// Least Recently Used replacement policy.
    ///
    /// Evicts the resident page whose last access is the oldest.
    #[serde(alias = "Lru")]
    Lru,
}

impl fmt::Display for ReplacementPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fifo => f.write_str("FIFO"),
            Self::Lru => f.write_str("LRU"),
        }
    }
}

/// Root configuration structure containing all simulator settings.
///
/// # Examples
///
/// Creating a default configuration:
///
/// ```
/// use memsim_core::config::{AllocationPolicy, SimConfig};
///
/// let config = SimConfig::default();
/// assert_eq!(config.memory_size, 100);
/// assert_eq!(config.allocation_policy, AllocationPolicy::FirstFit);
/// ```
///
/// Deserializing from JSON (typical front-end usage):
///
/// ```
/// use memsim_core::config::{AllocationPolicy, ReplacementPolicy, SimConfig};
///
/// let json = r#"{
///     "memory_size": 256,
///     "allocation_policy": "best_fit",
///     "paging": { "page_size": 4, "num_frames": 3, "replacement_policy": "LRU" }
/// }"#;
///
/// let config: SimConfig = serde_json::from_str(json).unwrap();
/// assert_eq!(config.memory_size, 256);
/// assert_eq!(config.allocation_policy, AllocationPolicy::BestFit);
/// assert_eq!(config.paging.replacement_policy, ReplacementPolicy::Lru);
/// assert_eq!(config.fragment_threshold, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Size of the contiguous address space, in bytes.
    #[serde(default = "SimConfig::default_memory_size")]
    pub memory_size: u64,

    /// Placement policy used by `allocate_for`.
    #[serde(default)]
    pub allocation_policy: AllocationPolicy,

    /// Free blocks strictly smaller than this count as fragments.
    #[serde(default = "SimConfig::default_fragment_threshold")]
    pub fragment_threshold: u64,

    /// Paging engine parameters.
    #[serde(default)]
    pub paging: PagingConfig,
}

impl SimConfig {
    fn default_memory_size() -> u64 {
        defaults::MEMORY_SIZE
    }

    fn default_fragment_threshold() -> u64 {
        defaults::FRAGMENT_THRESHOLD
    }

    /// Checks every field that would make an engine unusable.
    ///
    /// # Errors
    ///
    /// `MemorySizeInvalid` for a zero or oversized address space, and whatever
    /// [`PagingConfig::validate`] reports.
    pub fn validate(&self) -> SimResult<()> {
        if self.memory_size == 0 || self.memory_size > MAX_MEMORY_SIZE {
            return Err(SimError::MemorySizeInvalid(self.memory_size));
        }
        self.paging.validate()
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            memory_size: defaults::MEMORY_SIZE,
            allocation_policy: AllocationPolicy::default(),
            fragment_threshold: defaults::FRAGMENT_THRESHOLD,
            paging: PagingConfig::default(),
        }
    }
}

/// Paging engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingConfig {
    /// Size of a page (and of a frame), in bytes.
    #[serde(default = "PagingConfig::default_page_size", alias = "pageSize")]
    pub page_size: u64,

    /// Number of physical frames.
    #[serde(default = "PagingConfig::default_num_frames", alias = "numFrames")]
    pub num_frames: u32,

    /// Victim selection on a fault with every frame occupied.
    #[serde(default, alias = "replacementPolicy")]
    pub replacement_policy: ReplacementPolicy,
}

impl PagingConfig {
    fn default_page_size() -> u64 {
        defaults::PAGE_SIZE
    }

    fn default_num_frames() -> u32 {
        defaults::NUM_FRAMES
    }

    /// Creates a paging configuration.
    pub const fn new(page_size: u64, num_frames: u32, replacement_policy: ReplacementPolicy) -> Self {
        Self {
            page_size,
            num_frames,
            replacement_policy,
        }
    }

    /// Rejects a zero page size or frame count at setup time.
    ///
    /// # Errors
    ///
    /// `PagingConfigInvalid` carrying the rejected values.
    pub fn validate(&self) -> SimResult<()> {
        if self.page_size == 0 || self.num_frames == 0 || self.num_frames > MAX_FRAMES {
            return Err(SimError::PagingConfigInvalid {
                page_size: self.page_size,
                num_frames: self.num_frames,
            });
        }
        Ok(())
    }

    /// Number of pages needed to hold `size` bytes (`ceil(size / page_size)`).
    ///
    /// Callers validate the configuration first, so `page_size` is non-zero.
    pub const fn pages_for(&self, size: u64) -> u64 {
        size.div_ceil(self.page_size)
    }
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            page_size: defaults::PAGE_SIZE,
            num_frames: defaults::NUM_FRAMES,
            replacement_policy: ReplacementPolicy::default(),
        }
    }
}
