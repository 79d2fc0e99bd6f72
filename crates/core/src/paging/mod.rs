//! Demand paging engine.
//!
//! This module owns the frame pool and every page table. It provides:
//! 1. **Demand paging:** The first access to a page creates its entry; no explicit map call exists.
//! 2. **Fault handling:** Free frames are used lowest id first, otherwise a victim is evicted.
//! 3. **Replacement:** A pluggable [`policies::ReplacementPolicy`] chosen from the configuration.
//! 4. **Process teardown:** `unmap_process` returns every frame a process held.

/// Physical frame pool.
pub mod frame_table;

/// Per-process page tables.
pub mod page_table;

/// Replacement policy implementations (FIFO, LRU).
pub mod policies;

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::{debug, trace, warn};

use self::frame_table::{FrameTable, PageRef};
use self::page_table::{PageTable, PageTableEntry};
use self::policies::{FifoPolicy, LruPolicy, ReplacementPolicy, ResidentPage};
use crate::common::{FrameId, ProcessId, SimError, SimResult, Tick};
use crate::config::{PagingConfig, ReplacementPolicy as PolicyType};

/// Result of a single page access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AccessOutcome {
    /// The page was resident.
    Hit {
        /// Frame holding the page.
        frame: FrameId,
    },
    /// The page was loaded into `frame`, evicting `evicted` if no frame was free.
    Fault {
        /// Frame the page now occupies.
        frame: FrameId,
        /// Page that had to leave `frame`.
        evicted: Option<PageRef>,
    },
}

impl AccessOutcome {
    /// Frame the page occupies after the access.
    pub const fn frame(&self) -> FrameId {
        match *self {
            Self::Hit { frame } | Self::Fault { frame, .. } => frame,
        }
    }

    /// Returns `true` for a page fault.
    pub const fn is_fault(&self) -> bool {
        matches!(self, Self::Fault { .. })
    }

    /// Evicted page, if the access caused an eviction.
    pub const fn evicted(&self) -> Option<PageRef> {
        match *self {
            Self::Fault { evicted, .. } => evicted,
            Self::Hit { .. } => None,
        }
    }
}

/// Paging engine: frame pool, page tables and replacement policy.
pub struct PagingEngine {
    config: PagingConfig,
    frames: FrameTable,
    tables: BTreeMap<ProcessId, PageTable>,
    policy: Box<dyn ReplacementPolicy + Send + Sync>,
}

impl fmt::Debug for PagingEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PagingEngine")
            .field("config", &self.config)
            .field("frames", &self.frames)
            .field("tables", &self.tables)
            .finish_non_exhaustive()
    }
}

impl PagingEngine {
    /// Creates an engine with the replacement policy named by `config`.
    ///
    /// # Errors
    ///
    /// `PagingConfigInvalid` for a zero page size or frame count.
    pub fn new(config: PagingConfig) -> SimResult<Self> {
        Self::with_policy(config, Self::policy_for(config.replacement_policy))
    }

    /// Creates an engine with a caller-supplied replacement policy.
    ///
    /// # Errors
    ///
    /// `PagingConfigInvalid` for a zero page size or frame count.
    pub fn with_policy(
        config: PagingConfig,
        policy: Box<dyn ReplacementPolicy + Send + Sync>,
    ) -> SimResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            frames: FrameTable::new(config.num_frames),
            tables: BTreeMap::new(),
            policy,
        })
    }

    /// Rebuilds an engine from persisted page tables, deriving the frame pool from them.
    ///
    /// # Errors
    ///
    /// A description of the first frame that is out of range or mapped twice.
    pub(crate) fn from_tables(
        config: PagingConfig,
        tables: BTreeMap<ProcessId, PageTable>,
    ) -> Result<Self, String> {
        let mut engine = Self::new(config).map_err(|e| e.to_string())?;
        for (&process, table) in &tables {
            for entry in table.resident() {
                let Some(frame) = entry.frame else { continue };
                let Some(slot) = engine.frames.get(frame) else {
                    return Err(format!(
                        "{process} page {} maps to {frame}, but only {} frames exist",
                        entry.virtual_page, config.num_frames
                    ));
                };
                if let Some(other) = slot.occupant {
                    return Err(format!(
                        "{frame} is mapped by both {} page {} and {process} page {}",
                        other.process, other.page, entry.virtual_page
                    ));
                }
                let _ = engine
                    .frames
                    .occupy(frame, PageRef::new(process, entry.virtual_page));
            }
        }
        engine.tables = tables;
        Ok(engine)
    }

    fn policy_for(policy: PolicyType) -> Box<dyn ReplacementPolicy + Send + Sync> {
        match policy {
            PolicyType::Fifo => Box::new(FifoPolicy),
            PolicyType::Lru => Box::new(LruPolicy),
        }
    }

    /// Active configuration.
    #[inline]
    pub const fn config(&self) -> PagingConfig {
        self.config
    }

    /// The frame pool.
    #[inline]
    pub const fn frames(&self) -> &FrameTable {
        &self.frames
    }

    /// Every page table, keyed by process.
    #[inline]
    pub const fn page_tables(&self) -> &BTreeMap<ProcessId, PageTable> {
        &self.tables
    }

    /// Page table of one process.
    pub fn page_table(&self, process: ProcessId) -> Option<&PageTable> {
        self.tables.get(&process)
    }

    /// Highest page number touched by `process`.
    pub fn highest_page(&self, process: ProcessId) -> Option<u64> {
        self.tables.get(&process).and_then(PageTable::highest_page)
    }

    /// Number of resident pages.
    pub fn resident_count(&self) -> usize {
        self.frames.occupied()
    }

    /// Every resident page, ordered by process then page.
    pub fn resident_pages(&self) -> Vec<ResidentPage> {
        self.tables
            .iter()
            .flat_map(|(&process, table)| {
                table.resident().filter_map(move |e| {
                    e.frame.map(|frame| ResidentPage {
                        process,
                        page: e.virtual_page,
                        frame,
                        loaded_tick: e.loaded_tick,
                        last_access_tick: e.last_access_tick,
                    })
                })
            })
            .collect()
    }

    /// Accesses `page` of `process` at tick `now`.
    ///
    /// A resident page is a hit and only refreshes its access tick. Anything else faults:
    /// the page gets the lowest free frame, or the policy's victim frame when none is free,
    /// and both its load and access ticks are set to `now`.
    pub fn access_page(&mut self, process: ProcessId, page: u64, now: Tick) -> AccessOutcome {
        let table = self.tables.entry(process).or_default();
        if let Some(entry) = table.get_mut(page)
            && let Some(frame) = entry.frame
        {
            entry.last_access_tick = now;
            trace!(process = %process, page, frame = %frame, tick = now, "page hit");
            return AccessOutcome::Hit { frame };
        }

        let (frame, evicted) = if let Some(frame) = self.frames.first_free() {
            (frame, None)
        } else if let Some(victim) = self.evict() {
            (victim.frame, Some(victim.page_ref()))
        } else {
            self.reclaim_first_frame()
        };

        let _ = self.frames.occupy(frame, PageRef::new(process, page));
        self.tables.entry(process).or_default().insert(PageTableEntry {
            virtual_page: page,
            frame: Some(frame),
            last_access_tick: now,
            loaded_tick: now,
        });

        debug!(
            process = %process,
            page,
            frame = %frame,
            evicted = ?evicted,
            tick = now,
            "page fault"
        );
        AccessOutcome::Fault { frame, evicted }
    }

    /// Removes the policy's victim from its frame.
    ///
    /// An out-of-range choice falls back to the first resident page. `None` when no page
    /// table maps a frame.
    fn evict(&mut self) -> Option<ResidentPage> {
        let resident = self.resident_pages();
        if resident.is_empty() {
            return None;
        }
        let chosen = self.policy.select_victim(&resident);
        let &victim = resident.get(chosen).or_else(|| resident.first())?;

        let _ = self.frames.release(victim.frame);
        if let Some(entry) = self
            .tables
            .get_mut(&victim.process)
            .and_then(|t| t.get_mut(victim.page))
        {
            entry.frame = None;
        }
        debug!(
            process = %victim.process,
            page = victim.page,
            frame = %victim.frame,
            policy = %self.config.replacement_policy,
            "evicted"
        );
        Some(victim)
    }

    /// Empties frame 0 for a pool that is full while no page table maps a frame.
    ///
    /// Whatever the frame held is reported as evicted and unmapped from its table.
    fn reclaim_first_frame(&mut self) -> (FrameId, Option<PageRef>) {
        let frame = FrameId(0);
        let stale = self.frames.release(frame);
        if let Some(page) = stale
            && let Some(entry) = self
                .tables
                .get_mut(&page.process)
                .and_then(|t| t.get_mut(page.page))
        {
            entry.frame = None;
        }
        warn!(frame = %frame, stale = ?stale, "frame pool full without resident pages, reclaiming");
        (frame, stale)
    }

    /// Drops the page table of `process` and frees every frame it held.
    ///
    /// Returns the number of frames released.
    ///
    /// # Errors
    ///
    /// `InvalidProcess` if the process has no page table.
    pub fn unmap_process(&mut self, process: ProcessId) -> SimResult<usize> {
        let Some(table) = self.tables.remove(&process) else {
            warn!(process = %process, "unmap of process without a page table");
            return Err(SimError::InvalidProcess(process));
        };
        let mut released = 0;
        for frame in table.resident().filter_map(|e| e.frame) {
            let _ = self.frames.release(frame);
            released += 1;
        }
        debug!(process = %process, pages = table.len(), frames = released, "process unmapped");
        Ok(released)
    }

    /// Empties every page table and frame, keeping the configuration.
    pub fn reset(&mut self) {
        self.frames = FrameTable::new(self.config.num_frames);
        self.tables.clear();
    }

    /// Verifies the frame/entry bijection.
    ///
    /// # Errors
    ///
    /// A description of the first mismatch found.
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut mapped = 0;
        for (&process, table) in &self.tables {
            for entry in table.resident() {
                let Some(frame) = entry.frame else { continue };
                let expected = Some(PageRef::new(process, entry.virtual_page));
                match self.frames.get(frame) {
                    Some(slot) if slot.occupant == expected => mapped += 1,
                    Some(slot) => {
                        return Err(format!(
                            "{process} page {} points at {frame}, which holds {:?}",
                            entry.virtual_page, slot.occupant
                        ));
                    }
                    None => return Err(format!("{frame} is out of range")),
                }
            }
        }
        if mapped != self.frames.occupied() {
            return Err(format!(
                "{} frames occupied but {mapped} entries are resident",
                self.frames.occupied()
            ));
        }
        Ok(())
    }
}
