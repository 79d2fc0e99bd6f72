//! Simulator: the single owner of every engine.
//!
//! Commands enter here, are dispatched to the owning engine, and the facade then updates
//! the clock, the statistics and the process table. Nothing else holds a reference into
//! engine state, so every mutation passes through these methods.

use serde::Serialize;
use tracing::{debug, info, warn};

use super::process::{Process, ProcessTable};
use super::scenario::Scenario;
use super::snapshot::{PageTableView, Snapshot};
use crate::alloc::AllocationEngine;
use crate::alloc::address_space::Block;
use crate::common::{BlockId, ProcessId, SimClock, SimError, SimResult, Tick};
use crate::config::{AllocationPolicy, PagingConfig, ReplacementPolicy, SimConfig};
use crate::paging::frame_table::FrameTable;
use crate::paging::policies::ReplacementPolicy as VictimSelector;
use crate::paging::{AccessOutcome, PagingEngine};
use crate::segmentation::{CreatedSegment, Segment, SegmentationEngine};
use crate::stats::{Recommendation, SimStats, StatsReport, UsageHistory};

/// Result of a successful allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Allocation {
    /// The new block.
    pub block: BlockId,
    /// Process that owns it.
    pub process: ProcessId,
    /// First byte of the block.
    pub start: u64,
    /// Size of the block.
    pub size: u64,
}

impl Allocation {
    fn from_block(block: &Block, process: ProcessId) -> Self {
        Self {
            block: block.id,
            process,
            start: block.start,
            size: block.size,
        }
    }
}

/// What `terminate_process` released.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Termination {
    /// Blocks freed.
    pub blocks_freed: usize,
    /// Bytes those blocks held.
    pub bytes_freed: u64,
    /// Frames returned to the pool.
    pub frames_released: usize,
    /// Segments dropped with the process.
    pub segments_removed: usize,
}

/// Top-level simulator: allocation, paging and segmentation engines plus shared state.
#[derive(Debug)]
pub struct Simulator {
    pub(crate) clock: SimClock,
    pub(crate) alloc: AllocationEngine,
    pub(crate) paging: PagingEngine,
    pub(crate) segments: SegmentationEngine,
    pub(crate) processes: ProcessTable,
    pub(crate) stats: SimStats,
    pub(crate) usage: UsageHistory,
    pub(crate) fragment_threshold: u64,
}

impl Simulator {
    /// Creates a simulator from a validated configuration.
    ///
    /// # Errors
    ///
    /// `MemorySizeInvalid` or `PagingConfigInvalid` from [`SimConfig::validate`].
    pub fn new(config: &SimConfig) -> SimResult<Self> {
        config.validate()?;
        info!(
            memory_size = config.memory_size,
            policy = %config.allocation_policy,
            page_size = config.paging.page_size,
            num_frames = config.paging.num_frames,
            replacement = %config.paging.replacement_policy,
            "simulator created"
        );
        Ok(Self {
            clock: SimClock::default(),
            alloc: AllocationEngine::new(config.memory_size, config.allocation_policy),
            paging: PagingEngine::new(config.paging)?,
            segments: SegmentationEngine::new(),
            processes: ProcessTable::default(),
            stats: SimStats::default(),
            usage: UsageHistory::default(),
            fragment_threshold: config.fragment_threshold,
        })
    }

    /// Creates a simulator whose paging engine uses a caller-supplied replacement policy.
    ///
    /// # Errors
    ///
    /// Same as [`Self::new`].
    pub fn with_replacement(
        config: &SimConfig,
        policy: Box<dyn VictimSelector + Send + Sync>,
    ) -> SimResult<Self> {
        let mut sim = Self::new(config)?;
        sim.paging = PagingEngine::with_policy(config.paging, policy)?;
        Ok(sim)
    }

    /// The configuration the simulator currently runs with.
    pub fn config(&self) -> SimConfig {
        SimConfig {
            memory_size: self.alloc.space().memory_size(),
            allocation_policy: self.alloc.policy(),
            fragment_threshold: self.fragment_threshold,
            paging: self.paging.config(),
        }
    }

    /// Current tick.
    #[inline]
    pub const fn tick(&self) -> Tick {
        self.clock.now()
    }

    /// Blocks in address order.
    pub fn blocks(&self) -> &[Block] {
        self.alloc.blocks()
    }

    /// Live processes in id order.
    pub fn processes(&self) -> impl Iterator<Item = &Process> {
        self.processes.iter()
    }

    /// Looks up a live process.
    pub fn process(&self, id: ProcessId) -> Option<&Process> {
        self.processes.get(id)
    }

    /// The paging engine (page tables and frames).
    #[inline]
    pub const fn paging(&self) -> &PagingEngine {
        &self.paging
    }

    /// The frame pool.
    pub const fn frames(&self) -> &FrameTable {
        self.paging.frames()
    }

    /// Live segments in creation order.
    pub fn segments(&self) -> &[Segment] {
        self.segments.segments()
    }

    /// Running counters.
    #[inline]
    pub const fn stats(&self) -> &SimStats {
        &self.stats
    }

    /// Allocated bytes after every command that changed them.
    #[inline]
    pub const fn usage_history(&self) -> &UsageHistory {
        &self.usage
    }

    /// Allocates `size` bytes for a new process using `policy`, which becomes the current
    /// policy.
    ///
    /// The process id is only consumed when the allocation succeeds. It is never the id of
    /// a live process.
    ///
    /// # Errors
    ///
    /// `InvalidSize` or `AllocationFailed`; see [`AllocationEngine::allocate`].
    /// `InvalidProcess` if every process id is live.
    pub fn allocate(&mut self, size: u64, policy: AllocationPolicy) -> SimResult<Allocation> {
        self.alloc.set_policy(policy);
        let Some(process) = self.processes.next_id() else {
            warn!("no process id left for an anonymous allocation");
            return Err(SimError::InvalidProcess(ProcessId(self.processes.counter().peek())));
        };
        self.place(size, process)
    }

    /// Allocates `size` bytes for `process` (existing or new) with the current policy.
    ///
    /// # Errors
    ///
    /// `InvalidSize` or `AllocationFailed`; see [`AllocationEngine::allocate`].
    pub fn allocate_for(&mut self, process: ProcessId, size: u64) -> SimResult<Allocation> {
        self.place(size, process)
    }

    fn place(&mut self, size: u64, process: ProcessId) -> SimResult<Allocation> {
        let policy = self.alloc.policy();
        match self.alloc.allocate(size, process, policy) {
            Ok(block) => {
                let _ = self.clock.advance();
                self.stats.record_allocation(policy, block.size);
                self.record_usage();
                self.sync_processes();
                Ok(Allocation::from_block(&block, process))
            }
            Err(err) => {
                if matches!(err, SimError::AllocationFailed(_)) {
                    self.stats.record_failure(policy);
                }
                Err(err)
            }
        }
    }

    /// Selects the placement policy for later allocations.
    pub fn set_policy(&mut self, policy: AllocationPolicy) {
        self.alloc.set_policy(policy);
    }

    /// Frees a block.
    ///
    /// # Errors
    ///
    /// `InvalidBlock` if the block is unknown or already free.
    pub fn deallocate(&mut self, block: BlockId) -> SimResult<Block> {
        let freed = self.alloc.deallocate(block)?;
        self.stats.record_deallocation(freed.size);
        self.record_usage();
        self.sync_processes();
        Ok(freed)
    }

    /// Frees every block of a process. Its pages are left alone.
    ///
    /// # Errors
    ///
    /// `InvalidProcess` if the process owns no block.
    pub fn deallocate_process(&mut self, process: ProcessId) -> SimResult<Vec<Block>> {
        let freed = self.alloc.deallocate_process(process)?;
        for block in &freed {
            self.stats.record_deallocation(block.size);
        }
        self.record_usage();
        self.sync_processes();
        Ok(freed)
    }

    /// Touches `page` of `process`, creating the entry on first use.
    pub fn access_page(&mut self, process: ProcessId, page: u64) -> AccessOutcome {
        let now = self.clock.advance();
        let outcome = self.paging.access_page(process, page, now);
        self.stats.record_access(&outcome);
        self.sync_processes();
        outcome
    }

    /// Drops the page table of a process and frees its frames.
    ///
    /// Segments of the process go with it, since their pages no longer exist.
    ///
    /// # Errors
    ///
    /// `InvalidProcess` if the process has no page table.
    pub fn unmap_process(&mut self, process: ProcessId) -> SimResult<usize> {
        let released = self.paging.unmap_process(process)?;
        let _ = self.drop_segments_of(process);
        self.sync_processes();
        Ok(released)
    }

    /// Frees every block, frame and segment of a process.
    ///
    /// # Errors
    ///
    /// `InvalidProcess` if the process does not exist.
    pub fn terminate_process(&mut self, process: ProcessId) -> SimResult<Termination> {
        if !self.processes.contains(process) {
            warn!(process = %process, "terminate of unknown process");
            return Err(SimError::InvalidProcess(process));
        }
        let mut done = Termination::default();
        if !self.alloc.blocks_of(process).is_empty() {
            let blocks = self.alloc.deallocate_process(process)?;
            for block in &blocks {
                self.stats.record_deallocation(block.size);
                done.bytes_freed += block.size;
            }
            done.blocks_freed = blocks.len();
            self.record_usage();
        }
        if self.paging.page_table(process).is_some() {
            done.frames_released = self.paging.unmap_process(process)?;
        }
        done.segments_removed = self.drop_segments_of(process);
        self.sync_processes();
        debug!(process = %process, ?done, "process terminated");
        Ok(done)
    }

    fn record_usage(&mut self) {
        self.usage.record(self.clock.now(), self.stats.bytes_allocated);
    }

    fn drop_segments_of(&mut self, process: ProcessId) -> usize {
        let removed = self.segments.remove_process(process);
        self.stats.segments_deleted += removed as u64;
        removed
    }

    /// Creates a segment placed after every page the process already uses.
    ///
    /// # Errors
    ///
    /// `SegmentNameConflict` or `InvalidSize`.
    pub fn create_segment(
        &mut self,
        name: &str,
        size: u64,
        process: ProcessId,
    ) -> SimResult<CreatedSegment> {
        let created =
            self.segments
                .create_segment(name, size, process, &mut self.paging, &mut self.clock)?;
        self.after_segment_created(&created);
        Ok(created)
    }

    /// Creates a segment starting at `base_page`.
    ///
    /// # Errors
    ///
    /// `SegmentNameConflict`, `InvalidSize` or `SegmentPageConflict`.
    pub fn create_segment_at(
        &mut self,
        name: &str,
        size: u64,
        process: ProcessId,
        base_page: u64,
    ) -> SimResult<CreatedSegment> {
        let created = self.segments.create_segment_at(
            name,
            size,
            process,
            base_page,
            &mut self.paging,
            &mut self.clock,
        )?;
        self.after_segment_created(&created);
        Ok(created)
    }

    fn after_segment_created(&mut self, created: &CreatedSegment) {
        for outcome in &created.accesses {
            self.stats.record_access(outcome);
        }
        self.stats.segments_created += 1;
        self.sync_processes();
    }

    /// Deletes a segment; its pages stay resident until evicted.
    ///
    /// # Errors
    ///
    /// `SegmentNotFound` if no live segment has `name`.
    pub fn delete_segment(&mut self, name: &str) -> SimResult<Segment> {
        let segment = self.segments.delete_segment(name)?;
        self.stats.segments_deleted += 1;
        Ok(segment)
    }

    /// Replaces the paging configuration.
    ///
    /// Page tables, frames and segments are cleared, along with the paging counters.
    /// Blocks are kept.
    ///
    /// # Errors
    ///
    /// `PagingConfigInvalid`; the running state is untouched on error.
    pub fn set_paging_config(
        &mut self,
        page_size: u64,
        num_frames: u32,
        replacement_policy: ReplacementPolicy,
    ) -> SimResult<()> {
        let config = PagingConfig::new(page_size, num_frames, replacement_policy);
        let engine = PagingEngine::new(config).inspect_err(|_| {
            warn!(page_size, num_frames, "rejected paging configuration");
        })?;
        self.paging = engine;
        self.segments.reset();
        self.stats.reset_paging();
        self.sync_processes();
        debug!(page_size, num_frames, %replacement_policy, "paging reconfigured");
        Ok(())
    }

    /// Replaces the address space with a single free block of `memory_size` bytes.
    ///
    /// Every block is dropped; page tables and segments are kept.
    ///
    /// # Errors
    ///
    /// `MemorySizeInvalid`; the running state is untouched on error.
    pub fn set_memory_size(&mut self, memory_size: u64) -> SimResult<()> {
        let candidate = SimConfig {
            memory_size,
            ..self.config()
        };
        candidate.validate().inspect_err(|_| {
            warn!(memory_size, "rejected memory size");
        })?;
        self.alloc.resize(memory_size);
        self.stats.reset_memory();
        self.record_usage();
        self.sync_processes();
        Ok(())
    }

    /// Restores the initial state: one free block, no pages, frames or segments, tick 0.
    pub fn reset(&mut self) {
        self.alloc.reset();
        self.paging.reset();
        self.segments.reset();
        self.processes.reset();
        self.clock.reset();
        self.stats = SimStats::default();
        self.usage.clear();
        debug!("simulator reset");
    }

    /// Counters plus metrics derived from the current state.
    pub fn stats_report(&self) -> StatsReport {
        let paging = self.paging.config();
        let memory_size = self.alloc.space().memory_size();
        let fragmentation = self.alloc.fragmentation(self.fragment_threshold);
        let internal_fragmentation = self.segments.internal_fragmentation(paging.page_size);
        let segment_bytes: u64 = self
            .segments
            .segments()
            .iter()
            .map(|s| s.page_ids.len() as u64 * paging.page_size)
            .sum();
        let internal_pct = if segment_bytes == 0 {
            0.0
        } else {
            internal_fragmentation as f64 / segment_bytes as f64 * 100.0
        };
        let wasted_bytes = fragmentation.fragment_bytes + internal_fragmentation;
        StatsReport {
            counters: self.stats,
            memory_size,
            fragmentation,
            internal_fragmentation,
            internal_pct,
            wasted_bytes,
            total_accesses: self.stats.total_accesses(),
            hit_ratio: self.stats.hit_ratio(),
            fault_ratio: self.stats.fault_ratio(),
            resident_pages: self.paging.resident_count(),
            num_frames: paging.num_frames,
            live_segments: self.segments.segments().len(),
            usage_history: self.usage.clone(),
            recommendations: Recommendation::assess(
                &fragmentation,
                internal_pct,
                wasted_bytes,
                memory_size,
            ),
        }
    }

    /// Owned copy of the whole state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tick: self.clock.now(),
            memory_size: self.alloc.space().memory_size(),
            policy: self.alloc.policy(),
            paging: self.paging.config(),
            next_fit_cursor: self.alloc.next_fit_cursor(),
            blocks: self.alloc.blocks().to_vec(),
            processes: self.processes.iter().cloned().collect(),
            page_tables: self
                .paging
                .page_tables()
                .iter()
                .map(|(&process, table)| PageTableView {
                    process,
                    entries: table.entries().copied().collect(),
                })
                .collect(),
            frames: self.paging.frames().frames().to_vec(),
            segments: self.segments.segments().to_vec(),
            statistics: self.stats_report(),
        }
    }

    /// Captures the state as a persisted scenario.
    pub fn save_scenario(&self) -> Scenario {
        Scenario::capture(self)
    }

    /// Replaces the whole state with a persisted scenario.
    ///
    /// # Errors
    ///
    /// `ConfigLoadInvalid` if the scenario violates any structural invariant. The running
    /// simulation is left exactly as it was.
    pub fn load_scenario(&mut self, scenario: &Scenario) -> SimResult<()> {
        let restored = scenario.restore().map_err(|reason| {
            warn!(%reason, "scenario rejected");
            SimError::ConfigLoadInvalid(reason)
        })?;
        *self = restored;
        info!(
            memory_size = self.alloc.space().memory_size(),
            blocks = self.alloc.blocks().len(),
            segments = self.segments.segments().len(),
            tick = self.clock.now(),
            "scenario loaded"
        );
        Ok(())
    }

    /// Checks every structural invariant of the current state.
    ///
    /// # Errors
    ///
    /// A description of the first violation found.
    pub fn check_invariants(&self) -> Result<(), String> {
        self.alloc.space().check_invariants()?;
        self.paging.check_invariants()?;

        let page_size = self.paging.config().page_size;
        for segment in self.segments.segments() {
            let expected = segment.size.div_ceil(page_size);
            if segment.page_ids.len() as u64 != expected {
                return Err(format!(
                    "segment '{}' has {} pages, expected {expected}",
                    segment.name,
                    segment.page_ids.len()
                ));
            }
        }

        let owned: u64 = self.processes.iter().map(|p| p.allocated_bytes).sum();
        if owned != self.alloc.allocated_bytes() {
            return Err(format!(
                "processes own {owned} bytes but {} bytes are allocated",
                self.alloc.allocated_bytes()
            ));
        }
        if self.stats.bytes_allocated != self.alloc.allocated_bytes() {
            return Err(format!(
                "statistics report {} allocated bytes, blocks hold {}",
                self.stats.bytes_allocated,
                self.alloc.allocated_bytes()
            ));
        }
        Ok(())
    }

    fn sync_processes(&mut self) {
        self.processes
            .sync(self.alloc.blocks(), self.paging.page_tables());
    }
}
