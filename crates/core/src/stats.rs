//! Simulation statistics collection and reporting.
//!
//! This module tracks running metrics for the memory simulator. It provides:
//! 1. **Allocation:** Successful and failed requests per placement policy, bytes in use and peak.
//! 2. **Paging:** Faults, hits and evictions, with derived hit and fault ratios.
//! 3. **Segmentation:** Segments created and deleted, internal fragmentation.
//! 4. **Fragmentation:** External fragmentation of the free-block layout, with tuning
//!    recommendations when it crosses fixed thresholds.
//! 5. **Usage history:** Bytes allocated after every command that changed them.
//!
//! `SimStats` holds only the counters and `UsageHistory` the samples (both persisted with a
//! scenario); `StatsReport` combines them with the figures derived from the current engine
//! state.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::alloc::address_space::FragmentationReport;
use crate::common::Tick;
use crate::config::AllocationPolicy;
use crate::paging::AccessOutcome;

/// Section names for selective stats output.
///
/// Valid section identifiers: `"summary"`, `"allocation"`, `"paging"`, `"segmentation"`,
/// `"recommendations"`.
/// Pass an empty slice to `print_sections` to print all sections.
pub const STATS_SECTIONS: &[&str] = &[
    "summary",
    "allocation",
    "paging",
    "segmentation",
    "recommendations",
];

/// External fragmentation percentage above which compaction is recommended.
pub const EXTERNAL_FRAGMENTATION_LIMIT: f64 = 70.0;

/// Share of segment-backed bytes lost to internal fragmentation, in percent, above which a
/// different page size is recommended.
pub const INTERNAL_FRAGMENTATION_LIMIT: f64 = 30.0;

/// Share of memory, in percent, that unusable fragments plus internal fragmentation may
/// take before the placement policy should be reviewed.
pub const WASTED_MEMORY_LIMIT: f64 = 20.0;

/// Outcome counters for one placement policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyCounters {
    /// Successful allocations.
    pub allocations: u64,
    /// Rejected allocations.
    pub failures: u64,
}

impl PolicyCounters {
    /// Percentage of requests that succeeded, 0 with no requests.
    pub fn success_rate(&self) -> f64 {
        let total = self.allocations + self.failures;
        if total == 0 {
            0.0
        } else {
            self.allocations as f64 / total as f64 * 100.0
        }
    }
}

/// Per-policy counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlgorithmStats {
    /// First-fit counters.
    pub first_fit: PolicyCounters,
    /// Best-fit counters.
    pub best_fit: PolicyCounters,
    /// Worst-fit counters.
    pub worst_fit: PolicyCounters,
    /// Next-fit counters.
    pub next_fit: PolicyCounters,
}

impl AlgorithmStats {
    /// Counters of one policy.
    pub const fn get(&self, policy: AllocationPolicy) -> &PolicyCounters {
        match policy {
            AllocationPolicy::FirstFit => &self.first_fit,
            AllocationPolicy::BestFit => &self.best_fit,
            AllocationPolicy::WorstFit => &self.worst_fit,
            AllocationPolicy::NextFit => &self.next_fit,
        }
    }

    fn get_mut(&mut self, policy: AllocationPolicy) -> &mut PolicyCounters {
        match policy {
            AllocationPolicy::FirstFit => &mut self.first_fit,
            AllocationPolicy::BestFit => &mut self.best_fit,
            AllocationPolicy::WorstFit => &mut self.worst_fit,
            AllocationPolicy::NextFit => &mut self.next_fit,
        }
    }
}

/// Running counters updated by every command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimStats {
    /// Successful allocations.
    pub allocations: u64,
    /// Rejected allocations.
    pub failed_allocations: u64,
    /// Blocks freed.
    pub deallocations: u64,
    /// Bytes currently allocated.
    pub bytes_allocated: u64,
    /// Highest value `bytes_allocated` has reached.
    pub peak_bytes_allocated: u64,
    /// Per-policy outcomes.
    pub algorithms: AlgorithmStats,

    /// Page accesses that found no frame mapping.
    pub page_faults: u64,
    /// Page accesses that found the page resident.
    pub page_hits: u64,
    /// Faults that had to evict a resident page.
    pub evictions: u64,

    /// Segments created.
    pub segments_created: u64,
    /// Segments deleted.
    pub segments_deleted: u64,
}

impl SimStats {
    /// Records a successful allocation.
    pub fn record_allocation(&mut self, policy: AllocationPolicy, size: u64) {
        self.allocations += 1;
        self.algorithms.get_mut(policy).allocations += 1;
        self.bytes_allocated += size;
        self.peak_bytes_allocated = self.peak_bytes_allocated.max(self.bytes_allocated);
    }

    /// Records a rejected allocation.
    pub fn record_failure(&mut self, policy: AllocationPolicy) {
        self.failed_allocations += 1;
        self.algorithms.get_mut(policy).failures += 1;
    }

    /// Records a freed block of `size` bytes.
    pub fn record_deallocation(&mut self, size: u64) {
        self.deallocations += 1;
        self.bytes_allocated = self.bytes_allocated.saturating_sub(size);
    }

    /// Records one page access.
    pub fn record_access(&mut self, outcome: &AccessOutcome) {
        match outcome {
            AccessOutcome::Hit { .. } => self.page_hits += 1,
            AccessOutcome::Fault { evicted, .. } => {
                self.page_faults += 1;
                if evicted.is_some() {
                    self.evictions += 1;
                }
            }
        }
    }

    /// Clears the paging and segmentation counters.
    pub fn reset_paging(&mut self) {
        self.page_faults = 0;
        self.page_hits = 0;
        self.evictions = 0;
        self.segments_created = 0;
        self.segments_deleted = 0;
    }

    /// Clears the allocation counters, keeping per-policy history.
    pub fn reset_memory(&mut self) {
        self.bytes_allocated = 0;
        self.peak_bytes_allocated = 0;
    }

    /// Total page accesses.
    pub const fn total_accesses(&self) -> u64 {
        self.page_faults + self.page_hits
    }

    /// Hits over accesses, 0 with no accesses.
    pub fn hit_ratio(&self) -> f64 {
        ratio(self.page_hits, self.total_accesses())
    }

    /// Faults over accesses, 0 with no accesses.
    pub fn fault_ratio(&self) -> f64 {
        ratio(self.page_faults, self.total_accesses())
    }
}

fn ratio(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

/// Bytes allocated at one point of the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSample {
    /// Clock value when the sample was taken.
    pub tick: Tick,
    /// Bytes allocated at that point.
    pub bytes: u64,
}

/// Allocated-bytes samples in command order.
///
/// A sample is appended after every command that allocates, frees or resizes memory.
/// Ticks never decrease; commands that do not advance the clock (frees) share the tick of
/// the preceding event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsageHistory(Vec<UsageSample>);

impl UsageHistory {
    /// Builds a history from persisted samples.
    ///
    /// # Errors
    ///
    /// A description of the first sample whose tick goes backwards or lies after `now`.
    pub fn from_samples(samples: Vec<UsageSample>, now: Tick) -> Result<Self, String> {
        let mut previous = 0;
        for sample in &samples {
            if sample.tick < previous {
                return Err(format!(
                    "usage sample at tick {} follows one at tick {previous}",
                    sample.tick
                ));
            }
            if sample.tick > now {
                return Err(format!(
                    "usage sample at tick {} is newer than the clock ({now})",
                    sample.tick
                ));
            }
            previous = sample.tick;
        }
        Ok(Self(samples))
    }

    /// Appends a sample.
    pub fn record(&mut self, tick: Tick, bytes: u64) {
        self.0.push(UsageSample { tick, bytes });
    }

    /// Samples in the order they were taken.
    #[inline]
    pub fn samples(&self) -> &[UsageSample] {
        &self.0
    }

    /// Most recent sample.
    pub fn last(&self) -> Option<UsageSample> {
        self.0.last().copied()
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` before the first sample.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Drops every sample.
    pub fn clear(&mut self) {
        self.0.clear();
    }
}

/// Tuning advice derived from the fragmentation figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    /// External fragmentation is above [`EXTERNAL_FRAGMENTATION_LIMIT`].
    CompactMemory,
    /// Internal fragmentation is above [`INTERNAL_FRAGMENTATION_LIMIT`].
    AdjustPageSize,
    /// Wasted bytes are above [`WASTED_MEMORY_LIMIT`] percent of memory.
    ReviewAllocationPolicy,
}

impl Recommendation {
    /// Recommendations for the given figures, in a fixed order.
    ///
    /// `internal_pct` is internal fragmentation as a share of segment-backed bytes and
    /// `wasted` counts unusable fragment bytes plus internal fragmentation.
    pub fn assess(
        fragmentation: &FragmentationReport,
        internal_pct: f64,
        wasted: u64,
        memory_size: u64,
    ) -> Vec<Self> {
        let mut out = Vec::new();
        if fragmentation.external_pct > EXTERNAL_FRAGMENTATION_LIMIT {
            out.push(Self::CompactMemory);
        }
        if internal_pct > INTERNAL_FRAGMENTATION_LIMIT {
            out.push(Self::AdjustPageSize);
        }
        if wasted as f64 > memory_size as f64 * WASTED_MEMORY_LIMIT / 100.0 {
            out.push(Self::ReviewAllocationPolicy);
        }
        out
    }

    /// Human-readable advice.
    pub const fn message(self) -> &'static str {
        match self {
            Self::CompactMemory => {
                "High external fragmentation detected. Consider memory compaction."
            }
            Self::AdjustPageSize => {
                "High internal fragmentation detected. Consider adjusting the page size."
            }
            Self::ReviewAllocationPolicy => {
                "Significant memory waste detected. Review the allocation policy."
            }
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Counters plus figures derived from the current engine state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsReport {
    /// Running counters.
    #[serde(flatten)]
    pub counters: SimStats,
    /// Size of the address space.
    pub memory_size: u64,
    /// External fragmentation of the free blocks.
    pub fragmentation: FragmentationReport,
    /// Bytes wasted in the last page of every live segment.
    pub internal_fragmentation: u64,
    /// `internal_fragmentation` over the bytes of every live segment's pages, in percent.
    pub internal_pct: f64,
    /// Unusable fragment bytes plus internal fragmentation.
    pub wasted_bytes: u64,
    /// Page accesses so far.
    pub total_accesses: u64,
    /// `page_hits / total_accesses`.
    pub hit_ratio: f64,
    /// `page_faults / total_accesses`.
    pub fault_ratio: f64,
    /// Frames currently occupied.
    pub resident_pages: usize,
    /// Frames in the pool.
    pub num_frames: u32,
    /// Live segments.
    pub live_segments: usize,
    /// Bytes allocated after each command that changed them.
    pub usage_history: UsageHistory,
    /// Advice triggered by the fragmentation figures.
    pub recommendations: Vec<Recommendation>,
}

impl StatsReport {
    /// Prints only the requested statistics sections to stdout.
    ///
    /// Each element of `sections` should be one of [`STATS_SECTIONS`]. Pass an empty slice
    /// to print all sections (same as `print()`).
    pub fn print_sections(&self, sections: &[String]) {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);
        let c = &self.counters;
        let mem = self.memory_size.max(1) as f64;

        if want("summary") {
            println!("\n==========================================================");
            println!("MEMORY MANAGEMENT SIMULATION STATISTICS");
            println!("==========================================================");
            println!("memory_size              {}", self.memory_size);
            println!(
                "bytes_allocated          {} ({:.2}%)",
                c.bytes_allocated,
                c.bytes_allocated as f64 / mem * 100.0
            );
            println!("peak_bytes_allocated     {}", c.peak_bytes_allocated);
            println!("page_accesses            {}", self.total_accesses);
            println!("hit_ratio                {:.4}", self.hit_ratio);
            println!("----------------------------------------------------------");
        }
        if want("allocation") {
            let f = &self.fragmentation;
            println!("ALLOCATION");
            println!("  alloc.requests         {}", c.allocations + c.failed_allocations);
            println!("  alloc.failed           {}", c.failed_allocations);
            println!("  dealloc.count          {}", c.deallocations);
            println!("  free.blocks            {}", f.free_blocks);
            println!("  free.bytes             {}", f.free_bytes);
            println!("  free.largest           {}", f.largest_free);
            println!(
                "  fragments              {} ({} bytes)",
                f.fragment_count, f.fragment_bytes
            );
            println!("  frag.external          {:.2}%", f.external_pct);
            for policy in AllocationPolicy::ALL {
                let p = self.counters.algorithms.get(policy);
                println!(
                    "  {:<10} ok: {:<8} | failed: {:<8} | success: {:.2}%",
                    policy.name(),
                    p.allocations,
                    p.failures,
                    p.success_rate()
                );
            }
            println!("----------------------------------------------------------");
        }
        if want("paging") {
            println!("PAGING");
            println!("  page.faults            {}", c.page_faults);
            println!("  page.hits              {}", c.page_hits);
            println!("  page.evictions         {}", c.evictions);
            println!("  fault_ratio            {:.4}", self.fault_ratio);
            println!(
                "  frames.resident        {} / {}",
                self.resident_pages, self.num_frames
            );
            println!("----------------------------------------------------------");
        }
        if want("segmentation") {
            println!("SEGMENTATION");
            println!("  seg.live               {}", self.live_segments);
            println!("  seg.created            {}", c.segments_created);
            println!("  seg.deleted            {}", c.segments_deleted);
            println!(
                "  frag.internal          {} bytes ({:.2}%)",
                self.internal_fragmentation, self.internal_pct
            );
            println!("----------------------------------------------------------");
        }
        if want("recommendations") {
            println!("RECOMMENDATIONS");
            println!("  usage.samples          {}", self.usage_history.len());
            println!("  wasted.bytes           {}", self.wasted_bytes);
            if self.recommendations.is_empty() {
                println!("  none");
            }
            for advice in &self.recommendations {
                println!("  - {advice}");
            }
        }
        println!("==========================================================");
    }

    /// Prints all statistics sections to stdout.
    ///
    /// Equivalent to `print_sections(&[])`.
    pub fn print(&self) {
        self.print_sections(&[]);
    }
}
