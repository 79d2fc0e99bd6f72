//! Persisted scenario schema.
//!
//! A scenario is the camelCase JSON record a front end saves and reloads. The required
//! part (`memorySize`, `blocks`, `currentPolicy`, `pagingConfig`, `segments`) is enough to
//! rebuild a usable simulation; the optional part (page tables, tick, cursor, counters,
//! usage history and id counters) makes a save-then-load reproduce the snapshot exactly.
//!
//! Loading never repairs anything. Every structural invariant is checked
//! and a complete replacement simulator is built before the running one is swapped out.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::process::ProcessTable;
use super::simulator::Simulator;
use crate::alloc::AllocationEngine;
use crate::alloc::address_space::{AddressSpace, Block, BlockStatus};
use crate::common::{
    BlockId, IdCounter, ProcessId, SegmentId, SimClock, SimError, SimResult, Tick,
};
use crate::config::{AllocationPolicy, PagingConfig, ReplacementPolicy, SimConfig};
use crate::paging::PagingEngine;
use crate::paging::page_table::{PageTable, PageTableEntry};
use crate::segmentation::{Segment, SegmentationEngine};
use crate::stats::{SimStats, UsageHistory, UsageSample};

/// A persisted block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedBlock {
    /// First byte.
    pub start: u64,
    /// Length in bytes.
    pub size: u64,
    /// `"free"` or `"allocated"`.
    pub status: BlockStatus,
    /// Owner; present iff allocated.
    #[serde(default)]
    pub process_id: Option<ProcessId>,
    /// Block id.
    pub block_id: BlockId,
}

/// Persisted paging configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedPaging {
    /// Page and frame size.
    pub page_size: u64,
    /// Frame count.
    pub num_frames: u32,
    /// `"FIFO"` or `"LRU"`.
    pub replacement_policy: ReplacementPolicy,
}

/// A persisted segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSegment {
    /// Unique name.
    pub name: String,
    /// Requested size in bytes.
    pub size: u64,
    /// Backing pages in order.
    pub page_ids: Vec<u64>,
    /// Owning process.
    pub process_id: ProcessId,
    /// Segment id; minted on load when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_id: Option<SegmentId>,
}

/// A persisted page table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedPageTable {
    /// Owning process.
    pub process_id: ProcessId,
    /// Touched pages.
    pub entries: Vec<PageTableEntry>,
}

/// The persisted simulation record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    /// Size of the address space.
    pub memory_size: u64,
    /// Blocks in address order.
    pub blocks: Vec<PersistedBlock>,
    /// Placement policy.
    pub current_policy: AllocationPolicy,
    /// Paging configuration.
    pub paging_config: PersistedPaging,
    /// Live segments in creation order.
    pub segments: Vec<PersistedSegment>,

    /// Fragment threshold; the configuration default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragment_threshold: Option<u64>,
    /// Page tables; empty when absent.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub page_tables: Vec<PersistedPageTable>,
    /// Clock value; the newest entry tick when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tick: Option<Tick>,
    /// Next-fit resume address.
    #[serde(default)]
    pub next_fit_cursor: u64,
    /// Running counters; derived from the blocks and segments when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<SimStats>,
    /// Allocated-bytes samples; empty when absent.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub usage_history: Vec<UsageSample>,
    /// Next block id to mint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_block_id: Option<u32>,
    /// Next segment id to mint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_segment_id: Option<u32>,
    /// Next anonymous process id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_process_id: Option<u32>,
}

impl Scenario {
    /// Parses a scenario from JSON.
    ///
    /// # Errors
    ///
    /// `ConfigLoadInvalid` carrying the parser message.
    pub fn from_json(json: &str) -> SimResult<Self> {
        serde_json::from_str(json).map_err(|e| SimError::ConfigLoadInvalid(e.to_string()))
    }

    /// Serializes the scenario as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// `ConfigLoadInvalid` if serialization fails.
    pub fn to_json(&self) -> SimResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| SimError::ConfigLoadInvalid(e.to_string()))
    }

    /// Captures the complete state of `sim`.
    pub(crate) fn capture(sim: &Simulator) -> Self {
        let paging = sim.paging.config();
        Self {
            memory_size: sim.alloc.space().memory_size(),
            blocks: sim
                .alloc
                .blocks()
                .iter()
                .map(|b| PersistedBlock {
                    start: b.start,
                    size: b.size,
                    status: b.status,
                    process_id: b.owner,
                    block_id: b.id,
                })
                .collect(),
            current_policy: sim.alloc.policy(),
            paging_config: PersistedPaging {
                page_size: paging.page_size,
                num_frames: paging.num_frames,
                replacement_policy: paging.replacement_policy,
            },
            segments: sim
                .segments
                .segments()
                .iter()
                .map(|s| PersistedSegment {
                    name: s.name.clone(),
                    size: s.size,
                    page_ids: s.page_ids.clone(),
                    process_id: s.owner,
                    segment_id: Some(s.id),
                })
                .collect(),
            fragment_threshold: Some(sim.fragment_threshold),
            page_tables: sim
                .paging
                .page_tables()
                .iter()
                .map(|(&process_id, table)| PersistedPageTable {
                    process_id,
                    entries: table.entries().copied().collect(),
                })
                .collect(),
            tick: Some(sim.clock.now()),
            next_fit_cursor: sim.alloc.next_fit_cursor(),
            statistics: Some(sim.stats),
            usage_history: sim.usage.samples().to_vec(),
            next_block_id: Some(sim.alloc.block_ids().peek()),
            next_segment_id: Some(sim.segments.segment_ids().peek()),
            next_process_id: Some(sim.processes.counter().peek()),
        }
    }

    /// Validates the scenario and builds the simulator it describes.
    ///
    /// # Errors
    ///
    /// A description of the first structural violation found.
    pub(crate) fn restore(&self) -> Result<Simulator, String> {
        let paging_config = PagingConfig::new(
            self.paging_config.page_size,
            self.paging_config.num_frames,
            self.paging_config.replacement_policy,
        );
        let mut config = SimConfig {
            memory_size: self.memory_size,
            allocation_policy: self.current_policy,
            paging: paging_config,
            ..SimConfig::default()
        };
        if let Some(threshold) = self.fragment_threshold {
            config.fragment_threshold = threshold;
        }
        config.validate().map_err(|e| e.to_string())?;

        let alloc = self.restore_blocks()?;
        let (paging, newest_tick) = self.restore_pages(paging_config)?;
        let segments = self.restore_segments(paging_config)?;

        let tick = match self.tick {
            Some(tick) if tick < newest_tick => {
                return Err(format!(
                    "tick {tick} is older than a page access at tick {newest_tick}"
                ));
            }
            Some(tick) => tick,
            None => newest_tick,
        };

        let usage = UsageHistory::from_samples(self.usage_history.clone(), tick)?;

        let stats = self.statistics.unwrap_or_else(|| SimStats {
            segments_created: segments.segments().len() as u64,
            ..SimStats::default()
        });
        let stats = SimStats {
            bytes_allocated: alloc.allocated_bytes(),
            peak_bytes_allocated: stats.peak_bytes_allocated.max(alloc.allocated_bytes()),
            ..stats
        };

        let mut processes =
            ProcessTable::with_counter(IdCounter::starting_at(self.next_process_id.unwrap_or(1)));
        processes.sync(alloc.blocks(), paging.page_tables());

        Ok(Simulator {
            clock: SimClock::at(tick),
            alloc,
            paging,
            segments,
            processes,
            stats,
            usage,
            fragment_threshold: config.fragment_threshold,
        })
    }

    fn restore_blocks(&self) -> Result<AllocationEngine, String> {
        let blocks: Vec<Block> = self
            .blocks
            .iter()
            .map(|b| Block {
                id: b.block_id,
                start: b.start,
                size: b.size,
                status: b.status,
                owner: b.process_id,
            })
            .collect();
        let space = AddressSpace::from_blocks(self.memory_size, blocks)?;

        if self.next_fit_cursor > self.memory_size {
            return Err(format!(
                "next-fit cursor {} lies outside memory of size {}",
                self.next_fit_cursor, self.memory_size
            ));
        }

        let past_ids = space
            .blocks()
            .iter()
            .map(|b| b.id.val().saturating_add(1))
            .max()
            .unwrap_or(1);
        let block_ids = match self.next_block_id {
            Some(next) if next < past_ids => {
                return Err(format!("next block id {next} is already in use"));
            }
            Some(next) => next,
            None => past_ids,
        };

        Ok(AllocationEngine::from_parts(
            space,
            self.current_policy,
            self.next_fit_cursor % self.memory_size,
            IdCounter::starting_at(block_ids),
        ))
    }

    fn restore_pages(&self, config: PagingConfig) -> Result<(PagingEngine, Tick), String> {
        let mut tables = BTreeMap::new();
        let mut newest: Tick = 0;
        for persisted in &self.page_tables {
            let mut pages = BTreeSet::new();
            for entry in &persisted.entries {
                if !pages.insert(entry.virtual_page) {
                    return Err(format!(
                        "{} has two entries for page {}",
                        persisted.process_id, entry.virtual_page
                    ));
                }
                if entry.is_resident() && entry.loaded_tick > entry.last_access_tick {
                    return Err(format!(
                        "{} page {} was loaded after its last access",
                        persisted.process_id, entry.virtual_page
                    ));
                }
                newest = newest.max(entry.last_access_tick);
            }
            let table: PageTable = persisted.entries.iter().copied().collect();
            if tables.insert(persisted.process_id, table).is_some() {
                return Err(format!("duplicate page table for {}", persisted.process_id));
            }
        }
        let engine = PagingEngine::from_tables(config, tables)?;
        Ok((engine, newest))
    }

    fn restore_segments(&self, config: PagingConfig) -> Result<SegmentationEngine, String> {
        let mut names = BTreeSet::new();
        let mut ids = BTreeSet::new();
        let mut minted = IdCounter::starting_at(
            self.segments
                .iter()
                .filter_map(|s| s.segment_id)
                .map(|id| id.val().saturating_add(1))
                .max()
                .unwrap_or(1),
        );

        let mut segments = Vec::with_capacity(self.segments.len());
        for s in &self.segments {
            if !names.insert(s.name.as_str()) {
                return Err(format!("duplicate segment name '{}'", s.name));
            }
            if s.size == 0 {
                return Err(format!("segment '{}' has zero size", s.name));
            }
            let expected = config.pages_for(s.size);
            if s.page_ids.len() as u64 != expected {
                return Err(format!(
                    "segment '{}' of size {} lists {} pages, expected {expected}",
                    s.name,
                    s.size,
                    s.page_ids.len()
                ));
            }
            let id = s
                .segment_id
                .unwrap_or_else(|| SegmentId::new(minted.mint()));
            if !ids.insert(id) {
                return Err(format!("duplicate segment id {id}"));
            }
            segments.push(Segment {
                id,
                name: s.name.clone(),
                size: s.size,
                page_ids: s.page_ids.clone(),
                owner: s.process_id,
            });
        }

        let next = match self.next_segment_id {
            Some(next) if next < minted.peek() => {
                return Err(format!("next segment id {next} is already in use"));
            }
            Some(next) => next,
            None => minted.peek(),
        };
        Ok(SegmentationEngine::from_parts(
            segments,
            IdCounter::starting_at(next),
        ))
    }
}
