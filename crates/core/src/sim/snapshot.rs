//! Read-only view of the whole simulation.
//!
//! A `Snapshot` is an owned copy, safe to keep or serialize after further commands run.

use serde::{Deserialize, Serialize};

use super::process::Process;
use crate::alloc::address_space::Block;
use crate::common::{ProcessId, Tick};
use crate::config::{AllocationPolicy, PagingConfig};
use crate::paging::frame_table::Frame;
use crate::paging::page_table::PageTableEntry;
use crate::segmentation::Segment;
use crate::stats::StatsReport;

/// Page table of one process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageTableView {
    /// Owning process.
    pub process: ProcessId,
    /// Touched pages in page order.
    pub entries: Vec<PageTableEntry>,
}

/// Full simulator state at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Clock value after the latest event.
    pub tick: Tick,
    /// Size of the address space.
    pub memory_size: u64,
    /// Current placement policy.
    pub policy: AllocationPolicy,
    /// Paging configuration.
    pub paging: PagingConfig,
    /// Next-fit resume address.
    pub next_fit_cursor: u64,
    /// Blocks in address order.
    pub blocks: Vec<Block>,
    /// Live processes in id order.
    pub processes: Vec<Process>,
    /// Page tables in process order.
    pub page_tables: Vec<PageTableView>,
    /// Frames in id order.
    pub frames: Vec<Frame>,
    /// Live segments in creation order.
    pub segments: Vec<Segment>,
    /// Counters and derived metrics.
    pub statistics: StatsReport,
}

impl Snapshot {
    /// Serializes the snapshot as JSON for a front end.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error; the snapshot types serialize infallibly in practice.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
