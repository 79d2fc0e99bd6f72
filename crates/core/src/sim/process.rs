//! Process table.
//!
//! A process is not created explicitly: it exists while it owns at least one block or has
//! touched at least one page. The table is re-derived from the engines after every
//! command, so it can never drift from the blocks and page tables it summarises.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::alloc::address_space::Block;
use crate::common::{BlockId, IdCounter, ProcessId};
use crate::paging::page_table::PageTable;

/// A simulated process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Process {
    /// Process id.
    pub id: ProcessId,
    /// Allocated blocks owned by the process.
    pub blocks: BTreeSet<BlockId>,
    /// Virtual pages the process has touched.
    pub pages: BTreeSet<u64>,
    /// Bytes held in `blocks`.
    pub allocated_bytes: u64,
}

impl Process {
    fn new(id: ProcessId) -> Self {
        Self {
            id,
            blocks: BTreeSet::new(),
            pages: BTreeSet::new(),
            allocated_bytes: 0,
        }
    }
}

/// Live processes plus the counter used to name new ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessTable {
    processes: BTreeMap<ProcessId, Process>,
    ids: IdCounter,
}

impl ProcessTable {
    /// Creates an empty table whose first minted id is `ids.peek()`.
    pub const fn with_counter(ids: IdCounter) -> Self {
        Self {
            processes: BTreeMap::new(),
            ids,
        }
    }

    /// The id the next anonymous allocation will receive.
    ///
    /// This is the counter value unless a live process already holds it, which happens once
    /// the counter has been pushed to `u32::MAX`; the lowest unused id is taken instead.
    /// It is consumed by the process-table sync that follows a successful allocation.
    /// Returns `None` only when every id is live.
    pub fn next_id(&self) -> Option<ProcessId> {
        let preferred = ProcessId(self.ids.peek());
        if !self.processes.contains_key(&preferred) {
            return Some(preferred);
        }
        (1..=u32::MAX)
            .map(ProcessId)
            .find(|id| !self.processes.contains_key(id))
    }

    /// Id counter for anonymous processes.
    pub const fn counter(&self) -> IdCounter {
        self.ids
    }

    /// Returns `true` if `id` owns a block or a page.
    pub fn contains(&self, id: ProcessId) -> bool {
        self.processes.contains_key(&id)
    }

    /// Looks up a live process.
    pub fn get(&self, id: ProcessId) -> Option<&Process> {
        self.processes.get(&id)
    }

    /// Live processes in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Process> {
        self.processes.values()
    }

    /// Number of live processes.
    pub fn len(&self) -> usize {
        self.processes.len()
    }

    /// Returns `true` when no process is live.
    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    /// Rebuilds the table from the block list and the page tables.
    ///
    /// The id counter is pushed past every live id, so an anonymous allocation never
    /// reuses the id of a process created with an explicit id.
    pub(crate) fn sync(&mut self, blocks: &[Block], tables: &BTreeMap<ProcessId, PageTable>) {
        self.processes.clear();
        for block in blocks {
            if let Some(owner) = block.owner {
                let process = self
                    .processes
                    .entry(owner)
                    .or_insert_with(|| Process::new(owner));
                let _ = process.blocks.insert(block.id);
                process.allocated_bytes += block.size;
            }
        }
        for (&id, table) in tables.iter().filter(|(_, t)| !t.is_empty()) {
            self.processes
                .entry(id)
                .or_insert_with(|| Process::new(id))
                .pages
                .extend(table.pages());
        }
        if let Some(highest) = self.processes.keys().next_back()
            && highest.val() >= self.ids.peek()
        {
            self.ids = IdCounter::starting_at(highest.val().saturating_add(1));
        }
    }

    /// Forgets every process and restarts id minting.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
