//! Per-process page tables.
//!
//! Entries exist only for pages the process has touched. An entry whose `frame` is `None`
//! was evicted; touching it again faults.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::common::{FrameId, Tick};

/// Mapping state of one virtual page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageTableEntry {
    /// Virtual page number.
    pub virtual_page: u64,
    /// Backing frame, `None` when not resident.
    pub frame: Option<FrameId>,
    /// Tick of the most recent access (hit or fault).
    pub last_access_tick: Tick,
    /// Tick of the fault that made the page resident.
    #[serde(default)]
    pub loaded_tick: Tick,
}

impl PageTableEntry {
    /// Returns `true` when the page currently occupies a frame.
    #[inline]
    pub const fn is_resident(&self) -> bool {
        self.frame.is_some()
    }
}

/// Page table of one process, keyed by virtual page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageTable {
    entries: BTreeMap<u64, PageTableEntry>,
}

impl PageTable {
    /// Entry for `page`, if touched.
    pub fn get(&self, page: u64) -> Option<&PageTableEntry> {
        self.entries.get(&page)
    }

    pub(crate) fn get_mut(&mut self, page: u64) -> Option<&mut PageTableEntry> {
        self.entries.get_mut(&page)
    }

    pub(crate) fn insert(&mut self, entry: PageTableEntry) {
        let _ = self.entries.insert(entry.virtual_page, entry);
    }

    /// Entries in virtual page order.
    pub fn entries(&self) -> impl Iterator<Item = &PageTableEntry> {
        self.entries.values()
    }

    /// Touched page numbers in order.
    pub fn pages(&self) -> impl Iterator<Item = u64> {
        self.entries.keys().copied()
    }

    /// Entries that currently hold a frame.
    pub fn resident(&self) -> impl Iterator<Item = &PageTableEntry> {
        self.entries.values().filter(|e| e.is_resident())
    }

    /// Highest touched page number.
    pub fn highest_page(&self) -> Option<u64> {
        self.entries.keys().next_back().copied()
    }

    /// Number of touched pages.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no page was touched.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<PageTableEntry> for PageTable {
    fn from_iter<I: IntoIterator<Item = PageTableEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|e| (e.virtual_page, e)).collect(),
        }
    }
}
