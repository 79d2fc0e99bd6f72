//! Segmentation layered on paging.
//!
//! A segment is a named run of consecutive virtual pages of one process. Creating a
//! segment touches each of its pages through the paging engine; the segment itself only
//! remembers the page numbers. Frames and page-table entries stay with the paging engine,
//! so deleting a segment leaves its pages resident until replacement evicts them.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::common::constants::MAX_SEGMENT_PAGES;
use crate::common::{IdCounter, ProcessId, SegmentId, SimClock, SimError, SimResult};
use crate::paging::{AccessOutcome, PagingEngine};

/// A live segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    /// Creation-order identifier.
    pub id: SegmentId,
    /// Unique name among live segments.
    pub name: String,
    /// Requested size in bytes.
    pub size: u64,
    /// Backing virtual pages, in order.
    pub page_ids: Vec<u64>,
    /// Owning process.
    #[serde(rename = "processId")]
    pub owner: ProcessId,
}

impl Segment {
    /// Bytes of the last page left unused: `pages * page_size - size`.
    pub fn internal_fragmentation(&self, page_size: u64) -> u64 {
        (self.page_ids.len() as u64 * page_size).saturating_sub(self.size)
    }

    fn overlaps(&self, first: u64, last: u64) -> Option<u64> {
        self.page_ids
            .iter()
            .copied()
            .find(|&p| (first..=last).contains(&p))
    }
}

/// Outcome of a successful segment creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedSegment {
    /// Id of the new segment.
    pub id: SegmentId,
    /// Pages backing it.
    pub pages: Vec<u64>,
    /// Paging outcome for each page, in page order.
    pub accesses: Vec<AccessOutcome>,
}

impl CreatedSegment {
    /// Number of page faults the creation caused.
    pub fn faults(&self) -> usize {
        self.accesses.iter().filter(|a| a.is_fault()).count()
    }
}

/// Segment table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentationEngine {
    segments: Vec<Segment>,
    ids: IdCounter,
}

impl SegmentationEngine {
    /// Creates an empty segment table.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) const fn from_parts(segments: Vec<Segment>, ids: IdCounter) -> Self {
        Self { segments, ids }
    }

    /// Live segments in creation order.
    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Looks up a live segment by name.
    pub fn get(&self, name: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.name == name)
    }

    /// Id counter for the next segment.
    #[inline]
    pub const fn segment_ids(&self) -> IdCounter {
        self.ids
    }

    /// Creates a segment after every page `owner` already uses.
    ///
    /// # Errors
    ///
    /// `SegmentNameConflict` or `InvalidSize`; see [`Self::create_segment_at`].
    pub fn create_segment(
        &mut self,
        name: &str,
        size: u64,
        owner: ProcessId,
        paging: &mut PagingEngine,
        clock: &mut SimClock,
    ) -> SimResult<CreatedSegment> {
        let base = self.next_free_page(owner, paging);
        self.create_segment_at(name, size, owner, base, paging, clock)
    }

    /// Creates a segment whose first page is `base_page`.
    ///
    /// Issues one page access per page through `paging`, advancing `clock` each time.
    /// Every check runs before the first page is touched.
    ///
    /// # Errors
    ///
    /// * `SegmentNameConflict` - a live segment already has `name`.
    /// * `InvalidSize` - `size` is zero, needs more than [`MAX_SEGMENT_PAGES`] pages, or the
    ///   pages would run past the last page number.
    /// * `SegmentPageConflict` - a live segment of `owner` already covers one of the pages.
    pub fn create_segment_at(
        &mut self,
        name: &str,
        size: u64,
        owner: ProcessId,
        base_page: u64,
        paging: &mut PagingEngine,
        clock: &mut SimClock,
    ) -> SimResult<CreatedSegment> {
        if self.get(name).is_some() {
            warn!(segment = name, "segment name already in use");
            return Err(SimError::SegmentNameConflict(name.to_owned()));
        }
        if size == 0 {
            warn!(segment = name, "rejected zero-sized segment");
            return Err(SimError::InvalidSize);
        }
        let count = paging.config().pages_for(size);
        if count > MAX_SEGMENT_PAGES {
            warn!(segment = name, size, pages = count, "segment spans too many pages");
            return Err(SimError::InvalidSize);
        }
        let Some(last_page) = base_page.checked_add(count - 1) else {
            warn!(segment = name, base_page, size, "segment runs past the last page");
            return Err(SimError::InvalidSize);
        };
        if let Some((existing, page)) = self
            .segments
            .iter()
            .filter(|s| s.owner == owner)
            .find_map(|s| s.overlaps(base_page, last_page).map(|p| (s, p)))
        {
            warn!(segment = name, existing = %existing.name, page, "segment pages overlap");
            return Err(SimError::SegmentPageConflict {
                name: name.to_owned(),
                existing: existing.name.clone(),
                page,
            });
        }

        let pages: Vec<u64> = (base_page..=last_page).collect();
        let accesses = pages
            .iter()
            .map(|&page| paging.access_page(owner, page, clock.advance()))
            .collect();

        let id = SegmentId::new(self.ids.mint());
        self.segments.push(Segment {
            id,
            name: name.to_owned(),
            size,
            page_ids: pages.clone(),
            owner,
        });
        debug!(segment = %id, name, process = %owner, size, base_page, pages = count, "segment created");
        Ok(CreatedSegment {
            id,
            pages,
            accesses,
        })
    }

    /// Removes a segment. Its pages stay mapped in the paging engine.
    ///
    /// # Errors
    ///
    /// `SegmentNotFound` if no live segment has `name`.
    pub fn delete_segment(&mut self, name: &str) -> SimResult<Segment> {
        let Some(index) = self.segments.iter().position(|s| s.name == name) else {
            warn!(segment = name, "segment not found");
            return Err(SimError::SegmentNotFound(name.to_owned()));
        };
        let segment = self.segments.remove(index);
        debug!(segment = %segment.id, name, process = %segment.owner, "segment deleted");
        Ok(segment)
    }

    /// Removes every segment owned by `owner`, returning how many were removed.
    pub fn remove_process(&mut self, owner: ProcessId) -> usize {
        let before = self.segments.len();
        self.segments.retain(|s| s.owner != owner);
        before - self.segments.len()
    }

    /// First page after every page `owner` uses in its page table or live segments.
    pub fn next_free_page(&self, owner: ProcessId, paging: &PagingEngine) -> u64 {
        let in_segments = self
            .segments
            .iter()
            .filter(|s| s.owner == owner)
            .filter_map(|s| s.page_ids.last().copied())
            .max();
        in_segments
            .max(paging.highest_page(owner))
            .map_or(0, |p| p.saturating_add(1))
    }

    /// Sum of internal fragmentation over live segments.
    pub fn internal_fragmentation(&self, page_size: u64) -> u64 {
        self.segments
            .iter()
            .map(|s| s.internal_fragmentation(page_size))
            .sum()
    }

    /// Empties the segment table and restarts id minting.
    pub fn reset(&mut self) {
        self.segments.clear();
        self.ids = IdCounter::default();
    }
}
