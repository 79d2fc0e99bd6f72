//! Physical frame pool.
//!
//! A fixed array of frames indexed by `FrameId`. A frame is either free or holds exactly
//! one `(process, virtual page)` occupant. Free frames are handed out lowest id first.

use serde::{Deserialize, Serialize};

use crate::common::{FrameId, ProcessId};

/// A `(process, virtual page)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PageRef {
    /// Owning process.
    pub process: ProcessId,
    /// Virtual page number within the process.
    pub page: u64,
}

impl PageRef {
    /// Creates a page reference.
    pub const fn new(process: ProcessId, page: u64) -> Self {
        Self { process, page }
    }
}

/// One physical frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// Frame index.
    pub id: FrameId,
    /// Resident page, if any.
    pub occupant: Option<PageRef>,
}

/// Fixed pool of physical frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameTable {
    frames: Vec<Frame>,
}

impl FrameTable {
    /// Creates `num_frames` empty frames.
    pub fn new(num_frames: u32) -> Self {
        Self {
            frames: (0..num_frames)
                .map(|i| Frame {
                    id: FrameId(i),
                    occupant: None,
                })
                .collect(),
        }
    }

    /// All frames in id order.
    #[inline]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Number of frames in the pool.
    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns `true` for an empty pool.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Looks up a frame; `None` when the id is out of range.
    pub fn get(&self, id: FrameId) -> Option<&Frame> {
        self.frames.get(id.index())
    }

    /// Lowest-numbered free frame.
    pub fn first_free(&self) -> Option<FrameId> {
        self.frames
            .iter()
            .find(|f| f.occupant.is_none())
            .map(|f| f.id)
    }

    /// Number of occupied frames.
    pub fn occupied(&self) -> usize {
        self.frames.iter().filter(|f| f.occupant.is_some()).count()
    }

    /// Places `occupant` in `id`, returning the previous occupant. Out-of-range ids are
    /// ignored.
    pub(crate) fn occupy(&mut self, id: FrameId, occupant: PageRef) -> Option<PageRef> {
        self.frames
            .get_mut(id.index())
            .and_then(|f| f.occupant.replace(occupant))
    }

    /// Empties `id`, returning what it held.
    pub(crate) fn release(&mut self, id: FrameId) -> Option<PageRef> {
        self.frames.get_mut(id.index()).and_then(|f| f.occupant.take())
    }
}
