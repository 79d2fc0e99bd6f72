//! Error definitions.
//!
//! This module defines the error taxonomy shared by every engine. It provides:
//! 1. **One kind per failure:** Each variant names exactly one reason a command was refused,
//!    so a front end can render a message from the kind alone.
//! 2. **Recoverability:** No variant describes corrupted state. Engines validate before
//!    mutating, so the simulation is fully usable after any error.
//! 3. **Error Handling:** Integrates with `std::error::Error` through `thiserror`.

use thiserror::Error;

use super::ids::{BlockId, ProcessId};

/// Reason an allocation request could not be placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllocationFailure {
    /// No free block satisfies the placement policy's predicate.
    NoSuitableBlock,
    /// The request is larger than the whole address space and can never succeed.
    ExceedsMemory,
}

impl std::fmt::Display for AllocationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSuitableBlock => write!(f, "no free block large enough"),
            Self::ExceedsMemory => write!(f, "request exceeds total memory"),
        }
    }
}

/// Errors returned by simulator commands.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SimError {
    /// The allocation request could not be satisfied.
    #[error("allocation failed: {0}")]
    AllocationFailed(AllocationFailure),

    /// The deallocation target is unknown or not currently allocated.
    #[error("block {0} is not allocated")]
    InvalidBlock(BlockId),

    /// The command references a process that does not exist.
    #[error("unknown process {0}")]
    InvalidProcess(ProcessId),

    /// Page size or frame count is zero.
    #[error("invalid paging configuration: page_size={page_size}, num_frames={num_frames}")]
    PagingConfigInvalid {
        /// Rejected page size.
        page_size: u64,
        /// Rejected frame count.
        num_frames: u32,
    },

    /// Total memory size is zero.
    #[error("invalid memory size: {0}")]
    MemorySizeInvalid(u64),

    /// A zero-sized allocation or segment was requested.
    #[error("size must be positive")]
    InvalidSize,

    /// A live segment already uses this name.
    #[error("segment name '{0}' is already in use")]
    SegmentNameConflict(String),

    /// No live segment has this name.
    #[error("segment '{0}' not found")]
    SegmentNotFound(String),

    /// An explicitly placed segment overlaps a live segment of the same process.
    #[error("segment '{name}' overlaps virtual page {page} of segment '{existing}'")]
    SegmentPageConflict {
        /// Name of the segment being created.
        name: String,
        /// Name of the live segment that already covers the page.
        existing: String,
        /// First clashing virtual page.
        page: u64,
    },

    /// A persisted scenario is malformed or violates a structural invariant.
    #[error("invalid scenario: {0}")]
    ConfigLoadInvalid(String),
}

impl SimError {
    /// Short, stable name of the error kind (used by front ends to pick a message).
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::AllocationFailed(_) => "AllocationFailed",
            Self::InvalidBlock(_) => "InvalidBlock",
            Self::InvalidProcess(_) => "InvalidProcess",
            Self::PagingConfigInvalid { .. } => "PagingConfigInvalid",
            Self::MemorySizeInvalid(_) => "MemorySizeInvalid",
            Self::InvalidSize => "InvalidSize",
            Self::SegmentNameConflict(_) => "SegmentNameConflict",
            Self::SegmentNotFound(_) => "SegmentNotFound",
            Self::SegmentPageConflict { .. } => "SegmentPageConflict",
            Self::ConfigLoadInvalid(_) => "ConfigLoadInvalid",
        }
    }
}

/// Result alias used throughout the crate.
pub type SimResult<T> = Result<T, SimError>;
