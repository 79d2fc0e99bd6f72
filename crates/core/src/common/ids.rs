//! Identifier types.
//!
//! This module defines strong types for the identifiers handed out by the engines so
//! that a block id can never be passed where a frame id is expected. It provides:
//! 1. **Type Safety:** Distinct newtypes for blocks, processes, frames and segments.
//! 2. **Display:** Short human-readable forms (`B7`, `P3`, `F2`, `S1`) matching what a UI shows.
//! 3. **Serialization:** Transparent serde encoding as the raw integer.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// Creates a new identifier from its raw value.
            #[inline(always)]
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// Returns the raw integer value.
            #[inline(always)]
            pub const fn val(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

define_id!(
    /// Identifier of a block in the address space.
    ///
    /// Every block carries one, free or allocated. Allocations always mint a fresh id.
    BlockId,
    "B"
);

define_id!(
    /// Identifier of a simulated process.
    ProcessId,
    "P"
);

define_id!(
    /// Index of a physical frame in the frame table.
    FrameId,
    "F"
);

define_id!(
    /// Identifier of a segment, minted in creation order.
    SegmentId,
    "S"
);

impl FrameId {
    /// Returns the frame index as a `usize` for table indexing.
    #[inline(always)]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Monotonic id generator.
///
/// Engines keep one per id space. The next value is persisted with a scenario so that
/// ids minted after a reload never collide with ids minted before the save.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdCounter(u32);

impl IdCounter {
    /// Starts a counter whose first minted value is `first`.
    pub const fn starting_at(first: u32) -> Self {
        Self(first)
    }

    /// Returns the next value without consuming it.
    pub const fn peek(self) -> u32 {
        self.0
    }

    /// Mints the next raw value.
    pub fn mint(&mut self) -> u32 {
        let raw = self.0;
        self.0 += 1;
        raw
    }
}

impl Default for IdCounter {
    fn default() -> Self {
        Self::starting_at(1)
    }
}
