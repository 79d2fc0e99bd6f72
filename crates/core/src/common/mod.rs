//! Common types shared by every engine.
//!
//! This module provides the fundamental building blocks of the simulator:
//! 1. **Identifiers:** Strong types for block, process, frame and segment ids.
//! 2. **Clock:** The deterministic event counter used for FIFO age and LRU recency.
//! 3. **Constants:** Address-space and frame-pool limits.
//! 4. **Error Handling:** The `SimError` taxonomy and `SimResult` alias.

/// Deterministic simulation clock.
pub mod clock;

/// Global simulation constants.
pub mod constants;

/// Error taxonomy.
pub mod error;

/// Identifier newtypes.
pub mod ids;

pub use clock::{SimClock, Tick};
pub use error::{AllocationFailure, SimError, SimResult};
pub use ids::{BlockId, FrameId, IdCounter, ProcessId, SegmentId};
