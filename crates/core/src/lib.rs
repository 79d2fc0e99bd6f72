//! Memory management simulation library.
//!
//! This crate simulates how an operating system manages memory, with the following:
//! 1. **Allocation:** Contiguous blocks under first-fit, best-fit, worst-fit and next-fit placement.
//! 2. **Paging:** Per-process page tables over a fixed frame pool with FIFO or LRU replacement.
//! 3. **Segmentation:** Named segments backed by consecutive virtual pages.
//! 4. **Simulation:** One facade owning every engine, snapshots, statistics and scenario persistence.
//!
//! Every command is synchronous and deterministic: the simulation clock counts events,
//! never wall-clock time, so replaying a command sequence reproduces the same state.

/// Allocation engine, address space and placement policies.
pub mod alloc;
/// Common types (identifiers, clock, errors, limits).
pub mod common;
/// Simulator configuration (defaults, policy enums, paging parameters).
pub mod config;
/// Paging engine, frame table, page tables and replacement policies.
pub mod paging;
/// Segmentation engine.
pub mod segmentation;
/// Simulation facade, snapshots and persisted scenarios.
pub mod sim;
/// Simulation statistics collection and reporting.
pub mod stats;

/// Error taxonomy shared by every command.
pub use crate::common::{SimError, SimResult};
/// Root configuration type; use `SimConfig::default()` or deserialize from JSON.
pub use crate::config::SimConfig;
/// Persisted scenario record.
pub use crate::sim::Scenario;
/// Top-level simulator; construct with `Simulator::new`.
pub use crate::sim::Simulator;
/// Owned view of the full simulation state.
pub use crate::sim::Snapshot;
