//! Simulation facade and its read/persist surfaces.
//!
//! Provides the `Simulator` command surface, the process table it maintains, owned
//! snapshots for rendering and the persisted scenario schema.

/// Process table derived from blocks and page tables.
pub mod process;

/// Persisted scenario schema and validation.
pub mod scenario;

/// The simulator facade.
pub mod simulator;

/// Owned state snapshots.
pub mod snapshot;

pub use scenario::Scenario;
pub use simulator::{Allocation, Simulator, Termination};
pub use snapshot::Snapshot;
