//! Mock implementations of engine traits.

/// Mock page replacement policy.
pub mod replacement;
