//! # Unit Components
//!
//! This module serves as the central hub for the engine-level tests, organised the
//! same way as the crate: allocation, paging, segmentation, and the facade on top.


/// Configuration defaults, deserialization and validation.
pub mod config;

/// Paging engine tests: demand paging, FIFO/LRU replacement, process unmapping.
pub mod paging;


/// Segmentation engine tests.
pub mod segmentation;
