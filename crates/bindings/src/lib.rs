//! Python bindings for the memory management simulator.
//!
//! This crate exposes the simulator to Python via PyO3. It provides:
//! 1. **Simulator:** `Simulator` with one method per allocation, paging and segmentation command.
//! 2. **Statistics:** `Stats` for counters, ratios and selective section printing.
//! 3. **Utilities:** Version string and conversion helpers for Python↔Rust types.
//!
//! Logging goes through `tracing`; set `RUST_LOG=memsim_core=debug` to see engine events.

use pyo3::prelude::*;

/// Python dict and JSON conversion, error mapping.
pub mod conversion;
/// Simulator binding (`PySimulator`).
pub mod simulator;
/// Statistics binding (`PyStats`).
pub mod stats;
/// Utility functions (e.g., version).
pub mod utils;

/// Registers all simulator classes and functions onto the given Python module.
///
/// # Errors
///
/// A `PyErr` if registration fails.
pub fn register_simulator_module(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<simulator::PySimulator>()?;
    m.add_class::<stats::PyStats>()?;

    m.add_function(wrap_pyfunction!(utils::version, m)?)?;

    Ok(())
}

#[pymodule]
fn memsim(m: &Bound<'_, PyModule>) -> PyResult<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
    register_simulator_module(m)?;
    Ok(())
}
