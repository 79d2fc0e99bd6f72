//! Utility functions exposed to Python.

use pyo3::prelude::*;

/// Returns the simulator version string.
#[pyfunction]
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
