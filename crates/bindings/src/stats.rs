//! Statistics Python binding.
//!
//! Exposes the statistics report to Python: getters for the headline counters and ratios,
//! `print` / `print_sections` for human-readable output and `to_dict` for export.

use memsim_core::stats::StatsReport;
use pyo3::prelude::*;

use crate::conversion::to_py;

/// Python-exposed statistics: a frozen `StatsReport` taken when `stats()` was called.
#[pyclass(name = "Stats")]
#[derive(Clone, Debug)]
pub struct PyStats {
    /// The wrapped report.
    pub inner: StatsReport,
}

#[pymethods]
impl PyStats {
    /// Print all stats (full dump).
    fn print(&self) {
        self.inner.print();
    }

    /// Print only the given sections. Options: "summary", "allocation", "paging", "segmentation",
    /// "recommendations".
    /// Pass an empty list for full dump.
    fn print_sections(&self, sections: Vec<String>) {
        self.inner.print_sections(&sections);
    }

    #[getter]
    fn allocations(&self) -> u64 {
        self.inner.counters.allocations
    }
    #[getter]
    fn failed_allocations(&self) -> u64 {
        self.inner.counters.failed_allocations
    }
    #[getter]
    fn deallocations(&self) -> u64 {
        self.inner.counters.deallocations
    }
    #[getter]
    fn bytes_allocated(&self) -> u64 {
        self.inner.counters.bytes_allocated
    }
    #[getter]
    fn peak_bytes_allocated(&self) -> u64 {
        self.inner.counters.peak_bytes_allocated
    }
    #[getter]
    fn page_faults(&self) -> u64 {
        self.inner.counters.page_faults
    }
    #[getter]
    fn page_hits(&self) -> u64 {
        self.inner.counters.page_hits
    }
    #[getter]
    fn evictions(&self) -> u64 {
        self.inner.counters.evictions
    }
    #[getter]
    fn hit_ratio(&self) -> f64 {
        self.inner.hit_ratio
    }
    #[getter]
    fn fault_ratio(&self) -> f64 {
        self.inner.fault_ratio
    }
    #[getter]
    fn external_fragmentation(&self) -> f64 {
        self.inner.fragmentation.external_pct
    }
    #[getter]
    fn internal_fragmentation(&self) -> u64 {
        self.inner.internal_fragmentation
    }
    #[getter]
    fn wasted_bytes(&self) -> u64 {
        self.inner.wasted_bytes
    }
    /// `(tick, bytes)` pairs, oldest first.
    #[getter]
    fn usage_history(&self) -> Vec<(u64, u64)> {
        self.inner
            .usage_history
            .samples()
            .iter()
            .map(|s| (s.tick, s.bytes))
            .collect()
    }
    #[getter]
    fn recommendations(&self) -> Vec<String> {
        self.inner
            .recommendations
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    /// Export all stats as a Python dict (JSON-serializable).
    fn to_dict(&self, py: Python<'_>) -> PyResult<PyObject> {
        to_py(py, &self.inner)
    }
}

impl From<StatsReport> for PyStats {
    fn from(inner: StatsReport) -> Self {
        Self { inner }
    }
}
