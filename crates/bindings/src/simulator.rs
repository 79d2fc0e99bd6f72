//! Simulator Python binding.
//!
//! Exposes the core `Simulator` to Python: one method per command, with results returned
//! as plain dicts and refused commands raised as `ValueError(kind, message)`.

use memsim_core::common::{BlockId, ProcessId};
use memsim_core::config::SimConfig;
use memsim_core::{Scenario, Simulator};
use pyo3::exceptions::PyRuntimeError;
use pyo3::prelude::*;

use crate::conversion::{
    parse_allocation_policy, parse_replacement_policy, py_dict_to_config, sim_err, to_py,
};
use crate::stats::PyStats;

/// Python-exposed simulator.
#[pyclass(name = "Simulator")]
#[derive(Debug)]
pub struct PySimulator {
    /// The wrapped simulator.
    pub inner: Simulator,
}

#[pymethods]
impl PySimulator {
    /// Creates a simulator from an optional config dict; missing keys take their defaults.
    #[new]
    #[pyo3(signature = (config_dict=None))]
    fn new(py: Python<'_>, config_dict: Option<&Bound<'_, PyAny>>) -> PyResult<Self> {
        let config = match config_dict {
            Some(dict) => py_dict_to_config(py, dict)?,
            None => SimConfig::default(),
        };
        let inner = Simulator::new(&config).map_err(sim_err)?;
        Ok(Self { inner })
    }

    /// Current tick.
    #[getter]
    fn tick(&self) -> u64 {
        self.inner.tick()
    }

    /// Allocates for a new process. `policy` (e.g. `"worst_fit"`) becomes the current policy.
    #[pyo3(signature = (size, policy=None))]
    fn allocate(&mut self, py: Python<'_>, size: u64, policy: Option<&str>) -> PyResult<PyObject> {
        let policy = match policy {
            Some(name) => parse_allocation_policy(name)?,
            None => self.inner.config().allocation_policy,
        };
        let allocation = self.inner.allocate(size, policy).map_err(sim_err)?;
        to_py(py, &allocation)
    }

    /// Allocates for an existing or new process with the current policy.
    fn allocate_for(&mut self, py: Python<'_>, process: u32, size: u64) -> PyResult<PyObject> {
        let allocation = self
            .inner
            .allocate_for(ProcessId::new(process), size)
            .map_err(sim_err)?;
        to_py(py, &allocation)
    }

    /// Selects the placement policy for later allocations.
    fn set_policy(&mut self, policy: &str) -> PyResult<()> {
        self.inner.set_policy(parse_allocation_policy(policy)?);
        Ok(())
    }

    /// Frees one block and returns it as it was.
    fn deallocate(&mut self, py: Python<'_>, block: u32) -> PyResult<PyObject> {
        let freed = self
            .inner
            .deallocate(BlockId::new(block))
            .map_err(sim_err)?;
        to_py(py, &freed)
    }

    /// Frees every block of a process.
    fn deallocate_process(&mut self, py: Python<'_>, process: u32) -> PyResult<PyObject> {
        let freed = self
            .inner
            .deallocate_process(ProcessId::new(process))
            .map_err(sim_err)?;
        to_py(py, &freed)
    }

    /// Touches a virtual page; returns `{"kind": "hit"|"fault", ...}`.
    fn access_page(&mut self, py: Python<'_>, process: u32, page: u64) -> PyResult<PyObject> {
        let outcome = self.inner.access_page(ProcessId::new(process), page);
        to_py(py, &outcome)
    }

    /// Drops a process's page table; returns the number of frames released.
    fn unmap_process(&mut self, process: u32) -> PyResult<usize> {
        self.inner
            .unmap_process(ProcessId::new(process))
            .map_err(sim_err)
    }

    /// Frees every block, frame and segment of a process.
    fn terminate_process(&mut self, py: Python<'_>, process: u32) -> PyResult<PyObject> {
        let done = self
            .inner
            .terminate_process(ProcessId::new(process))
            .map_err(sim_err)?;
        to_py(py, &done)
    }

    /// Creates a segment, after the process's pages or at `base_page` when given.
    #[pyo3(signature = (name, size, process, base_page=None))]
    fn create_segment(
        &mut self,
        py: Python<'_>,
        name: &str,
        size: u64,
        process: u32,
        base_page: Option<u64>,
    ) -> PyResult<PyObject> {
        let process = ProcessId::new(process);
        let created = match base_page {
            Some(base) => self.inner.create_segment_at(name, size, process, base),
            None => self.inner.create_segment(name, size, process),
        }
        .map_err(sim_err)?;
        to_py(py, &created)
    }

    /// Deletes a segment by name.
    fn delete_segment(&mut self, py: Python<'_>, name: &str) -> PyResult<PyObject> {
        let segment = self.inner.delete_segment(name).map_err(sim_err)?;
        to_py(py, &segment)
    }

    /// Replaces the paging configuration, clearing pages and segments.
    #[pyo3(signature = (page_size, num_frames, replacement_policy="FIFO"))]
    fn set_paging_config(
        &mut self,
        page_size: u64,
        num_frames: u32,
        replacement_policy: &str,
    ) -> PyResult<()> {
        let policy = parse_replacement_policy(replacement_policy)?;
        self.inner
            .set_paging_config(page_size, num_frames, policy)
            .map_err(sim_err)
    }

    /// Replaces the address space with a single free block.
    fn set_memory_size(&mut self, memory_size: u64) -> PyResult<()> {
        self.inner.set_memory_size(memory_size).map_err(sim_err)
    }

    /// Restores the initial state.
    fn reset(&mut self) {
        self.inner.reset();
    }

    /// Whole state as a dict.
    fn snapshot(&self, py: Python<'_>) -> PyResult<PyObject> {
        to_py(py, &self.inner.snapshot())
    }

    /// Statistics report.
    fn stats(&self) -> PyStats {
        PyStats::from(self.inner.stats_report())
    }

    /// Scenario JSON for the current state.
    fn save_scenario(&self) -> PyResult<String> {
        self.inner.save_scenario().to_json().map_err(sim_err)
    }

    /// Replaces the state with a scenario JSON. Nothing changes if it is rejected.
    fn load_scenario(&mut self, json: &str) -> PyResult<()> {
        let scenario = Scenario::from_json(json).map_err(sim_err)?;
        self.inner.load_scenario(&scenario).map_err(sim_err)
    }

    /// Raises `RuntimeError` describing the first broken structural invariant, if any.
    fn check_invariants(&self) -> PyResult<()> {
        self.inner
            .check_invariants()
            .map_err(PyRuntimeError::new_err)
    }
}
