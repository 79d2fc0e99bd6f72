//! Python↔Rust conversion.
//!
//! Configuration dicts and every value returned to Python cross the boundary as JSON, so
//! Python sees exactly the serde schema of the core types (the same one scenarios use).

use memsim_core::common::SimError;
use memsim_core::config::{AllocationPolicy, ReplacementPolicy, SimConfig};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Converts a Python dict to a simulator `SimConfig`.
///
/// Missing keys take their defaults, so `{}` is the default configuration.
///
/// # Errors
///
/// `ValueError` if the dict does not match the configuration schema.
pub fn py_dict_to_config(py: Python<'_>, dict: &Bound<'_, PyAny>) -> PyResult<SimConfig> {
    let json = py.import("json")?;
    let json_str: String = json.getattr("dumps")?.call1((dict,))?.extract()?;

    serde_json::from_str(&json_str)
        .map_err(|e| PyValueError::new_err(format!("Invalid config: {e}")))
}

/// Converts any serializable core value into the equivalent Python object.
///
/// # Errors
///
/// Propagates serialization or `json.loads` failures.
pub fn to_py<T: Serialize>(py: Python<'_>, value: &T) -> PyResult<PyObject> {
    let text = serde_json::to_string(value).map_err(|e| PyValueError::new_err(e.to_string()))?;
    let json = py.import("json")?;
    Ok(json.getattr("loads")?.call1((text,))?.unbind())
}

fn parse_name<T: DeserializeOwned>(what: &str, name: &str) -> PyResult<T> {
    serde_json::from_value(serde_json::Value::String(name.to_owned()))
        .map_err(|_| PyValueError::new_err(format!("unknown {what} '{name}'")))
}

/// Parses a placement policy name such as `"best_fit"`.
///
/// # Errors
///
/// `ValueError` for an unknown name.
pub fn parse_allocation_policy(name: &str) -> PyResult<AllocationPolicy> {
    parse_name("allocation policy", name)
}

/// Parses a replacement policy name, `"FIFO"` or `"LRU"`.
///
/// # Errors
///
/// `ValueError` for an unknown name.
pub fn parse_replacement_policy(name: &str) -> PyResult<ReplacementPolicy> {
    parse_name("replacement policy", name)
}

/// Maps a refused command to `ValueError(kind, message)`.
pub fn sim_err(err: SimError) -> PyErr {
    PyValueError::new_err((err.kind(), err.to_string()))
}
