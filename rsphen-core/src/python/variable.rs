//! Python bindings for the variable registry.
//!
//! This module provides Python access to:
//! - [`PyStorageType`] for the on-disk element type
//! - [`PyVariableDefinition`] for variable metadata
//! - Lookup functions over the registered output variables

use crate::variable::{list_all, lookup, StorageType, VariableDefinition};
use pyo3::exceptions::PyKeyError;
use pyo3::prelude::*;

/// Python wrapper for StorageType enum.
#[pyclass(name = "StorageType", module = "rsphen.core")]
#[derive(Clone)]
pub struct PyStorageType(pub StorageType);

#[pymethods]
impl PyStorageType {
    /// 64-bit floats, missing values are NaN.
    #[staticmethod]
    pub fn float() -> Self {
        PyStorageType(StorageType::Float)
    }

    /// 32-bit integers, missing values are the fill value.
    #[staticmethod]
    pub fn integer() -> Self {
        PyStorageType(StorageType::Integer)
    }

    fn __repr__(&self) -> String {
        format!("StorageType.{}", self.0)
    }

    fn __eq__(&self, other: &PyStorageType) -> bool {
        self.0 == other.0
    }

    fn __hash__(&self) -> u64 {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.0.hash(&mut hasher);
        hasher.finish()
    }
}

/// Python wrapper for VariableDefinition.
///
/// Metadata attached to a variable when it is written to disk.
#[pyclass(name = "VariableDefinition", module = "rsphen.core")]
#[derive(Clone)]
pub struct PyVariableDefinition(pub VariableDefinition);

#[pymethods]
impl PyVariableDefinition {
    #[getter]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    #[getter]
    pub fn unit(&self) -> &str {
        &self.0.unit
    }

    #[getter]
    pub fn description(&self) -> &str {
        &self.0.description
    }

    #[getter]
    pub fn storage(&self) -> PyStorageType {
        PyStorageType(self.0.storage)
    }

    /// Whether missing values are written as the fill value
    #[getter]
    pub fn fill(&self) -> bool {
        self.0.fill
    }

    fn __repr__(&self) -> String {
        format!(
            "VariableDefinition(name='{}', unit='{}', storage={}, description='{}')",
            self.0.name, self.0.unit, self.0.storage, self.0.description
        )
    }
}

/// Look up a registered output variable by name.
///
/// Raises `KeyError` if no variable of that name is registered.
#[pyfunction]
pub fn get_variable(name: &str) -> PyResult<PyVariableDefinition> {
    lookup(name)
        .map(PyVariableDefinition)
        .ok_or_else(|| PyKeyError::new_err(format!("Unknown variable '{name}'")))
}

/// All registered output variables, sorted by name.
#[pyfunction]
pub fn list_variables() -> Vec<PyVariableDefinition> {
    list_all().into_iter().map(PyVariableDefinition).collect()
}
