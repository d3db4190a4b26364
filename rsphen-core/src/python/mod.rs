//! Python interface to the core numerics and metadata

use crate::config::PhenologyConfig;
use crate::errors::PhenologyError;
use crate::grid::{box_layout, Grid, Region};
use crate::smoothing;
use crate::trend;
use crate::FloatValue;
use numpy::{IntoPyArray, PyArray1, PyReadonlyArray1};
use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;

pub mod variable;

pub use variable::{PyStorageType, PyVariableDefinition};

impl From<PhenologyError> for PyErr {
    fn from(err: PhenologyError) -> PyErr {
        match err {
            PhenologyError::Io(_) | PhenologyError::MissingFile(_) => {
                PyIOError::new_err(err.to_string())
            }
            _ => PyValueError::new_err(err.to_string()),
        }
    }
}

/// Run configuration from a Python object
///
/// Accepts either a path to a TOML file or a dict shaped like the TOML document.
pub fn extract_config(obj: &Bound<'_, PyAny>) -> PyResult<PhenologyConfig> {
    if let Ok(path) = obj.extract::<std::path::PathBuf>() {
        return Ok(PhenologyConfig::from_file(path)?);
    }
    let mut config = pythonize::depythonize_bound::<PhenologyConfig>(obj.clone())
        .map_err(|e| PyValueError::new_err(format!("{}", e)))?;
    config.resolve_kind()?;
    config.validate()?;
    Ok(config)
}

/// Parse and validate a configuration, returning it as TOML text.
#[pyfunction]
pub fn check_config(config: Bound<'_, PyAny>) -> PyResult<String> {
    Ok(extract_config(&config)?.to_toml_string()?)
}

/// Inclusive grid index bounds of every box of a region.
///
/// Returns `(lat_bounds, lon_bounds)`, each a list of `(start, end)` pairs.
#[pyfunction]
#[pyo3(signature = (lats, lons, lat_min, lat_max, lon_min, lon_max, lat_boxsize, lon_boxsize))]
#[allow(clippy::too_many_arguments)]
pub fn box_indices(
    lats: Vec<FloatValue>,
    lons: Vec<FloatValue>,
    lat_min: FloatValue,
    lat_max: FloatValue,
    lon_min: FloatValue,
    lon_max: FloatValue,
    lat_boxsize: FloatValue,
    lon_boxsize: FloatValue,
) -> PyResult<(Vec<(usize, usize)>, Vec<(usize, usize)>)> {
    let grid = Grid::new(lats, lons)?;
    let region = Region::new(lat_min, lat_max, lon_min, lon_max, lat_boxsize, lon_boxsize);
    let layout = box_layout(&region, &grid)?;
    Ok((layout.lat_bounds().to_vec(), layout.lon_bounds().to_vec()))
}

/// Least-squares slope of `values` against `years`, NaN when fewer than half are finite.
#[pyfunction]
pub fn fit_trend<'py>(years: Vec<i32>, values: PyReadonlyArray1<'py, f64>) -> PyResult<f64> {
    let values = values.as_array().to_vec();
    if years.len() != values.len() {
        return Err(PyValueError::new_err(format!(
            "years has {} entries but values has {}",
            years.len(),
            values.len()
        )));
    }
    Ok(trend::fit_trend(&years, &values))
}

/// Centered moving average ignoring NaN.
#[pyfunction]
#[pyo3(signature = (values, window=smoothing::SMOOTHING_WINDOW))]
pub fn moving_average<'py>(
    py: Python<'py>,
    values: PyReadonlyArray1<'py, f64>,
    window: usize,
) -> Bound<'py, PyArray1<f64>> {
    let values = values.as_array().to_vec();
    ndarray::Array1::from(smoothing::moving_average(&values, window)).into_pyarray_bound(py)
}

#[pymodule]
pub fn core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyStorageType>()?;
    m.add_class::<PyVariableDefinition>()?;
    m.add_function(wrap_pyfunction!(variable::get_variable, m)?)?;
    m.add_function(wrap_pyfunction!(variable::list_variables, m)?)?;
    m.add_function(wrap_pyfunction!(check_config, m)?)?;
    m.add_function(wrap_pyfunction!(box_indices, m)?)?;
    m.add_function(wrap_pyfunction!(fit_trend, m)?)?;
    m.add_function(wrap_pyfunction!(moving_average, m)?)?;
    Ok(())
}
