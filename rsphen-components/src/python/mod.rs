//! Python interface to the phenology stages
//!
//! Two levels are exposed: per-pixel functions operating on a single daily series, and
//! file-level runners driven by a run configuration (a TOML path or an equivalent dict).

use crate::pipeline::{run_stages, Stage};
use crate::stages::turning_point::detect_turning_day;
use crate::stages::{extrema, spring, summer};
use numpy::PyReadonlyArray1;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use rsphen_core::calendar::DayOfYear;
use rsphen_core::config::Thresholds;
use rsphen_core::python::extract_config;
use rsphen_core::smoothing::smooth_daily;
use serde::Serialize;

fn to_python<T: Serialize>(py: Python<'_>, value: &T) -> PyResult<PyObject> {
    pythonize::pythonize(py, value).map_err(|e| PyValueError::new_err(format!("{}", e)))
}

/// Turning day of one pixel's daily climatology difference, or None.
#[pyfunction]
pub fn turning_day<'py>(diff: PyReadonlyArray1<'py, f64>) -> Option<DayOfYear> {
    detect_turning_day(&diff.as_array().to_vec())
}

/// Smoothed annual extrema of one year of daily values.
///
/// Returns a dict with `day_min`, `data_min`, `day_max` and `data_max`.
#[pyfunction]
pub fn annual_extrema<'py>(
    py: Python<'py>,
    series: PyReadonlyArray1<'py, f64>,
) -> PyResult<PyObject> {
    to_python(py, &extrema::annual_extrema(&series.as_array().to_vec()))
}

/// Spring start days `(day1, day2)` of one year of daily values.
#[pyfunction]
#[pyo3(signature = (series, turning_day, spring1=281.0, spring2=283.0))]
pub fn spring_start<'py>(
    series: PyReadonlyArray1<'py, f64>,
    turning_day: Option<DayOfYear>,
    spring1: f64,
    spring2: f64,
) -> (Option<DayOfYear>, Option<DayOfYear>) {
    let thresholds = Thresholds {
        spring1,
        spring2,
        ..Thresholds::default()
    };
    let smoothed = smooth_daily(&series.as_array().to_vec());
    let start = spring::spring_start(&smoothed, turning_day, &thresholds);
    (start.day1, start.day2)
}

/// Summer `(start, end)` days of one year of daily values.
#[pyfunction]
#[pyo3(signature = (series, turning_day, baseline, offset=1.0))]
pub fn summer_start_end<'py>(
    series: PyReadonlyArray1<'py, f64>,
    turning_day: Option<DayOfYear>,
    baseline: f64,
    offset: f64,
) -> (Option<DayOfYear>, Option<DayOfYear>) {
    let smoothed = smooth_daily(&series.as_array().to_vec());
    let events = summer::summer_start_end(&smoothed, turning_day, baseline, offset);
    (events.start, events.end)
}

/// Run the named stages, or all of them, returning the paths written.
#[pyfunction]
#[pyo3(signature = (config, stages=None))]
pub fn run(config: Bound<'_, PyAny>, stages: Option<Vec<String>>) -> PyResult<Vec<String>> {
    let config = extract_config(&config)?;
    let stages = match stages {
        Some(names) => names
            .iter()
            .map(|name| name.parse::<Stage>())
            .collect::<Result<Vec<_>, _>>()?,
        None => Stage::ALL.to_vec(),
    };
    let written = run_stages(&config, &stages)?;
    Ok(written
        .into_iter()
        .map(|p| p.display().to_string())
        .collect())
}

/// Names of the stages in dependency order
#[pyfunction]
pub fn stage_names() -> Vec<&'static str> {
    Stage::ALL.iter().map(Stage::name).collect()
}

#[pymodule]
pub fn components(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(turning_day, m)?)?;
    m.add_function(wrap_pyfunction!(annual_extrema, m)?)?;
    m.add_function(wrap_pyfunction!(spring_start, m)?)?;
    m.add_function(wrap_pyfunction!(summer_start_end, m)?)?;
    m.add_function(wrap_pyfunction!(run, m)?)?;
    m.add_function(wrap_pyfunction!(stage_names, m)?)?;
    Ok(())
}
