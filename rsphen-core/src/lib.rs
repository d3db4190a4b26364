//! Core building blocks for ocean-surface phenology metrics
//!
//! This crate holds everything that does not depend on a particular processing stage:
//! - [`grid`]: regular lat/lon grids and their tiling into boxes
//! - [`calendar`]: day-of-year conventions
//! - [`smoothing`], [`polynomial`] and [`trend`]: the numerical kernels
//! - [`dataset`]: the self-describing file model shared by all stages
//! - [`variable`] and [`standard_variables`]: metadata of persisted variables
//! - [`config`]: TOML run configuration
//! - [`errors`]: the error type

pub mod calendar;
pub mod config;
pub mod dataset;
pub mod errors;
pub mod grid;
pub mod maybe_rayon;
#[cfg(feature = "netcdf")]
mod netcdf_io;
pub mod polynomial;
#[cfg(feature = "python")]
pub mod python;
pub mod smoothing;
pub mod standard_variables;
pub mod trend;
pub mod variable;

/// Floating point type used for all data values
pub type FloatValue = f64;
