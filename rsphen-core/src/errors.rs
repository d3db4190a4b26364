use thiserror::Error;

/// Error type for invalid operations.
#[derive(Error, Debug)]
pub enum PhenologyError {
    #[error("{0}")]
    Error(String),
    #[error("Invalid region: {0}")]
    InvalidRegion(String),
    #[error("No grid {axis} coordinate falls inside box {index} [{low}, {high}]. Check that the region overlaps the grid.")]
    EmptyBox {
        axis: &'static str,
        index: usize,
        low: f64,
        high: f64,
    },
    #[error("Invalid grid: {0}")]
    InvalidGrid(String),
    #[error("Shape mismatch for {name}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        name: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
    #[error("Variable '{0}' not found in dataset")]
    MissingVariable(String),
    #[error("Required file {0} does not exist")]
    MissingFile(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed dataset file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Malformed configuration file: {0}")]
    Config(#[from] toml::de::Error),
    #[cfg(feature = "netcdf")]
    #[error("NetCDF error: {0}")]
    NetCdf(#[from] netcdf::Error),
    #[error("Cannot handle '{0}' files in this build. Enable the `netcdf` feature or use .json")]
    FormatUnavailable(String),
}

/// Convenience type for `Result<T, PhenologyError>`.
pub type PhenologyResult<T> = Result<T, PhenologyError>;
