//! Self-describing gridded datasets and their persistence
//!
//! A [`Dataset`] is a small in-memory model of a NetCDF file: named dimensions,
//! named variables over those dimensions and global attributes. Every stage of the
//! pipeline reads and writes its artifacts through this type.
//!
//! Two encodings are supported and selected from the file extension:
//! - `.json`: always available, written with `serde_json`
//! - `.nc`: requires the `netcdf` feature
//!
//! Missing floating point values are `NaN` in memory and are written as the variable's
//! `_FillValue` when it has one. Reads map fill values back to `NaN`.
//!
//! # Examples
//!
//! ```rust
//! use ndarray::{array, IxDyn};
//! use rsphen_core::dataset::Dataset;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let path = dir.path().join("trend.json");
//!
//! let mut ds = Dataset::new();
//! ds.add_dimension("lat", 2).unwrap();
//! ds.add_dimension("lon", 2).unwrap();
//! let trend = array![[0.5, f64::NAN], [1.0, -0.25]].into_dyn();
//! ds.add_float("day_spring_trend1", &["lat", "lon"], trend).unwrap();
//! ds.write(&path).unwrap();
//!
//! let loaded = Dataset::read(&path).unwrap();
//! let values = loaded.float("day_spring_trend1").unwrap();
//! assert_eq!(values[IxDyn(&[0, 0])], 0.5);
//! assert!(values[IxDyn(&[0, 1])].is_nan());
//! ```

use crate::calendar::{DayOfYear, DAYS_PER_CLIMATOLOGY, FILL_VALUE};
use crate::errors::{PhenologyError, PhenologyResult};
use crate::grid::Grid;
use crate::variable::lookup;
use crate::FloatValue;
use ndarray::{Array, ArrayD, Dimension, IxDyn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const UNITS: &str = "units";
pub const LONG_NAME: &str = "long_name";
pub const FILL_VALUE_ATTR: &str = "_FillValue";

/// Attribute value attached to a dataset or a variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Integer(i64),
    Float(FloatValue),
    Text(String),
}

impl AttributeValue {
    pub fn as_f64(&self) -> Option<FloatValue> {
        match self {
            AttributeValue::Integer(v) => Some(*v as FloatValue),
            AttributeValue::Float(v) => Some(*v),
            AttributeValue::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl From<FloatValue> for AttributeValue {
    fn from(value: FloatValue) -> Self {
        AttributeValue::Float(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Integer(value)
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        AttributeValue::Integer(i64::from(value))
    }
}

/// Values of a variable
#[derive(Debug, Clone, PartialEq)]
pub enum VariableData {
    Float(ArrayD<FloatValue>),
    Integer(ArrayD<i32>),
}

impl VariableData {
    pub fn shape(&self) -> &[usize] {
        match self {
            VariableData::Float(a) => a.shape(),
            VariableData::Integer(a) => a.shape(),
        }
    }
}

/// A named array over a list of dimensions
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    dims: Vec<String>,
    data: VariableData,
    attributes: BTreeMap<String, AttributeValue>,
}

impl Variable {
    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    pub fn data(&self) -> &VariableData {
        &self.data
    }

    pub fn attributes(&self) -> &BTreeMap<String, AttributeValue> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    pub fn fill_value(&self) -> Option<FloatValue> {
        self.attribute(FILL_VALUE_ATTR).and_then(AttributeValue::as_f64)
    }

    pub fn units(&self) -> Option<&str> {
        self.attribute(UNITS).and_then(AttributeValue::as_str)
    }
}

/// File encoding of a [`Dataset`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Json,
    NetCdf,
}

impl DatasetFormat {
    /// Encoding implied by the extension of `path`
    ///
    /// Fails with [`PhenologyError::FormatUnavailable`] for unknown extensions and for
    /// NetCDF files when the `netcdf` feature is disabled.
    pub fn from_path(path: &Path) -> PhenologyResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Ok(DatasetFormat::Json),
            "nc" | "nc4" if cfg!(feature = "netcdf") => Ok(DatasetFormat::NetCdf),
            _ => Err(PhenologyError::FormatUnavailable(if ext.is_empty() {
                path.display().to_string()
            } else {
                format!(".{ext}")
            })),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            DatasetFormat::Json => "json",
            DatasetFormat::NetCdf => "nc",
        }
    }
}

/// In-memory gridded dataset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    dimensions: BTreeMap<String, usize>,
    variables: BTreeMap<String, Variable>,
    attributes: BTreeMap<String, AttributeValue>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a dimension
    ///
    /// Re-declaring a dimension with the same length is a no-op.
    pub fn add_dimension(&mut self, name: &str, len: usize) -> PhenologyResult<()> {
        match self.dimensions.get(name) {
            Some(&existing) if existing != len => Err(PhenologyError::ShapeMismatch {
                name: format!("dimension {name}"),
                expected: vec![existing],
                actual: vec![len],
            }),
            _ => {
                self.dimensions.insert(name.to_string(), len);
                Ok(())
            }
        }
    }

    pub fn dimension(&self, name: &str) -> Option<usize> {
        self.dimensions.get(name).copied()
    }

    pub fn dimensions(&self) -> &BTreeMap<String, usize> {
        &self.dimensions
    }

    /// Add a floating point variable
    ///
    /// `units`, `long_name` and `_FillValue` are attached from the registered
    /// [`VariableDefinition`](crate::variable::VariableDefinition) when one exists.
    pub fn add_float(
        &mut self,
        name: &str,
        dims: &[&str],
        data: ArrayD<FloatValue>,
    ) -> PhenologyResult<()> {
        let fill = AttributeValue::Float(FloatValue::from(FILL_VALUE));
        self.insert(name, dims, VariableData::Float(data), fill)
    }

    /// Add an integer variable, see [`Dataset::add_float`]
    pub fn add_integer(&mut self, name: &str, dims: &[&str], data: ArrayD<i32>) -> PhenologyResult<()> {
        let fill = AttributeValue::Integer(i64::from(FILL_VALUE));
        self.insert(name, dims, VariableData::Integer(data), fill)
    }

    /// Add a 1-D coordinate variable together with its dimension
    pub fn add_coordinate(&mut self, name: &str, values: Vec<FloatValue>) -> PhenologyResult<()> {
        self.add_dimension(name, values.len())?;
        self.add_float(name, &[name], ArrayD::from_shape_vec(IxDyn(&[values.len()]), values).map_err(shape_error(name))?)
    }

    /// Add a 1-D integer coordinate variable together with its dimension
    pub fn add_integer_coordinate(&mut self, name: &str, values: Vec<i32>) -> PhenologyResult<()> {
        self.add_dimension(name, values.len())?;
        self.add_integer(name, &[name], ArrayD::from_shape_vec(IxDyn(&[values.len()]), values).map_err(shape_error(name))?)
    }

    fn insert(
        &mut self,
        name: &str,
        dims: &[&str],
        data: VariableData,
        fill: AttributeValue,
    ) -> PhenologyResult<()> {
        let expected = dims
            .iter()
            .map(|d| {
                self.dimension(d)
                    .ok_or_else(|| PhenologyError::Error(format!("Unknown dimension '{d}' for {name}")))
            })
            .collect::<PhenologyResult<Vec<usize>>>()?;
        if expected != data.shape() {
            return Err(PhenologyError::ShapeMismatch {
                name: name.to_string(),
                expected,
                actual: data.shape().to_vec(),
            });
        }

        let mut attributes = BTreeMap::new();
        if let Some(definition) = lookup(name) {
            attributes.insert(UNITS.to_string(), definition.unit.into());
            attributes.insert(LONG_NAME.to_string(), definition.description.into());
            if definition.fill {
                attributes.insert(FILL_VALUE_ATTR.to_string(), fill);
            }
        }

        self.variables.insert(
            name.to_string(),
            Variable {
                dims: dims.iter().map(|d| d.to_string()).collect(),
                data,
                attributes,
            },
        );
        Ok(())
    }

    /// Insert a fully specified variable, checking only its rank against `dims`
    #[cfg_attr(not(feature = "netcdf"), allow(dead_code))]
    pub(crate) fn insert_raw(
        &mut self,
        name: &str,
        dims: Vec<String>,
        data: VariableData,
        attributes: BTreeMap<String, AttributeValue>,
    ) -> PhenologyResult<()> {
        for (dim, &len) in dims.iter().zip(data.shape()) {
            self.add_dimension(dim, len)?;
        }
        if dims.len() != data.shape().len() {
            return Err(PhenologyError::ShapeMismatch {
                name: name.to_string(),
                expected: dims.iter().filter_map(|d| self.dimension(d)).collect(),
                actual: data.shape().to_vec(),
            });
        }
        self.variables.insert(
            name.to_string(),
            Variable {
                dims,
                data,
                attributes,
            },
        );
        Ok(())
    }

    pub fn set_attribute(&mut self, name: &str, value: impl Into<AttributeValue>) {
        self.attributes.insert(name.to_string(), value.into());
    }

    pub fn set_variable_attribute(
        &mut self,
        variable: &str,
        name: &str,
        value: impl Into<AttributeValue>,
    ) -> PhenologyResult<()> {
        let var = self
            .variables
            .get_mut(variable)
            .ok_or_else(|| PhenologyError::MissingVariable(variable.to_string()))?;
        var.attributes.insert(name.to_string(), value.into());
        Ok(())
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> &BTreeMap<String, AttributeValue> {
        &self.attributes
    }

    pub fn variables(&self) -> &BTreeMap<String, Variable> {
        &self.variables
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn variable(&self, name: &str) -> PhenologyResult<&Variable> {
        self.variables
            .get(name)
            .ok_or_else(|| PhenologyError::MissingVariable(name.to_string()))
    }

    /// Values of `name` as floats, integer fill values becoming `NaN`
    pub fn float(&self, name: &str) -> PhenologyResult<ArrayD<FloatValue>> {
        let var = self.variable(name)?;
        Ok(match &var.data {
            VariableData::Float(values) => values.clone(),
            VariableData::Integer(values) => {
                let fill = var.fill_value();
                values.mapv(|v| {
                    let v = FloatValue::from(v);
                    if Some(v) == fill {
                        FloatValue::NAN
                    } else {
                        v
                    }
                })
            }
        })
    }

    /// Values of `name` as integers, non-finite floats becoming [`FILL_VALUE`]
    pub fn integer(&self, name: &str) -> PhenologyResult<ArrayD<i32>> {
        let var = self.variable(name)?;
        Ok(match &var.data {
            VariableData::Integer(values) => values.clone(),
            VariableData::Float(values) => values.mapv(|v| {
                if v.is_finite() {
                    v.round() as i32
                } else {
                    FILL_VALUE
                }
            }),
        })
    }

    /// [`Dataset::float`] with a fixed dimensionality
    pub fn float_array<D: Dimension>(&self, name: &str) -> PhenologyResult<Array<FloatValue, D>> {
        let values = self.float(name)?;
        let shape = values.shape().to_vec();
        values
            .into_dimensionality::<D>()
            .map_err(|_| rank_error(name, D::NDIM, shape))
    }

    /// [`Dataset::integer`] with a fixed dimensionality
    pub fn integer_array<D: Dimension>(&self, name: &str) -> PhenologyResult<Array<i32, D>> {
        let values = self.integer(name)?;
        let shape = values.shape().to_vec();
        values
            .into_dimensionality::<D>()
            .map_err(|_| rank_error(name, D::NDIM, shape))
    }

    /// Regular grid from the `lat`/`lon` (or `latitude`/`longitude`) coordinates
    pub fn grid(&self) -> PhenologyResult<Grid> {
        let coordinate = |names: [&str; 2]| -> PhenologyResult<Vec<FloatValue>> {
            let name = names
                .iter()
                .find(|n| self.has_variable(n))
                .ok_or_else(|| PhenologyError::MissingVariable(names.join(" or ")))?;
            Ok(self.float(name)?.iter().copied().collect())
        };
        Grid::new(
            coordinate(["lat", "latitude"])?,
            coordinate(["lon", "longitude"])?,
        )
    }

    /// Read a dataset, choosing the decoder from the extension
    pub fn read(path: impl AsRef<Path>) -> PhenologyResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PhenologyError::MissingFile(path.display().to_string()));
        }
        match DatasetFormat::from_path(path)? {
            DatasetFormat::Json => {
                let file = fs::File::open(path)?;
                let encoded: EncodedDataset = serde_json::from_reader(std::io::BufReader::new(file))?;
                encoded.decode()
            }
            #[cfg(feature = "netcdf")]
            DatasetFormat::NetCdf => crate::netcdf_io::read(path),
            #[cfg(not(feature = "netcdf"))]
            DatasetFormat::NetCdf => Err(PhenologyError::FormatUnavailable(".nc".to_string())),
        }
    }

    /// Write the dataset, replacing `path` only once the encoding has succeeded
    ///
    /// Parent directories are created as needed.
    pub fn write(&self, path: impl AsRef<Path>) -> PhenologyResult<()> {
        let path = path.as_ref();
        let format = DatasetFormat::from_path(path)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let partial = partial_path(path);
        let result = match format {
            DatasetFormat::Json => self.write_json(&partial),
            #[cfg(feature = "netcdf")]
            DatasetFormat::NetCdf => crate::netcdf_io::write(self, &partial),
            #[cfg(not(feature = "netcdf"))]
            DatasetFormat::NetCdf => Err(PhenologyError::FormatUnavailable(".nc".to_string())),
        };

        match result {
            Ok(()) => {
                fs::rename(&partial, path)?;
                log::debug!("Wrote {}", path.display());
                Ok(())
            }
            Err(e) => {
                let _ = fs::remove_file(&partial);
                Err(e)
            }
        }
    }

    fn write_json(&self, path: &Path) -> PhenologyResult<()> {
        let file = fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer(writer, &EncodedDataset::encode(self))?;
        Ok(())
    }
}

/// Sibling path used while a file is being written
fn partial_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.partial"))
}

fn shape_error(name: &str) -> impl Fn(ndarray::ShapeError) -> PhenologyError + '_ {
    move |e| PhenologyError::Error(format!("Cannot shape {name}: {e}"))
}

fn rank_error(name: &str, ndim: Option<usize>, actual: Vec<usize>) -> PhenologyError {
    PhenologyError::Error(format!(
        "Variable {name} has shape {actual:?}, expected {} dimensions",
        ndim.unwrap_or(actual.len())
    ))
}

/// Persisted form of a day array: missing days become [`FILL_VALUE`]
pub fn encode_days<D: Dimension>(days: &Array<Option<DayOfYear>, D>) -> Array<i32, D> {
    days.mapv(|d| d.map_or(FILL_VALUE, i32::from))
}

/// Inverse of [`encode_days`]; anything outside `1..=366` is missing
pub fn decode_days<D: Dimension>(values: &Array<i32, D>) -> Array<Option<DayOfYear>, D> {
    values.mapv(|v| {
        if (1..=DAYS_PER_CLIMATOLOGY as i32).contains(&v) {
            Some(v as DayOfYear)
        } else {
            None
        }
    })
}

#[derive(Serialize, Deserialize)]
struct EncodedDataset {
    #[serde(default)]
    attributes: BTreeMap<String, AttributeValue>,
    dimensions: BTreeMap<String, usize>,
    variables: BTreeMap<String, EncodedVariable>,
}

#[derive(Serialize, Deserialize)]
struct EncodedVariable {
    dims: Vec<String>,
    #[serde(default)]
    attributes: BTreeMap<String, AttributeValue>,
    data: EncodedValues,
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "dtype", content = "values", rename_all = "lowercase")]
enum EncodedValues {
    F64(Vec<Option<FloatValue>>),
    I32(Vec<i32>),
}

impl EncodedDataset {
    fn encode(ds: &Dataset) -> Self {
        let variables = ds
            .variables
            .iter()
            .map(|(name, var)| {
                let data = match &var.data {
                    VariableData::Float(values) => {
                        let fill = var.fill_value();
                        EncodedValues::F64(
                            values
                                .iter()
                                .map(|&v| if v.is_finite() { Some(v) } else { fill })
                                .collect(),
                        )
                    }
                    VariableData::Integer(values) => EncodedValues::I32(values.iter().copied().collect()),
                };
                (
                    name.clone(),
                    EncodedVariable {
                        dims: var.dims.clone(),
                        attributes: var.attributes.clone(),
                        data,
                    },
                )
            })
            .collect();

        Self {
            attributes: ds.attributes.clone(),
            dimensions: ds.dimensions.clone(),
            variables,
        }
    }

    fn decode(self) -> PhenologyResult<Dataset> {
        let mut ds = Dataset {
            dimensions: self.dimensions,
            variables: BTreeMap::new(),
            attributes: self.attributes,
        };

        for (name, var) in self.variables {
            let shape = var
                .dims
                .iter()
                .map(|d| {
                    ds.dimension(d).ok_or_else(|| {
                        PhenologyError::Error(format!("Unknown dimension '{d}' for {name}"))
                    })
                })
                .collect::<PhenologyResult<Vec<usize>>>()?;

            let fill = var
                .attributes
                .get(FILL_VALUE_ATTR)
                .and_then(AttributeValue::as_f64);
            let data = match var.data {
                EncodedValues::F64(values) => VariableData::Float(
                    ArrayD::from_shape_vec(
                        IxDyn(&shape),
                        values
                            .into_iter()
                            .map(|v| match v {
                                Some(v) if Some(v) != fill => v,
                                _ => FloatValue::NAN,
                            })
                            .collect(),
                    )
                    .map_err(shape_error(&name))?,
                ),
                EncodedValues::I32(values) => VariableData::Integer(
                    ArrayD::from_shape_vec(IxDyn(&shape), values).map_err(shape_error(&name))?,
                ),
            };

            ds.variables.insert(
                name,
                Variable {
                    dims: var.dims,
                    data,
                    attributes: var.attributes,
                },
            );
        }
        Ok(ds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Ix2, Ix3};
    use tempfile::tempdir;

    fn sample() -> Dataset {
        let mut ds = Dataset::new();
        ds.add_coordinate("lat", vec![10.0, 20.0]).unwrap();
        ds.add_coordinate("lon", vec![-5.0, 0.0, 5.0]).unwrap();
        ds.add_integer_coordinate("year", vec![2003, 2004]).unwrap();
        ds.add_integer(
            "day_spring1",
            &["lat", "lon", "year"],
            Array::from_shape_fn((2, 3, 2), |(i, j, k)| {
                if i == j {
                    FILL_VALUE
                } else {
                    (100 + i * 10 + j + k) as i32
                }
            })
            .into_dyn(),
        )
        .unwrap();
        ds.add_float(
            "day_spring_trend1",
            &["lat", "lon"],
            array![[0.1, f64::NAN, 0.3], [0.4, 0.5, f64::NAN]].into_dyn(),
        )
        .unwrap();
        ds.set_attribute("dataset", "MUR");
        ds
    }

    #[test]
    fn registered_metadata_is_attached() {
        let ds = sample();
        let var = ds.variable("day_spring_trend1").unwrap();
        assert_eq!(var.units(), Some("days/yr"));
        assert_eq!(var.fill_value(), Some(-9999.0));
        assert!(ds.variable("lat").unwrap().fill_value().is_none());
    }

    #[test]
    fn shape_must_match_dimensions() {
        let mut ds = sample();
        let err = ds
            .add_float("data_min", &["lat", "lon"], ArrayD::zeros(IxDyn(&[3, 2])))
            .unwrap_err();
        assert!(matches!(err, PhenologyError::ShapeMismatch { .. }));

        let err = ds
            .add_float("data_min", &["depth"], ArrayD::zeros(IxDyn(&[3])))
            .unwrap_err();
        assert!(err.to_string().contains("depth"));

        assert!(ds.add_dimension("lat", 5).is_err());
        assert!(ds.add_dimension("lat", 2).is_ok());
    }

    #[test]
    fn json_round_trip_keeps_missing_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("spring.json");
        let ds = sample();
        ds.write(&path).unwrap();

        let loaded = Dataset::read(&path).unwrap();
        let trend = loaded.float_array::<Ix2>("day_spring_trend1").unwrap();
        assert_eq!(trend[[0, 0]], 0.1);
        assert!(trend[[0, 1]].is_nan());
        assert!(trend[[1, 2]].is_nan());

        let days = decode_days(&loaded.integer_array::<Ix3>("day_spring1").unwrap());
        assert_eq!(days[[0, 0, 0]], None);
        assert_eq!(days[[0, 1, 1]], Some(102));
        assert_eq!(loaded.attribute("dataset").and_then(|a| a.as_str()), Some("MUR"));
        assert_eq!(loaded.grid().unwrap().shape(), (2, 3));
    }

    #[test]
    fn fill_values_are_persisted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("spring.json");
        sample().write(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("-9999.0"));
        assert!(!text.contains("null"));
    }

    #[test]
    fn no_partial_file_is_left_behind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.json");
        sample().write(&path).unwrap();
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("out.json")]);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = tempdir().unwrap();
        let err = sample().write(dir.path().join("out.csv")).unwrap_err();
        assert!(matches!(err, PhenologyError::FormatUnavailable(_)));
    }

    #[test]
    fn missing_file() {
        let err = Dataset::read("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, PhenologyError::MissingFile(_)));
    }

    #[test]
    fn integer_and_float_views() {
        let ds = sample();
        let as_float = ds.float("day_spring1").unwrap();
        assert!(as_float[IxDyn(&[0, 0, 0])].is_nan());
        assert_eq!(as_float[IxDyn(&[1, 0, 0])], 110.0);

        let as_int = ds.integer("day_spring_trend1").unwrap();
        assert_eq!(as_int[IxDyn(&[0, 1])], FILL_VALUE);
    }

    #[test]
    fn day_encoding() {
        let days = array![Some(1u16), None, Some(366)];
        let encoded = encode_days(&days);
        assert_eq!(encoded, array![1, FILL_VALUE, 366]);
        assert_eq!(decode_days(&encoded), days);
        assert_eq!(decode_days(&array![0, 367]), array![None::<DayOfYear>, None]);
    }
}
