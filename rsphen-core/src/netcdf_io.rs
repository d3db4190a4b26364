//! NetCDF encoding of [`Dataset`]
//!
//! Packed inputs (`scale_factor`/`add_offset`, as used by GHRSST granules) are unpacked
//! on read, and every variable is loaded as `f64`. Integer variables come back through
//! [`Dataset::integer`], which restores the fill value for missing entries.

use crate::dataset::{AttributeValue, Dataset, VariableData, FILL_VALUE_ATTR};
use crate::errors::{PhenologyError, PhenologyResult};
use crate::FloatValue;
use ndarray::{ArrayD, IxDyn};
use std::collections::BTreeMap;
use std::path::Path;

const SCALE_FACTOR: &str = "scale_factor";
const ADD_OFFSET: &str = "add_offset";

pub(crate) fn write(ds: &Dataset, path: &Path) -> PhenologyResult<()> {
    let mut file = netcdf::create(path)?;

    for (name, &len) in ds.dimensions() {
        file.add_dimension(name, len)?;
    }
    for (name, value) in ds.attributes() {
        match value {
            AttributeValue::Text(s) => file.add_attribute(name, s.as_str())?,
            AttributeValue::Float(v) => file.add_attribute(name, *v)?,
            AttributeValue::Integer(v) => match i32::try_from(*v) {
                Ok(small) => file.add_attribute(name, small)?,
                Err(_) => file.add_attribute(name, *v)?,
            },
        };
    }

    for (name, var) in ds.variables() {
        let dims: Vec<&str> = var.dims().iter().map(String::as_str).collect();
        match var.data() {
            VariableData::Float(values) => {
                let mut nc_var = file.add_variable::<f64>(name, &dims)?;
                for (key, value) in var.attributes() {
                    match value {
                        AttributeValue::Text(s) => nc_var.put_attribute(key, s.as_str())?,
                        other => nc_var.put_attribute(key, other.as_f64().unwrap_or(FloatValue::NAN))?,
                    };
                }
                let fill = var.fill_value();
                let flat: Vec<f64> = values
                    .iter()
                    .map(|&v| match fill {
                        Some(f) if !v.is_finite() => f,
                        _ => v,
                    })
                    .collect();
                nc_var.put_values(&flat, ..)?;
            }
            VariableData::Integer(values) => {
                let mut nc_var = file.add_variable::<i32>(name, &dims)?;
                for (key, value) in var.attributes() {
                    match value {
                        AttributeValue::Text(s) => nc_var.put_attribute(key, s.as_str())?,
                        AttributeValue::Integer(v) => match i32::try_from(*v) {
                            Ok(small) => nc_var.put_attribute(key, small)?,
                            Err(_) => nc_var.put_attribute(key, *v)?,
                        },
                        AttributeValue::Float(v) => nc_var.put_attribute(key, *v)?,
                    };
                }
                let flat: Vec<i32> = values.iter().copied().collect();
                nc_var.put_values(&flat, ..)?;
            }
        }
    }
    Ok(())
}

fn convert_attribute(value: netcdf::AttributeValue) -> Option<AttributeValue> {
    match value {
        netcdf::AttributeValue::Str(s) => Some(AttributeValue::Text(s)),
        netcdf::AttributeValue::Double(v) => Some(AttributeValue::Float(v)),
        netcdf::AttributeValue::Float(v) => Some(AttributeValue::Float(f64::from(v))),
        netcdf::AttributeValue::Int(v) => Some(AttributeValue::Integer(i64::from(v))),
        netcdf::AttributeValue::Short(v) => Some(AttributeValue::Integer(i64::from(v))),
        netcdf::AttributeValue::Schar(v) => Some(AttributeValue::Integer(i64::from(v))),
        netcdf::AttributeValue::Uchar(v) => Some(AttributeValue::Integer(i64::from(v))),
        netcdf::AttributeValue::Longlong(v) => Some(AttributeValue::Integer(v)),
        _ => None,
    }
}

pub(crate) fn read(path: &Path) -> PhenologyResult<Dataset> {
    let file = netcdf::open(path)?;
    let mut ds = Dataset::new();

    for dim in file.dimensions() {
        ds.add_dimension(&dim.name(), dim.len())?;
    }
    for attr in file.attributes() {
        if let Some(value) = attr.value().ok().and_then(convert_attribute) {
            ds.set_attribute(attr.name(), value);
        }
    }

    for var in file.variables() {
        let name = var.name();
        let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
        let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();

        let mut attributes: BTreeMap<String, AttributeValue> = var
            .attributes()
            .filter_map(|a| {
                let value = a.value().ok().and_then(convert_attribute)?;
                Some((a.name().to_string(), value))
            })
            .collect();

        let fill = attributes.get(FILL_VALUE_ATTR).and_then(AttributeValue::as_f64);
        let scale = attributes
            .remove(SCALE_FACTOR)
            .and_then(|v| v.as_f64())
            .unwrap_or(1.0);
        let offset = attributes
            .remove(ADD_OFFSET)
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);
        if scale != 1.0 || offset != 0.0 {
            if let Some(f) = fill {
                attributes.insert(FILL_VALUE_ATTR.to_string(), AttributeValue::Float(f * scale + offset));
            }
        }

        let raw: Vec<f64> = var.get_values(..)?;
        let values: Vec<FloatValue> = raw
            .into_iter()
            .map(|v| {
                if !v.is_finite() || Some(v) == fill {
                    FloatValue::NAN
                } else {
                    v * scale + offset
                }
            })
            .collect();
        let data = ArrayD::from_shape_vec(IxDyn(&shape), values)
            .map_err(|e| PhenologyError::Error(format!("Cannot shape {name}: {e}")))?;

        ds.insert_raw(&name, dims, VariableData::Float(data), attributes)?;
    }
    Ok(ds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use tempfile::tempdir;

    #[test]
    fn netcdf_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("trend.nc");

        let mut ds = Dataset::new();
        ds.add_coordinate("lat", vec![1.0, 2.0]).unwrap();
        ds.add_coordinate("lon", vec![3.0]).unwrap();
        ds.add_float(
            "day_summer_start_trend",
            &["lat", "lon"],
            array![[0.5], [f64::NAN]].into_dyn(),
        )
        .unwrap();
        ds.add_integer("year_summer_baseline", &["lat", "lon"], array![[2004], [-9999]].into_dyn())
            .unwrap();
        ds.set_attribute("dataset", "MUR");
        ds.write(&path).unwrap();

        let loaded = Dataset::read(&path).unwrap();
        let trend = loaded.float("day_summer_start_trend").unwrap();
        assert_eq!(trend[IxDyn(&[0, 0])], 0.5);
        assert!(trend[IxDyn(&[1, 0])].is_nan());
        let years = loaded.integer("year_summer_baseline").unwrap();
        assert_eq!(years[IxDyn(&[0, 0])], 2004);
        assert_eq!(years[IxDyn(&[1, 0])], -9999);
        assert_eq!(loaded.attribute("dataset").and_then(|a| a.as_str()), Some("MUR"));
    }
}
