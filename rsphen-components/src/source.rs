//! Daily input fields and where they come from
//!
//! Stages never touch the file system directly: they ask a [`DailyFieldSource`] for
//! the fields of a `(year, day)` pair. [`DirectorySource`] reads the conventional
//! `root/YYYY/DDD/*.nc` tree, [`MemorySource`] serves fields built in memory.

use chrono::Datelike;
use ndarray::{s, Array2, ArrayD, Axis, Ix2};
use rsphen_core::calendar::{month_day, parse_start_time, DayOfYear};
use rsphen_core::config::{DatasetKind, PhenologyConfig};
use rsphen_core::dataset::{AttributeValue, Dataset, DatasetFormat};
use rsphen_core::errors::{PhenologyError, PhenologyResult};
use rsphen_core::grid::Grid;
use rsphen_core::FloatValue;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const MASK_VARIABLE: &str = "mask";
pub const START_TIME_ATTRIBUTE: &str = "start_time";

/// One day of gridded observations, `(nlat, nlon)`
#[derive(Debug, Clone, PartialEq)]
pub struct DailyField {
    pub values: Array2<FloatValue>,
    /// Surface type flags (1 water, 2 land, 4 lake, 8 sea ice, 16 river)
    pub mask: Option<Array2<FloatValue>>,
    pub error: Option<Array2<FloatValue>>,
    /// Raw `start_time` attribute, e.g. `20030101T000000Z`
    pub start_time: Option<String>,
}

impl DailyField {
    pub fn new(values: Array2<FloatValue>) -> Self {
        Self {
            values,
            mask: None,
            error: None,
            start_time: None,
        }
    }

    pub fn with_mask(mut self, mask: Array2<FloatValue>) -> Self {
        self.mask = Some(mask);
        self
    }

    pub fn with_error(mut self, error: Array2<FloatValue>) -> Self {
        self.error = Some(error);
        self
    }

    pub fn with_start_time(mut self, start_time: impl Into<String>) -> Self {
        self.start_time = Some(start_time.into());
        self
    }

    /// `(nlat, nlon)`
    pub fn shape(&self) -> (usize, usize) {
        self.values.dim()
    }

    /// Mask flag at a pixel, if the field has a mask
    pub fn mask_at(&self, i: usize, j: usize) -> Option<FloatValue> {
        self.mask.as_ref().map(|m| m[[i, j]])
    }

    /// Calendar `(month, day)` of the field
    ///
    /// Taken from `start_time` when it parses, otherwise derived from `year` and the
    /// day-of-year.
    pub fn calendar_date(&self, year: i32, day: DayOfYear) -> Option<(u32, u32)> {
        self.start_time
            .as_deref()
            .and_then(parse_start_time)
            .map(|date| (date.month(), date.day()))
            .or_else(|| month_day(year, day))
    }

    /// Same field with rows in reverse order
    pub fn flip_latitude(self) -> Self {
        let flip = |a: Array2<FloatValue>| a.slice(s![..;-1, ..]).to_owned();
        Self {
            values: flip(self.values),
            mask: self.mask.map(flip),
            error: self.error.map(flip),
            start_time: self.start_time,
        }
    }

    /// Extract the field of `kind` from a daily dataset
    ///
    /// Variables may carry a leading time axis of length one.
    pub fn from_dataset(ds: &Dataset, kind: &DatasetKind) -> PhenologyResult<Self> {
        let values = squeeze_2d(ds.float(kind.variable())?, kind.variable())?;
        let mask = if ds.has_variable(MASK_VARIABLE) {
            Some(squeeze_2d(ds.float(MASK_VARIABLE)?, MASK_VARIABLE)?)
        } else {
            None
        };
        let error = match kind.error_variable() {
            Some(name) if ds.has_variable(name) => Some(squeeze_2d(ds.float(name)?, name)?),
            _ => None,
        };
        let start_time = ds
            .attribute(START_TIME_ATTRIBUTE)
            .and_then(AttributeValue::as_str)
            .map(str::to_string);

        for (name, other) in [("mask", &mask), ("error", &error)] {
            if let Some(other) = other {
                if other.dim() != values.dim() {
                    return Err(PhenologyError::ShapeMismatch {
                        name: name.to_string(),
                        expected: values.shape().to_vec(),
                        actual: other.shape().to_vec(),
                    });
                }
            }
        }

        Ok(Self {
            values,
            mask,
            error,
            start_time,
        })
    }

    /// Daily dataset holding this field, the inverse of [`DailyField::from_dataset`]
    pub fn to_dataset(&self, grid: &Grid, kind: &DatasetKind) -> PhenologyResult<Dataset> {
        let mut ds = Dataset::new();
        ds.add_coordinate("lat", grid.lats().to_vec())?;
        ds.add_coordinate("lon", grid.lons().to_vec())?;
        ds.add_dimension("time", 1)?;
        let dims = ["time", "lat", "lon"];
        let with_time = |a: &Array2<FloatValue>| a.clone().insert_axis(Axis(0)).into_dyn();

        ds.add_float(kind.variable(), &dims, with_time(&self.values))?;
        if let Some(mask) = &self.mask {
            ds.add_float(MASK_VARIABLE, &dims, with_time(mask))?;
        }
        if let (Some(error), Some(name)) = (&self.error, kind.error_variable()) {
            ds.add_float(name, &dims, with_time(error))?;
        }
        if let Some(start_time) = &self.start_time {
            ds.set_attribute(START_TIME_ATTRIBUTE, start_time.as_str());
        }
        Ok(ds)
    }
}

fn squeeze_2d(mut values: ArrayD<FloatValue>, name: &str) -> PhenologyResult<Array2<FloatValue>> {
    while values.ndim() > 2 && values.shape()[0] == 1 {
        values = values.index_axis_move(Axis(0), 0);
    }
    let shape = values.shape().to_vec();
    values
        .into_dimensionality::<Ix2>()
        .map_err(|_| PhenologyError::ShapeMismatch {
            name: name.to_string(),
            expected: vec![1, 0, 0],
            actual: shape,
        })
}

/// Provider of daily fields
///
/// Implementations return every field available for a day; an absent day is an
/// empty list. Failures on individual files are logged and the file is skipped.
pub trait DailyFieldSource: Sync {
    /// Grid shared by all fields of the source
    fn grid(&self) -> PhenologyResult<Grid>;

    /// Fields observed on `day` of `year`
    fn read_day(&self, year: i32, day: DayOfYear) -> Vec<DailyField>;
}

/// Daily files laid out as `root/YYYY/DDD/*.{nc,json}`
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    kind: DatasetKind,
    /// File name template, `{year}` and `{day}` are substituted
    prefix: Option<String>,
    flip_latitude: bool,
    grid_file: Option<PathBuf>,
    /// Year scanned for a sample file when no grid file is given
    sample_year: Option<i32>,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>, kind: DatasetKind) -> Self {
        Self {
            root: root.into(),
            kind,
            prefix: None,
            flip_latitude: false,
            grid_file: None,
            sample_year: None,
        }
    }

    pub fn with_prefix(mut self, template: impl Into<String>) -> Self {
        self.prefix = Some(template.into());
        self
    }

    pub fn with_flip_latitude(mut self, flip: bool) -> Self {
        self.flip_latitude = flip;
        self
    }

    pub fn with_grid_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.grid_file = Some(path.into());
        self
    }

    pub fn with_sample_year(mut self, year: i32) -> Self {
        self.sample_year = Some(year);
        self
    }

    pub fn from_config(config: &PhenologyConfig) -> PhenologyResult<Self> {
        let ds = &config.dataset;
        let mut source = Self::new(&ds.root, config.kind()?.clone())
            .with_flip_latitude(ds.flip_latitude)
            .with_sample_year(ds.start_year);
        if let Some(template) = &ds.file_prefix {
            source = source.with_prefix(template.clone());
        }
        if let Some(path) = ds.grid_path() {
            if path.exists() || ds.grid_file.is_some() {
                source = source.with_grid_file(path);
            }
        }
        Ok(source)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn day_dir(&self, year: i32, day: DayOfYear) -> PathBuf {
        self.root.join(format!("{year:04}")).join(format!("{day:03}"))
    }

    /// Readable daily files of `day`, sorted by name
    pub fn day_files(&self, year: i32, day: DayOfYear) -> Vec<PathBuf> {
        let dir = self.day_dir(year, day);
        let Ok(entries) = std::fs::read_dir(&dir) else {
            return Vec::new();
        };
        let prefix = self.prefix.as_ref().map(|template| {
            template
                .replace("{year}", &format!("{year:04}"))
                .replace("{day}", &format!("{day:03}"))
        });

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && DatasetFormat::from_path(path).is_ok())
            .filter(|path| match (&prefix, path.file_name().and_then(|n| n.to_str())) {
                (Some(prefix), Some(name)) => name.starts_with(prefix.as_str()),
                (Some(_), None) => false,
                (None, _) => true,
            })
            .collect();
        files.sort();
        files
    }

    fn read_file(&self, path: &Path) -> PhenologyResult<DailyField> {
        let ds = Dataset::read(path)?;
        let field = DailyField::from_dataset(&ds, &self.kind)?;
        Ok(if self.flip_latitude {
            field.flip_latitude()
        } else {
            field
        })
    }

    fn sample_file(&self) -> Option<PathBuf> {
        let year = self.sample_year?;
        (1..=366).find_map(|day| self.day_files(year, day).into_iter().next())
    }
}

impl DailyFieldSource for DirectorySource {
    fn grid(&self) -> PhenologyResult<Grid> {
        let path = match &self.grid_file {
            Some(path) => path.clone(),
            None => self.sample_file().ok_or_else(|| {
                PhenologyError::MissingFile(format!(
                    "grid file or daily file under {}",
                    self.root.display()
                ))
            })?,
        };
        let grid = Dataset::read(&path)?.grid()?;
        Ok(if self.flip_latitude {
            grid.with_flipped_latitude()
        } else {
            grid
        })
    }

    fn read_day(&self, year: i32, day: DayOfYear) -> Vec<DailyField> {
        self.day_files(year, day)
            .into_iter()
            .filter_map(|path| match self.read_file(&path) {
                Ok(field) => {
                    log::debug!("Read {}", path.display());
                    Some(field)
                }
                Err(e) => {
                    log::warn!("Skipping {}: {}", path.display(), e);
                    None
                }
            })
            .collect()
    }
}

/// Fields held in memory, keyed by `(year, day)`
#[derive(Debug, Clone)]
pub struct MemorySource {
    grid: Grid,
    fields: HashMap<(i32, DayOfYear), Vec<DailyField>>,
}

impl MemorySource {
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            fields: HashMap::new(),
        }
    }

    /// Add a field; fields whose shape differs from the grid are rejected
    pub fn insert(&mut self, year: i32, day: DayOfYear, field: DailyField) -> PhenologyResult<()> {
        if field.shape() != self.grid.shape() {
            return Err(PhenologyError::ShapeMismatch {
                name: format!("field {year}/{day:03}"),
                expected: vec![self.grid.nlat(), self.grid.nlon()],
                actual: field.values.shape().to_vec(),
            });
        }
        self.fields.entry((year, day)).or_default().push(field);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.fields.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DailyFieldSource for MemorySource {
    fn grid(&self) -> PhenologyResult<Grid> {
        Ok(self.grid.clone())
    }

    fn read_day(&self, year: i32, day: DayOfYear) -> Vec<DailyField> {
        self.fields.get(&(year, day)).cloned().unwrap_or_default()
    }
}
