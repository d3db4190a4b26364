//! Regular latitude/longitude grids and their tiling into boxes
//!
//! A [`Grid`] is the fixed raster of one source dataset. A [`Region`] describes the
//! bounding box of interest together with a box size, and [`box_layout`] maps it onto
//! the grid as a [`BoxLayout`] of inclusive index ranges.
//!
//! # Examples
//!
//! ```rust
//! use rsphen_core::grid::{box_layout, Grid, Region};
//!
//! let grid = Grid::new(vec![-10.0, -5.0, 0.0, 5.0, 10.0], vec![0.0, 1.0, 2.0]).unwrap();
//! let region = Region::new(-10.0, 10.0, 0.0, 2.0, 10.0, 2.0);
//!
//! let layout = box_layout(&region, &grid).unwrap();
//! assert_eq!(layout.nx(), 2);
//! assert_eq!(layout.lat_bounds(), &[(0, 2), (2, 4)]);
//! ```

use crate::errors::{PhenologyError, PhenologyResult};
use crate::FloatValue;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Relative tolerance on the coordinate step used when checking for uniform spacing
const SPACING_TOLERANCE: FloatValue = 1e-3;

/// Immutable regular latitude/longitude raster
///
/// Both axes must be strictly monotonic with uniform spacing. Increasing and
/// decreasing axes are both accepted (some chlorophyll products are stored north to
/// south).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    lats: Vec<FloatValue>,
    lons: Vec<FloatValue>,
}

impl Grid {
    /// Create a grid after validating both coordinate axes
    pub fn new(lats: Vec<FloatValue>, lons: Vec<FloatValue>) -> PhenologyResult<Self> {
        check_axis("latitude", &lats)?;
        check_axis("longitude", &lons)?;
        Ok(Self { lats, lons })
    }

    pub fn lats(&self) -> &[FloatValue] {
        &self.lats
    }

    pub fn lons(&self) -> &[FloatValue] {
        &self.lons
    }

    pub fn nlat(&self) -> usize {
        self.lats.len()
    }

    pub fn nlon(&self) -> usize {
        self.lons.len()
    }

    /// `(nlat, nlon)`
    pub fn shape(&self) -> (usize, usize) {
        (self.nlat(), self.nlon())
    }

    /// Same grid with the latitude axis reversed
    pub fn with_flipped_latitude(&self) -> Self {
        let mut lats = self.lats.clone();
        lats.reverse();
        Self {
            lats,
            lons: self.lons.clone(),
        }
    }
}

fn check_axis(name: &str, coords: &[FloatValue]) -> PhenologyResult<()> {
    if coords.is_empty() {
        return Err(PhenologyError::InvalidGrid(format!("{name} axis is empty")));
    }
    if let Some(bad) = coords.iter().find(|c| !c.is_finite()) {
        return Err(PhenologyError::InvalidGrid(format!(
            "{name} axis contains a non-finite coordinate ({bad})"
        )));
    }
    if coords.len() == 1 {
        return Ok(());
    }

    let step = coords[1] - coords[0];
    if step == 0.0 {
        return Err(PhenologyError::InvalidGrid(format!(
            "{name} axis is not strictly monotonic"
        )));
    }

    for (i, pair) in coords.windows(2).enumerate() {
        let delta = pair[1] - pair[0];
        if delta == 0.0 || delta.signum() != step.signum() {
            return Err(PhenologyError::InvalidGrid(format!(
                "{name} axis is not strictly monotonic at index {}",
                i + 1
            )));
        }
        if (delta - step).abs() > SPACING_TOLERANCE * step.abs() {
            return Err(PhenologyError::InvalidGrid(format!(
                "{name} axis spacing is not uniform at index {} (step {delta}, expected {step})",
                i + 1
            )));
        }
    }
    Ok(())
}

/// Geographic bounding box and tiling box size, in degrees
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Region {
    pub lat_min: FloatValue,
    pub lat_max: FloatValue,
    pub lon_min: FloatValue,
    pub lon_max: FloatValue,
    /// Box height (degrees latitude)
    pub lat_boxsize: FloatValue,
    /// Box width (degrees longitude)
    pub lon_boxsize: FloatValue,
}

impl Default for Region {
    /// North Atlantic subset tiled in 5 degree boxes
    fn default() -> Self {
        Self {
            lat_min: 30.0,
            lat_max: 70.0,
            lon_min: -80.0,
            lon_max: 0.0,
            lat_boxsize: 5.0,
            lon_boxsize: 5.0,
        }
    }
}

impl Region {
    pub fn new(
        lat_min: FloatValue,
        lat_max: FloatValue,
        lon_min: FloatValue,
        lon_max: FloatValue,
        lat_boxsize: FloatValue,
        lon_boxsize: FloatValue,
    ) -> Self {
        Self {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
            lat_boxsize,
            lon_boxsize,
        }
    }

    /// Check that the ranges are ordered and the box sizes are positive
    pub fn validate(&self) -> PhenologyResult<()> {
        let values = [
            self.lat_min,
            self.lat_max,
            self.lon_min,
            self.lon_max,
            self.lat_boxsize,
            self.lon_boxsize,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(PhenologyError::InvalidRegion(
                "all bounds and box sizes must be finite".to_string(),
            ));
        }
        if self.lat_min >= self.lat_max {
            return Err(PhenologyError::InvalidRegion(format!(
                "lat_min ({}) must be below lat_max ({})",
                self.lat_min, self.lat_max
            )));
        }
        if self.lon_min >= self.lon_max {
            return Err(PhenologyError::InvalidRegion(format!(
                "lon_min ({}) must be below lon_max ({})",
                self.lon_min, self.lon_max
            )));
        }
        if self.lat_boxsize <= 0.0 || self.lon_boxsize <= 0.0 {
            return Err(PhenologyError::InvalidRegion(format!(
                "box sizes must be positive, got {} x {}",
                self.lat_boxsize, self.lon_boxsize
            )));
        }
        Ok(())
    }
}

/// One box of a [`BoxLayout`]
///
/// Index bounds are inclusive on both ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoBox {
    /// Position along the latitude axis of the tiling
    pub row: usize,
    /// Position along the longitude axis of the tiling
    pub col: usize,
    pub lat_start: usize,
    pub lat_end: usize,
    pub lon_start: usize,
    pub lon_end: usize,
}

impl GeoBox {
    pub fn lat_range(&self) -> RangeInclusive<usize> {
        self.lat_start..=self.lat_end
    }

    pub fn lon_range(&self) -> RangeInclusive<usize> {
        self.lon_start..=self.lon_end
    }

    /// Number of grid pixels covered by the box
    pub fn n_pixels(&self) -> usize {
        (self.lat_end - self.lat_start + 1) * (self.lon_end - self.lon_start + 1)
    }
}

/// Tiling of a [`Region`] over a [`Grid`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoxLayout {
    lat_bounds: Vec<(usize, usize)>,
    lon_bounds: Vec<(usize, usize)>,
}

impl BoxLayout {
    /// Number of boxes along the latitude axis
    pub fn nx(&self) -> usize {
        self.lat_bounds.len()
    }

    /// Number of boxes along the longitude axis
    pub fn ny(&self) -> usize {
        self.lon_bounds.len()
    }

    /// Inclusive `(start, end)` row indices of every box row
    pub fn lat_bounds(&self) -> &[(usize, usize)] {
        &self.lat_bounds
    }

    /// Inclusive `(start, end)` column indices of every box column
    pub fn lon_bounds(&self) -> &[(usize, usize)] {
        &self.lon_bounds
    }

    pub fn get(&self, row: usize, col: usize) -> Option<GeoBox> {
        let (lat_start, lat_end) = *self.lat_bounds.get(row)?;
        let (lon_start, lon_end) = *self.lon_bounds.get(col)?;
        Some(GeoBox {
            row,
            col,
            lat_start,
            lat_end,
            lon_start,
            lon_end,
        })
    }

    /// All boxes in row-major order
    pub fn boxes(&self) -> impl Iterator<Item = GeoBox> + '_ {
        (0..self.nx()).flat_map(move |row| (0..self.ny()).filter_map(move |col| self.get(row, col)))
    }
}

/// Number of boxes needed to cover `range` with boxes of `size`
///
/// A small epsilon keeps exact multiples (e.g. 0.6 / 0.2) from rounding up.
fn box_count(range: FloatValue, size: FloatValue) -> usize {
    ((range / size) - 1e-9).ceil().max(1.0) as usize
}

/// Inclusive index bounds along one axis for every box
pub fn axis_bounds(
    axis: &'static str,
    min: FloatValue,
    max: FloatValue,
    size: FloatValue,
    coords: &[FloatValue],
) -> PhenologyResult<Vec<(usize, usize)>> {
    let n = box_count(max - min, size);

    (0..n)
        .map(|i| {
            let low = min + i as FloatValue * size;
            let high = min + (i + 1) as FloatValue * size;
            let mut inside = coords
                .iter()
                .enumerate()
                .filter(|(_, &c)| c >= low && c <= high)
                .map(|(idx, _)| idx);

            let first = inside.next().ok_or(PhenologyError::EmptyBox {
                axis,
                index: i,
                low,
                high,
            })?;
            let last = inside.last().unwrap_or(first);
            Ok((first, last))
        })
        .collect()
}

/// Map a region onto a grid
///
/// Fails with [`PhenologyError::InvalidRegion`] for malformed regions and with
/// [`PhenologyError::EmptyBox`] if any box contains no grid coordinate, which
/// includes regions lying entirely outside the grid.
pub fn box_layout(region: &Region, grid: &Grid) -> PhenologyResult<BoxLayout> {
    region.validate()?;

    let lat_bounds = axis_bounds(
        "latitude",
        region.lat_min,
        region.lat_max,
        region.lat_boxsize,
        grid.lats(),
    )?;
    let lon_bounds = axis_bounds(
        "longitude",
        region.lon_min,
        region.lon_max,
        region.lon_boxsize,
        grid.lons(),
    )?;

    Ok(BoxLayout {
        lat_bounds,
        lon_bounds,
    })
}
