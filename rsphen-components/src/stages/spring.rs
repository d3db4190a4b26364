//! Start of spring
//!
//! After the turning day the smoothed series is scanned for the first exceedance of
//! each of the two spring thresholds. The scan stops after day 300 so that an
//! autumn warm spell is never reported as spring.

use super::annual::{load_year, pixel_year};
use super::extrema::{extrema_of_smoothed, AnnualExtrema, ExtremaGrid};
use crate::source::DailyFieldSource;
use ndarray::{s, Array2, Array3};
use rsphen_core::calendar::{day_index, index_day, DayOfYear};
use rsphen_core::config::{DatasetKind, Thresholds};
use rsphen_core::dataset::{encode_days, Dataset};
use rsphen_core::errors::PhenologyResult;
use rsphen_core::grid::Grid;
use rsphen_core::maybe_rayon::*;
use rsphen_core::smoothing::smooth_daily;
use rsphen_core::trend::fit_day_trend;
use rsphen_core::FloatValue;
use serde::{Deserialize, Serialize};

/// The spring scan covers days before this one, i.e. up to day 300
pub const SPRING_SCAN_END: DayOfYear = 301;

/// Spring start days of one pixel and year
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpringStart {
    pub day1: Option<DayOfYear>,
    pub day2: Option<DayOfYear>,
}

/// First day in `[start, end)` whose smoothed value is above `threshold`
///
/// With `skip_first_position` the first array position (day 1) never matches.
pub fn first_exceedance(
    smoothed: &[FloatValue],
    start: DayOfYear,
    end: DayOfYear,
    threshold: FloatValue,
    skip_first_position: bool,
) -> Option<DayOfYear> {
    let lo = day_index(start.max(1));
    let hi = day_index(end).min(smoothed.len());
    (lo..hi)
        .filter(|&i| !(skip_first_position && i == 0))
        .find(|&i| smoothed[i] > threshold)
        .map(index_day)
}

/// Spring start days from a smoothed year and the pixel's turning day
pub fn spring_start(
    smoothed: &[FloatValue],
    turning_day: Option<DayOfYear>,
    thresholds: &Thresholds,
) -> SpringStart {
    let Some(turning_day) = turning_day else {
        return SpringStart::default();
    };
    SpringStart {
        day1: first_exceedance(smoothed, turning_day, SPRING_SCAN_END, thresholds.spring1, false),
        day2: first_exceedance(smoothed, turning_day, SPRING_SCAN_END, thresholds.spring2, true),
    }
}

/// Extrema and spring start of one pixel-year
///
/// Years whose minimum day is missing get no spring start.
pub fn spring_year(
    series: &[FloatValue],
    turning_day: Option<DayOfYear>,
    thresholds: &Thresholds,
) -> (AnnualExtrema, SpringStart) {
    let smoothed = smooth_daily(series);
    let extrema = extrema_of_smoothed(&smoothed);
    let spring = if extrema.day_min.is_some() {
        spring_start(&smoothed, turning_day, thresholds)
    } else {
        SpringStart::default()
    };
    (extrema, spring)
}

/// Spring metric of a whole grid
#[derive(Debug, Clone, PartialEq)]
pub struct SpringMetric {
    pub years: Vec<i32>,
    pub extrema: ExtremaGrid,
    /// `(nlat, nlon, n_years)`
    pub day_spring1: Array3<Option<DayOfYear>>,
    pub day_spring2: Array3<Option<DayOfYear>>,
    /// `(nlat, nlon)` days per year
    pub trend1: Array2<FloatValue>,
    pub trend2: Array2<FloatValue>,
}

impl SpringMetric {
    pub fn to_dataset(&self, grid: &Grid) -> PhenologyResult<Dataset> {
        let mut ds = Dataset::new();
        ds.add_coordinate("lat", grid.lats().to_vec())?;
        ds.add_coordinate("lon", grid.lons().to_vec())?;
        ds.add_integer_coordinate("year", self.years.clone())?;
        self.extrema.add_to_dataset(&mut ds)?;

        let dims = ["lat", "lon", "year"];
        ds.add_integer("day_spring1", &dims, encode_days(&self.day_spring1).into_dyn())?;
        ds.add_integer("day_spring2", &dims, encode_days(&self.day_spring2).into_dyn())?;
        ds.add_float("day_spring_trend1", &["lat", "lon"], self.trend1.clone().into_dyn())?;
        ds.add_float("day_spring_trend2", &["lat", "lon"], self.trend2.clone().into_dyn())?;
        Ok(ds)
    }
}

/// Spring start of every pixel and year, followed by the trends across years
pub fn compute_spring(
    source: &dyn DailyFieldSource,
    kind: &DatasetKind,
    years: &[i32],
    turning_days: &Array2<Option<DayOfYear>>,
    thresholds: &Thresholds,
) -> SpringMetric {
    let (nlat, nlon) = turning_days.dim();
    let n_years = years.len();
    let mut extrema = ExtremaGrid::new(nlat, nlon, n_years);
    let mut day_spring1 = Array3::from_elem((nlat, nlon, n_years), None);
    let mut day_spring2 = Array3::from_elem((nlat, nlon, n_years), None);

    for (y, &year) in years.iter().enumerate() {
        log::info!("Processing year {year}");
        let cube = load_year(source, kind, year, (nlat, nlon));
        let results: Vec<(AnnualExtrema, SpringStart)> = (0..nlat * nlon)
            .into_par_iter()
            .map(|p| {
                let (i, j) = (p / nlon, p % nlon);
                spring_year(&pixel_year(&cube, i, j), turning_days[[i, j]], thresholds)
            })
            .collect();

        for (p, (e, s)) in results.iter().enumerate() {
            let (i, j) = (p / nlon, p % nlon);
            extrema.set(i, j, y, e);
            day_spring1[[i, j, y]] = s.day1;
            day_spring2[[i, j, y]] = s.day2;
        }
    }

    let trend1 = day_trends(years, &day_spring1);
    let trend2 = day_trends(years, &day_spring2);
    SpringMetric {
        years: years.to_vec(),
        extrema,
        day_spring1,
        day_spring2,
        trend1,
        trend2,
    }
}

/// Per-pixel trend of a `(nlat, nlon, n_years)` day array
pub fn day_trends(years: &[i32], days: &Array3<Option<DayOfYear>>) -> Array2<FloatValue> {
    let (nlat, nlon, _) = days.dim();
    Array2::from_shape_fn((nlat, nlon), |(i, j)| {
        let series: Vec<Option<DayOfYear>> = days.slice(s![i, j, ..]).to_vec();
        fit_day_trend(years, &series)
    })
}
