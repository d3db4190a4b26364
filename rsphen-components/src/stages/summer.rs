//! Summer start and end
//!
//! The summer of a pixel is measured against its coolest summer: the baseline is the
//! smallest of the per-year maxima of the smoothed days 151 to 240. Summer starts on
//! the first day after the turning day reaching `baseline + offset` and ends on the
//! first day after the annual maximum falling back to it.

use super::annual::{load_year, pixel_year};
use super::extrema::{extrema_of_smoothed, AnnualExtrema, ExtremaGrid};
use super::spring::day_trends;
use crate::source::DailyFieldSource;
use ndarray::{Array2, Array3};
use rsphen_core::calendar::{day_index, index_day, DayOfYear, FILL_VALUE};
use rsphen_core::config::DatasetKind;
use rsphen_core::dataset::{encode_days, Dataset};
use rsphen_core::errors::PhenologyResult;
use rsphen_core::grid::Grid;
use rsphen_core::maybe_rayon::*;
use rsphen_core::smoothing::smooth_daily;
use rsphen_core::FloatValue;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Array positions of the summer window, days 151 to 240
///
/// The window is fixed as 90 positions starting at position 150, so it is written in
/// positions rather than converted from a "day 150" through [`day_index`]. Position 150
/// holds day 151.
pub const SUMMER_WINDOW: Range<usize> = 150..240;

/// Maximum of the smoothed summer window of one year, `NaN` when it has no data
pub fn summer_maximum(series: &[FloatValue]) -> FloatValue {
    let end = SUMMER_WINDOW.end.min(series.len());
    let start = SUMMER_WINDOW.start.min(end);
    smooth_daily(&series[start..end])
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(FloatValue::NAN, FloatValue::max)
}

/// Smallest finite summer maximum and the year it occurred in
///
/// The first year wins a tie.
pub fn summer_baseline(maxima: &[FloatValue], years: &[i32]) -> Option<(FloatValue, i32)> {
    maxima
        .iter()
        .zip(years)
        .filter(|(v, _)| v.is_finite())
        .fold(None, |best: Option<(FloatValue, i32)>, (&v, &year)| match best {
            Some((b, _)) if b <= v => best,
            _ => Some((v, year)),
        })
}

/// Summer start and end days of one pixel and year
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummerEvents {
    pub start: Option<DayOfYear>,
    pub end: Option<DayOfYear>,
}

/// Crossings of `baseline + offset` by a smoothed year
///
/// The start scan runs from the turning day to the end of the year, the end scan from
/// the first annual maximum. Both are missing when the turning day or the baseline is.
pub fn summer_start_end(
    smoothed: &[FloatValue],
    turning_day: Option<DayOfYear>,
    baseline: FloatValue,
    offset: FloatValue,
) -> SummerEvents {
    let Some(turning_day) = turning_day else {
        return SummerEvents::default();
    };
    if !baseline.is_finite() {
        return SummerEvents::default();
    }
    let threshold = baseline + offset;

    let start = (day_index(turning_day)..smoothed.len())
        .find(|&i| smoothed[i] >= threshold)
        .map(index_day);

    let peak = smoothed
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .fold(None, |best: Option<(usize, FloatValue)>, (i, &v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i);
    let end = peak.and_then(|peak| {
        (peak..smoothed.len())
            .find(|&i| smoothed[i] <= threshold)
            .map(index_day)
    });

    SummerEvents { start, end }
}

/// Extrema and summer events of one pixel-year
///
/// Years whose minimum day is missing get no summer events.
pub fn summer_year(
    series: &[FloatValue],
    turning_day: Option<DayOfYear>,
    baseline: FloatValue,
    offset: FloatValue,
) -> (AnnualExtrema, SummerEvents) {
    let smoothed = smooth_daily(series);
    let extrema = extrema_of_smoothed(&smoothed);
    let events = if extrema.day_min.is_some() {
        summer_start_end(&smoothed, turning_day, baseline, offset)
    } else {
        SummerEvents::default()
    };
    (extrema, events)
}

/// Summer metric of a whole grid
#[derive(Debug, Clone, PartialEq)]
pub struct SummerMetric {
    pub years: Vec<i32>,
    pub extrema: ExtremaGrid,
    /// `(nlat, nlon, n_years)`
    pub day_summer_start: Array3<Option<DayOfYear>>,
    pub day_summer_end: Array3<Option<DayOfYear>>,
    /// `(nlat, nlon)` days per year
    pub start_trend: Array2<FloatValue>,
    pub end_trend: Array2<FloatValue>,
    pub baseline: Array2<FloatValue>,
    pub baseline_year: Array2<Option<i32>>,
}

impl SummerMetric {
    pub fn to_dataset(&self, grid: &Grid) -> PhenologyResult<Dataset> {
        let mut ds = Dataset::new();
        ds.add_coordinate("lat", grid.lats().to_vec())?;
        ds.add_coordinate("lon", grid.lons().to_vec())?;
        ds.add_integer_coordinate("year", self.years.clone())?;
        self.extrema.add_to_dataset(&mut ds)?;

        let dims = ["lat", "lon", "year"];
        ds.add_integer("day_summer_start", &dims, encode_days(&self.day_summer_start).into_dyn())?;
        ds.add_integer("day_summer_end", &dims, encode_days(&self.day_summer_end).into_dyn())?;
        let dims = ["lat", "lon"];
        ds.add_float("day_summer_start_trend", &dims, self.start_trend.clone().into_dyn())?;
        ds.add_float("day_summer_end_trend", &dims, self.end_trend.clone().into_dyn())?;
        ds.add_float("data_summer_baseline", &dims, self.baseline.clone().into_dyn())?;
        ds.add_integer(
            "year_summer_baseline",
            &dims,
            self.baseline_year.mapv(|y| y.unwrap_or(FILL_VALUE)).into_dyn(),
        )?;
        Ok(ds)
    }
}

/// Summer events of every pixel and year
///
/// Runs two passes over the years: the first finds the baseline of every pixel, the
/// second locates the crossings.
pub fn compute_summer(
    source: &dyn DailyFieldSource,
    kind: &DatasetKind,
    years: &[i32],
    turning_days: &Array2<Option<DayOfYear>>,
    offset: FloatValue,
) -> SummerMetric {
    let (nlat, nlon) = turning_days.dim();
    let n_years = years.len();

    let mut maxima = Array3::from_elem((nlat, nlon, n_years), FloatValue::NAN);
    for (y, &year) in years.iter().enumerate() {
        log::info!("Summer maxima of {year}");
        let cube = load_year(source, kind, year, (nlat, nlon));
        let values: Vec<FloatValue> = (0..nlat * nlon)
            .into_par_iter()
            .map(|p| summer_maximum(&pixel_year(&cube, p / nlon, p % nlon)))
            .collect();
        for (p, v) in values.into_iter().enumerate() {
            maxima[[p / nlon, p % nlon, y]] = v;
        }
    }

    let mut baseline = Array2::from_elem((nlat, nlon), FloatValue::NAN);
    let mut baseline_year = Array2::from_elem((nlat, nlon), None);
    for i in 0..nlat {
        for j in 0..nlon {
            let series = pixel_year(&maxima, i, j);
            if let Some((value, year)) = summer_baseline(&series, years) {
                baseline[[i, j]] = value;
                baseline_year[[i, j]] = Some(year);
            }
        }
    }

    let mut extrema = ExtremaGrid::new(nlat, nlon, n_years);
    let mut day_summer_start = Array3::from_elem((nlat, nlon, n_years), None);
    let mut day_summer_end = Array3::from_elem((nlat, nlon, n_years), None);
    for (y, &year) in years.iter().enumerate() {
        log::info!("Processing year {year}");
        let cube = load_year(source, kind, year, (nlat, nlon));
        let results: Vec<(AnnualExtrema, SummerEvents)> = (0..nlat * nlon)
            .into_par_iter()
            .map(|p| {
                let (i, j) = (p / nlon, p % nlon);
                summer_year(
                    &pixel_year(&cube, i, j),
                    turning_days[[i, j]],
                    baseline[[i, j]],
                    offset,
                )
            })
            .collect();

        for (p, (e, events)) in results.iter().enumerate() {
            let (i, j) = (p / nlon, p % nlon);
            extrema.set(i, j, y, e);
            day_summer_start[[i, j, y]] = events.start;
            day_summer_end[[i, j, y]] = events.end;
        }
    }

    SummerMetric {
        years: years.to_vec(),
        extrema,
        start_trend: day_trends(years, &day_summer_start),
        end_trend: day_trends(years, &day_summer_end),
        day_summer_start,
        day_summer_end,
        baseline,
        baseline_year,
    }
}
