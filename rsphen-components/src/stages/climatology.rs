//! Day-of-year climatology
//!
//! Every valid daily observation of every year is added to a per-pixel, per-day sum
//! and count held by a [`ClimatologyAccumulator`]. The finished [`Climatology`] holds
//! the mean for each day-of-year and its first difference along the day axis.
//!
//! Sea surface temperature sources also accumulate [`MonthlyRateAccumulator`], which
//! yields the per-month rate of change of the monthly mean (`data_rate`).

use crate::source::{DailyField, DailyFieldSource};
use ndarray::{s, Array2, Array3, Array4, Axis, Ix3, Zip};
use rsphen_core::calendar::{day_index, DayOfYear, DAYS_PER_CLIMATOLOGY, MONTHS};
use rsphen_core::config::DatasetKind;
use rsphen_core::dataset::Dataset;
use rsphen_core::errors::{PhenologyError, PhenologyResult};
use rsphen_core::grid::Grid;
use rsphen_core::polynomial::linear_fit;
use rsphen_core::FloatValue;
use std::ops::RangeInclusive;

/// Days of each month that contribute to the monthly rate
pub const RATE_DAYS_PER_MONTH: u32 = 28;

/// Per-pixel, per-day running sum and count
///
/// Arrays are `(nlat, nlon, 366)` so that the day series of a pixel is contiguous.
#[derive(Debug, Clone, PartialEq)]
pub struct ClimatologyAccumulator {
    sum: Array3<FloatValue>,
    count: Array3<u32>,
}

impl ClimatologyAccumulator {
    pub fn new(nlat: usize, nlon: usize) -> Self {
        Self {
            sum: Array3::zeros((nlat, nlon, DAYS_PER_CLIMATOLOGY)),
            count: Array3::zeros((nlat, nlon, DAYS_PER_CLIMATOLOGY)),
        }
    }

    /// `(nlat, nlon)`
    pub fn shape(&self) -> (usize, usize) {
        let (nlat, nlon, _) = self.sum.dim();
        (nlat, nlon)
    }

    /// Add the values of `field` accepted by `kind` to `day`
    pub fn add(
        &mut self,
        day: DayOfYear,
        field: &DailyField,
        kind: &DatasetKind,
    ) -> PhenologyResult<()> {
        if field.shape() != self.shape() {
            return Err(PhenologyError::ShapeMismatch {
                name: format!("daily field of day {day}"),
                expected: vec![self.shape().0, self.shape().1],
                actual: field.values.shape().to_vec(),
            });
        }
        if let Some(mask) = &field.mask {
            if mask.dim() != field.values.dim() {
                return Err(PhenologyError::ShapeMismatch {
                    name: format!("mask of day {day}"),
                    expected: field.values.shape().to_vec(),
                    actual: mask.shape().to_vec(),
                });
            }
        }
        let index = checked_day_index(day)?;
        let mut sum = self.sum.index_axis_mut(Axis(2), index);
        let mut count = self.count.index_axis_mut(Axis(2), index);

        match &field.mask {
            Some(mask) => Zip::from(&mut sum)
                .and(&mut count)
                .and(&field.values)
                .and(mask)
                .for_each(|s, c, &v, &m| {
                    if kind.accepts(v, Some(m)) {
                        *s += v;
                        *c += 1;
                    }
                }),
            None => Zip::from(&mut sum)
                .and(&mut count)
                .and(&field.values)
                .for_each(|s, c, &v| {
                    if kind.accepts(v, None) {
                        *s += v;
                        *c += 1;
                    }
                }),
        }
        Ok(())
    }

    /// Fold another accumulator over the same grid into this one
    pub fn merge(&mut self, other: &ClimatologyAccumulator) -> PhenologyResult<()> {
        if other.sum.dim() != self.sum.dim() {
            return Err(PhenologyError::ShapeMismatch {
                name: "climatology accumulator".to_string(),
                expected: self.sum.shape().to_vec(),
                actual: other.sum.shape().to_vec(),
            });
        }
        self.sum += &other.sum;
        self.count += &other.count;
        Ok(())
    }

    pub fn counts(&self) -> &Array3<u32> {
        &self.count
    }

    /// Mean per pixel and day, `NaN` where nothing was observed
    pub fn finish(self) -> Climatology {
        let mean = Zip::from(&self.sum)
            .and(&self.count)
            .map_collect(|&s, &c| {
                if c == 0 {
                    FloatValue::NAN
                } else {
                    s / FloatValue::from(c)
                }
            });
        let mut climatology = Climatology::from_mean(mean);
        climatology.counts = Some(self.count);
        climatology
    }
}

fn checked_day_index(day: DayOfYear) -> PhenologyResult<usize> {
    if (1..=DAYS_PER_CLIMATOLOGY as DayOfYear).contains(&day) {
        Ok(day_index(day))
    } else {
        Err(PhenologyError::Error(format!(
            "Day {day} is outside 1..={DAYS_PER_CLIMATOLOGY}"
        )))
    }
}

/// First difference along the last axis; the first day is `NaN`
pub fn day_difference(mean: &Array3<FloatValue>) -> Array3<FloatValue> {
    let mut diff = Array3::from_elem(mean.dim(), FloatValue::NAN);
    let n = mean.len_of(Axis(2));
    if n > 1 {
        let current = mean.slice(s![.., .., 1..]);
        let previous = mean.slice(s![.., .., ..n - 1]);
        diff.slice_mut(s![.., .., 1..]).assign(&(&current - &previous));
    }
    diff
}

/// Day-of-year climatology of a dataset
#[derive(Debug, Clone, PartialEq)]
pub struct Climatology {
    /// `(nlat, nlon, 366)` mean per day-of-year
    pub mean: Array3<FloatValue>,
    /// `(nlat, nlon, 366)` first difference of `mean`
    pub diff: Array3<FloatValue>,
    /// Number of observations behind each mean, when known
    pub counts: Option<Array3<u32>>,
    /// `(12, nlat, nlon)` rate of change of the monthly mean, sea surface temperature only
    pub data_rate: Option<Array3<FloatValue>>,
}

impl Climatology {
    pub fn from_mean(mean: Array3<FloatValue>) -> Self {
        let diff = day_difference(&mean);
        Self {
            mean,
            diff,
            counts: None,
            data_rate: None,
        }
    }

    /// `(nlat, nlon)`
    pub fn shape(&self) -> (usize, usize) {
        let (nlat, nlon, _) = self.mean.dim();
        (nlat, nlon)
    }

    pub fn pixel_mean(&self, i: usize, j: usize) -> Vec<FloatValue> {
        self.mean.slice(s![i, j, ..]).to_vec()
    }

    pub fn pixel_diff(&self, i: usize, j: usize) -> Vec<FloatValue> {
        self.diff.slice(s![i, j, ..]).to_vec()
    }

    /// Climatology file contents
    pub fn to_dataset(
        &self,
        grid: &Grid,
        kind: &DatasetKind,
        years: RangeInclusive<i32>,
    ) -> PhenologyResult<Dataset> {
        let mut ds = Dataset::new();
        ds.add_coordinate("lat", grid.lats().to_vec())?;
        ds.add_coordinate("lon", grid.lons().to_vec())?;
        ds.add_integer_coordinate("time", (1..=DAYS_PER_CLIMATOLOGY as i32).collect())?;
        ds.add_integer_coordinate("year", years.collect())?;
        ds.add_integer_coordinate("month", (1..=MONTHS as i32).collect())?;

        let dims = ["lat", "lon", "time"];
        ds.add_float(&kind.climatology_variable(), &dims, self.mean.clone().into_dyn())?;
        ds.add_float(&kind.diff_climatology_variable(), &dims, self.diff.clone().into_dyn())?;
        if let Some(rate) = &self.data_rate {
            ds.add_float("data_rate", &["month", "lat", "lon"], rate.clone().into_dyn())?;
        }
        if let (true, Some(counts)) = (kind.is_chlorophyll(), &self.counts) {
            let counts = counts.mapv(|c| i32::try_from(c).unwrap_or(i32::MAX));
            ds.add_integer("chlor_num_days", &dims, counts.into_dyn())?;
        }
        Ok(ds)
    }

    /// Read back a climatology written by [`Climatology::to_dataset`]
    ///
    /// A missing difference variable is recomputed from the mean.
    pub fn from_dataset(ds: &Dataset, kind: &DatasetKind) -> PhenologyResult<Self> {
        let mean = ds.float_array::<Ix3>(&kind.climatology_variable())?;
        if mean.len_of(Axis(2)) != DAYS_PER_CLIMATOLOGY {
            return Err(PhenologyError::ShapeMismatch {
                name: kind.climatology_variable(),
                expected: vec![mean.len_of(Axis(0)), mean.len_of(Axis(1)), DAYS_PER_CLIMATOLOGY],
                actual: mean.shape().to_vec(),
            });
        }
        let diff_name = kind.diff_climatology_variable();
        let diff = if ds.has_variable(&diff_name) {
            ds.float_array::<Ix3>(&diff_name)?
        } else {
            day_difference(&mean)
        };
        let counts = if ds.has_variable("chlor_num_days") {
            Some(
                ds.integer_array::<Ix3>("chlor_num_days")?
                    .mapv(|c| u32::try_from(c).unwrap_or(0)),
            )
        } else {
            None
        };
        let data_rate = if ds.has_variable("data_rate") {
            Some(ds.float_array::<Ix3>("data_rate")?)
        } else {
            None
        };
        Ok(Self {
            mean,
            diff,
            counts,
            data_rate,
        })
    }
}

/// Per `(year, month)` sums used for the monthly rate
///
/// Only days `1..=28` of each month are kept, and negative values are discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyRateAccumulator {
    start_year: i32,
    /// `(n_years, 12, nlat, nlon)`
    sum: Array4<FloatValue>,
    count: Array4<u32>,
}

impl MonthlyRateAccumulator {
    pub fn new(years: RangeInclusive<i32>, nlat: usize, nlon: usize) -> Self {
        let n_years = years.clone().count();
        Self {
            start_year: *years.start(),
            sum: Array4::zeros((n_years, MONTHS, nlat, nlon)),
            count: Array4::zeros((n_years, MONTHS, nlat, nlon)),
        }
    }

    /// Add a field observed on `month`/`day_of_month` of `year`
    ///
    /// Fields outside the first 28 days of a month or outside the year range are ignored.
    pub fn add(&mut self, year: i32, month: u32, day_of_month: u32, values: &Array2<FloatValue>) {
        if !(1..=RATE_DAYS_PER_MONTH).contains(&day_of_month)
            || !(1..=MONTHS as u32).contains(&month)
        {
            return;
        }
        let Ok(year_index) = usize::try_from(year - self.start_year) else {
            return;
        };
        if year_index >= self.sum.len_of(Axis(0)) {
            return;
        }
        let m = (month - 1) as usize;
        let mut sum = self.sum.slice_mut(s![year_index, m, .., ..]);
        let mut count = self.count.slice_mut(s![year_index, m, .., ..]);
        if sum.dim() != values.dim() {
            log::warn!(
                "Ignoring {year}-{month:02}-{day_of_month:02} for the monthly rate: shape mismatch"
            );
            return;
        }
        Zip::from(&mut sum)
            .and(&mut count)
            .and(values)
            .for_each(|s, c, &v| {
                if v.is_finite() && v >= 0.0 {
                    *s += v;
                    *c += 1;
                }
            });
    }

    /// `(12, nlat, nlon)` slope of the yearly monthly means against the year index
    pub fn finish(&self) -> Array3<FloatValue> {
        let (n_years, _, nlat, nlon) = self.sum.dim();
        Array3::from_shape_fn((MONTHS, nlat, nlon), |(m, i, j)| {
            let (xs, ys): (Vec<FloatValue>, Vec<FloatValue>) = (0..n_years)
                .filter_map(|y| {
                    let c = self.count[[y, m, i, j]];
                    (c > 0).then(|| (y as FloatValue, self.sum[[y, m, i, j]] / FloatValue::from(c)))
                })
                .unzip();
            linear_fit(&xs, &ys).map_or(FloatValue::NAN, |(slope, _)| slope)
        })
    }
}

/// Accumulate the climatology of `years` from `source`
///
/// Days without files are skipped. For sea surface temperature the monthly rate is
/// accumulated as well.
pub fn compute_climatology(
    source: &dyn DailyFieldSource,
    kind: &DatasetKind,
    years: RangeInclusive<i32>,
) -> PhenologyResult<Climatology> {
    let grid = source.grid()?;
    let (nlat, nlon) = grid.shape();
    let mut accumulator = ClimatologyAccumulator::new(nlat, nlon);
    let mut rate = (!kind.is_chlorophyll())
        .then(|| MonthlyRateAccumulator::new(years.clone(), nlat, nlon));

    for year in years.clone() {
        log::info!("Processing year {year}");
        let mut n_fields = 0usize;
        for day in 1..=kind.days_scanned(year) {
            for field in source.read_day(year, day) {
                if let Err(e) = accumulator.add(day, &field, kind) {
                    log::warn!("Skipping field {year}/{day:03}: {e}");
                    continue;
                }
                let date = field.calendar_date(year, day);
                if let (Some(rate), Some((month, dom))) = (rate.as_mut(), date) {
                    rate.add(year, month, dom, &field.values);
                }
                n_fields += 1;
            }
        }
        log::debug!("Accumulated {n_fields} fields for {year}");
    }

    let mut climatology = accumulator.finish();
    climatology.data_rate = rate.map(|r| r.finish());
    Ok(climatology)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn grid() -> Grid {
        Grid::new(vec![40.0, 41.0], vec![-20.0, -19.0]).unwrap()
    }

    #[test]
    fn unobserved_pixels_are_nan() {
        let kind = DatasetKind::sea_surface_temperature();
        let mut acc = ClimatologyAccumulator::new(2, 2);
        let field = DailyField::new(array![[280.0, f64::NAN], [290.0, 400.0]])
            .with_mask(array![[1.0, 1.0], [2.0, 1.0]]);
        acc.add(10, &field, &kind).unwrap();
        let clim = acc.finish();

        assert_eq!(clim.mean[[0, 0, 9]], 280.0);
        assert!(clim.mean[[0, 1, 9]].is_nan());
        // land pixel
        assert!(clim.mean[[1, 0, 9]].is_nan());
        // out of range
        assert!(clim.mean[[1, 1, 9]].is_nan());
        assert!(clim.mean[[0, 0, 10]].is_nan());
        assert!(clim.mean.iter().all(|v| *v != 0.0));
    }

    #[test]
    fn mean_and_difference() {
        let kind = DatasetKind::chlorophyll();
        let mut acc = ClimatologyAccumulator::new(1, 1);
        acc.add(1, &DailyField::new(array![[1.0]]), &kind).unwrap();
        acc.add(1, &DailyField::new(array![[3.0]]), &kind).unwrap();
        acc.add(2, &DailyField::new(array![[4.0]]), &kind).unwrap();
        acc.add(2, &DailyField::new(array![[0.0]]), &kind).unwrap();
        assert_eq!(acc.counts()[[0, 0, 0]], 2);
        assert_eq!(acc.counts()[[0, 0, 1]], 1);

        let clim = acc.finish();
        assert_relative_eq!(clim.mean[[0, 0, 0]], 2.0);
        assert_relative_eq!(clim.mean[[0, 0, 1]], 4.0);
        assert!(clim.diff[[0, 0, 0]].is_nan());
        assert_relative_eq!(clim.diff[[0, 0, 1]], 2.0);
        assert!(clim.diff[[0, 0, 2]].is_nan());
    }

    #[test]
    fn merge_is_a_sum() {
        let kind = DatasetKind::chlorophyll();
        let mut a = ClimatologyAccumulator::new(1, 1);
        let mut b = ClimatologyAccumulator::new(1, 1);
        a.add(5, &DailyField::new(array![[1.0]]), &kind).unwrap();
        b.add(5, &DailyField::new(array![[2.0]]), &kind).unwrap();
        a.merge(&b).unwrap();
        assert_relative_eq!(a.finish().mean[[0, 0, 4]], 1.5);

        let other = ClimatologyAccumulator::new(2, 1);
        assert!(ClimatologyAccumulator::new(1, 1).merge(&other).is_err());
    }

    #[test]
    fn rejects_bad_day_and_shape() {
        let kind = DatasetKind::chlorophyll();
        let mut acc = ClimatologyAccumulator::new(1, 1);
        assert!(acc.add(0, &DailyField::new(array![[1.0]]), &kind).is_err());
        assert!(acc.add(367, &DailyField::new(array![[1.0]]), &kind).is_err());
        assert!(acc.add(1, &DailyField::new(array![[1.0, 2.0]]), &kind).is_err());
    }

    #[test]
    fn monthly_rate_slope() {
        let mut rate = MonthlyRateAccumulator::new(2000..=2003, 1, 1);
        for (k, year) in (2000..=2003).enumerate() {
            rate.add(year, 1, 5, &array![[280.0 + 2.0 * k as f64]]);
            // day 29 is excluded
            rate.add(year, 1, 29, &array![[1000.0]]);
            // negative values are discarded
            rate.add(year, 1, 6, &array![[-5.0]]);
        }
        rate.add(2001, 2, 1, &array![[280.0]]);
        let result = rate.finish();
        assert_relative_eq!(result[[0, 0, 0]], 2.0, epsilon = 1e-12);
        // a single year is not enough for a slope
        assert!(result[[1, 0, 0]].is_nan());
        assert!(result[[5, 0, 0]].is_nan());
    }

    #[test]
    fn compute_from_memory_source() {
        let kind = DatasetKind::sea_surface_temperature();
        let mut source = MemorySource::new(grid());
        for (year, value) in [(2003, 280.0), (2004, 282.0)] {
            source
                .insert(year, 32, DailyField::new(Array2::from_elem((2, 2), value)))
                .unwrap();
        }
        let clim = compute_climatology(&source, &kind, 2003..=2004).unwrap();
        assert_relative_eq!(clim.mean[[1, 1, 31]], 281.0);
        assert!(clim.mean[[1, 1, 30]].is_nan());
        // day 32 is February 1st
        let rate = clim.data_rate.unwrap();
        assert_relative_eq!(rate[[1, 0, 0]], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn dataset_round_trip() {
        let kind = DatasetKind::chlorophyll();
        let mut acc = ClimatologyAccumulator::new(2, 2);
        acc.add(100, &DailyField::new(array![[0.5, 0.2], [0.1, 0.0]]), &kind)
            .unwrap();
        let clim = acc.finish();
        let ds = clim.to_dataset(&grid(), &kind, 2003..=2005).unwrap();
        assert_eq!(ds.dimension("year"), Some(3));
        assert!(ds.has_variable("chlor_num_days"));
        assert!(!ds.has_variable("data_rate"));

        let back = Climatology::from_dataset(&ds, &kind).unwrap();
        assert_eq!(back.mean[[0, 0, 99]], 0.5);
        assert!(back.mean[[1, 1, 99]].is_nan());
        assert_eq!(back.counts.unwrap()[[1, 1, 99]], 0);
    }
}
