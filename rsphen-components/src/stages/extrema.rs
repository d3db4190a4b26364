//! Annual minimum and maximum of a smoothed daily series

use ndarray::Array3;
use rsphen_core::calendar::{index_day, DayOfYear};
use rsphen_core::dataset::{encode_days, Dataset};
use rsphen_core::errors::PhenologyResult;
use rsphen_core::smoothing::smooth_daily;
use rsphen_core::FloatValue;
use serde::{Deserialize, Serialize};

/// Latest day accepted as the winter minimum of the year (array position 300)
pub const LATEST_MINIMUM_DAY: DayOfYear = 301;

/// Day and value of the annual extrema of one pixel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnnualExtrema {
    pub day_min: Option<DayOfYear>,
    pub data_min: FloatValue,
    pub day_max: Option<DayOfYear>,
    pub data_max: FloatValue,
}

impl AnnualExtrema {
    pub fn missing() -> Self {
        Self {
            day_min: None,
            data_min: FloatValue::NAN,
            day_max: None,
            data_max: FloatValue::NAN,
        }
    }
}

impl Default for AnnualExtrema {
    fn default() -> Self {
        Self::missing()
    }
}

/// Position and value of the first minimum and first maximum of the finite values
pub fn extrema_positions(values: &[FloatValue]) -> Option<((usize, FloatValue), (usize, FloatValue))> {
    let mut finite = values.iter().copied().enumerate().filter(|(_, v)| v.is_finite());
    let first = finite.next()?;
    Some(finite.fold((first, first), |(min, max), (i, v)| {
        (
            if v < min.1 { (i, v) } else { min },
            if v > max.1 { (i, v) } else { max },
        )
    }))
}

/// Extrema of an already smoothed year
///
/// When the minimum falls after [`LATEST_MINIMUM_DAY`] its day is dropped and its value kept.
pub fn extrema_of_smoothed(smoothed: &[FloatValue]) -> AnnualExtrema {
    let Some(((i_min, v_min), (i_max, v_max))) = extrema_positions(smoothed) else {
        return AnnualExtrema::missing();
    };
    let day_min = index_day(i_min);
    AnnualExtrema {
        day_min: (day_min <= LATEST_MINIMUM_DAY).then_some(day_min),
        data_min: v_min,
        day_max: Some(index_day(i_max)),
        data_max: v_max,
    }
}

/// Smooth one year of raw daily values and locate its extrema
pub fn annual_extrema(series: &[FloatValue]) -> AnnualExtrema {
    extrema_of_smoothed(&smooth_daily(series))
}

/// Extrema of every pixel and year, arrays are `(nlat, nlon, n_years)`
#[derive(Debug, Clone, PartialEq)]
pub struct ExtremaGrid {
    pub day_min: Array3<Option<DayOfYear>>,
    pub data_min: Array3<FloatValue>,
    pub day_max: Array3<Option<DayOfYear>>,
    pub data_max: Array3<FloatValue>,
}

impl ExtremaGrid {
    pub fn new(nlat: usize, nlon: usize, n_years: usize) -> Self {
        let shape = (nlat, nlon, n_years);
        Self {
            day_min: Array3::from_elem(shape, None),
            data_min: Array3::from_elem(shape, FloatValue::NAN),
            day_max: Array3::from_elem(shape, None),
            data_max: Array3::from_elem(shape, FloatValue::NAN),
        }
    }

    pub fn set(&mut self, i: usize, j: usize, year_index: usize, extrema: &AnnualExtrema) {
        self.day_min[[i, j, year_index]] = extrema.day_min;
        self.data_min[[i, j, year_index]] = extrema.data_min;
        self.day_max[[i, j, year_index]] = extrema.day_max;
        self.data_max[[i, j, year_index]] = extrema.data_max;
    }

    pub fn get(&self, i: usize, j: usize, year_index: usize) -> AnnualExtrema {
        AnnualExtrema {
            day_min: self.day_min[[i, j, year_index]],
            data_min: self.data_min[[i, j, year_index]],
            day_max: self.day_max[[i, j, year_index]],
            data_max: self.data_max[[i, j, year_index]],
        }
    }

    /// Add `day_min`, `day_max`, `data_min` and `data_max` over `(lat, lon, year)`
    pub fn add_to_dataset(&self, ds: &mut Dataset) -> PhenologyResult<()> {
        let dims = ["lat", "lon", "year"];
        ds.add_integer("day_min", &dims, encode_days(&self.day_min).into_dyn())?;
        ds.add_integer("day_max", &dims, encode_days(&self.day_max).into_dyn())?;
        ds.add_float("data_min", &dims, self.data_min.clone().into_dyn())?;
        ds.add_float("data_max", &dims, self.data_max.clone().into_dyn())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn smoothed_extrema_of_a_clean_series() {
        // Symmetric V shapes keep their extremum under a centered window
        let series: Vec<f64> = (1..=366)
            .map(|d: i32| {
                if d <= 200 {
                    (d - 10).abs() as f64
                } else {
                    (190 - (d - 200)) as f64
                }
            })
            .collect();
        let extrema = annual_extrema(&series);
        assert_eq!(extrema.day_min, Some(10));
        assert_eq!(extrema.day_max, Some(200));
        assert_relative_eq!(extrema.data_min, 56.0 / 15.0, epsilon = 1e-12);
        assert_relative_eq!(extrema.data_max, 190.0 - 56.0 / 15.0, epsilon = 1e-9);
    }

    #[test]
    fn late_minimum_drops_the_day() {
        let series: Vec<f64> = (1..=366)
            .map(|d: i32| if d <= 340 { 280.0 + (d as f64) * 0.01 } else { 270.0 })
            .collect();
        let extrema = annual_extrema(&series);
        assert_eq!(extrema.day_min, None);
        assert_relative_eq!(extrema.data_min, 270.0, epsilon = 1e-9);
        assert_eq!(extrema.day_max, Some(333));
    }

    #[test]
    fn minimum_day_cutoff() {
        let mut smoothed = vec![5.0; 366];
        smoothed[300] = 1.0;
        assert_eq!(extrema_of_smoothed(&smoothed).day_min, Some(301));

        smoothed[300] = 5.0;
        smoothed[301] = 1.0;
        let extrema = extrema_of_smoothed(&smoothed);
        assert_eq!(extrema.day_min, None);
        assert_relative_eq!(extrema.data_min, 1.0);
    }

    #[test]
    fn all_missing() {
        let extrema = annual_extrema(&[f64::NAN; 366]);
        assert_eq!(extrema.day_min, None);
        assert_eq!(extrema.day_max, None);
        assert!(extrema.data_min.is_nan());
        assert!(extrema.data_max.is_nan());
    }

    #[test]
    fn ties_take_the_first_day() {
        let mut smoothed = vec![5.0; 366];
        smoothed[20] = 1.0;
        smoothed[40] = 1.0;
        smoothed[100] = 9.0;
        smoothed[120] = 9.0;
        let extrema = extrema_of_smoothed(&smoothed);
        assert_eq!(extrema.day_min, Some(21));
        assert_eq!(extrema.day_max, Some(101));
        assert_relative_eq!(extrema.data_max, 9.0);
    }
}
