//! Per-pixel linear trends across years
//!
//! A trend is the least-squares slope of a metric against the year, computed only when
//! the record is dense enough. With too few finite values a single outlying year would
//! dominate the slope, so the fit requires strictly more than half of the years.

use crate::calendar::DayOfYear;
use crate::polynomial::linear_fit;
use crate::FloatValue;

/// Fraction of years that must hold a finite value (strictly exceeded)
pub const MIN_TREND_COVERAGE: FloatValue = 0.5;

/// Slope (units per year) of `values` against `years`
///
/// Non-finite values are discarded. Returns `NaN` when the number of remaining values
/// is not greater than half of `years.len()`, or when the two slices differ in length.
pub fn fit_trend(years: &[i32], values: &[FloatValue]) -> FloatValue {
    if years.len() != values.len() {
        log::warn!(
            "Cannot fit a trend of {} values against {} years",
            values.len(),
            years.len()
        );
        return FloatValue::NAN;
    }

    let (xs, ys): (Vec<FloatValue>, Vec<FloatValue>) = years
        .iter()
        .zip(values)
        .filter(|(_, v)| v.is_finite())
        .map(|(&year, &v)| (FloatValue::from(year), v))
        .unzip();

    if (xs.len() as FloatValue) <= MIN_TREND_COVERAGE * years.len() as FloatValue {
        return FloatValue::NAN;
    }

    linear_fit(&xs, &ys)
        .map(|(slope, _)| slope)
        .unwrap_or(FloatValue::NAN)
}

/// [`fit_trend`] over a series of event days
pub fn fit_day_trend(years: &[i32], days: &[Option<DayOfYear>]) -> FloatValue {
    let values: Vec<FloatValue> = days
        .iter()
        .map(|d| d.map_or(FloatValue::NAN, FloatValue::from))
        .collect();
    fit_trend(years, &values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn linear_series() -> (Vec<i32>, Vec<f64>) {
        let years: Vec<i32> = (2000..=2020).collect();
        let values = years.iter().map(|&y| 3.0 * y as f64 + 7.0).collect();
        (years, values)
    }

    #[test]
    fn full_coverage_recovers_slope() {
        let (years, values) = linear_series();
        assert_relative_eq!(fit_trend(&years, &values), 3.0, epsilon = 1e-9);
    }

    #[test]
    fn majority_coverage_recovers_slope() {
        let (years, mut values) = linear_series();
        // 21 years, keep 11 finite
        for v in values.iter_mut().step_by(2).take(10) {
            *v = f64::NAN;
        }
        assert_eq!(values.iter().filter(|v| v.is_finite()).count(), 11);
        assert_relative_eq!(fit_trend(&years, &values), 3.0, epsilon = 1e-9);
    }

    #[test]
    fn half_coverage_is_missing() {
        let years: Vec<i32> = (2000..2010).collect();
        let values: Vec<f64> = years
            .iter()
            .enumerate()
            .map(|(i, &y)| if i < 5 { 3.0 * y as f64 + 7.0 } else { f64::NAN })
            .collect();
        assert!(fit_trend(&years, &values).is_nan());
    }

    #[test]
    fn day_series() {
        let years = [2001, 2002, 2003, 2004];
        let days = [Some(100), Some(98), None, Some(94)];
        assert_relative_eq!(fit_day_trend(&years, &days), -2.0, epsilon = 1e-9);

        let sparse = [Some(100), None, None, Some(94)];
        assert!(fit_day_trend(&years, &sparse).is_nan());
    }

    #[test]
    fn mismatched_lengths_have_no_trend() {
        assert!(fit_trend(&[2001, 2002, 2003], &[1.0, 2.0]).is_nan());
    }
}
