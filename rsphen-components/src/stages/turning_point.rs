//! Turning point of the climatology
//!
//! The first difference of the climatology is noisy from day to day, so its sign is
//! read from a smooth degree-6 least-squares fit instead. The turning day is the
//! first day on which that fit is positive, i.e. where the seasonal cycle starts to
//! rise.

use super::climatology::Climatology;
use ndarray::Array2;
use rsphen_core::calendar::{index_day, DayOfYear};
use rsphen_core::maybe_rayon::*;
use rsphen_core::polynomial::Polynomial;
use rsphen_core::FloatValue;

/// Degree of the polynomial fitted to the difference curve
pub const TURNING_POLY_DEGREE: usize = 6;
/// Fewer finite samples than this yield no turning day
pub const MIN_TURNING_SAMPLES: usize = 3;
/// Last day searched for a positive fit
pub const LAST_TURNING_DAY: DayOfYear = 365;

/// Polynomial fitted to the finite samples of a difference curve
///
/// Position `i` of `diff` is day `i + 1`.
pub fn fit_difference_curve(diff: &[FloatValue]) -> Option<Polynomial> {
    let (days, values): (Vec<FloatValue>, Vec<FloatValue>) = diff
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .map(|(i, &v)| (FloatValue::from(index_day(i)), v))
        .unzip();
    if days.len() < MIN_TURNING_SAMPLES {
        return None;
    }
    Polynomial::fit(&days, &values, TURNING_POLY_DEGREE)
}

/// First day in `1..=365` at which the fitted difference curve is positive
///
/// `None` with fewer than three finite samples or when the fit never turns positive.
pub fn detect_turning_day(diff: &[FloatValue]) -> Option<DayOfYear> {
    let poly = fit_difference_curve(diff)?;
    (1..=LAST_TURNING_DAY).find(|&day| poly.evaluate(FloatValue::from(day)) > 0.0)
}

/// Turning day of every pixel of a climatology
pub fn turning_days(climatology: &Climatology) -> Array2<Option<DayOfYear>> {
    let (nlat, nlon) = climatology.shape();
    let days: Vec<Option<DayOfYear>> = (0..nlat * nlon)
        .into_par_iter()
        .map(|p| detect_turning_day(&climatology.pixel_diff(p / nlon, p % nlon)))
        .collect();
    let mut out = Array2::from_elem((nlat, nlon), None);
    for (p, day) in days.into_iter().enumerate() {
        out[[p / nlon, p % nlon]] = day;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Degree-6 curve crossing zero upwards at day 45
    fn sextic(day: f64) -> f64 {
        let t = day / 100.0;
        -(t - 0.45) * (t - 2.1) * (t - 2.9) * (t - 3.8) * (t * t + 1.0)
    }

    #[test]
    fn crossing_of_a_sextic() {
        let diff: Vec<f64> = (1..=366).map(|d| sextic(d as f64)).collect();
        let day = detect_turning_day(&diff).unwrap();
        assert!((44..=46).contains(&day), "got {day}");
    }

    #[test]
    fn gaps_are_ignored() {
        let diff: Vec<f64> = (1..=366)
            .map(|d| if d % 3 == 0 { f64::NAN } else { sextic(d as f64) })
            .collect();
        let day = detect_turning_day(&diff).unwrap();
        assert!((44..=46).contains(&day), "got {day}");
    }

    #[test]
    fn too_few_samples() {
        let mut diff = vec![f64::NAN; 366];
        assert_eq!(detect_turning_day(&diff), None);
        diff[10] = 1.0;
        diff[20] = 2.0;
        assert_eq!(detect_turning_day(&diff), None);
        diff[30] = 3.0;
        assert!(detect_turning_day(&diff).is_some());
    }

    #[test]
    fn never_positive() {
        let diff = vec![-0.1; 366];
        assert_eq!(detect_turning_day(&diff), None);
    }

    #[test]
    fn turning_days_of_a_grid() {
        let mut mean = ndarray::Array3::from_elem((1, 2, 366), f64::NAN);
        let mut level = 0.0;
        for d in 1..=366 {
            level += sextic(d as f64);
            mean[[0, 0, d - 1]] = level;
        }
        let days = turning_days(&Climatology::from_mean(mean));
        assert!(days[[0, 0]].is_some_and(|d| (44..=46).contains(&d)));
        assert_eq!(days[[0, 1]], None);
    }

    #[test]
    fn positive_from_the_start() {
        let diff: Vec<f64> = (0..366).map(|i| 0.05 + i as f64 * 1e-4).collect();
        assert_eq!(detect_turning_day(&diff), Some(1));
    }
}
