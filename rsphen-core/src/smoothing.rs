//! Gap-tolerant moving average

use crate::FloatValue;

/// Window length (days) used for daily series
pub const SMOOTHING_WINDOW: usize = 15;

/// Centered moving average that ignores missing (non-finite) values
///
/// The output at position `i` is the mean of the finite values in the window
/// `[i - left, i + right]`, truncated at both ends of the series, where
/// `left = window / 2` and `right = window - 1 - left`. Positions whose window holds
/// no finite value are `NaN`.
pub fn moving_average(values: &[FloatValue], window: usize) -> Vec<FloatValue> {
    let n = values.len();
    if n == 0 || window == 0 {
        return vec![FloatValue::NAN; n];
    }
    let left = window / 2;
    let right = window - 1 - left;

    // Prefix sums over zero-filled values and over the validity flags
    let mut sums = Vec::with_capacity(n + 1);
    let mut counts = Vec::with_capacity(n + 1);
    sums.push(0.0);
    counts.push(0usize);
    for &v in values {
        let finite = v.is_finite();
        sums.push(sums[sums.len() - 1] + if finite { v } else { 0.0 });
        counts.push(counts[counts.len() - 1] + usize::from(finite));
    }

    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(left);
            let hi = (i + right).min(n - 1) + 1;
            let count = counts[hi] - counts[lo];
            if count == 0 {
                FloatValue::NAN
            } else {
                (sums[hi] - sums[lo]) / count as FloatValue
            }
        })
        .collect()
}

/// [`moving_average`] with the standard daily window
pub fn smooth_daily(values: &[FloatValue]) -> Vec<FloatValue> {
    moving_average(values, SMOOTHING_WINDOW)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn constant_series_is_unchanged() {
        let values = vec![4.0; 30];
        let smoothed = moving_average(&values, 15);
        assert!(smoothed.iter().all(|&v| v == 4.0));
    }

    #[test]
    fn window_is_centered_and_truncated() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let smoothed = moving_average(&values, 3);
        assert_relative_eq!(smoothed[0], 1.5);
        assert_relative_eq!(smoothed[2], 3.0);
        assert_relative_eq!(smoothed[4], 4.5);
    }

    #[test]
    fn gaps_are_filled_from_neighbours() {
        let values = [1.0, f64::NAN, 3.0];
        let smoothed = moving_average(&values, 3);
        assert_relative_eq!(smoothed[1], 2.0);
    }

    #[test]
    fn long_gaps_stay_missing() {
        let mut values = vec![f64::NAN; 40];
        values[0] = 1.0;
        let smoothed = moving_average(&values, 15);
        assert_relative_eq!(smoothed[7], 1.0);
        assert!(smoothed[8].is_nan());
        assert!(smoothed[39].is_nan());
    }

    #[test]
    fn empty_input() {
        assert!(moving_average(&[], 15).is_empty());
        assert!(moving_average(&[f64::NAN; 5], 15).iter().all(|v| v.is_nan()));
    }
}
