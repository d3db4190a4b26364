//! Least-squares polynomial fitting
//!
//! Fits are computed on the abscissa mapped affinely onto `[-1, 1]`. A polynomial of
//! degree `n` in the mapped variable is a polynomial of degree `n` in the original
//! one, so the least-squares solution is unchanged while the Vandermonde matrix stays
//! well conditioned for day numbers up to 366 raised to the sixth power.

use crate::FloatValue;
use nalgebra::{DMatrix, DVector};

/// Polynomial fitted by [`Polynomial::fit`]
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    /// Coefficients in ascending powers of the mapped abscissa
    coefficients: Vec<FloatValue>,
    center: FloatValue,
    half_width: FloatValue,
}

impl Polynomial {
    /// Least-squares fit of a polynomial of `degree` through `(xs, ys)`
    ///
    /// Returns `None` if the inputs are empty, of different lengths or contain
    /// non-finite values. Underdetermined systems (fewer points than coefficients)
    /// get the minimum-norm solution.
    pub fn fit(xs: &[FloatValue], ys: &[FloatValue], degree: usize) -> Option<Self> {
        if xs.is_empty() || xs.len() != ys.len() {
            return None;
        }
        if xs.iter().chain(ys.iter()).any(|v| !v.is_finite()) {
            return None;
        }

        let (lo, hi) = xs
            .iter()
            .fold((FloatValue::INFINITY, FloatValue::NEG_INFINITY), |(lo, hi), &x| {
                (lo.min(x), hi.max(x))
            });
        let center = 0.5 * (lo + hi);
        let half_width = if hi > lo { 0.5 * (hi - lo) } else { 1.0 };

        let n_coef = degree + 1;
        let design = DMatrix::from_fn(xs.len(), n_coef, |row, col| {
            ((xs[row] - center) / half_width).powi(col as i32)
        });
        let rhs = DVector::from_column_slice(ys);

        let svd = design.svd(true, true);
        let max_singular = svd.singular_values.max();
        let eps = FloatValue::EPSILON * xs.len().max(n_coef) as FloatValue * max_singular;
        let solution = svd.solve(&rhs, eps).ok()?;

        Some(Self {
            coefficients: solution.iter().copied().collect(),
            center,
            half_width,
        })
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    /// Evaluate at `x` using Horner's scheme
    pub fn evaluate(&self, x: FloatValue) -> FloatValue {
        let t = (x - self.center) / self.half_width;
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, &c| acc * t + c)
    }
}

/// Ordinary least-squares line through `(xs, ys)`
///
/// Returns `(slope, intercept)`, or `None` with fewer than two distinct abscissae.
pub fn linear_fit(xs: &[FloatValue], ys: &[FloatValue]) -> Option<(FloatValue, FloatValue)> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let n = xs.len() as FloatValue;
    let x_mean = xs.iter().sum::<FloatValue>() / n;
    let y_mean = ys.iter().sum::<FloatValue>() / n;

    let (sxy, sxx) = xs
        .iter()
        .zip(ys)
        .fold((0.0, 0.0), |(sxy, sxx), (&x, &y)| {
            let dx = x - x_mean;
            (sxy + dx * (y - y_mean), sxx + dx * dx)
        });

    if sxx == 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    Some((slope, y_mean - slope * x_mean))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn recovers_exact_sextic() {
        // (x - 45)(x - 200)(x - 300) * small scale, expanded implicitly
        let f = |x: f64| 1e-6 * (x - 45.0) * (x - 200.0) * (x - 300.0) * (1.0 + 1e-3 * x);
        let xs: Vec<f64> = (1..=366).map(|d| d as f64).collect();
        let ys: Vec<f64> = xs.iter().map(|&x| f(x)).collect();

        let poly = Polynomial::fit(&xs, &ys, 6).unwrap();
        assert_eq!(poly.degree(), 6);
        for x in [1.0, 45.0, 120.0, 250.0, 366.0] {
            assert_relative_eq!(poly.evaluate(x), f(x), epsilon = 1e-6);
        }
    }

    #[test]
    fn underdetermined_fit_passes_through_points() {
        let xs = [10.0, 20.0, 30.0];
        let ys = [1.0, -2.0, 0.5];
        let poly = Polynomial::fit(&xs, &ys, 6).unwrap();
        for (x, y) in xs.iter().zip(ys.iter()) {
            assert_relative_eq!(poly.evaluate(*x), *y, epsilon = 1e-8);
        }
    }

    #[test]
    fn rejects_bad_input() {
        assert!(Polynomial::fit(&[], &[], 2).is_none());
        assert!(Polynomial::fit(&[1.0, 2.0], &[1.0], 1).is_none());
        assert!(Polynomial::fit(&[1.0, 2.0], &[1.0, f64::NAN], 1).is_none());
    }

    #[test]
    fn straight_line() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [1.0, 3.0, 5.0, 7.0];
        let (slope, intercept) = linear_fit(&xs, &ys).unwrap();
        assert_relative_eq!(slope, 2.0);
        assert_relative_eq!(intercept, 1.0);

        assert!(linear_fit(&[1.0], &[1.0]).is_none());
        assert!(linear_fit(&[1.0, 1.0], &[1.0, 2.0]).is_none());
    }
}
