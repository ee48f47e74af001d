//! Sample statistics with degenerate-input guards
//!
//! Thin wrappers over `statrs` that return `0.0` instead of `NaN` for empty or
//! constant inputs, so downstream ratios never divide by rounding noise.

use statrs::statistics::Statistics;

/// Arithmetic mean, `0.0` for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().mean()
}

/// Population (divide by `n`) standard deviation
///
/// Exactly `0.0` when every value is identical.
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 || is_constant(values) {
        return 0.0;
    }
    values.iter().population_std_dev()
}

/// True when all values compare equal (vacuously true for empty input)
pub fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

/// Pearson correlation coefficient over the common prefix of `x` and `y`
///
/// Returns `0.0` if fewer than two pairs are available or either series has
/// zero variance.
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return 0.0;
    }

    let (x, y) = (&x[..n], &y[..n]);
    if is_constant(x) || is_constant(y) {
        return 0.0;
    }

    let covariance = x.iter().population_covariance(y.iter());
    let std_x = x.iter().population_std_dev();
    let std_y = y.iter().population_std_dev();

    if std_x <= 0.0 || std_y <= 0.0 {
        return 0.0;
    }

    (covariance / (std_x * std_y)).clamp(-1.0, 1.0)
}
