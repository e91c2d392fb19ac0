use serde::Serialize;

use super::{mean, require, variance, StatsError};

/// Two-sided 95% quantile of the standard normal distribution, as used for the interval.
pub const Z_95: f64 = 1.96;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceInterval {
    pub difference: f64,
    pub standard_error: f64,
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    /// From group means, sample standard deviations and sizes.
    pub fn from_summaries(
        (mean_a, std_a, n_a): (f64, f64, usize),
        (mean_b, std_b, n_b): (f64, f64, usize),
    ) -> Self {
        let se_a = std_a / (n_a as f64).sqrt();
        let se_b = std_b / (n_b as f64).sqrt();
        let standard_error = (se_a.powi(2) + se_b.powi(2)).sqrt();
        let difference = mean_a - mean_b;

        Self {
            difference,
            standard_error,
            lower: difference - Z_95 * standard_error,
            upper: difference + Z_95 * standard_error,
        }
    }

    pub fn contains_zero(&self) -> bool {
        self.lower <= 0.0 && 0.0 <= self.upper
    }
}

/// 95% interval of `mean(a) - mean(b)` using the normal approximation rather than a t
/// interval.
pub fn mean_difference_ci(a: &[f64], b: &[f64]) -> Result<ConfidenceInterval, StatsError> {
    require(a, 2)?;
    require(b, 2)?;

    Ok(ConfidenceInterval::from_summaries(
        (mean(a), variance(a).sqrt(), a.len()),
        (mean(b), variance(b).sqrt(), b.len()),
    ))
}
