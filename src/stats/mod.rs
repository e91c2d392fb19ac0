//! Statistics used by the significance engine. Samples are plain `&[f64]`.
mod anova;
mod confidence;
mod descriptive;
pub mod distributions;
mod effect_size;
mod normality;
mod two_sample;

use std::fmt::Display;

use serde::Serialize;
use thiserror::Error;

pub use anova::{one_way_anova, AnovaResult};
pub use confidence::{mean_difference_ci, ConfidenceInterval, Z_95};
pub use descriptive::{describe, Descriptive};
pub use effect_size::{cohens_d, EffectSize, EffectSizeBand};
pub use normality::{shapiro_wilk, ShapiroWilk};
pub use two_sample::{mann_whitney_u, t_test_independent, MannWhitneyMethod, MannWhitneyU, TTest};

/// Significance threshold used throughout.
pub const ALPHA: f64 = 0.05;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum StatsError {
    #[error("needs at least {required} observations, got {actual}")]
    InsufficientSample { required: usize, actual: usize },
    #[error("degenerate sample: {0}")]
    DegenerateSample(String),
    #[error("group {index} is empty")]
    EmptyGroup { index: usize },
}

fn require(sample: &[f64], required: usize) -> Result<(), StatsError> {
    if sample.len() < required {
        Err(StatsError::InsufficientSample {
            required,
            actual: sample.len(),
        })
    } else {
        Ok(())
    }
}

fn mean(sample: &[f64]) -> f64 {
    sample.iter().sum::<f64>() / sample.len() as f64
}

fn sum_of_squares(sample: &[f64], mean: f64) -> f64 {
    sample.iter().map(|value| (value - mean).powi(2)).sum()
}

/// Sample variance, ddof = 1. Callers make sure there are at least two observations.
fn variance(sample: &[f64]) -> f64 {
    sum_of_squares(sample, mean(sample)) / (sample.len() - 1) as f64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignificanceLevel {
    HighlySignificant,
    VerySignificant,
    Significant,
    NotSignificant,
}

impl SignificanceLevel {
    pub fn from_p(p_value: f64) -> Self {
        if p_value < 0.001 {
            SignificanceLevel::HighlySignificant
        } else if p_value < 0.01 {
            SignificanceLevel::VerySignificant
        } else if p_value < ALPHA {
            SignificanceLevel::Significant
        } else {
            SignificanceLevel::NotSignificant
        }
    }

    /// The bound the p-value is known to be below, `None` when not significant.
    pub fn threshold(&self) -> Option<f64> {
        match self {
            SignificanceLevel::HighlySignificant => Some(0.001),
            SignificanceLevel::VerySignificant => Some(0.01),
            SignificanceLevel::Significant => Some(ALPHA),
            SignificanceLevel::NotSignificant => None,
        }
    }

    pub fn stars(&self) -> &'static str {
        match self {
            SignificanceLevel::HighlySignificant => "***",
            SignificanceLevel::VerySignificant => "**",
            SignificanceLevel::Significant => "*",
            SignificanceLevel::NotSignificant => "",
        }
    }
}

impl Display for SignificanceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SignificanceLevel::HighlySignificant => "highly significant",
            SignificanceLevel::VerySignificant => "very significant",
            SignificanceLevel::Significant => "significant",
            SignificanceLevel::NotSignificant => "not significant",
        };
        write!(f, "{label}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn significance_level_boundaries_test() {
        assert_eq!(
            SignificanceLevel::from_p(0.0005),
            SignificanceLevel::HighlySignificant
        );
        assert_eq!(
            SignificanceLevel::from_p(0.001),
            SignificanceLevel::VerySignificant
        );
        assert_eq!(SignificanceLevel::from_p(0.01), SignificanceLevel::Significant);
        assert_eq!(
            SignificanceLevel::from_p(0.05),
            SignificanceLevel::NotSignificant
        );
    }

    #[test]
    fn variance_test() {
        assert_eq!(variance(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 32.0 / 7.0);
    }
}
