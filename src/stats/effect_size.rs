use std::fmt::Display;

use serde::Serialize;

use super::{mean, require, variance, StatsError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectSizeBand {
    Negligible,
    Small,
    Medium,
    Large,
}

impl EffectSizeBand {
    pub fn from_d(d: f64) -> Self {
        let d = d.abs();
        if d < 0.2 {
            EffectSizeBand::Negligible
        } else if d < 0.5 {
            EffectSizeBand::Small
        } else if d < 0.8 {
            EffectSizeBand::Medium
        } else {
            EffectSizeBand::Large
        }
    }
}

impl Display for EffectSizeBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            EffectSizeBand::Negligible => "negligible",
            EffectSizeBand::Small => "small",
            EffectSizeBand::Medium => "medium",
            EffectSizeBand::Large => "large",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EffectSize {
    pub d: f64,
    pub pooled_std: f64,
    pub band: EffectSizeBand,
}

// A group of one contributes no variance but still counts towards the pooled degrees of freedom.
fn variance_or_zero(sample: &[f64]) -> f64 {
    if sample.len() < 2 {
        0.0
    } else {
        variance(sample)
    }
}

/// Cohen's d of `a` against `b` with the pooled standard deviation. Positive when `a` has the
/// larger mean.
pub fn cohens_d(a: &[f64], b: &[f64]) -> Result<EffectSize, StatsError> {
    require(a, 1)?;
    require(b, 1)?;

    let (n1, n2) = (a.len() as f64, b.len() as f64);
    if a.len() + b.len() <= 2 {
        return Err(StatsError::DegenerateSample(
            "pooled standard deviation needs more than two observations".to_string(),
        ));
    }

    let pooled_std = (((n1 - 1.0) * variance_or_zero(a) + (n2 - 1.0) * variance_or_zero(b))
        / (n1 + n2 - 2.0))
        .sqrt();
    if pooled_std == 0.0 {
        return Err(StatsError::DegenerateSample(
            "pooled standard deviation is zero".to_string(),
        ));
    }

    let d = (mean(a) - mean(b)) / pooled_std;

    Ok(EffectSize {
        d,
        pooled_std,
        band: EffectSizeBand::from_d(d),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_when_first_group_is_larger_test() {
        let effect = cohens_d(&[100.0, 110.0, 120.0], &[50.0, 60.0, 70.0]).unwrap();
        assert!(effect.d > 0.0);
        assert_eq!(effect.pooled_std, 10.0);
        assert_eq!(effect.d, 5.0);
        assert_eq!(effect.band, EffectSizeBand::Large);

        let effect = cohens_d(&[50.0, 60.0, 70.0], &[100.0, 110.0, 120.0]).unwrap();
        assert_eq!(effect.d, -5.0);
        assert_eq!(effect.band, EffectSizeBand::Large);
    }

    #[test]
    fn band_boundaries_are_inclusive_below_test() {
        assert_eq!(EffectSizeBand::from_d(0.199), EffectSizeBand::Negligible);
        assert_eq!(EffectSizeBand::from_d(0.2), EffectSizeBand::Small);
        assert_eq!(EffectSizeBand::from_d(-0.5), EffectSizeBand::Medium);
        assert_eq!(EffectSizeBand::from_d(0.8), EffectSizeBand::Large);
    }

    #[test]
    fn degenerate_samples_test() {
        assert!(matches!(
            cohens_d(&[1.0], &[2.0]),
            Err(StatsError::DegenerateSample(_))
        ));
        assert!(matches!(
            cohens_d(&[4.0, 4.0], &[4.0]),
            Err(StatsError::DegenerateSample(_))
        ));
        assert!(matches!(
            cohens_d(&[], &[1.0, 2.0]),
            Err(StatsError::InsufficientSample { .. })
        ));
    }
}
