use serde::Serialize;

use super::{distributions::f_sf, mean, sum_of_squares, StatsError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnovaResult {
    pub f: f64,
    pub p_value: f64,
    pub between_df: f64,
    pub within_df: f64,
}

/// One-way ANOVA. Every group must be non-empty, drop empty ones before calling.
pub fn one_way_anova(groups: &[&[f64]]) -> Result<AnovaResult, StatsError> {
    if let Some(index) = groups.iter().position(|group| group.is_empty()) {
        return Err(StatsError::EmptyGroup { index });
    }
    if groups.len() < 2 {
        return Err(StatsError::InsufficientSample {
            required: 2,
            actual: groups.len(),
        });
    }

    let k = groups.len();
    let total: usize = groups.iter().map(|group| group.len()).sum();
    if total <= k {
        return Err(StatsError::InsufficientSample {
            required: k + 1,
            actual: total,
        });
    }

    let grand_mean = groups.iter().flat_map(|group| group.iter()).sum::<f64>() / total as f64;
    let (between, within) = groups
        .iter()
        .fold((0.0, 0.0), |(between, within), group| {
            let group_mean = mean(group);
            (
                between + group.len() as f64 * (group_mean - grand_mean).powi(2),
                within + sum_of_squares(group, group_mean),
            )
        });

    if within == 0.0 {
        return Err(StatsError::DegenerateSample(
            "no variance within groups".to_string(),
        ));
    }

    let between_df = (k - 1) as f64;
    let within_df = (total - k) as f64;
    let f = (between / between_df) / (within / within_df);

    Ok(AnovaResult {
        f,
        p_value: f_sf(f, between_df, within_df),
        between_df,
        within_df,
    })
}
