use super::{mean, require, variance, StatsError};

#[derive(Debug, Clone, PartialEq)]
pub struct Descriptive {
    pub n: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation (ddof = 1), undefined below two observations.
    pub std_dev: Result<f64, StatsError>,
    pub min: f64,
    pub max: f64,
}

pub fn describe(sample: &[f64]) -> Result<Descriptive, StatsError> {
    require(sample, 1)?;

    let mut sorted = sample.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    let median = if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    };
    let std_dev = require(sample, 2).map(|_| variance(sample).sqrt());

    Ok(Descriptive {
        n,
        mean: mean(sample),
        median,
        std_dev,
        min: sorted[0],
        max: sorted[n - 1],
    })
}
