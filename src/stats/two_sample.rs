use serde::Serialize;

use super::{
    distributions::{normal_sf, student_t_two_sided},
    mean, require, variance, StatsError,
};

/// Below this many observations in the smaller sample, and without ties, the Mann-Whitney
/// p-value comes from the exact null distribution.
const MANN_WHITNEY_EXACT_MAX: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TTest {
    pub t: f64,
    pub p_value: f64,
    pub degrees_of_freedom: f64,
}

/// Student's independent two-sample t-test, two-sided. Assumes equal variances and pools them,
/// df = n1 + n2 - 2.
pub fn t_test_independent(a: &[f64], b: &[f64]) -> Result<TTest, StatsError> {
    require(a, 2)?;
    require(b, 2)?;

    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let degrees_of_freedom = n1 + n2 - 2.0;
    let pooled_variance =
        ((n1 - 1.0) * variance(a) + (n2 - 1.0) * variance(b)) / degrees_of_freedom;
    if pooled_variance == 0.0 {
        return Err(StatsError::DegenerateSample(
            "pooled variance is zero".to_string(),
        ));
    }

    let t = (mean(a) - mean(b)) / (pooled_variance * (1.0 / n1 + 1.0 / n2)).sqrt();

    Ok(TTest {
        t,
        p_value: student_t_two_sided(t, degrees_of_freedom),
        degrees_of_freedom,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MannWhitneyMethod {
    Exact,
    Asymptotic,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MannWhitneyU {
    /// U of the first sample.
    pub u: f64,
    pub p_value: f64,
    pub method: MannWhitneyMethod,
}

/// Midranks of the pooled values, plus the size of every group of ties.
fn rank(values: &[f64]) -> (Vec<f64>, Vec<usize>) {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|i, j| values[*i].total_cmp(&values[*j]));

    let mut ranks = vec![0.0; values.len()];
    let mut tie_sizes = Vec::new();
    let mut start = 0;
    while start < order.len() {
        let mut end = start;
        while end + 1 < order.len() && values[order[end + 1]] == values[order[start]] {
            end += 1;
        }

        let midrank = (start + end) as f64 / 2.0 + 1.0;
        for index in &order[start..=end] {
            ranks[*index] = midrank;
        }
        if end > start {
            tie_sizes.push(end - start + 1);
        }

        start = end + 1;
    }

    (ranks, tie_sizes)
}

/// Number of ways each U value can occur under the null hypothesis, indexed by U. These are the
/// coefficients of the Gaussian binomial `[small + large choose small]_q`.
fn exact_u_frequencies(small: usize, large: usize) -> Vec<i128> {
    let mut frequencies = vec![1i128];

    for k in 1..=small {
        // Multiply by (1 - q^(large + k)), then divide by (1 - q^k).
        let shift = large + k;
        let mut next = frequencies.clone();
        next.resize(frequencies.len() + shift, 0);
        for (i, frequency) in frequencies.iter().enumerate() {
            next[i + shift] -= frequency;
        }
        for i in k..next.len() {
            next[i] += next[i - k];
        }
        while next.len() > 1 && next.last() == Some(&0) {
            next.pop();
        }
        frequencies = next;
    }

    frequencies
}

/// Two-sided Mann-Whitney U test.
pub fn mann_whitney_u(a: &[f64], b: &[f64]) -> Result<MannWhitneyU, StatsError> {
    require(a, 1)?;
    require(b, 1)?;

    let (n1, n2) = (a.len(), b.len());
    let pooled: Vec<f64> = a.iter().chain(b).copied().collect();
    let (ranks, tie_sizes) = rank(&pooled);

    let rank_sum_a: f64 = ranks[..n1].iter().sum();
    let u1 = rank_sum_a - (n1 * (n1 + 1)) as f64 / 2.0;
    let u2 = (n1 * n2) as f64 - u1;
    let u_max = u1.max(u2);

    let (p_value, method) = if n1.min(n2) <= MANN_WHITNEY_EXACT_MAX && tie_sizes.is_empty() {
        let frequencies = exact_u_frequencies(n1.min(n2), n1.max(n2));
        let total: i128 = frequencies.iter().sum();
        let at_least: i128 = frequencies[u_max as usize..].iter().sum();
        (
            2.0 * at_least as f64 / total as f64,
            MannWhitneyMethod::Exact,
        )
    } else {
        let n = (n1 + n2) as f64;
        let mu = (n1 * n2) as f64 / 2.0;
        let tie_term: f64 = tie_sizes
            .iter()
            .map(|t| {
                let t = *t as f64;
                t * t * t - t
            })
            .sum();
        let sigma = ((n1 * n2) as f64 / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)))).sqrt();
        if sigma == 0.0 || sigma.is_nan() {
            return Err(StatsError::DegenerateSample(
                "every observation is tied".to_string(),
            ));
        }

        let z = (u_max - mu - 0.5) / sigma;
        (2.0 * normal_sf(z), MannWhitneyMethod::Asymptotic)
    };

    Ok(MannWhitneyU {
        u: u1,
        p_value: p_value.min(1.0),
        method,
    })
}
