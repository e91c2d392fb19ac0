//! Shapiro-Wilk test, following Royston's AS R94 approximation of the coefficients and of the
//! null distribution of W.

use std::f64::consts::PI;

use serde::Serialize;

use super::{
    distributions::{inverse_normal_cdf, normal_sf},
    mean, require, sum_of_squares, StatsError,
};

const MAX_SAMPLE: usize = 5000;

const C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.07119, 4.434685, -2.706056];
const C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const C3: [f64; 4] = [0.544, -0.39978, 0.025054, -6.714e-4];
const C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
const G: [f64; 2] = [-2.273, 0.459];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShapiroWilk {
    pub w: f64,
    pub p_value: f64,
}

impl ShapiroWilk {
    /// Informational only, nothing downstream is gated on it.
    pub fn looks_normal(&self) -> bool {
        self.p_value > super::ALPHA
    }
}

/// Coefficients in ascending powers of `x`.
fn poly(coefficients: &[f64], x: f64) -> f64 {
    coefficients
        .iter()
        .rev()
        .fold(0.0, |acc, coefficient| acc * x + coefficient)
}

/// The first half of the antisymmetric weights `a`, largest first.
fn coefficients(n: usize) -> Vec<f64> {
    let half = n / 2;
    if n == 3 {
        return vec![std::f64::consts::FRAC_1_SQRT_2];
    }

    let n_f = n as f64;
    let m: Vec<f64> = (1..=half)
        .map(|i| inverse_normal_cdf((i as f64 - 0.375) / (n_f + 0.25)))
        .collect();
    let summ2 = 2.0 * m.iter().map(|m| m * m).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / n_f.sqrt();

    let mut a = vec![0.0; half];
    a[0] = poly(&C1, rsn) - m[0] / ssumm2;

    let (first_free, fac) = if n > 5 {
        a[1] = poly(&C2, rsn) - m[1] / ssumm2;
        let fac = ((summ2 - 2.0 * m[0].powi(2) - 2.0 * m[1].powi(2))
            / (1.0 - 2.0 * a[0].powi(2) - 2.0 * a[1].powi(2)))
        .sqrt();
        (2, fac)
    } else {
        let fac = ((summ2 - 2.0 * m[0].powi(2)) / (1.0 - 2.0 * a[0].powi(2))).sqrt();
        (1, fac)
    };

    for (a, m) in a.iter_mut().zip(&m).skip(first_free) {
        *a = -m / fac;
    }

    a
}

fn p_value(w: f64, n: usize) -> f64 {
    if n == 3 {
        let p = 6.0 / PI * ((w.sqrt()).asin() - PI / 3.0);
        return p.max(0.0);
    }

    let n_f = n as f64;
    let mut y = (1.0 - w).ln();
    let (m, s) = if n <= 11 {
        let gamma = poly(&G, n_f);
        if y >= gamma {
            return f64::MIN_POSITIVE;
        }
        y = -(gamma - y).ln();
        (poly(&C3, n_f), poly(&C4, n_f).exp())
    } else {
        let ln_n = n_f.ln();
        (poly(&C5, ln_n), poly(&C6, ln_n).exp())
    };

    normal_sf((y - m) / s)
}

/// Needs 3 to 5000 observations that are not all equal.
pub fn shapiro_wilk(sample: &[f64]) -> Result<ShapiroWilk, StatsError> {
    require(sample, 3)?;
    if sample.len() > MAX_SAMPLE {
        return Err(StatsError::DegenerateSample(format!(
            "shapiro-wilk supports at most {MAX_SAMPLE} observations, got {}",
            sample.len()
        )));
    }

    let mut sorted = sample.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();

    let ss = sum_of_squares(&sorted, mean(&sorted));
    if ss == 0.0 {
        return Err(StatsError::DegenerateSample(
            "all observations are identical".to_string(),
        ));
    }

    let numerator: f64 = coefficients(n)
        .iter()
        .enumerate()
        .map(|(i, a)| a * (sorted[n - 1 - i] - sorted[i]))
        .sum();
    let w = (numerator * numerator / ss).min(1.0);

    Ok(ShapiroWilk {
        w,
        p_value: p_value(w, n),
    })
}
