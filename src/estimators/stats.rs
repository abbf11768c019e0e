//! Summary statistics, critical values and bootstrap resampling.
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

/// Two-sided critical value for `confidence_level`, Student t when `df` is given.
pub fn critical_value(confidence_level: f64, df: Option<usize>) -> f64 {
    let q = 1.0 - (1.0 - confidence_level) / 2.0;
    let student = df
        .filter(|df| *df > 0)
        .and_then(|df| StudentsT::new(0.0, 1.0, df as f64).ok())
        .map(|d| d.inverse_cdf(q));
    match student {
        Some(c) => c,
        None => Normal::new(0.0, 1.0).map(|d| d.inverse_cdf(q)).unwrap_or(1.959964),
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample variance, zero for fewer than two values.
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Centre and scale to unit variance, `None` for a constant column.
pub fn standardize(values: &[f64]) -> Option<Vec<f64>> {
    let sd = std_dev(values);
    if sd.is_nan() || sd <= 0.0 {
        return None;
    }
    let m = mean(values);
    Some(values.iter().map(|v| (v - m) / sd).collect())
}

/// Linear-interpolated quantile of sorted values.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

pub fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    quantile(&sorted, 0.5)
}

/// Percentile interval of bootstrap replicates.
pub fn percentile_interval(replicates: &[f64], confidence_level: f64) -> (f64, f64) {
    let mut sorted = replicates.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let alpha = (1.0 - confidence_level) / 2.0;
    (quantile(&sorted, alpha), quantile(&sorted, 1.0 - alpha))
}

/// Row indices of `replicates` resamples with replacement, drawn from a seeded generator.
pub fn bootstrap_indices(n: usize, replicates: usize, seed: u64) -> Vec<Vec<usize>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..replicates)
        .map(|_| (0..n).map(|_| rng.gen_range(0..n)).collect())
        .collect()
}
