//! Nearest-neighbour matching on standardised covariates, estimating the effect
//! on the treated.
use super::stats::{critical_value, mean, standardize, std_dev};
use super::{binary_treatment, EstimationContext, Estimator};
use crate::errors::EstimationFailure;
use crate::result::Effect;
use rayon::prelude::*;

#[derive(Debug, Default, Clone, Copy)]
pub struct Matching;

fn squared_distance(covariates: &[Vec<f64>], a: usize, b: usize) -> f64 {
    covariates.iter().map(|c| (c[a] - c[b]).powi(2)).sum()
}

/// For every treated row, its outcome minus the mean outcome of its `k` nearest untreated rows.
fn matched_differences(covariates: &[Vec<f64>], treatment: &[f64], outcome: &[f64], k: usize) -> Vec<f64> {
    let control: Vec<usize> = (0..treatment.len()).filter(|&i| treatment[i] == 0.0).collect();
    let treated: Vec<usize> = (0..treatment.len()).filter(|&i| treatment[i] == 1.0).collect();
    let k = k.min(control.len());
    treated
        .par_iter()
        .map(|&i| {
            let mut distances: Vec<(f64, usize)> = control
                .iter()
                .map(|&j| (squared_distance(covariates, i, j), j))
                .collect();
            distances.select_nth_unstable_by(k - 1, |a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            let matched = distances[..k].iter().map(|(_, j)| outcome[*j]).sum::<f64>() / k as f64;
            outcome[i] - matched
        })
        .collect()
}

impl Estimator for Matching {
    fn estimate(&self, ctx: &EstimationContext) -> Result<Effect, EstimationFailure> {
        let sample = ctx.adjusted_sample()?;
        let treatment = binary_treatment(sample.column(0))?;
        let covariates: Vec<Vec<f64>> = sample.tail(2).into_iter().filter_map(standardize).collect();
        let diffs = matched_differences(&covariates, &treatment, sample.column(1), ctx.config.matching_neighbors);
        let se = std_dev(&diffs) / (diffs.len() as f64).sqrt();
        let critical = critical_value(ctx.config.confidence_level, None);
        Ok(Effect::from_standard_error(mean(&diffs), se, critical, sample.rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_matched_differences_nearest() {
        let x = vec![vec![0.0, 0.1, 5.0, 5.2, 20.0]];
        let treatment = [1.0, 0.0, 1.0, 0.0, 0.0];
        let outcome = [3.0, 1.0, 10.0, 4.0, 100.0];
        let diffs = matched_differences(&x, &treatment, &outcome, 1);
        assert_eq!(diffs, vec![2.0, 6.0]);
        let diffs = matched_differences(&x, &treatment, &outcome, 2);
        assert_relative_eq!(diffs[0], 0.5);
        assert_relative_eq!(diffs[1], 7.5);
    }

    #[test]
    fn test_more_neighbours_than_controls() {
        let x = vec![vec![0.0, 1.0, 2.0]];
        let treatment = [1.0, 0.0, 1.0];
        let outcome = [5.0, 1.0, 7.0];
        let diffs = matched_differences(&x, &treatment, &outcome, 4);
        assert_eq!(diffs, vec![4.0, 6.0]);
    }
}
