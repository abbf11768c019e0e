//! Inverse propensity weighting
//!
//! Normalised (Hájek) inverse propensity weighted difference in means. The
//! interval is a percentile bootstrap: the propensity model is refit on every
//! resample, and resamples are drawn from a generator seeded by the
//! configuration so repeated runs agree.
use super::linear::propensity_scores;
use super::stats::{bootstrap_indices, percentile_interval, std_dev};
use super::{binary_treatment, EstimationContext, Estimator};
use crate::errors::EstimationFailure;
use crate::result::Effect;
use log::debug;
use rayon::prelude::*;

#[derive(Debug, Default, Clone, Copy)]
pub struct Weighting;

/// Weighted difference of treated and untreated mean outcomes.
fn weighted_difference(treatment: &[f64], outcome: &[f64], scores: &[f64]) -> Result<f64, EstimationFailure> {
    let (mut num1, mut den1, mut num0, mut den0) = (0.0, 0.0, 0.0, 0.0);
    for ((t, y), e) in treatment.iter().zip(outcome).zip(scores) {
        if *t == 1.0 {
            num1 += y / e;
            den1 += 1.0 / e;
        } else {
            num0 += y / (1.0 - e);
            den0 += 1.0 / (1.0 - e);
        }
    }
    if den1 == 0.0 || den0 == 0.0 {
        return Err(EstimationFailure::NoTreatmentVariation);
    }
    Ok(num1 / den1 - num0 / den0)
}

fn ipw(covariates: &[&[f64]], treatment: &[f64], outcome: &[f64], clip: f64) -> Result<f64, EstimationFailure> {
    let scores = propensity_scores(covariates, treatment, clip)?;
    weighted_difference(treatment, outcome, &scores)
}

fn resample(column: &[f64], rows: &[usize]) -> Vec<f64> {
    rows.iter().map(|&i| column[i]).collect()
}

impl Estimator for Weighting {
    fn estimate(&self, ctx: &EstimationContext) -> Result<Effect, EstimationFailure> {
        let sample = ctx.adjusted_sample()?;
        let treatment = binary_treatment(sample.column(0))?;
        let outcome = sample.column(1);
        let covariates = sample.tail(2);
        let clip = ctx.config.propensity_clip;
        let estimate = ipw(&covariates, &treatment, outcome, clip)?;

        let draws = bootstrap_indices(sample.rows, ctx.config.bootstrap_samples, ctx.config.seed);
        let replicates: Vec<f64> = draws
            .par_iter()
            .filter_map(|rows| {
                let t = resample(&treatment, rows);
                let y = resample(outcome, rows);
                let x: Vec<Vec<f64>> = covariates.iter().map(|c| resample(c, rows)).collect();
                let x: Vec<&[f64]> = x.iter().map(|c| c.as_slice()).collect();
                ipw(&x, &t, &y, clip).ok().filter(|v| v.is_finite())
            })
            .collect();
        debug!(
            "Weighting bootstrap kept {} of {} replicate(s).",
            replicates.len(),
            draws.len()
        );
        if replicates.len() < 2 {
            return Err(EstimationFailure::NonFinite);
        }
        Ok(Effect {
            point_estimate: estimate,
            confidence_interval: percentile_interval(&replicates, ctx.config.confidence_level),
            standard_error: Some(std_dev(&replicates)),
            sample_size: sample.rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_weighted_difference_constant_scores() {
        // Constant scores reduce to a plain difference in means.
        let treatment = [1.0, 1.0, 0.0, 0.0];
        let outcome = [4.0, 6.0, 1.0, 3.0];
        let scores = [0.3; 4];
        assert_relative_eq!(weighted_difference(&treatment, &outcome, &scores).unwrap(), 3.0);
    }

    #[test]
    fn test_weighted_difference_reweights() {
        let treatment = [1.0, 1.0, 0.0, 0.0];
        let outcome = [2.0, 4.0, 0.0, 0.0];
        // Weights 1/0.5 = 2 and 1/0.25 = 4.
        let scores = [0.5, 0.25, 0.5, 0.5];
        assert_relative_eq!(weighted_difference(&treatment, &outcome, &scores).unwrap(), 20.0 / 6.0);
    }
}
