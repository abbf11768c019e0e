//! Stratification
//!
//! Rows are grouped into strata that are homogeneous in the adjustment set. The
//! effect is the stratum-size weighted average of within-stratum treated minus
//! untreated mean outcomes. Strata missing either group are dropped.
//!
//! When every adjustment column is discrete and the number of covariate
//! combinations is small, each combination is its own stratum. Otherwise rows
//! are grouped into quantiles of the estimated propensity score.
use super::linear::propensity_scores;
use super::stats::{critical_value, mean, variance};
use super::{binary_treatment, EstimationContext, Estimator, Sample};
use crate::errors::EstimationFailure;
use crate::result::Effect;
use log::debug;
use std::collections::BTreeMap;

#[derive(Debug, Default, Clone, Copy)]
pub struct Stratification;

/// Exact strata keyed by covariate values, `None` when there are too many.
fn exact_strata(covariates: &[&[f64]], rows: usize, max_strata: usize) -> Option<Vec<Vec<usize>>> {
    let mut strata: BTreeMap<Vec<u64>, Vec<usize>> = BTreeMap::new();
    for i in 0..rows {
        let key = covariates.iter().map(|c| c[i].to_bits()).collect();
        strata.entry(key).or_default().push(i);
        if strata.len() > max_strata {
            return None;
        }
    }
    Some(strata.into_values().collect())
}

/// Contiguous, near-equal groups of rows ordered by propensity score.
fn propensity_strata(scores: &[f64], num_strata: usize) -> Vec<Vec<usize>> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|a, b| scores[*a].total_cmp(&scores[*b]).then(a.cmp(b)));
    let n = order.len();
    let k = num_strata.min(n).max(1);
    let mut strata = vec![Vec::new(); k];
    for (rank, i) in order.into_iter().enumerate() {
        strata[rank * k / n].push(i);
    }
    strata
}

/// Stratum-weighted difference in means and its standard error.
fn combine(strata: &[Vec<usize>], treatment: &[f64], outcome: &[f64]) -> Option<(f64, f64, usize)> {
    let mut total = 0usize;
    let mut parts = Vec::new();
    for stratum in strata.iter() {
        let (treated, control): (Vec<usize>, Vec<usize>) = stratum.iter().copied().partition(|&i| treatment[i] == 1.0);
        if treated.is_empty() || control.is_empty() {
            continue;
        }
        let yt: Vec<f64> = treated.iter().map(|&i| outcome[i]).collect();
        let yc: Vec<f64> = control.iter().map(|&i| outcome[i]).collect();
        let diff = mean(&yt) - mean(&yc);
        let var = variance(&yt) / yt.len() as f64 + variance(&yc) / yc.len() as f64;
        total += stratum.len();
        parts.push((stratum.len(), diff, var));
    }
    if total == 0 {
        return None;
    }
    let n = total as f64;
    let estimate = parts.iter().map(|(size, diff, _)| *size as f64 / n * diff).sum();
    let var: f64 = parts.iter().map(|(size, _, var)| (*size as f64 / n).powi(2) * var).sum();
    Some((estimate, var.sqrt(), total))
}

impl Stratification {
    fn strata(
        &self,
        ctx: &EstimationContext,
        sample: &Sample,
        treatment: &[f64],
    ) -> Result<Vec<Vec<usize>>, EstimationFailure> {
        let covariates = sample.tail(2);
        let all_discrete = ctx
            .plan
            .adjustment_set
            .iter()
            .all(|name| ctx.dataset.column(name).map_or(false, |c| c.is_discrete(ctx.config.discrete_max_levels)));
        if all_discrete {
            if let Some(strata) = exact_strata(&covariates, sample.rows, ctx.config.max_exact_strata) {
                debug!("Stratifying on {} exact covariate strata.", strata.len());
                return Ok(strata);
            }
        }
        let scores = propensity_scores(&covariates, treatment, ctx.config.propensity_clip)?;
        debug!("Stratifying on {} propensity score strata.", ctx.config.num_strata);
        Ok(propensity_strata(&scores, ctx.config.num_strata))
    }
}

impl Estimator for Stratification {
    fn estimate(&self, ctx: &EstimationContext) -> Result<Effect, EstimationFailure> {
        let sample = ctx.adjusted_sample()?;
        let treatment = binary_treatment(sample.column(0))?;
        let strata = self.strata(ctx, &sample, &treatment)?;
        let (estimate, se, used) = combine(&strata, &treatment, sample.column(1)).ok_or(EstimationFailure::NoOverlap)?;
        if used < ctx.config.min_samples {
            return Err(EstimationFailure::InsufficientSamples {
                required: ctx.config.min_samples,
                found: used,
            });
        }
        let critical = critical_value(ctx.config.confidence_level, None);
        Ok(Effect::from_standard_error(estimate, se, critical, used))
    }
}
