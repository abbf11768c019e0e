//! Estimators
//!
//! One estimator per method. Every estimator reads the columns it needs from the
//! dataset, drops incomplete rows, and either returns an [`Effect`] or a typed
//! [`EstimationFailure`]. Estimators never touch shared mutable state, so the
//! orchestrator may run them concurrently.
pub mod discontinuity;
pub mod iv;
pub mod linear;
pub mod matching;
pub mod mediation;
pub mod regression;
pub mod stats;
pub mod stratification;
pub mod weighting;


use crate::config::EstimationConfig;
use crate::data::Dataset;
use crate::errors::EstimationFailure;
use crate::graph::CausalGraph;
use crate::method::Method;
use crate::resolver::EstimationPlan;
use crate::result::Effect;

pub use discontinuity::RegressionDiscontinuity;
pub use iv::InstrumentalVariable;
pub use matching::Matching;
pub use mediation::{NaturalDirectEffect, NaturalIndirectEffect};
pub use regression::Regression;
pub use stratification::Stratification;
pub use weighting::Weighting;

/// Everything an estimator may read. Shared immutably between concurrent estimators.
#[derive(Clone, Copy)]
pub struct EstimationContext<'a> {
    pub dataset: &'a Dataset,
    pub graph: &'a CausalGraph,
    pub plan: &'a EstimationPlan,
    pub config: &'a EstimationConfig,
}

/// Complete rows of a set of columns, in the order they were requested.
#[derive(Debug, Clone)]
pub struct Sample {
    pub columns: Vec<Vec<f64>>,
    pub rows: usize,
}

impl Sample {
    /// Column `i` of the sample.
    pub fn column(&self, i: usize) -> &[f64] {
        &self.columns[i]
    }

    /// Columns from `i` onwards.
    pub fn tail(&self, i: usize) -> Vec<&[f64]> {
        self.columns[i..].iter().map(|c| c.as_slice()).collect()
    }
}

impl<'a> EstimationContext<'a> {
    pub fn new(
        dataset: &'a Dataset,
        graph: &'a CausalGraph,
        plan: &'a EstimationPlan,
        config: &'a EstimationConfig,
    ) -> Self {
        EstimationContext {
            dataset,
            graph,
            plan,
            config,
        }
    }

    pub fn treatment(&self) -> &str {
        &self.plan.treatment
    }

    pub fn outcome(&self) -> &str {
        &self.plan.outcome
    }

    /// Rows where every named column is present, with at least `min_samples` rows.
    pub fn sample(&self, names: &[&str]) -> Result<Sample, EstimationFailure> {
        let mut source = Vec::with_capacity(names.len());
        for name in names {
            let values = self
                .dataset
                .values(name)
                .map_err(|_| EstimationFailure::UnknownColumn { name: name.to_string() })?;
            source.push(values);
        }
        let keep: Vec<usize> = (0..self.dataset.nrows())
            .filter(|&i| source.iter().all(|c| !c[i].is_nan()))
            .collect();
        if keep.len() < self.config.min_samples {
            return Err(EstimationFailure::InsufficientSamples {
                required: self.config.min_samples,
                found: keep.len(),
            });
        }
        let columns = source
            .iter()
            .map(|c| keep.iter().map(|&i| c[i]).collect())
            .collect();
        Ok(Sample {
            columns,
            rows: keep.len(),
        })
    }

    /// Treatment, outcome, then the adjustment set.
    pub fn adjusted_sample(&self) -> Result<Sample, EstimationFailure> {
        let mut names = vec![self.treatment(), self.outcome()];
        names.extend(self.plan.adjustment_set.iter().map(|s| s.as_str()));
        self.sample(&names)
    }
}

/// Recode a two-level treatment to 0/1, lower level to 0.
pub fn binary_treatment(values: &[f64]) -> Result<Vec<f64>, EstimationFailure> {
    let mut levels = values.to_vec();
    levels.sort_by(|a, b| a.total_cmp(b));
    levels.dedup();
    match levels.len() {
        0 | 1 => Err(EstimationFailure::NoTreatmentVariation),
        2 => Ok(values
            .iter()
            .map(|v| if *v == levels[1] { 1.0 } else { 0.0 })
            .collect()),
        n => Err(EstimationFailure::NonBinaryTreatment { levels: n }),
    }
}

/// Whether a column takes more than one value.
pub fn has_variation(values: &[f64]) -> bool {
    values.first().map_or(false, |first| values.iter().any(|v| v != first))
}

/// Estimate a causal effect from the context.
pub trait Estimator {
    fn estimate(&self, ctx: &EstimationContext) -> Result<Effect, EstimationFailure>;
}

impl Estimator for Method {
    fn estimate(&self, ctx: &EstimationContext) -> Result<Effect, EstimationFailure> {
        match self {
            Method::Regression => Regression.estimate(ctx),
            Method::Stratification => Stratification.estimate(ctx),
            Method::Matching => Matching.estimate(ctx),
            Method::Weighting => Weighting.estimate(ctx),
            Method::InstrumentalVariable => InstrumentalVariable.estimate(ctx),
            Method::RegressionDiscontinuity => RegressionDiscontinuity.estimate(ctx),
            Method::NaturalDirectEffect => NaturalDirectEffect.estimate(ctx),
            Method::NaturalIndirectEffect => NaturalIndirectEffect.estimate(ctx),
        }
    }
}
