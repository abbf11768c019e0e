//! Back-door linear regression.
use super::linear::{design_matrix, ols};
use super::stats::critical_value;
use super::{has_variation, EstimationContext, Estimator};
use crate::errors::EstimationFailure;
use crate::result::Effect;
use log::debug;

/// Regress the outcome on the treatment and the adjustment set; the treatment
/// coefficient is the effect of a unit change in treatment.
#[derive(Debug, Default, Clone, Copy)]
pub struct Regression;

impl Estimator for Regression {
    fn estimate(&self, ctx: &EstimationContext) -> Result<Effect, EstimationFailure> {
        let sample = ctx.adjusted_sample()?;
        let treatment = sample.column(0);
        if !has_variation(treatment) {
            return Err(EstimationFailure::NoTreatmentVariation);
        }
        let mut regressors = vec![treatment];
        regressors.extend(sample.tail(2));
        let fit = ols(&design_matrix(&regressors, true), sample.column(1))?;
        debug!(
            "Regression of {} on {} with {} covariate(s), residual df {}.",
            ctx.outcome(),
            ctx.treatment(),
            regressors.len() - 1,
            fit.df
        );
        let critical = critical_value(ctx.config.confidence_level, Some(fit.df));
        Ok(Effect::from_standard_error(
            fit.coefficient(1),
            fit.standard_error(1),
            critical,
            sample.rows,
        ))
    }
}
