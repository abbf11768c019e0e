//! Mediation
//!
//! Natural direct and indirect effects under linear structural equations,
//! with every mediator between the treatment and the outcome held in the
//! model at once.
//!
//! * Every mediator is regressed on the treatment and the adjustment set.
//! * The outcome is regressed on the treatment, every mediator and the
//!   adjustment set.
//!
//! The direct effect is the treatment coefficient of the outcome model. The
//! indirect effect sums, over mediators, the treatment-to-mediator coefficient
//! times the mediator-to-outcome coefficient. For least squares that sum equals
//! the total effect minus the direct effect, so chained and parallel mediators
//! are both covered. Its standard error is first-order delta method (Sobel).
use super::linear::{design_matrix, ols};
use super::stats::critical_value;
use super::{has_variation, EstimationContext, Estimator};
use crate::errors::EstimationFailure;
use crate::result::Effect;

#[derive(Debug, Default, Clone, Copy)]
pub struct NaturalDirectEffect;

#[derive(Debug, Default, Clone, Copy)]
pub struct NaturalIndirectEffect;

/// Coefficients carrying the treatment through one mediator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediatorLeg {
    /// Treatment coefficient of the mediator model.
    pub from_treatment: f64,
    pub from_treatment_se: f64,
    /// Mediator coefficient of the outcome model.
    pub to_outcome: f64,
    pub to_outcome_se: f64,
}

/// Fitted mediation model.
#[derive(Debug, Clone)]
pub struct MediationFit {
    /// Treatment coefficient of the outcome model.
    pub direct: f64,
    pub direct_se: f64,
    pub direct_df: usize,
    pub legs: Vec<MediatorLeg>,
    pub rows: usize,
}

impl MediationFit {
    pub fn indirect(&self) -> f64 {
        self.legs.iter().map(|l| l.from_treatment * l.to_outcome).sum()
    }

    /// Delta-method standard error of the summed leg products.
    pub fn indirect_se(&self) -> f64 {
        let var: f64 = self
            .legs
            .iter()
            .map(|l| (l.to_outcome * l.from_treatment_se).powi(2) + (l.from_treatment * l.to_outcome_se).powi(2))
            .sum();
        var.sqrt()
    }
}

/// Fit the mediator and outcome equations; `covariates` are the adjustment set.
pub fn fit_mediation(
    treatment: &[f64],
    outcome: &[f64],
    mediators: &[&[f64]],
    covariates: &[&[f64]],
) -> Result<MediationFit, EstimationFailure> {
    if !has_variation(treatment) {
        return Err(EstimationFailure::NoTreatmentVariation);
    }
    if mediators.is_empty() {
        return Err(EstimationFailure::NoMediator);
    }
    let mut regressors: Vec<&[f64]> = vec![treatment];
    regressors.extend_from_slice(covariates);
    let mediator_design = design_matrix(&regressors, true);
    let mut from_treatment = Vec::with_capacity(mediators.len());
    for mediator in mediators {
        let fit = ols(&mediator_design, mediator)?;
        from_treatment.push((fit.coefficient(1), fit.standard_error(1)));
    }

    let mut regressors: Vec<&[f64]> = vec![treatment];
    regressors.extend_from_slice(mediators);
    regressors.extend_from_slice(covariates);
    let fit = ols(&design_matrix(&regressors, true), outcome)?;
    // Intercept, treatment, then mediators in order.
    let legs = from_treatment
        .into_iter()
        .enumerate()
        .map(|(k, (a, a_se))| MediatorLeg {
            from_treatment: a,
            from_treatment_se: a_se,
            to_outcome: fit.coefficient(2 + k),
            to_outcome_se: fit.standard_error(2 + k),
        })
        .collect();

    Ok(MediationFit {
        direct: fit.coefficient(1),
        direct_se: fit.standard_error(1),
        direct_df: fit.df,
        legs,
        rows: outcome.len(),
    })
}

fn fit_from_context(ctx: &EstimationContext) -> Result<MediationFit, EstimationFailure> {
    let mediators = &ctx.plan.mediators;
    if mediators.is_empty() {
        return Err(EstimationFailure::NoMediator);
    }
    let mut names = vec![ctx.treatment(), ctx.outcome()];
    names.extend(mediators.iter().map(|s| s.as_str()));
    names.extend(
        ctx.plan
            .adjustment_set
            .iter()
            .filter(|c| !mediators.contains(*c))
            .map(|s| s.as_str()),
    );
    let sample = ctx.sample(&names)?;
    let columns = sample.tail(2);
    let (mediators, covariates) = columns.split_at(mediators.len());
    fit_mediation(sample.column(0), sample.column(1), mediators, covariates)
}

impl Estimator for NaturalDirectEffect {
    fn estimate(&self, ctx: &EstimationContext) -> Result<Effect, EstimationFailure> {
        let fit = fit_from_context(ctx)?;
        let critical = critical_value(ctx.config.confidence_level, Some(fit.direct_df));
        Ok(Effect::from_standard_error(fit.direct, fit.direct_se, critical, fit.rows))
    }
}

impl Estimator for NaturalIndirectEffect {
    fn estimate(&self, ctx: &EstimationContext) -> Result<Effect, EstimationFailure> {
        let fit = fit_from_context(ctx)?;
        let critical = critical_value(ctx.config.confidence_level, None);
        Ok(Effect::from_standard_error(fit.indirect(), fit.indirect_se(), critical, fit.rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sign_pattern(n: usize, period: usize) -> Vec<f64> {
        (0..n).map(|i| if (i / period) % 2 == 0 { 1.0 } else { -1.0 }).collect()
    }

    #[test]
    fn test_single_mediator_decomposition() {
        // Orthogonal noise patterns keep the fits exact.
        let n = 64;
        let t: Vec<f64> = (0..n).map(|i| (i % 2) as f64).collect();
        let (e1, e2) = (sign_pattern(n, 2), sign_pattern(n, 4));
        let m: Vec<f64> = (0..n).map(|i| 1.5 * t[i] + e1[i]).collect();
        let y: Vec<f64> = (0..n).map(|i| 2.0 * t[i] + 3.0 * m[i] + e2[i]).collect();
        let fit = fit_mediation(&t, &y, &[&m], &[]).unwrap();
        assert_relative_eq!(fit.direct, 2.0, epsilon = 1e-9);
        assert_relative_eq!(fit.indirect(), 4.5, epsilon = 1e-9);
        assert_relative_eq!(fit.legs[0].from_treatment, 1.5, epsilon = 1e-9);
        assert_relative_eq!(fit.legs[0].to_outcome, 3.0, epsilon = 1e-9);
        assert!(fit.indirect_se() > 0.0);
    }

    #[test]
    fn test_parallel_mediators() {
        // t -> m1 (1), t -> m2 (2), both mediators -> y (1), t -> y (1).
        let n = 64;
        let t: Vec<f64> = (0..n).map(|i| (i % 2) as f64).collect();
        let (e1, e2, e3) = (sign_pattern(n, 2), sign_pattern(n, 4), sign_pattern(n, 8));
        let m1: Vec<f64> = (0..n).map(|i| t[i] + e1[i]).collect();
        let m2: Vec<f64> = (0..n).map(|i| 2.0 * t[i] + e2[i]).collect();
        let y: Vec<f64> = (0..n).map(|i| t[i] + m1[i] + m2[i] + e3[i]).collect();
        let fit = fit_mediation(&t, &y, &[&m1, &m2], &[]).unwrap();
        assert_relative_eq!(fit.direct, 1.0, epsilon = 1e-9);
        assert_relative_eq!(fit.indirect(), 3.0, epsilon = 1e-9);
        assert_eq!(fit.legs.len(), 2);
    }

    #[test]
    fn test_chained_mediators_sum_to_total() {
        // t -> m1 -> m2 -> y with a direct edge; indirect is 1.5 * 2 * 3.
        let n = 64;
        let t: Vec<f64> = (0..n).map(|i| (i % 2) as f64).collect();
        let (e1, e2, e3) = (sign_pattern(n, 2), sign_pattern(n, 4), sign_pattern(n, 8));
        let m1: Vec<f64> = (0..n).map(|i| 1.5 * t[i] + e1[i]).collect();
        let m2: Vec<f64> = (0..n).map(|i| 2.0 * m1[i] + e2[i]).collect();
        let y: Vec<f64> = (0..n).map(|i| 0.5 * t[i] + 3.0 * m2[i] + e3[i]).collect();
        let fit = fit_mediation(&t, &y, &[&m1, &m2], &[]).unwrap();
        assert_relative_eq!(fit.direct, 0.5, epsilon = 1e-9);
        assert_relative_eq!(fit.indirect(), 9.0, epsilon = 1e-9);
    }

    #[test]
    fn test_indirect_se_formula() {
        let fit = MediationFit {
            direct: 0.0,
            direct_se: 0.0,
            direct_df: 10,
            legs: vec![MediatorLeg {
                from_treatment: 2.0,
                from_treatment_se: 0.1,
                to_outcome: 3.0,
                to_outcome_se: 0.2,
            }],
            rows: 12,
        };
        let expected = ((3.0f64 * 0.1).powi(2) + (2.0f64 * 0.2).powi(2)).sqrt();
        assert_relative_eq!(fit.indirect_se(), expected);
    }

    #[test]
    fn test_constant_treatment() {
        let t = vec![1.0; 20];
        let m: Vec<f64> = (0..20).map(|i| i as f64).collect();
        assert_eq!(
            fit_mediation(&t, &m, &[&m], &[]).unwrap_err(),
            EstimationFailure::NoTreatmentVariation
        );
    }

    #[test]
    fn test_no_mediator() {
        let t: Vec<f64> = (0..20).map(|i| (i % 2) as f64).collect();
        assert_eq!(fit_mediation(&t, &t, &[], &[]).unwrap_err(), EstimationFailure::NoMediator);
    }
}
