//! Instrumental Variable Estimator
//!
//! Two-stage least squares. The first stage regresses the treatment on the
//! instruments, the second regresses the outcome on the fitted treatment. The
//! standard error uses residuals of the structural equation, evaluated at the
//! observed treatment rather than the fitted one.
use super::linear::{design_matrix, fitted, ols};
use super::stats::{critical_value, mean, variance};
use super::{has_variation, EstimationContext, Estimator};
use crate::constants::WEAK_INSTRUMENT_EPS;
use crate::errors::EstimationFailure;
use crate::result::Effect;
use log::debug;

#[derive(Debug, Default, Clone, Copy)]
pub struct InstrumentalVariable;

/// Estimate, standard error and residual degrees of freedom of a 2SLS fit.
pub fn two_stage_least_squares(
    instruments: &[&[f64]],
    treatment: &[f64],
    outcome: &[f64],
) -> Result<(f64, f64, usize), EstimationFailure> {
    if !has_variation(treatment) {
        return Err(EstimationFailure::NoTreatmentVariation);
    }
    let varying: Vec<&[f64]> = instruments.iter().copied().filter(|z| has_variation(z)).collect();
    if varying.is_empty() {
        return Err(EstimationFailure::NoInstrumentVariation);
    }

    let first_stage = design_matrix(&varying, true);
    let first = ols(&first_stage, treatment)?;
    let predicted = fitted(&first_stage, &first.coefficients);
    if variance(&predicted) < WEAK_INSTRUMENT_EPS * variance(treatment) {
        return Err(EstimationFailure::WeakInstrument);
    }

    let second = ols(&design_matrix(&[predicted.as_slice()], true), outcome)?;
    let (intercept, effect) = (second.coefficient(0), second.coefficient(1));
    let n = outcome.len();
    let rss: f64 = outcome
        .iter()
        .zip(treatment)
        .map(|(y, t)| (y - intercept - effect * t).powi(2))
        .sum();
    let df = n - 2;
    let centre = mean(&predicted);
    let sxx: f64 = predicted.iter().map(|p| (p - centre).powi(2)).sum();
    let se = (rss / df as f64 / sxx).sqrt();
    Ok((effect, se, df))
}

impl Estimator for InstrumentalVariable {
    fn estimate(&self, ctx: &EstimationContext) -> Result<Effect, EstimationFailure> {
        let mut names = vec![ctx.treatment(), ctx.outcome()];
        names.extend(ctx.plan.instruments.iter().map(|s| s.as_str()));
        let sample = ctx.sample(&names)?;
        debug!("Instrumenting {} with {:?}.", ctx.treatment(), ctx.plan.instruments);
        let (effect, se, df) = two_stage_least_squares(&sample.tail(2), sample.column(0), sample.column(1))?;
        let critical = critical_value(ctx.config.confidence_level, Some(df));
        Ok(Effect::from_standard_error(effect, se, critical, sample.rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_two_stage_recovers_effect() {
        // u confounds t and y; z moves t only.
        let z: Vec<f64> = (0..200).map(|i| (i % 2) as f64).collect();
        let u: Vec<f64> = (0..200).map(|i| if (i / 2) % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let t: Vec<f64> = z.iter().zip(&u).map(|(z, u)| 2.0 * z + u).collect();
        let y: Vec<f64> = t.iter().zip(&u).map(|(t, u)| 3.0 * t + 5.0 * u).collect();
        let (effect, se, df) = two_stage_least_squares(&[&z], &t, &y).unwrap();
        assert_relative_eq!(effect, 3.0, epsilon = 1e-9);
        assert!(se > 0.0);
        assert_eq!(df, 198);
    }

    #[test]
    fn test_constant_instrument() {
        let z = vec![1.0; 20];
        let t: Vec<f64> = (0..20).map(|i| (i % 2) as f64).collect();
        let y = t.clone();
        assert_eq!(
            two_stage_least_squares(&[&z], &t, &y).unwrap_err(),
            EstimationFailure::NoInstrumentVariation
        );
    }

    #[test]
    fn test_instrument_unrelated_to_treatment() {
        // z is orthogonal to t.
        let z: Vec<f64> = (0..40).map(|i| (i % 2) as f64).collect();
        let t: Vec<f64> = (0..40).map(|i| ((i / 2) % 2) as f64).collect();
        let y = t.clone();
        assert_eq!(
            two_stage_least_squares(&[&z], &t, &y).unwrap_err(),
            EstimationFailure::WeakInstrument
        );
    }
}
