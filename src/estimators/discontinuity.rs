//! Regression Discontinuity
//!
//! Fuzzy discontinuity design: the jump of the outcome at the threshold of the
//! running variable divided by the jump of the treatment. With a sharp design
//! the treatment jump is one and the ratio is the outcome jump itself.
//!
//! Each side of the threshold is fit separately inside the bandwidth, either by
//! a local line evaluated at the threshold or by a local mean.
use super::linear::{design_matrix, ols};
use super::stats::{critical_value, median, std_dev};
use super::{EstimationContext, Estimator};
use crate::config::{RdFit, RdThreshold};
use crate::constants::WEAK_INSTRUMENT_EPS;
use crate::errors::EstimationFailure;
use crate::result::Effect;
use log::debug;
use nalgebra::DMatrix;

#[derive(Debug, Default, Clone, Copy)]
pub struct RegressionDiscontinuity;

/// Limits of outcome and treatment at the threshold from one side, with their
/// sampling (co)variances.
#[derive(Debug, Clone, Copy)]
struct SideFit {
    outcome: f64,
    treatment: f64,
    var_outcome: f64,
    var_treatment: f64,
    covariance: f64,
}

fn fit_side(
    running: &[f64],
    treatment: &[f64],
    outcome: &[f64],
    threshold: f64,
    fit: RdFit,
) -> Result<SideFit, EstimationFailure> {
    let centred: Vec<f64> = running.iter().map(|r| r - threshold).collect();
    let x = match fit {
        RdFit::LocalLinear => design_matrix(&[centred.as_slice()], true),
        RdFit::LocalConstant => DMatrix::from_element(running.len(), 1, 1.0),
    };
    let fy = ols(&x, outcome)?;
    let ft = ols(&x, treatment)?;
    let h00 = fy.xtx_inverse[(0, 0)];
    let cross = fy.residuals.dot(&ft.residuals) / fy.df as f64;
    Ok(SideFit {
        outcome: fy.coefficient(0),
        treatment: ft.coefficient(0),
        var_outcome: fy.sigma2 * h00,
        var_treatment: ft.sigma2 * h00,
        covariance: cross * h00,
    })
}

/// Ratio of jumps with its delta-method standard error.
fn wald_ratio(below: SideFit, above: SideFit) -> Result<(f64, f64), EstimationFailure> {
    let jump_outcome = above.outcome - below.outcome;
    let jump_treatment = above.treatment - below.treatment;
    if jump_treatment.abs() < WEAK_INSTRUMENT_EPS {
        return Err(EstimationFailure::WeakInstrument);
    }
    let ratio = jump_outcome / jump_treatment;
    let var_outcome = below.var_outcome + above.var_outcome;
    let var_treatment = below.var_treatment + above.var_treatment;
    let covariance = below.covariance + above.covariance;
    let var = (var_outcome + ratio.powi(2) * var_treatment - 2.0 * ratio * covariance) / jump_treatment.powi(2);
    Ok((ratio, var.max(0.0).sqrt()))
}

impl Estimator for RegressionDiscontinuity {
    fn estimate(&self, ctx: &EstimationContext) -> Result<Effect, EstimationFailure> {
        let running_name = ctx
            .plan
            .running_variable
            .as_deref()
            .ok_or(EstimationFailure::NoRunningVariable)?;
        let sample = ctx.sample(&[running_name, ctx.treatment(), ctx.outcome()])?;
        let (running, treatment, outcome) = (sample.column(0), sample.column(1), sample.column(2));

        let threshold = match ctx.config.rd_threshold {
            RdThreshold::Median => median(running),
            RdThreshold::Value(v) => v,
        };
        let bandwidth = ctx.config.rd_bandwidth.unwrap_or_else(|| std_dev(running));
        if bandwidth.is_nan() || bandwidth <= 0.0 {
            return Err(EstimationFailure::NoRunningVariation);
        }

        let mut sides: [(Vec<f64>, Vec<f64>, Vec<f64>); 2] = Default::default();
        for i in 0..sample.rows {
            let r = running[i];
            if (r - threshold).abs() > bandwidth {
                continue;
            }
            let side = &mut sides[usize::from(r >= threshold)];
            side.0.push(r);
            side.1.push(treatment[i]);
            side.2.push(outcome[i]);
        }
        let required = ctx.config.rd_min_side_obs;
        for (label, side) in ["below", "above"].iter().zip(sides.iter()) {
            if side.0.len() < required {
                return Err(EstimationFailure::ThresholdTooFewObservations {
                    side: label.to_string(),
                    found: side.0.len(),
                    required,
                });
            }
        }
        debug!(
            "Discontinuity of {} at {:.4} with bandwidth {:.4}: {} row(s) below, {} above.",
            running_name,
            threshold,
            bandwidth,
            sides[0].0.len(),
            sides[1].0.len()
        );

        let [below, above] = &sides;
        let below = fit_side(&below.0, &below.1, &below.2, threshold, ctx.config.rd_fit)?;
        let above = fit_side(&above.0, &above.1, &above.2, threshold, ctx.config.rd_fit)?;
        let (ratio, se) = wald_ratio(below, above)?;
        let used = sides[0].0.len() + sides[1].0.len();
        let critical = critical_value(ctx.config.confidence_level, None);
        Ok(Effect::from_standard_error(ratio, se, critical, used))
    }
}
