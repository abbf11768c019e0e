//! Results
//!
//! Per-method estimation results and the ordered set returned by the orchestrator.
use crate::errors::EstimationFailure;
use crate::method::Method;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A successful estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Effect {
    /// Point estimate of the effect.
    pub point_estimate: f64,
    /// Lower and upper bound of the confidence interval.
    pub confidence_interval: (f64, f64),
    /// Standard error, when the method provides one.
    pub standard_error: Option<f64>,
    /// Number of rows the estimate is based on.
    pub sample_size: usize,
}

impl Effect {
    /// Effect with a symmetric interval `estimate ± critical * se`.
    pub fn from_standard_error(point_estimate: f64, standard_error: f64, critical: f64, sample_size: usize) -> Self {
        Effect {
            point_estimate,
            confidence_interval: (
                point_estimate - critical * standard_error,
                point_estimate + critical * standard_error,
            ),
            standard_error: Some(standard_error),
            sample_size,
        }
    }

    /// Whether every number in the effect is finite.
    pub fn is_finite(&self) -> bool {
        self.point_estimate.is_finite()
            && self.confidence_interval.0.is_finite()
            && self.confidence_interval.1.is_finite()
            && self.standard_error.map_or(true, f64::is_finite)
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.4} [{:.4}, {:.4}] (n={})",
            self.point_estimate, self.confidence_interval.0, self.confidence_interval.1, self.sample_size
        )
    }
}

/// Success or failure of one method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum EstimationOutcome {
    Succeeded(Effect),
    Failed { failure: EstimationFailure },
}

/// Result of one method within one invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimationResult {
    pub method: Method,
    #[serde(flatten)]
    pub outcome: EstimationOutcome,
}

impl EstimationResult {
    pub fn succeeded(method: Method, effect: Effect) -> Self {
        EstimationResult {
            method,
            outcome: EstimationOutcome::Succeeded(effect),
        }
    }

    pub fn failed(method: Method, failure: EstimationFailure) -> Self {
        EstimationResult {
            method,
            outcome: EstimationOutcome::Failed { failure },
        }
    }

    /// The estimate, if the method succeeded.
    pub fn effect(&self) -> Option<&Effect> {
        match &self.outcome {
            EstimationOutcome::Succeeded(effect) => Some(effect),
            EstimationOutcome::Failed { .. } => None,
        }
    }

    /// The failure reason, if the method failed.
    pub fn failure(&self) -> Option<&EstimationFailure> {
        match &self.outcome {
            EstimationOutcome::Succeeded(_) => None,
            EstimationOutcome::Failed { failure } => Some(failure),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, EstimationOutcome::Succeeded(_))
    }
}

/// All results of one invocation, in canonical method order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultSet {
    results: Vec<EstimationResult>,
}

impl ResultSet {
    /// Build a result set; results are put into canonical method order.
    pub fn new(mut results: Vec<EstimationResult>) -> Self {
        results.sort_by_key(|r| r.method);
        ResultSet { results }
    }

    /// Result of a method, `None` when the method was not run.
    pub fn get(&self, method: Method) -> Option<&EstimationResult> {
        self.results.iter().find(|r| r.method == method)
    }

    /// Estimate of a method, `None` when it was not run or failed.
    pub fn effect(&self, method: Method) -> Option<&Effect> {
        self.get(method).and_then(EstimationResult::effect)
    }

    /// Methods present in the set, in order.
    pub fn methods(&self) -> Vec<Method> {
        self.results.iter().map(|r| r.method).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EstimationResult> {
        self.results.iter()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn n_succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn n_failed(&self) -> usize {
        self.len() - self.n_succeeded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_set_order_and_lookup() {
        let effect = Effect::from_standard_error(1.0, 0.5, 2.0, 100);
        assert_eq!(effect.confidence_interval, (0.0, 2.0));
        let set = ResultSet::new(vec![
            EstimationResult::failed(Method::Weighting, EstimationFailure::NoOverlap),
            EstimationResult::succeeded(Method::Regression, effect.clone()),
        ]);
        assert_eq!(set.methods(), vec![Method::Regression, Method::Weighting]);
        assert_eq!(set.effect(Method::Regression), Some(&effect));
        assert!(set.effect(Method::Weighting).is_none());
        assert_eq!(set.get(Method::Weighting).unwrap().failure(), Some(&EstimationFailure::NoOverlap));
        assert!(set.get(Method::Matching).is_none());
        assert_eq!((set.n_succeeded(), set.n_failed()), (1, 1));
    }

    #[test]
    fn test_result_serialization() {
        let ok = EstimationResult::succeeded(Method::InstrumentalVariable, Effect::from_standard_error(10.0, 1.0, 1.96, 50));
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["method"], "ivs");
        assert_eq!(json["status"], "succeeded");
        assert_eq!(json["pointEstimate"], 10.0);

        let failed = EstimationResult::failed(
            Method::RegressionDiscontinuity,
            EstimationFailure::ThresholdTooFewObservations {
                side: "below".to_string(),
                found: 3,
                required: 10,
            },
        );
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["failure"]["reason"], "thresholdTooFewObservations");
        let back: EstimationResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, failed);
    }
}
