//! Estimation Orchestrator
//!
//! Entry point of the crate. An invocation validates the graph against the
//! dataset, resolves which methods apply, fans the estimators out over a rayon
//! pool and gathers one result per method in canonical order. Structural
//! problems abort the invocation; a failing or panicking estimator only
//! produces a failed result for its own method.

use crate::config::EstimationConfig;
use crate::data::Dataset;
use crate::errors::{CausalError, EstimationFailure};
use crate::estimators::{EstimationContext, Estimator};
use crate::graph::{CausalGraph, GraphSpec};
use crate::method::Method;
use crate::request::EstimationRequest;
use crate::resolver::{resolve, EstimationPlan, MethodSelection};
use crate::result::{EstimationResult, ResultSet};
use crate::session::SessionStore;
use crate::utils::fmt_names;
use log::{debug, info, warn};
use rayon::prelude::*;
use rayon::ThreadPool;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

/// Runs causal-effect estimations with a fixed configuration and worker pool.
pub struct Orchestrator {
    config: EstimationConfig,
    pool: ThreadPool,
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        String::from("unknown panic")
    }
}

/// Run one estimator, turning panics and non-finite numbers into failures.
fn run_method(method: Method, ctx: &EstimationContext) -> EstimationResult {
    let start = Instant::now();
    let outcome = catch_unwind(AssertUnwindSafe(|| method.estimate(ctx)))
        .unwrap_or_else(|payload| {
            Err(EstimationFailure::Panicked {
                message: panic_message(payload),
            })
        })
        .and_then(|effect| {
            if effect.is_finite() {
                Ok(effect)
            } else {
                Err(EstimationFailure::NonFinite)
            }
        });
    match outcome {
        Ok(effect) => {
            debug!("{} finished in {:.3}s: {}", method, start.elapsed().as_secs_f32(), effect);
            EstimationResult::succeeded(method, effect)
        }
        Err(failure) => {
            warn!("{} failed: {}", method, failure);
            EstimationResult::failed(method, failure)
        }
    }
}

impl Orchestrator {
    /// Create an orchestrator. The configuration is validated and the worker
    /// pool is built once, here.
    pub fn new(config: EstimationConfig) -> Result<Self, CausalError> {
        config.validate()?;
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(num_threads) = config.num_threads {
            builder = builder.num_threads(num_threads);
        }
        let pool = builder.build().map_err(|e| CausalError::ThreadPool(e.to_string()))?;
        Ok(Orchestrator { config, pool })
    }

    pub fn config(&self) -> &EstimationConfig {
        &self.config
    }

    /// Build and validate the graph for `dataset`, then resolve the methods to run.
    pub fn plan(
        &self,
        dataset: &Dataset,
        spec: &GraphSpec,
        selection: &MethodSelection,
    ) -> Result<(CausalGraph, EstimationPlan), CausalError> {
        let graph = CausalGraph::build(&dataset.feature_names(), spec)?;
        let plan = resolve(&graph, dataset, &self.config, selection);
        let omitted: Vec<Method> = Method::ALL.iter().copied().filter(|m| !plan.runs(*m)).collect();
        info!(
            "Estimating effect of {} on {}. Running: {}. Omitted: {}.",
            plan.treatment,
            plan.outcome,
            fmt_names(&plan.methods.iter().map(|m| m.id()).collect::<Vec<_>>()),
            fmt_names(&omitted.iter().map(|m| m.id()).collect::<Vec<_>>()),
        );
        Ok((graph, plan))
    }

    /// Estimate the effect of the treatment on the outcome with every
    /// applicable, selected method.
    ///
    /// * `dataset` - Loaded data; every graph node must be one of its columns.
    /// * `spec` - Role assignments and edges.
    /// * `selection` - Caller's method filter.
    pub fn estimate(
        &self,
        dataset: &Dataset,
        spec: &GraphSpec,
        selection: &MethodSelection,
    ) -> Result<ResultSet, CausalError> {
        let start = Instant::now();
        let (graph, plan) = self.plan(dataset, spec, selection)?;
        let ctx = EstimationContext::new(dataset, &graph, &plan, &self.config);
        let results: Vec<EstimationResult> = self
            .pool
            .install(|| plan.methods.par_iter().map(|method| run_method(*method, &ctx)).collect());
        let results = ResultSet::new(results);
        info!(
            "Finished {} method(s) in {:.3}s: {} succeeded, {} failed.",
            results.len(),
            start.elapsed().as_secs_f32(),
            results.n_succeeded(),
            results.n_failed()
        );
        Ok(results)
    }

    /// Load a session's uploaded files, estimate, and store the results in the session.
    pub fn process_session(
        &self,
        store: &SessionStore,
        session: &str,
        request: &EstimationRequest,
    ) -> Result<ResultSet, CausalError> {
        let (bytes, mut options) = store.data_file(session)?;
        options.delimiter = request.delimiter.clone();
        let dataset = Dataset::from_bytes(&bytes, &options)?;
        let spec = request.graph_spec(store.graph_file(session))?;
        let results = self.estimate(&dataset, &spec, &request.selection)?;
        store.store_results(session, results.clone());
        Ok(results)
    }
}
