use causal_effects::estimators::{
    EstimationContext, Estimator, InstrumentalVariable, Matching, Regression, RegressionDiscontinuity,
    Stratification, Weighting,
};
use causal_effects::graph::{CausalGraph, GraphSpec, GraphVariables};
use causal_effects::resolver::{resolve, MethodSelection};
use causal_effects::{EstimationConfig, Orchestrator};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::time::Duration;

mod utils;

fn variables() -> GraphVariables {
    GraphVariables::new("v0", "y")
        .set_instruments(&["Z0", "Z1"])
        .set_iv_method_instrument("Z0")
        .set_reg_discont_var_name("Z1")
}

pub fn estimator_benchmarks(c: &mut Criterion) {
    let dataset = utils::confounded_dataset(10_000);
    let spec = GraphSpec::from_edges(variables(), &utils::confounded_edges());
    let config = EstimationConfig::default();
    let graph = CausalGraph::build(&dataset.feature_names(), &spec).unwrap();
    let plan = resolve(&graph, &dataset, &config, &MethodSelection::All);
    let ctx = EstimationContext::new(&dataset, &graph, &plan, &config);

    c.bench_function("build graph", |b| {
        b.iter(|| CausalGraph::build(black_box(&dataset.feature_names()), black_box(&spec)))
    });
    c.bench_function("regression", |b| b.iter(|| Regression.estimate(black_box(&ctx))));
    c.bench_function("stratification", |b| b.iter(|| Stratification.estimate(black_box(&ctx))));
    c.bench_function("instrumental variable", |b| {
        b.iter(|| InstrumentalVariable.estimate(black_box(&ctx)))
    });
    c.bench_function("regression discontinuity", |b| {
        b.iter(|| RegressionDiscontinuity.estimate(black_box(&ctx)))
    });

    let mut slow = c.benchmark_group("slow estimators");
    slow.sample_size(10);
    slow.bench_function("matching", |b| b.iter(|| Matching.estimate(black_box(&ctx))));
    slow.bench_function("weighting", |b| b.iter(|| Weighting.estimate(black_box(&ctx))));
    slow.finish();
}

pub fn orchestrator_benchmarks(c: &mut Criterion) {
    let dataset = utils::confounded_dataset(10_000);
    let spec = GraphSpec::from_edges(variables(), &utils::confounded_edges());
    let orchestrator = Orchestrator::new(EstimationConfig::default()).unwrap();

    let mut group = c.benchmark_group("orchestrator");
    group.measurement_time(Duration::from_secs(20));
    group.sample_size(10);
    group.bench_function("estimate all methods", |b| {
        b.iter(|| orchestrator.estimate(black_box(&dataset), black_box(&spec), black_box(&MethodSelection::All)))
    });
    group.finish();
}

criterion_group!(benches, estimator_benchmarks, orchestrator_benchmarks);
criterion_main!(benches);
