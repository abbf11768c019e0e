//! Synthetic datasets with known causal effects, written as CSV text so tests
//! go through the same reader as uploaded files.
use crate::data::{Dataset, DatasetOptions};
use crate::graph::{GraphSpec, GraphVariables};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

pub const FEATURES: [&str; 9] = ["Z0", "Z1", "W0", "W1", "W2", "W3", "W4", "v0", "y"];

/// Effect of `v0` on `y` in both synthetic designs.
pub const BETA: f64 = 10.0;
/// Effect of the mediator `W0` on `y` in the front-door design.
pub const MEDIATOR_EFFECT: f64 = 2.5;

fn write_csv(header: &[&str], rows: &[Vec<f64>], delimiter: u8) -> Vec<u8> {
    let mut writer = csv::WriterBuilder::new().delimiter(delimiter).from_writer(Vec::new());
    writer.write_record(header).unwrap();
    for row in rows {
        writer.write_record(row.iter().map(|v| v.to_string())).unwrap();
    }
    writer.into_inner().unwrap()
}

/// Binary treatment `v0` confounded by `W0..W4`, driven by the instrument `Z0`
/// and by a jump at `Z1 = 0.5`.
///
/// y = 10 v0 + W0 + ... + W4 + e
pub fn backdoor_csv(n: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0).unwrap();
    let rows: Vec<Vec<f64>> = (0..n)
        .map(|_| {
            let z0 = if rng.gen_bool(0.5) { 1.0 } else { 0.0 };
            let z1: f64 = rng.gen_range(0.0..1.0);
            let w: Vec<f64> = (0..5).map(|_| normal.sample(&mut rng)).collect();
            let w_sum: f64 = w.iter().sum();
            let jump = if z1 > 0.5 { 1.0 } else { 0.0 };
            let latent = 0.3 * w_sum + 1.2 * z0 + 2.0 * jump - 1.6 + normal.sample(&mut rng);
            let v0 = if latent > 0.0 { 1.0 } else { 0.0 };
            let y = BETA * v0 + w_sum + normal.sample(&mut rng);
            let mut row = vec![z0, z1];
            row.extend(w);
            row.push(v0);
            row.push(y);
            row
        })
        .collect();
    write_csv(&FEATURES, &rows, b',')
}

/// Front-door design: `v0 -> W0 -> y` with `W1` confounding `v0` and `y`.
///
/// W0 = v0 + e, y = 10 v0 + 2.5 W0 + W1 + e, so the total effect is 12.5.
pub fn frontdoor_csv(n: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0).unwrap();
    let rows: Vec<Vec<f64>> = (0..n)
        .map(|_| {
            let z0 = if rng.gen_bool(0.5) { 1.0 } else { 0.0 };
            let z1: f64 = rng.gen_range(0.0..1.0);
            let w1 = normal.sample(&mut rng);
            let w2 = normal.sample(&mut rng);
            let w3 = normal.sample(&mut rng);
            let w4 = normal.sample(&mut rng);
            let jump = if z1 > 0.5 { 1.0 } else { 0.0 };
            let latent = 0.5 * w1 + 1.5 * z1 + 2.0 * jump - 1.75 + normal.sample(&mut rng);
            let v0 = if latent > 0.0 { 1.0 } else { 0.0 };
            let w0 = v0 + normal.sample(&mut rng);
            let y = BETA * v0 + MEDIATOR_EFFECT * w0 + w1 + normal.sample(&mut rng);
            vec![z0, z1, w0, w1, w2, w3, w4, v0, y]
        })
        .collect();
    write_csv(&FEATURES, &rows, b',')
}

pub fn backdoor_dataset(n: usize, seed: u64) -> Dataset {
    Dataset::from_bytes(&backdoor_csv(n, seed), &DatasetOptions::default()).unwrap()
}

pub fn frontdoor_dataset(n: usize, seed: u64) -> Dataset {
    Dataset::from_bytes(&frontdoor_csv(n, seed), &DatasetOptions::default()).unwrap()
}

pub fn backdoor_variables() -> GraphVariables {
    GraphVariables::new("v0", "y")
        .set_instruments(&["Z0", "Z1"])
        .set_iv_method_instrument("Z0")
        .set_reg_discont_var_name("Z1")
}

/// Every confounder into both treatment and outcome, instruments into the treatment.
pub fn backdoor_graph() -> GraphSpec {
    let mut edges = vec![("v0", "y"), ("Z0", "v0"), ("Z1", "v0")];
    for w in ["W0", "W1", "W2", "W3", "W4"] {
        edges.push((w, "v0"));
        edges.push((w, "y"));
    }
    GraphSpec::from_edges(backdoor_variables(), &edges)
}

pub fn frontdoor_variables() -> GraphVariables {
    GraphVariables::new("v0", "y")
        .set_common_causes(&["W1"])
        .set_instruments(&["Z1"])
        .set_iv_method_instrument("Z0")
        .set_reg_discont_var_name("Z1")
}

pub fn frontdoor_graph() -> GraphSpec {
    let edges = [
        ("v0", "W0"),
        ("W0", "y"),
        ("v0", "y"),
        ("W1", "v0"),
        ("W1", "y"),
        ("Z1", "v0"),
    ];
    GraphSpec::from_edges(frontdoor_variables(), &edges)
}

/// Scenario with a boolean treatment and a small exact effect of 0.26.
pub fn service_level_csv() -> Vec<u8> {
    let mut text = String::from("enabled,running,blocked,level,test,timed,something\n");
    for i in 0..50 {
        let enabled = i % 2 == 0;
        let d = if (i / 2) % 2 == 0 { 0.02 } else { -0.02 };
        let level = 0.5 + if enabled { 0.26 } else { 0.0 } + d;
        text.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            enabled,
            i % 3 == 0,
            i % 5 == 0,
            level,
            i,
            i * 10,
            if i % 4 == 0 { "alpha" } else { "beta" }
        ));
    }
    text.into_bytes()
}
