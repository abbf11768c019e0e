#![allow(dead_code)]
use causal_effects::data::{Column, Dataset};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

pub(crate) const FEATURES: [&str; 9] = ["Z0", "Z1", "W0", "W1", "W2", "W3", "W4", "v0", "y"];

// confounded_dataset
//
// Binary treatment v0 confounded by W0..W4, with instrument Z0
// and a jump in treatment probability at Z1 = 0.5.
pub(crate) fn confounded_dataset(n_samples: usize) -> Dataset {
    // reproducible seed
    let mut rng = StdRng::seed_from_u64(1903);
    let normal = Normal::new(0.0, 1.0).unwrap();

    let mut columns: Vec<Vec<f64>> = vec![Vec::with_capacity(n_samples); FEATURES.len()];
    for _ in 0..n_samples {
        let z0 = if rng.gen_bool(0.5) { 1.0 } else { 0.0 };
        let z1: f64 = rng.gen_range(0.0..1.0);
        let w: Vec<f64> = (0..5).map(|_| normal.sample(&mut rng)).collect();
        let w_sum: f64 = w.iter().sum();
        let jump = if z1 > 0.5 { 2.0 } else { 0.0 };
        let latent = 0.3 * w_sum + 1.2 * z0 + jump - 1.6 + normal.sample(&mut rng);
        let v0 = if latent > 0.0 { 1.0 } else { 0.0 };
        let y = 10.0 * v0 + w_sum + normal.sample(&mut rng);

        let row = [z0, z1, w[0], w[1], w[2], w[3], w[4], v0, y];
        for (column, value) in columns.iter_mut().zip(row) {
            column.push(value);
        }
    }

    let columns = FEATURES
        .iter()
        .zip(columns)
        .map(|(name, values)| Column::numeric(name, values))
        .collect();
    Dataset::from_columns(columns).unwrap()
}

// confounded_edges
//
// Every W into both v0 and y, instruments into v0.
pub(crate) fn confounded_edges() -> Vec<(&'static str, &'static str)> {
    let mut edges = vec![("v0", "y"), ("Z0", "v0"), ("Z1", "v0")];
    for w in ["W0", "W1", "W2", "W3", "W4"] {
        edges.push((w, "v0"));
        edges.push((w, "y"));
    }
    edges
}
