pub const CONFIDENCE_LEVEL: f64 = 0.95;
pub const MIN_SAMPLES: usize = 10;
pub const NUM_STRATA: usize = 10;
pub const MAX_EXACT_STRATA: usize = 50;
pub const DISCRETE_MAX_LEVELS: usize = 10;
pub const MATCHING_NEIGHBORS: usize = 1;
pub const BOOTSTRAP_SAMPLES: usize = 100;
pub const PROPENSITY_CLIP: f64 = 0.01;
pub const RD_MIN_SIDE_OBS: usize = 10;
pub const CONDITION_LIMIT: f64 = 1e-10;
pub const LOGISTIC_RIDGE: f64 = 1e-4;
pub const LOGISTIC_MAX_ITER: usize = 50;
pub const LOGISTIC_TOLERANCE: f64 = 1e-8;
pub const WEAK_INSTRUMENT_EPS: f64 = 1e-8;
