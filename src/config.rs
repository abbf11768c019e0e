//! Estimation Configuration
//!
//! Tunable parameters shared by every estimator, plus JSON persistence.
use crate::constants::{
    BOOTSTRAP_SAMPLES, CONFIDENCE_LEVEL, DISCRETE_MAX_LEVELS, MATCHING_NEIGHBORS, MAX_EXACT_STRATA, MIN_SAMPLES,
    NUM_STRATA, PROPENSITY_CLIP, RD_MIN_SIDE_OBS,
};
use crate::errors::CausalError;
use crate::utils::{validate_count_parameter, validate_float_parameter, validate_positive_float_parameter};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Where the regression-discontinuity threshold sits on the running variable.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug, Default)]
pub enum RdThreshold {
    /// Median of the running variable.
    #[default]
    Median,
    /// Fixed value.
    Value(f64),
}

/// Shape of the fit on each side of the threshold.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Debug, Default)]
pub enum RdFit {
    /// Separate straight line on each side, compared at the threshold.
    #[default]
    LocalLinear,
    /// Difference of means inside the bandwidth.
    LocalConstant,
}

fn default_confidence_level() -> f64 {
    CONFIDENCE_LEVEL
}
fn default_num_threads() -> Option<usize> {
    None
}
fn default_seed() -> u64 {
    0
}
fn default_min_samples() -> usize {
    MIN_SAMPLES
}
fn default_num_strata() -> usize {
    NUM_STRATA
}
fn default_max_exact_strata() -> usize {
    MAX_EXACT_STRATA
}
fn default_discrete_max_levels() -> usize {
    DISCRETE_MAX_LEVELS
}
fn default_matching_neighbors() -> usize {
    MATCHING_NEIGHBORS
}
fn default_bootstrap_samples() -> usize {
    BOOTSTRAP_SAMPLES
}
fn default_propensity_clip() -> f64 {
    PROPENSITY_CLIP
}
fn default_rd_bandwidth() -> Option<f64> {
    None
}
fn default_rd_min_side_obs() -> usize {
    RD_MIN_SIDE_OBS
}

/// Configuration for the orchestrator and its estimators.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EstimationConfig {
    /// Coverage of the reported confidence intervals.
    #[serde(default = "default_confidence_level")]
    pub confidence_level: f64,
    /// Number of worker threads, rayon's default when `None`.
    #[serde(default = "default_num_threads")]
    pub num_threads: Option<usize>,
    /// Seed for bootstrap resampling.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Minimum number of complete rows an estimator needs.
    #[serde(default = "default_min_samples")]
    pub min_samples: usize,
    /// Number of propensity-score strata.
    #[serde(default = "default_num_strata")]
    pub num_strata: usize,
    /// Largest number of exact covariate strata before falling back to propensity strata.
    #[serde(default = "default_max_exact_strata")]
    pub max_exact_strata: usize,
    /// A column with at most this many distinct values counts as discrete.
    #[serde(default = "default_discrete_max_levels")]
    pub discrete_max_levels: usize,
    /// Untreated neighbours matched to every treated row.
    #[serde(default = "default_matching_neighbors")]
    pub matching_neighbors: usize,
    /// Bootstrap replicates for resampled intervals.
    #[serde(default = "default_bootstrap_samples")]
    pub bootstrap_samples: usize,
    /// Propensity scores are clipped to `[clip, 1 - clip]`.
    #[serde(default = "default_propensity_clip")]
    pub propensity_clip: f64,
    /// Threshold on the running variable.
    #[serde(default)]
    pub rd_threshold: RdThreshold,
    /// Half-width of the window around the threshold, standard deviation of the running variable when `None`.
    #[serde(default = "default_rd_bandwidth")]
    pub rd_bandwidth: Option<f64>,
    /// Fit used on each side of the threshold.
    #[serde(default)]
    pub rd_fit: RdFit,
    /// Minimum number of rows on each side of the threshold.
    #[serde(default = "default_rd_min_side_obs")]
    pub rd_min_side_obs: usize,
}

impl Default for EstimationConfig {
    fn default() -> Self {
        EstimationConfig {
            confidence_level: CONFIDENCE_LEVEL,
            num_threads: None,
            seed: 0,
            min_samples: MIN_SAMPLES,
            num_strata: NUM_STRATA,
            max_exact_strata: MAX_EXACT_STRATA,
            discrete_max_levels: DISCRETE_MAX_LEVELS,
            matching_neighbors: MATCHING_NEIGHBORS,
            bootstrap_samples: BOOTSTRAP_SAMPLES,
            propensity_clip: PROPENSITY_CLIP,
            rd_threshold: RdThreshold::Median,
            rd_bandwidth: None,
            rd_fit: RdFit::LocalLinear,
            rd_min_side_obs: RD_MIN_SIDE_OBS,
        }
    }
}

impl EstimationConfig {
    /// Check every parameter is within its valid range.
    pub fn validate(&self) -> Result<(), CausalError> {
        validate_float_parameter(self.confidence_level, 0.5, 0.9999, "confidence_level")?;
        validate_float_parameter(self.propensity_clip, 0.0, 0.49, "propensity_clip")?;
        if let RdThreshold::Value(v) = self.rd_threshold {
            validate_float_parameter(v, f64::MIN, f64::MAX, "rd_threshold")?;
        }
        if let Some(bw) = self.rd_bandwidth {
            validate_positive_float_parameter(bw, "rd_bandwidth")?;
        }
        validate_count_parameter(self.min_samples, 2, "min_samples")?;
        validate_count_parameter(self.num_strata, 1, "num_strata")?;
        validate_count_parameter(self.max_exact_strata, 1, "max_exact_strata")?;
        validate_count_parameter(self.discrete_max_levels, 2, "discrete_max_levels")?;
        validate_count_parameter(self.matching_neighbors, 1, "matching_neighbors")?;
        validate_count_parameter(self.bootstrap_samples, 2, "bootstrap_samples")?;
        validate_count_parameter(self.rd_min_side_obs, 2, "rd_min_side_obs")?;
        if let Some(n) = self.num_threads {
            validate_count_parameter(n, 1, "num_threads")?;
        }
        Ok(())
    }

    // Set methods for parameters

    /// Set the coverage of the confidence intervals.
    pub fn set_confidence_level(mut self, confidence_level: f64) -> Self {
        self.confidence_level = confidence_level;
        self
    }

    /// Set the number of worker threads.
    pub fn set_num_threads(mut self, num_threads: Option<usize>) -> Self {
        self.num_threads = num_threads;
        self
    }

    /// Set the bootstrap seed.
    pub fn set_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the minimum number of complete rows.
    pub fn set_min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = min_samples;
        self
    }

    /// Set the number of propensity strata.
    pub fn set_num_strata(mut self, num_strata: usize) -> Self {
        self.num_strata = num_strata;
        self
    }

    /// Set the number of matched neighbours.
    pub fn set_matching_neighbors(mut self, matching_neighbors: usize) -> Self {
        self.matching_neighbors = matching_neighbors;
        self
    }

    /// Set the number of bootstrap replicates.
    pub fn set_bootstrap_samples(mut self, bootstrap_samples: usize) -> Self {
        self.bootstrap_samples = bootstrap_samples;
        self
    }

    /// Set the propensity clipping bound.
    pub fn set_propensity_clip(mut self, propensity_clip: f64) -> Self {
        self.propensity_clip = propensity_clip;
        self
    }

    /// Set the discontinuity threshold policy.
    pub fn set_rd_threshold(mut self, rd_threshold: RdThreshold) -> Self {
        self.rd_threshold = rd_threshold;
        self
    }

    /// Set the discontinuity bandwidth.
    pub fn set_rd_bandwidth(mut self, rd_bandwidth: Option<f64>) -> Self {
        self.rd_bandwidth = rd_bandwidth;
        self
    }

    /// Set the fit used on each side of the threshold.
    pub fn set_rd_fit(mut self, rd_fit: RdFit) -> Self {
        self.rd_fit = rd_fit;
        self
    }

    /// Set the minimum rows on each side of the threshold.
    pub fn set_rd_min_side_obs(mut self, rd_min_side_obs: usize) -> Self {
        self.rd_min_side_obs = rd_min_side_obs;
        self
    }
}

/// IO
pub trait ConfigIO: Serialize + DeserializeOwned + Sized {
    /// Save as a json object to a file.
    ///
    /// * `path` - Path to save to.
    fn save_config<P: AsRef<Path>>(&self, path: P) -> Result<(), CausalError> {
        fs::write(path, self.json_dump()?).map_err(|e| CausalError::UnableToWrite(e.to_string()))
    }

    /// Dump as a json object
    fn json_dump(&self) -> Result<String, CausalError> {
        serde_json::to_string(self).map_err(|e| CausalError::UnableToWrite(e.to_string()))
    }

    /// Load from Json string
    ///
    /// * `json_str` - String object, which can be serialized to json.
    fn from_json(json_str: &str) -> Result<Self, CausalError> {
        serde_json::from_str::<Self>(json_str).map_err(|e| CausalError::UnableToRead(e.to_string()))
    }

    /// Load from a path to a json object.
    ///
    /// * `path` - Path to load from.
    fn load_config<P: AsRef<Path>>(path: P) -> Result<Self, CausalError> {
        let json_str = fs::read_to_string(path).map_err(|e| CausalError::UnableToRead(e.to_string()))?;
        Self::from_json(&json_str)
    }
}

impl ConfigIO for EstimationConfig {}
