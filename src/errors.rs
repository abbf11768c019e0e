//! Errors
//!
//! Error taxonomy used throughout the `causal_effects` crate.
//!
//! Structural errors (`DatasetError`, `GraphError`) abort an invocation and are
//! surfaced through [`CausalError`]. Per-method problems are captured as an
//! [`EstimationFailure`] value inside the result set and never abort siblings.
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Problems with the uploaded tabular data.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DatasetError {
    /// The file has no data rows.
    #[error("The data file contains no rows.")]
    Empty,
    /// Fewer than two columns were found with the given delimiter.
    #[error("Only {found} column(s) found using delimiter {delimiter:?}, the delimiter probably does not match the file.")]
    DelimiterMismatch { delimiter: String, found: usize },
    /// Custom header length does not match the file width.
    #[error("Header has {expected} name(s) but the data has {found} column(s).")]
    HeaderMismatch { expected: usize, found: usize },
    /// A row has the wrong number of fields.
    #[error("Row {row} has {found} field(s), expected {expected}.")]
    RaggedRow { row: usize, expected: usize, found: usize },
    /// Two columns share a name.
    #[error("Column name {0} appears more than once.")]
    DuplicateColumn(String),
    /// A column was requested that the dataset does not have.
    #[error("Column {0} does not exist in the dataset.")]
    UnknownColumn(String),
    /// The delimiter is empty.
    #[error("The delimiter must not be empty.")]
    EmptyDelimiter,
    /// Underlying reader failure.
    #[error("Unable to parse the data file: {0}")]
    Csv(String),
    /// No data file was uploaded for this session.
    #[error("No data file found for session {0}.")]
    SessionNotFound(String),
}

/// Problems with the causal graph description.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
    /// A node, edge endpoint or role names a feature that is not a dataset column.
    #[error("Feature {0} is referenced by the graph but is not a dataset column.")]
    UnknownFeature(String),
    /// Treatment and outcome name the same feature.
    #[error("Treatment and outcome must be distinct, both are {0}.")]
    TreatmentIsOutcome(String),
    /// The edge set contains a directed cycle.
    #[error("The graph contains a cycle through {0}.")]
    Cycle(String),
    /// The treatment cannot reach the outcome.
    #[error("There is no directed path from treatment {treatment} to outcome {outcome}.")]
    NoCausalPath { treatment: String, outcome: String },
    /// The graph file declares itself undirected.
    #[error("The graph file describes an undirected graph.")]
    Undirected,
    /// The graph file could not be parsed.
    #[error("Unable to parse the graph file: {0}")]
    GraphData(String),
}

impl GraphError {
    /// Taxonomy code of this error.
    pub fn code(&self) -> &'static str {
        match self {
            GraphError::GraphData(_) | GraphError::Undirected => "GRAPH_DATA_INVALID",
            _ => "GRAPH_INVALID",
        }
    }
}

/// Errors that abort an orchestrator invocation.
#[derive(Debug, Error)]
pub enum CausalError {
    /// The dataset could not be loaded.
    #[error("Invalid dataset: {0}")]
    DatasetInvalid(#[from] DatasetError),
    /// The graph could not be built.
    #[error("Invalid graph: {0}")]
    GraphInvalid(#[from] GraphError),
    /// Invalid value parsing.
    #[error("Invalid value {0} passed for {1}, expected one of {2}.")]
    ParseString(String, String, String),
    /// First value is the name of the parameter, second is expected, third is what was passed.
    #[error("Invalid parameter value passed for {0}, expected {1} but {2} provided.")]
    InvalidParameter(String, String, String),
    /// Unable to write to file.
    #[error("Unable to write to file: {0}")]
    UnableToWrite(String),
    /// Unable to read from file.
    #[error("Unable to read from a file {0}")]
    UnableToRead(String),
    /// The worker pool could not be created.
    #[error("Unable to build the estimation thread pool: {0}")]
    ThreadPool(String),
}

impl CausalError {
    /// Taxonomy code of this error.
    pub fn code(&self) -> &'static str {
        match self {
            CausalError::DatasetInvalid(_) => "DATASET_INVALID",
            CausalError::GraphInvalid(e) => e.code(),
            CausalError::ParseString(..) | CausalError::InvalidParameter(..) => "INVALID_PARAMETER",
            CausalError::UnableToWrite(_) | CausalError::UnableToRead(_) => "IO_ERROR",
            CausalError::ThreadPool(_) => "INTERNAL_ERROR",
        }
    }
}

/// Reason a single estimator could not produce an estimate.
#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum EstimationFailure {
    /// Not enough complete rows.
    #[error("Insufficient sample size: {found} usable row(s), at least {required} required.")]
    InsufficientSamples { required: usize, found: usize },
    /// The design matrix is singular or numerically collinear.
    #[error("Covariates are singular or collinear.")]
    Collinear,
    /// The treatment is constant, or one of its groups is empty.
    #[error("The treatment has no variation.")]
    NoTreatmentVariation,
    /// The method needs a binary treatment.
    #[error("The treatment must be binary, found {levels} distinct levels.")]
    NonBinaryTreatment { levels: usize },
    /// The instrument is constant.
    #[error("The instrument has no variation.")]
    NoInstrumentVariation,
    /// The instrument does not move the treatment.
    #[error("The instrument does not predict the treatment.")]
    WeakInstrument,
    /// The discontinuity design has no usable running variable.
    #[error("No running variable is designated for the discontinuity design.")]
    NoRunningVariable,
    /// The running variable is constant, so no bandwidth can be derived.
    #[error("The running variable has no variation.")]
    NoRunningVariation,
    /// No mediator lies on a directed path from the treatment to the outcome.
    #[error("No mediator lies between the treatment and the outcome.")]
    NoMediator,
    /// Not enough rows near the discontinuity threshold.
    #[error("Only {found} observation(s) {side} the threshold, at least {required} required.")]
    ThresholdTooFewObservations { side: String, found: usize, required: usize },
    /// No stratum or neighbourhood contains both treated and untreated rows.
    #[error("Treated and untreated rows do not overlap.")]
    NoOverlap,
    /// A column the method needs is not in the dataset.
    #[error("Column {name} is not in the dataset.")]
    UnknownColumn { name: String },
    /// The computation produced NaN or infinity.
    #[error("The estimate is not finite.")]
    NonFinite,
    /// The estimator panicked.
    #[error("The estimator aborted: {message}")]
    Panicked { message: String },
}

impl EstimationFailure {
    /// Taxonomy code of every estimation failure.
    pub fn code(&self) -> &'static str {
        "ESTIMATION_FAILED"
    }
}
