#[cfg(test)]
mod test_data;

// Modules
pub mod config;
pub mod constants;
pub mod data;
pub mod errors;
pub mod estimators;
pub mod graph;
pub mod method;
pub mod orchestrator;
pub mod request;
pub mod resolver;
pub mod result;
pub mod session;
pub mod utils;

// Individual classes, and functions
pub use config::{ConfigIO, EstimationConfig};
pub use data::{Dataset, DatasetOptions};
pub use graph::{CausalGraph, GraphSpec, GraphVariables};
pub use method::Method;
pub use orchestrator::Orchestrator;
pub use request::EstimationRequest;
pub use resolver::MethodSelection;
pub use result::{Effect, EstimationResult, ResultSet};
pub use session::SessionStore;
