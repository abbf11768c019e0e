//! Request
//!
//! One processing request: how to read the session's data file, the graph
//! roles, where the edges come from, and which methods to run.
use crate::errors::{CausalError, GraphError};
use crate::graph::{GraphSource, GraphSpec, GraphVariables};
use crate::resolver::MethodSelection;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where the graph edges of a request come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeSource {
    /// Edges drawn by the client, sent with the request.
    Edges(Vec<(String, String)>),
    /// The graph file previously uploaded to the session.
    UploadedFile,
}

/// A validated processing request.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimationRequest {
    pub delimiter: String,
    pub variables: GraphVariables,
    pub source: EdgeSource,
    pub selection: MethodSelection,
}

fn default_delimiter() -> String {
    String::from(",")
}

/// Wire form of a request. `variables` may arrive as an object or as a JSON
/// encoded string.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestPayload {
    #[serde(default = "default_delimiter")]
    delimiter: String,
    variables: Value,
    #[serde(default)]
    edges: Option<Vec<(String, String)>>,
    #[serde(default)]
    selected_methods: Option<Vec<String>>,
    #[serde(default)]
    disabled_methods: Option<Vec<String>>,
}

impl EstimationRequest {
    /// Request using the uploaded graph file, comma delimiter and every method.
    pub fn new(variables: GraphVariables) -> Self {
        EstimationRequest {
            delimiter: default_delimiter(),
            variables,
            source: EdgeSource::UploadedFile,
            selection: MethodSelection::All,
        }
    }

    pub fn set_delimiter(mut self, delimiter: &str) -> Self {
        self.delimiter = delimiter.to_string();
        self
    }

    pub fn set_edges(mut self, edges: &[(&str, &str)]) -> Self {
        self.source = EdgeSource::Edges(edges.iter().map(|(s, t)| (s.to_string(), t.to_string())).collect());
        self
    }

    pub fn set_selection(mut self, selection: MethodSelection) -> Self {
        self.selection = selection;
        self
    }

    /// Parse a request from its JSON wire form.
    ///
    /// Malformed role payloads are reported as `GRAPH_DATA_INVALID`.
    pub fn from_json(json_str: &str) -> Result<Self, CausalError> {
        let payload: RequestPayload =
            serde_json::from_str(json_str).map_err(|e| CausalError::UnableToRead(e.to_string()))?;
        let variables = match payload.variables {
            Value::String(text) => serde_json::from_str::<GraphVariables>(&text),
            other => serde_json::from_value::<GraphVariables>(other),
        }
        .map_err(|e| GraphError::GraphData(e.to_string()))?;
        let selection =
            MethodSelection::from_lists(payload.selected_methods.as_deref(), payload.disabled_methods.as_deref())?;
        Ok(EstimationRequest {
            delimiter: payload.delimiter,
            variables,
            source: payload.edges.map_or(EdgeSource::UploadedFile, EdgeSource::Edges),
            selection,
        })
    }

    /// The graph spec of this request, `graph_file` being the session's uploaded file if any.
    pub fn graph_spec(&self, graph_file: Option<Vec<u8>>) -> Result<GraphSpec, GraphError> {
        let source = match (&self.source, graph_file) {
            (EdgeSource::Edges(edges), _) => GraphSource::Edges(edges.clone()),
            (EdgeSource::UploadedFile, Some(bytes)) => GraphSource::GraphFile(bytes),
            (EdgeSource::UploadedFile, None) => {
                return Err(GraphError::GraphData(String::from("no graph file was uploaded")))
            }
        };
        Ok(GraphSpec {
            variables: self.variables.clone(),
            source,
        })
    }
}
