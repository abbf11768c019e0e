//! Graph description supplied by the caller: role assignments plus either an
//! explicit edge list or an uploaded graph file.
use serde::{Deserialize, Serialize};

/// Role assignments of the causal graph, as sent in the `variables` payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphVariables {
    /// Feature whose effect is estimated.
    pub treatment: String,
    /// Feature whose response is measured.
    pub outcome: String,
    /// Declared confounders.
    #[serde(default)]
    pub common_causes: Vec<String>,
    /// Declared instruments.
    #[serde(default, alias = "ivs")]
    pub instruments: Vec<String>,
    /// Declared mediators.
    #[serde(default)]
    pub mediators: Vec<String>,
    /// Instrument used by the `ivs` estimator.
    #[serde(default)]
    pub iv_method_instrument: Option<String>,
    /// Running variable used by the `regDiscont` estimator.
    #[serde(default)]
    pub reg_discont_var_name: Option<String>,
}

impl GraphVariables {
    /// Roles with only treatment and outcome assigned.
    pub fn new(treatment: &str, outcome: &str) -> Self {
        GraphVariables {
            treatment: treatment.to_string(),
            outcome: outcome.to_string(),
            ..Default::default()
        }
    }

    pub fn set_common_causes(mut self, names: &[&str]) -> Self {
        self.common_causes = names.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn set_instruments(mut self, names: &[&str]) -> Self {
        self.instruments = names.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn set_mediators(mut self, names: &[&str]) -> Self {
        self.mediators = names.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn set_iv_method_instrument(mut self, name: &str) -> Self {
        self.iv_method_instrument = Some(name.to_string());
        self
    }

    pub fn set_reg_discont_var_name(mut self, name: &str) -> Self {
        self.reg_discont_var_name = Some(name.to_string());
        self
    }

    /// Every feature name referenced by a role.
    pub fn referenced(&self) -> impl Iterator<Item = &str> {
        [self.treatment.as_str(), self.outcome.as_str()]
            .into_iter()
            .chain(self.common_causes.iter().map(String::as_str))
            .chain(self.instruments.iter().map(String::as_str))
            .chain(self.mediators.iter().map(String::as_str))
            .chain(self.iv_method_instrument.as_deref())
            .chain(self.reg_discont_var_name.as_deref())
    }
}

/// Where the edges of the graph come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GraphSource {
    /// Directed `(source, target)` pairs.
    Edges(Vec<(String, String)>),
    /// Raw contents of a GML or DOT file.
    GraphFile(Vec<u8>),
}

/// Roles plus edges: everything needed to build a [`CausalGraph`](super::CausalGraph).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSpec {
    pub variables: GraphVariables,
    pub source: GraphSource,
}

impl GraphSpec {
    /// Spec from an explicit edge list.
    pub fn from_edges(variables: GraphVariables, edges: &[(&str, &str)]) -> Self {
        GraphSpec {
            variables,
            source: GraphSource::Edges(edges.iter().map(|(s, t)| (s.to_string(), t.to_string())).collect()),
        }
    }

    /// Spec from the raw bytes of a graph file.
    pub fn from_graph_file(variables: GraphVariables, bytes: Vec<u8>) -> Self {
        GraphSpec {
            variables,
            source: GraphSource::GraphFile(bytes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variables_payload() {
        let payload = r#"{
            "treatment": "v0",
            "outcome": "y",
            "commonCauses": ["W1"],
            "ivs": ["Z1"],
            "ivMethodInstrument": "Z0",
            "regDiscontVarName": "Z1"
        }"#;
        let v: GraphVariables = serde_json::from_str(payload).unwrap();
        assert_eq!(v.treatment, "v0");
        assert_eq!(v.instruments, vec!["Z1".to_string()]);
        assert!(v.mediators.is_empty());
        assert_eq!(v.iv_method_instrument.as_deref(), Some("Z0"));
        let names: Vec<&str> = v.referenced().collect();
        assert_eq!(names, vec!["v0", "y", "W1", "Z1", "Z0", "Z1"]);
    }
}
