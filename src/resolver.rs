//! Method Applicability
//!
//! Decides which estimation methods are structurally applicable to a graph and
//! dataset, then applies the caller's selection. Ineligible methods are simply
//! left out of the plan; they are never reported as failures.
use crate::config::EstimationConfig;
use crate::data::{ColumnKind, Dataset};
use crate::errors::CausalError;
use crate::graph::CausalGraph;
use crate::method::Method;
use log::warn;
use serde::{Deserialize, Serialize};

/// The caller's choice of methods. At most one of the two filters applies.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MethodSelection {
    /// Run every eligible method.
    #[default]
    All,
    /// Run only these methods, when eligible.
    Selected(Vec<Method>),
    /// Run every eligible method except these.
    Disabled(Vec<Method>),
}

fn parse_methods(ids: &[String], list: &str) -> Vec<Method> {
    let mut methods: Vec<Method> = ids
        .iter()
        .filter_map(|id| match id.parse::<Method>() {
            Ok(m) => Some(m),
            Err(_) => {
                warn!("Ignoring unknown method {} in {}.", id, list);
                None
            }
        })
        .collect();
    methods.sort();
    methods.dedup();
    methods
}

impl MethodSelection {
    /// Build a selection from the raw `selectedMethods` / `disabledMethods` lists.
    ///
    /// Unknown identifiers are ignored. An empty selected list means no selection.
    pub fn from_lists(selected: Option<&[String]>, disabled: Option<&[String]>) -> Result<Self, CausalError> {
        match (selected, disabled) {
            (Some(s), Some(d)) if !s.is_empty() && !d.is_empty() => Err(CausalError::InvalidParameter(
                "selectedMethods".to_string(),
                "either selectedMethods or disabledMethods".to_string(),
                "both".to_string(),
            )),
            (Some(s), _) if !s.is_empty() => Ok(MethodSelection::Selected(parse_methods(s, "selectedMethods"))),
            (_, Some(d)) if !d.is_empty() => Ok(MethodSelection::Disabled(parse_methods(d, "disabledMethods"))),
            _ => Ok(MethodSelection::All),
        }
    }

    /// Whether the caller allows this method to run.
    pub fn admits(&self, method: Method) -> bool {
        match self {
            MethodSelection::All => true,
            MethodSelection::Selected(methods) => methods.contains(&method),
            MethodSelection::Disabled(methods) => !methods.contains(&method),
        }
    }
}

/// Methods to run together with the graph-derived parameters they need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimationPlan {
    pub treatment: String,
    pub outcome: String,
    /// Structurally eligible methods.
    pub eligible: Vec<Method>,
    /// Eligible methods admitted by the selection, in canonical order.
    pub methods: Vec<Method>,
    /// Back-door adjustment set.
    pub adjustment_set: Vec<String>,
    /// Instruments used by the IV estimator.
    pub instruments: Vec<String>,
    /// Running variable of the discontinuity estimator.
    pub running_variable: Option<String>,
    /// Intermediate features of the shortest mediator path.
    pub mediator_path: Vec<String>,
    /// Every mediator between treatment and outcome; empty without a mediator path.
    pub mediators: Vec<String>,
}

impl EstimationPlan {
    /// Whether the method will be run.
    pub fn runs(&self, method: Method) -> bool {
        self.methods.contains(&method)
    }
}

/// Instruments for the IV estimator: the designated one when it satisfies the
/// instrument role, otherwise the declared instruments that do.
fn resolve_instruments(graph: &CausalGraph) -> Vec<String> {
    let vars = graph.variables();
    if let Some(designated) = vars.iv_method_instrument.as_deref() {
        if graph.is_valid_instrument(designated) {
            return vec![designated.to_string()];
        }
    }
    let mut declared: Vec<String> = Vec::new();
    for z in vars.instruments.iter() {
        if graph.is_valid_instrument(z) && !declared.contains(z) {
            declared.push(z.clone());
        }
    }
    declared
}

/// The running variable must be designated, numeric with more than two
/// distinct values, and a cause of the treatment.
fn resolve_running_variable(graph: &CausalGraph, dataset: &Dataset) -> Option<String> {
    let name = graph.variables().reg_discont_var_name.as_deref()?;
    if name == graph.treatment() || name == graph.outcome() || !graph.is_ancestor(name, graph.treatment()) {
        return None;
    }
    let column = dataset.column(name).ok()?;
    if column.kind == ColumnKind::Numeric && column.distinct_values().len() > 2 {
        Some(name.to_string())
    } else {
        None
    }
}

fn discretizable(dataset: &Dataset, names: &[String]) -> bool {
    names
        .iter()
        .all(|n| dataset.column(n).map_or(false, |c| c.n_missing() < c.len()))
}

/// Compute the eligible methods for `graph`, then apply `selection`.
pub fn resolve(
    graph: &CausalGraph,
    dataset: &Dataset,
    _config: &EstimationConfig,
    selection: &MethodSelection,
) -> EstimationPlan {
    let treatment = graph.treatment().to_string();
    let outcome = graph.outcome().to_string();
    let adjustment_set = graph.adjustment_set(&treatment, &outcome);
    let instruments = resolve_instruments(graph);
    let running_variable = resolve_running_variable(graph, dataset);
    let mediator_path = graph.mediator_path(&treatment, &outcome).unwrap_or_default();
    let mediators = if mediator_path.is_empty() {
        Vec::new()
    } else {
        graph.mediators(&treatment, &outcome)
    };

    let eligible: Vec<Method> = Method::ALL
        .iter()
        .copied()
        .filter(|m| match m {
            Method::Regression => true,
            Method::Stratification => !adjustment_set.is_empty() && discretizable(dataset, &adjustment_set),
            Method::Matching | Method::Weighting => !adjustment_set.is_empty(),
            Method::InstrumentalVariable => !instruments.is_empty(),
            Method::RegressionDiscontinuity => running_variable.is_some(),
            Method::NaturalDirectEffect | Method::NaturalIndirectEffect => !mediator_path.is_empty(),
        })
        .collect();
    let methods = eligible.iter().copied().filter(|m| selection.admits(*m)).collect();

    EstimationPlan {
        treatment,
        outcome,
        eligible,
        methods,
        adjustment_set,
        instruments,
        running_variable,
        mediator_path,
        mediators,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Column;
    use crate::graph::GraphVariables;

    const FEATURES: [&str; 9] = ["Z0", "Z1", "W0", "W1", "W2", "W3", "W4", "v0", "y"];

    fn dataset() -> Dataset {
        let columns = FEATURES
            .iter()
            .enumerate()
            .map(|(j, name)| {
                let values = (0..20)
                    .map(|i| match *name {
                        "Z0" | "v0" => (i % 2) as f64,
                        _ => ((i * (j + 3)) % 7) as f64 + 0.5 * j as f64,
                    })
                    .collect();
                Column::numeric(name, values)
            })
            .collect();
        Dataset::from_columns(columns).unwrap()
    }

    fn edges(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(s, t)| (s.to_string(), t.to_string())).collect()
    }

    fn backdoor_graph(vars: GraphVariables) -> CausalGraph {
        let mut pairs = vec![("v0", "y"), ("Z0", "v0"), ("Z1", "v0")];
        for w in ["W0", "W1", "W2", "W3", "W4"] {
            pairs.push((w, "v0"));
            pairs.push((w, "y"));
        }
        CausalGraph::from_edges(&FEATURES, &vars, &edges(&pairs)).unwrap()
    }

    fn frontdoor_graph(vars: GraphVariables) -> CausalGraph {
        let pairs = [("v0", "W0"), ("W0", "y"), ("W1", "v0"), ("W1", "y"), ("Z1", "v0")];
        CausalGraph::from_edges(&FEATURES, &vars, &edges(&pairs)).unwrap()
    }

    #[test]
    fn test_backdoor_eligibility() {
        let vars = GraphVariables::new("v0", "y")
            .set_instruments(&["Z0", "Z1"])
            .set_iv_method_instrument("Z0")
            .set_reg_discont_var_name("Z1");
        let plan = resolve(&backdoor_graph(vars), &dataset(), &EstimationConfig::default(), &MethodSelection::All);
        assert_eq!(
            plan.methods,
            vec![
                Method::Regression,
                Method::Stratification,
                Method::Matching,
                Method::Weighting,
                Method::InstrumentalVariable,
                Method::RegressionDiscontinuity,
            ]
        );
        assert_eq!(plan.instruments, vec!["Z0"]);
        assert_eq!(plan.running_variable.as_deref(), Some("Z1"));
        assert!(plan.mediator_path.is_empty());
        assert!(plan.mediators.is_empty());
    }

    #[test]
    fn test_frontdoor_eligibility() {
        let vars = GraphVariables::new("v0", "y")
            .set_common_causes(&["W1"])
            .set_instruments(&["Z1"])
            .set_iv_method_instrument("Z0")
            .set_reg_discont_var_name("Z1");
        let plan = resolve(&frontdoor_graph(vars), &dataset(), &EstimationConfig::default(), &MethodSelection::All);
        assert_eq!(plan.methods, Method::ALL.to_vec());
        assert_eq!(plan.adjustment_set, vec!["W1"]);
        assert_eq!(plan.instruments, vec!["Z1"]);
        assert_eq!(plan.mediator_path, vec!["W0"]);
        assert_eq!(plan.mediators, vec!["W0"]);
    }

    #[test]
    fn test_iv_absent_without_valid_instrument() {
        // W0 also causes y, so it is not an instrument.
        let vars = GraphVariables::new("v0", "y").set_iv_method_instrument("W0");
        let plan = resolve(&backdoor_graph(vars), &dataset(), &EstimationConfig::default(), &MethodSelection::All);
        assert!(!plan.eligible.contains(&Method::InstrumentalVariable));
        assert!(plan.instruments.is_empty());

        let vars = GraphVariables::new("v0", "y");
        let plan = resolve(&backdoor_graph(vars), &dataset(), &EstimationConfig::default(), &MethodSelection::All);
        assert!(!plan.runs(Method::InstrumentalVariable));
    }

    #[test]
    fn test_running_variable_must_be_continuous_cause() {
        let vars = GraphVariables::new("v0", "y").set_reg_discont_var_name("Z0");
        let plan = resolve(&backdoor_graph(vars), &dataset(), &EstimationConfig::default(), &MethodSelection::All);
        assert!(plan.running_variable.is_none());

        let vars = GraphVariables::new("v0", "y").set_reg_discont_var_name("W2");
        let plan = resolve(&frontdoor_graph(vars), &dataset(), &EstimationConfig::default(), &MethodSelection::All);
        assert!(!plan.runs(Method::RegressionDiscontinuity));
    }

    #[test]
    fn test_minimal_graph_only_regression() {
        let vars = GraphVariables::new("v0", "y");
        let graph = CausalGraph::from_edges(&FEATURES, &vars, &edges(&[("v0", "y")])).unwrap();
        let plan = resolve(&graph, &dataset(), &EstimationConfig::default(), &MethodSelection::All);
        assert_eq!(plan.methods, vec![Method::Regression]);
    }

    #[test]
    fn test_selection_filters() {
        let disabled = vec!["ivs".to_string(), "regDiscont".to_string(), "twoStageReg".to_string()];
        let selection = MethodSelection::from_lists(None, Some(&disabled)).unwrap();
        assert_eq!(
            selection,
            MethodSelection::Disabled(vec![Method::InstrumentalVariable, Method::RegressionDiscontinuity])
        );

        let vars = GraphVariables::new("v0", "y")
            .set_iv_method_instrument("Z0")
            .set_reg_discont_var_name("Z1");
        let plan = resolve(&backdoor_graph(vars.clone()), &dataset(), &EstimationConfig::default(), &selection);
        assert!(plan.eligible.contains(&Method::InstrumentalVariable));
        assert_eq!(
            plan.methods,
            vec![Method::Regression, Method::Stratification, Method::Matching, Method::Weighting]
        );

        let selected = vec!["weighting".to_string(), "regression".to_string(), "nde".to_string()];
        let selection = MethodSelection::from_lists(Some(&selected), None).unwrap();
        let plan = resolve(&backdoor_graph(vars), &dataset(), &EstimationConfig::default(), &selection);
        assert_eq!(plan.methods, vec![Method::Regression, Method::Weighting]);

        assert!(MethodSelection::from_lists(Some(&selected), Some(&disabled)).is_err());
        assert_eq!(MethodSelection::from_lists(Some(&[]), None).unwrap(), MethodSelection::All);
    }

    #[test]
    fn test_resolver_is_deterministic() {
        let vars = GraphVariables::new("v0", "y")
            .set_common_causes(&["W1"])
            .set_instruments(&["Z1"])
            .set_reg_discont_var_name("Z1");
        let graph = frontdoor_graph(vars);
        let data = dataset();
        let config = EstimationConfig::default();
        let first = resolve(&graph, &data, &config, &MethodSelection::All);
        for _ in 0..5 {
            assert_eq!(resolve(&graph, &data, &config, &MethodSelection::All), first);
        }
    }
}
