//! Graph
//!
//! Canonical in-memory causal graph. Every dataset column is a node, edges come
//! from an explicit list or a parsed graph file, and the role assignments
//! (treatment, outcome, confounders, instruments, mediators) travel with it.
//!
//! Construction enforces the structural invariants: known features only, a
//! distinct treatment and outcome, no directed cycle, and a directed path from
//! treatment to outcome. Queries return feature names in dataset column order.
pub mod file;
pub mod spec;

use crate::errors::GraphError;
use file::GraphFile;
use hashbrown::{HashMap, HashSet};
use petgraph::algo::{has_path_connecting, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, Reversed};
use petgraph::Direction;
pub use spec::{GraphSource, GraphSpec, GraphVariables};
use std::collections::VecDeque;

/// Validated causal DAG over the dataset's features.
#[derive(Debug, Clone)]
pub struct CausalGraph {
    graph: DiGraph<String, ()>,
    index: HashMap<String, NodeIndex>,
    variables: GraphVariables,
    treatment: NodeIndex,
    outcome: NodeIndex,
}

impl CausalGraph {
    /// Build the graph described by `spec` over the given dataset features.
    ///
    /// * `features` - Dataset column names, in column order.
    /// * `spec` - Role assignments plus the edge source.
    pub fn build(features: &[&str], spec: &GraphSpec) -> Result<Self, GraphError> {
        match &spec.source {
            GraphSource::Edges(edges) => CausalGraph::from_edges(features, &spec.variables, edges),
            GraphSource::GraphFile(bytes) => {
                let file = GraphFile::parse(bytes)?;
                if let Some(unknown) = file.nodes.iter().find(|n| !features.contains(&n.as_str())) {
                    return Err(GraphError::UnknownFeature(unknown.clone()));
                }
                CausalGraph::from_edges(features, &spec.variables, &file.edges)
            }
        }
    }

    /// Build the graph from an explicit edge list.
    pub fn from_edges(
        features: &[&str],
        variables: &GraphVariables,
        edges: &[(String, String)],
    ) -> Result<Self, GraphError> {
        if variables.treatment == variables.outcome {
            return Err(GraphError::TreatmentIsOutcome(variables.treatment.clone()));
        }

        let mut graph = DiGraph::with_capacity(features.len(), edges.len());
        let mut index = HashMap::with_capacity(features.len());
        for feature in features.iter() {
            if !index.contains_key(*feature) {
                let nx = graph.add_node(feature.to_string());
                index.insert(feature.to_string(), nx);
            }
        }

        let lookup = |name: &str| index.get(name).copied().ok_or_else(|| GraphError::UnknownFeature(name.to_string()));
        for name in variables.referenced() {
            lookup(name)?;
        }
        let mut resolved = Vec::with_capacity(edges.len());
        for (source, target) in edges.iter() {
            let s = lookup(source)?;
            let t = lookup(target)?;
            if s == t {
                return Err(GraphError::Cycle(source.clone()));
            }
            resolved.push((s, t));
        }
        let treatment = lookup(&variables.treatment)?;
        let outcome = lookup(&variables.outcome)?;

        for (s, t) in resolved {
            graph.update_edge(s, t, ());
        }

        if let Err(cycle) = toposort(&graph, None) {
            return Err(GraphError::Cycle(graph[cycle.node_id()].clone()));
        }
        if !has_path_connecting(&graph, treatment, outcome, None) {
            return Err(GraphError::NoCausalPath {
                treatment: variables.treatment.clone(),
                outcome: variables.outcome.clone(),
            });
        }

        Ok(CausalGraph {
            graph,
            index,
            variables: variables.clone(),
            treatment,
            outcome,
        })
    }

    /// Role assignments.
    pub fn variables(&self) -> &GraphVariables {
        &self.variables
    }

    /// Treatment feature.
    pub fn treatment(&self) -> &str {
        &self.graph[self.treatment]
    }

    /// Outcome feature.
    pub fn outcome(&self) -> &str {
        &self.graph[self.outcome]
    }

    /// Whether the feature is a node of the graph.
    pub fn contains(&self, feature: &str) -> bool {
        self.index.contains_key(feature)
    }

    /// Whether the directed edge `source -> target` exists.
    pub fn has_edge(&self, source: &str, target: &str) -> bool {
        match (self.index.get(source), self.index.get(target)) {
            (Some(&s), Some(&t)) => self.graph.find_edge(s, t).is_some(),
            _ => false,
        }
    }

    /// All directed edges, ordered by source then target column.
    pub fn edges(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(NodeIndex, NodeIndex)> = self
            .graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .collect();
        pairs.sort();
        pairs
            .into_iter()
            .map(|(s, t)| (self.graph[s].clone(), self.graph[t].clone()))
            .collect()
    }

    fn names(&self, mut nodes: Vec<NodeIndex>) -> Vec<String> {
        nodes.sort();
        nodes.dedup();
        nodes.into_iter().map(|n| self.graph[n].clone()).collect()
    }

    fn node(&self, feature: &str) -> Option<NodeIndex> {
        self.index.get(feature).copied()
    }

    /// Direct causes of `feature`.
    pub fn parents(&self, feature: &str) -> Vec<String> {
        match self.node(feature) {
            Some(n) => self.names(self.graph.neighbors_directed(n, Direction::Incoming).collect()),
            None => Vec::new(),
        }
    }

    fn ancestor_nodes(&self, start: NodeIndex) -> Vec<NodeIndex> {
        let reversed = Reversed(&self.graph);
        let mut dfs = Dfs::new(reversed, start);
        let mut found = Vec::new();
        while let Some(nx) = dfs.next(reversed) {
            if nx != start {
                found.push(nx);
            }
        }
        found
    }

    fn descendant_nodes(&self, start: NodeIndex) -> Vec<NodeIndex> {
        let mut dfs = Dfs::new(&self.graph, start);
        let mut found = Vec::new();
        while let Some(nx) = dfs.next(&self.graph) {
            if nx != start {
                found.push(nx);
            }
        }
        found
    }

    /// Features with a directed path into `feature`, the feature itself excluded.
    pub fn ancestors(&self, feature: &str) -> Vec<String> {
        match self.node(feature) {
            Some(n) => self.names(self.ancestor_nodes(n)),
            None => Vec::new(),
        }
    }

    /// Features reachable from `feature` by a directed path, the feature itself excluded.
    pub fn descendants(&self, feature: &str) -> Vec<String> {
        match self.node(feature) {
            Some(n) => self.names(self.descendant_nodes(n)),
            None => Vec::new(),
        }
    }

    /// Whether `ancestor` has a directed path into `feature`.
    pub fn is_ancestor(&self, ancestor: &str, feature: &str) -> bool {
        match (self.node(ancestor), self.node(feature)) {
            (Some(a), Some(f)) if a != f => has_path_connecting(&self.graph, a, f, None),
            _ => false,
        }
    }

    /// Back-door adjustment set for the effect of `treatment` on `outcome`.
    ///
    /// Parents of the treatment that stay connected to the outcome once the
    /// treatment is removed, plus declared common causes that are not caused by
    /// the treatment. Treatment, outcome and descendants of the treatment are
    /// never included.
    pub fn adjustment_set(&self, treatment: &str, outcome: &str) -> Vec<String> {
        let (t, y) = match (self.node(treatment), self.node(outcome)) {
            (Some(t), Some(y)) => (t, y),
            _ => return Vec::new(),
        };

        let mut connected: HashSet<NodeIndex> = HashSet::new();
        let mut queue = VecDeque::from([y]);
        connected.insert(y);
        while let Some(n) = queue.pop_front() {
            for m in self.graph.neighbors_undirected(n) {
                if m != t && connected.insert(m) {
                    queue.push_back(m);
                }
            }
        }

        let caused: HashSet<NodeIndex> = self.descendant_nodes(t).into_iter().collect();
        let mut set: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(t, Direction::Incoming)
            .filter(|p| *p != y && connected.contains(p))
            .collect();
        set.extend(
            self.variables
                .common_causes
                .iter()
                .filter_map(|c| self.node(c))
                .filter(|c| *c != t && *c != y && !caused.contains(c)),
        );
        self.names(set)
    }

    /// Intermediate features of the shortest directed path from `treatment` to
    /// `outcome` that passes through at least one other node.
    ///
    /// When mediators are declared only they may lie on the path.
    pub fn mediator_path(&self, treatment: &str, outcome: &str) -> Option<Vec<String>> {
        let (t, y) = (self.node(treatment)?, self.node(outcome)?);
        let allowed: HashSet<NodeIndex> = self
            .variables
            .mediators
            .iter()
            .filter_map(|m| self.node(m))
            .collect();

        let mut previous: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut queue = VecDeque::from([t]);
        while let Some(u) = queue.pop_front() {
            let mut next: Vec<NodeIndex> = self.graph.neighbors_directed(u, Direction::Outgoing).collect();
            next.sort();
            for v in next {
                if v == y {
                    if u == t {
                        continue;
                    }
                    let mut path = vec![u];
                    let mut cursor = u;
                    while let Some(&p) = previous.get(&cursor) {
                        if p == t {
                            break;
                        }
                        path.push(p);
                        cursor = p;
                    }
                    path.reverse();
                    return Some(path.into_iter().map(|n| self.graph[n].clone()).collect());
                }
                if v == t || previous.contains_key(&v) || (!allowed.is_empty() && !allowed.contains(&v)) {
                    continue;
                }
                previous.insert(v, u);
                queue.push_back(v);
            }
        }
        None
    }

    /// Every feature on some directed path from `treatment` to `outcome`, in
    /// column order. When mediators are declared only they are returned.
    pub fn mediators(&self, treatment: &str, outcome: &str) -> Vec<String> {
        let (t, y) = match (self.node(treatment), self.node(outcome)) {
            (Some(t), Some(y)) => (t, y),
            _ => return Vec::new(),
        };
        let upstream: HashSet<NodeIndex> = self.ancestor_nodes(y).into_iter().collect();
        let declared: HashSet<NodeIndex> = self
            .variables
            .mediators
            .iter()
            .filter_map(|m| self.node(m))
            .collect();
        let between = self
            .descendant_nodes(t)
            .into_iter()
            .filter(|n| *n != y && upstream.contains(n))
            .filter(|n| declared.is_empty() || declared.contains(n))
            .collect();
        self.names(between)
    }

    /// An instrument has an edge into the treatment and none into the outcome.
    pub fn is_valid_instrument(&self, feature: &str) -> bool {
        feature != self.treatment()
            && feature != self.outcome()
            && self.has_edge(feature, self.treatment())
            && !self.has_edge(feature, self.outcome())
    }
}
