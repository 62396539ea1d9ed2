// SPDX-License-Identifier: MIT

//! Graph builder and compile-time validation

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::types::{Edge, EdgeSpec, Router, Target, END};
use crate::engine::error::{ExecutionError, GraphDefinitionError};
use crate::engine::node::Node;
use crate::engine::state::GraphState;

/// Mutable graph definition; call [`StateGraph::compile`] to validate it
pub struct StateGraph<S: GraphState> {
    nodes: Vec<(String, Arc<dyn Node<S>>)>,
    edges: Vec<(String, Edge<S>)>,
    entry_point: Option<String>,
}

impl<S: GraphState> StateGraph<S> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            entry_point: None,
        }
    }

    /// Register a node under a name
    pub fn add_node(&mut self, name: impl Into<String>, node: Arc<dyn Node<S>>) -> &mut Self {
        self.nodes.push((name.into(), node));
        self
    }

    pub fn set_entry_point(&mut self, name: impl Into<String>) -> &mut Self {
        self.entry_point = Some(name.into());
        self
    }

    /// Declare a fixed successor; pass [`END`] to terminate after `from`
    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<Target>) -> &mut Self {
        self.edges.push((from.into(), Edge::Fixed(to.into())));
        self
    }

    /// Declare a successor chosen at run time by a router
    pub fn add_conditional_edges(
        &mut self,
        from: impl Into<String>,
        router: Arc<dyn Router<S>>,
    ) -> &mut Self {
        self.edges.push((from.into(), Edge::Conditional(router)));
        self
    }

    /// Validate the definition and freeze it
    pub fn compile(self) -> Result<CompiledGraph<S>, GraphDefinitionError> {
        let mut node_order = Vec::with_capacity(self.nodes.len());
        let mut nodes = HashMap::new();
        for (name, node) in self.nodes {
            if name == END {
                return Err(GraphDefinitionError::ReservedName(name));
            }
            if nodes.contains_key(&name) {
                return Err(GraphDefinitionError::DuplicateNode(name));
            }
            node_order.push(name.clone());
            nodes.insert(name, node);
        }

        let entry_point = self
            .entry_point
            .ok_or(GraphDefinitionError::MissingEntryPoint)?;
        if !nodes.contains_key(&entry_point) {
            return Err(GraphDefinitionError::UnknownEntryPoint(entry_point));
        }

        let mut edges: HashMap<String, Edge<S>> = HashMap::new();
        for (from, edge) in self.edges {
            if !nodes.contains_key(&from) {
                return Err(GraphDefinitionError::UnknownSource(from));
            }
            if edges.contains_key(&from) {
                return Err(GraphDefinitionError::DuplicateEdge(from));
            }

            let targets = edge.targets();
            if targets.is_empty() {
                return Err(GraphDefinitionError::EmptyConditionalTargets(from));
            }
            for target in targets {
                if let Target::Node(to) = target {
                    if nodes.contains_key(&to) {
                        continue;
                    }
                    return Err(match edge {
                        Edge::Fixed(_) => GraphDefinitionError::UnknownTarget { from, to },
                        Edge::Conditional(_) => {
                            GraphDefinitionError::UnknownConditionalTarget { from, to }
                        }
                    });
                }
            }
            edges.insert(from, edge);
        }

        if let Some(orphan) = node_order.iter().find(|name| !edges.contains_key(*name)) {
            return Err(GraphDefinitionError::MissingEdge(orphan.clone()));
        }

        let graph = CompiledGraph {
            nodes,
            edges,
            node_order,
            entry_point,
        };

        if let Some(cycle) = graph.find_cycle() {
            log::warn!(
                "Graph contains a cycle {:?}; runs that follow it will be rejected",
                cycle
            );
        }

        Ok(graph)
    }
}

impl<S: GraphState> Default for StateGraph<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// A validated graph: node registry plus edge table
pub struct CompiledGraph<S: GraphState> {
    nodes: HashMap<String, Arc<dyn Node<S>>>,
    edges: HashMap<String, Edge<S>>,
    node_order: Vec<String>, // Registration order, for stable descriptions
    entry_point: String,
}

impl<S: GraphState> CompiledGraph<S> {
    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    /// Node names in registration order
    pub fn node_names(&self) -> &[String] {
        &self.node_order
    }

    pub fn node(&self, name: &str) -> Option<&Arc<dyn Node<S>>> {
        self.nodes.get(name)
    }

    /// Resolve the successor of `name` against a (post-merge) state
    ///
    /// A router's choice must be one of the targets it declared at
    /// compile time; anything else is rejected rather than followed.
    pub fn successor(&self, name: &str, state: &S) -> Result<Target, ExecutionError> {
        let edge = self
            .edges
            .get(name)
            .ok_or_else(|| ExecutionError::NoSuccessor(name.to_string()))?;
        let target = edge.resolve(state);
        if edge.targets().contains(&target) {
            Ok(target)
        } else {
            Err(ExecutionError::UndeclaredTarget {
                from: name.to_string(),
                to: target.to_string(),
            })
        }
    }

    /// Edge table in registration order
    pub fn describe(&self) -> Vec<EdgeSpec> {
        self.node_order
            .iter()
            .filter_map(|name| self.edges.get(name).map(|edge| edge.describe(name)))
            .collect()
    }

    /// Find a cycle among the declared targets, if any
    fn find_cycle(&self) -> Option<Vec<String>> {
        fn visit<S: GraphState>(
            graph: &CompiledGraph<S>,
            name: &str,
            path: &mut Vec<String>,
            done: &mut HashSet<String>,
        ) -> Option<Vec<String>> {
            if let Some(pos) = path.iter().position(|n| n == name) {
                let mut cycle = path[pos..].to_vec();
                cycle.push(name.to_string());
                return Some(cycle);
            }
            if done.contains(name) {
                return None;
            }

            path.push(name.to_string());
            let targets = graph
                .edges
                .get(name)
                .map(|edge| edge.targets())
                .unwrap_or_default();
            for target in targets {
                if let Target::Node(next) = target {
                    if let Some(cycle) = visit(graph, &next, path, done) {
                        return Some(cycle);
                    }
                }
            }
            path.pop();
            done.insert(name.to_string());
            None
        }

        let mut done = HashSet::new();
        for name in &self.node_order {
            if let Some(cycle) = visit(self, name, &mut Vec::new(), &mut done) {
                return Some(cycle);
            }
        }
        None
    }
}
