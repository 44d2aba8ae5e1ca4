//! Module dependency graph
//!
//! Bidirectional adjacency over project modules plus the cyclic groups
//! (strongly connected components with two or more members) found when the
//! graph was built. The graph is immutable once built; every rule in a run
//! sees the same snapshot.

mod builder;

pub use builder::GraphBuilder;

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Adjacency of a single module
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    /// Modules this one imports
    pub dependencies: BTreeSet<String>,
    /// Modules importing this one
    pub dependents: BTreeSet<String>,
}

/// Dependency graph of one analysis run
#[derive(Debug, Clone, Default, Serialize)]
pub struct DependencyGraph {
    nodes: BTreeMap<String, GraphNode>,
    cyclic_groups: Vec<BTreeSet<String>>,
}

impl DependencyGraph {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|n| n.dependencies.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.nodes.contains_key(path)
    }

    /// Module paths in sorted order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn node(&self, path: &str) -> Option<&GraphNode> {
        self.nodes.get(path)
    }

    /// Outgoing edges of `path`; empty for unknown paths
    pub fn dependencies(&self, path: &str) -> impl Iterator<Item = &str> {
        self.nodes
            .get(path)
            .into_iter()
            .flat_map(|n| n.dependencies.iter().map(String::as_str))
    }

    /// Incoming edges of `path`; empty for unknown paths
    pub fn dependents(&self, path: &str) -> impl Iterator<Item = &str> {
        self.nodes
            .get(path)
            .into_iter()
            .flat_map(|n| n.dependents.iter().map(String::as_str))
    }

    /// Every directed edge `(from, to)`, sorted by `from` then `to`
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.nodes.iter().flat_map(|(from, node)| {
            node.dependencies
                .iter()
                .map(move |to| (from.as_str(), to.as_str()))
        })
    }

    /// Cyclic groups in SCC discovery order
    pub fn cyclic_groups(&self) -> &[BTreeSet<String>] {
        &self.cyclic_groups
    }

    /// The cyclic group containing `path`, if any
    pub fn group_of(&self, path: &str) -> Option<&BTreeSet<String>> {
        self.cyclic_groups.iter().find(|g| g.contains(path))
    }

    // Mutators are crate-private: only the builder shapes a graph.

    pub(crate) fn add_node(&mut self, path: &str) {
        if !self.nodes.contains_key(path) {
            self.nodes.insert(path.to_string(), GraphNode::default());
        }
    }

    /// Insert `from -> to`, keeping both directions consistent.
    /// Both endpoints must already be nodes.
    pub(crate) fn add_edge(&mut self, from: &str, to: &str) {
        if !(self.contains(from) && self.contains(to)) {
            return;
        }
        if let Some(node) = self.nodes.get_mut(from) {
            node.dependencies.insert(to.to_string());
        }
        if let Some(node) = self.nodes.get_mut(to) {
            node.dependents.insert(from.to_string());
        }
    }

    pub(crate) fn set_cyclic_groups(&mut self, groups: Vec<BTreeSet<String>>) {
        self.cyclic_groups = groups;
    }
}
