//! Static dependency graph management using `petgraph`.
//!
//! Builds a directed graph of construction dependencies between entries and
//! resolves a construction order. Only declared bindings are visible here:
//! constructor parameters filled implicitly by type at resolution time are
//! not, and property bindings are tracked separately because they are
//! applied after construction and may legitimately close a cycle.

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use wiring_common::error::{Result, WiringError};

use crate::builder::DefinitionSet;
use crate::model::Dependency;

/// Construction dependency graph of a definition set.
#[derive(Debug)]
pub struct DependencyGraph {
    /// Edge from a dependency to the entry that needs it.
    graph: DiGraph<String, ()>,
    nodes: HashMap<String, NodeIndex>,
    deferred: Vec<(String, String)>,
    dangling: Vec<(String, String)>,
    unbound_types: Vec<(String, String)>,
}

impl DependencyGraph {
    /// Builds the graph for every entry of `set`.
    #[must_use]
    pub fn from_definitions(set: &DefinitionSet) -> Self {
        let mut graph = Self {
            graph: DiGraph::new(),
            nodes: HashMap::new(),
            deferred: Vec::new(),
            dangling: Vec::new(),
            unbound_types: Vec::new(),
        };
        for entry in set.iter() {
            let _ = graph.node(&entry.id);
        }
        for entry in set.iter() {
            for dependency in entry.construction_bindings().flat_map(|b| b.dependencies()) {
                if let Some(target) = graph.target_of(set, &entry.id, dependency) {
                    graph.add_dependency(&entry.id, &target);
                }
            }
            for (_, binding) in &entry.properties {
                for dependency in binding.dependencies() {
                    if let Some(target) = graph.target_of(set, &entry.id, dependency) {
                        graph.deferred.push((entry.id.clone(), target));
                    }
                }
            }
        }
        graph
    }

    /// Adds a dependency edge: `dependent` needs `dependency` to be built first.
    pub fn add_dependency(&mut self, dependent: &str, dependency: &str) {
        let from = self.node(dependency);
        let to = self.node(dependent);
        let _ = self.graph.add_edge(from, to, ());
    }

    /// Returns entry ids with dependencies before their dependents.
    ///
    /// # Errors
    ///
    /// Returns a cyclic-dependency error naming the members of one cycle.
    pub fn construction_order(&self) -> Result<Vec<String>> {
        match petgraph::algo::toposort(&self.graph, None) {
            Ok(indices) => Ok(indices
                .iter()
                .filter_map(|&idx| self.graph.node_weight(idx).cloned())
                .collect()),
            Err(cycle) => Err(self.cycle_error(cycle.node_id())),
        }
    }

    /// Property links `(entry, target)` resolved after construction.
    #[must_use]
    pub fn deferred_links(&self) -> &[(String, String)] {
        &self.deferred
    }

    /// References `(entry, missing id)` to entries that are not defined.
    #[must_use]
    pub fn dangling_references(&self) -> &[(String, String)] {
        &self.dangling
    }

    /// Type lookups `(entry, type)` with no `default-for` entry; these can only
    /// be satisfied by auto-building a registered type at resolution time.
    #[must_use]
    pub fn unbound_types(&self) -> &[(String, String)] {
        &self.unbound_types
    }

    fn node(&mut self, id: &str) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(id) {
            return idx;
        }
        let idx = self.graph.add_node(id.to_owned());
        let _ = self.nodes.insert(id.to_owned(), idx);
        idx
    }

    fn target_of(&mut self, set: &DefinitionSet, from: &str, dependency: Dependency<'_>) -> Option<String> {
        match dependency {
            Dependency::Entry(id) if set.get(id).is_some() => Some(id.to_owned()),
            Dependency::Entry(id) => {
                self.dangling.push((from.to_owned(), id.to_owned()));
                None
            }
            Dependency::Type(type_name) => {
                if let Some(entry) = set.default_for(type_name) {
                    Some(entry.id.clone())
                } else {
                    self.unbound_types.push((from.to_owned(), type_name.to_owned()));
                    None
                }
            }
        }
    }

    fn cycle_error(&self, start: NodeIndex) -> WiringError {
        let members = petgraph::algo::kosaraju_scc(&self.graph)
            .into_iter()
            .find(|scc| scc.contains(&start))
            .unwrap_or_else(|| vec![start]);
        let mut path: Vec<String> = members
            .iter()
            .filter_map(|&idx| self.graph.node_weight(idx).cloned())
            .collect();
        path.sort();
        let id = path.first().cloned().unwrap_or_default();
        path.push(id.clone());
        WiringError::CyclicDependency { id, path }
    }
}
