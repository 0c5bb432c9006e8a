use crate::model::{Codebase, ModuleTree};
use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// Module-level view of the reference graph: one node per module
/// (weighted by qualified name), edges aggregating cross-module unit
/// references. Edges inside one module family (ancestor/descendant) are
/// left out; they are scoping, not coupling.
pub struct ModuleGraph {
    graph: DiGraph<String, usize>,
    node_indices: HashMap<String, NodeIndex>,
}

impl ModuleGraph {
    pub fn build(codebase: &Codebase, tree: &ModuleTree) -> Self {
        let mut graph = DiGraph::new();
        let mut node_indices = HashMap::new();

        // Depth-first module order keeps node indices stable across runs.
        for id in tree.dfs() {
            let name = tree.qualified_name(id);
            let idx = graph.add_node(name.clone());
            node_indices.insert(name, idx);
        }

        let mut counts: HashMap<(NodeIndex, NodeIndex), usize> = HashMap::new();
        for &(from, to) in codebase.edges() {
            let (Some(source), Some(target)) = (tree.owner_of(from), tree.owner_of(to)) else {
                continue;
            };
            if source == target
                || tree.is_ancestor(source, target)
                || tree.is_ancestor(target, source)
            {
                continue;
            }
            let from_idx = node_indices[&tree.qualified_name(source)];
            let to_idx = node_indices[&tree.qualified_name(target)];
            *counts.entry((from_idx, to_idx)).or_insert(0) += 1;
        }

        let mut keyed: Vec<((NodeIndex, NodeIndex), usize)> = counts.into_iter().collect();
        keyed.sort();
        for ((from_idx, to_idx), count) in keyed {
            graph.add_edge(from_idx, to_idx, count);
        }

        Self {
            graph,
            node_indices,
        }
    }

    pub fn graph(&self) -> &DiGraph<String, usize> {
        &self.graph
    }

    pub fn into_inner(self) -> DiGraph<String, usize> {
        self.graph
    }

    /// Modules referencing `name`.
    pub fn fan_in(&self, name: &str) -> usize {
        self.node_indices
            .get(name)
            .map(|&idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .count()
            })
            .unwrap_or(0)
    }

    /// Modules `name` references.
    pub fn fan_out(&self, name: &str) -> usize {
        self.node_indices
            .get(name)
            .map(|&idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Outgoing)
                    .count()
            })
            .unwrap_or(0)
    }

    /// Reference cycles between modules: every strongly connected
    /// component with more than one member, plus self-loops. Each cycle
    /// starts at its lexicographically smallest member and cycles are
    /// sorted, so the report is stable. Informational findings only,
    /// never violations.
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let mut cycles = Vec::new();
        for scc in tarjan_scc(&self.graph) {
            if scc.len() > 1 {
                let mut members: Vec<String> =
                    scc.iter().map(|&idx| self.graph[idx].clone()).collect();
                let smallest = members
                    .iter()
                    .enumerate()
                    .min_by(|a, b| a.1.cmp(b.1))
                    .map(|(i, _)| i)
                    .unwrap_or(0);
                members.rotate_left(smallest);
                cycles.push(members);
            } else if let Some(&idx) = scc.first() {
                if self
                    .graph
                    .neighbors_directed(idx, Direction::Outgoing)
                    .any(|n| n == idx)
                {
                    cycles.push(vec![self.graph[idx].clone()]);
                }
            }
        }
        cycles.sort();
        cycles
    }
}
