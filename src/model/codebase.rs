use super::namespace::{NamespaceId, NamespaceTree};
use super::unit::{Unit, UnitId};
use std::collections::HashMap;

/// The validated, immutable view of an indexer snapshot: unit arena,
/// namespace tree and deduplicated reference edges. Built once by snapshot
/// validation; every later pipeline stage borrows it read-only.
#[derive(Debug, Clone)]
pub struct Codebase {
    namespaces: NamespaceTree,
    units: Vec<Unit>,
    edges: Vec<(UnitId, UnitId)>,
    root: NamespaceId,
    by_path: HashMap<String, UnitId>,
    external_references: usize,
}

impl Codebase {
    pub(crate) fn new(
        namespaces: NamespaceTree,
        units: Vec<Unit>,
        edges: Vec<(UnitId, UnitId)>,
        root: NamespaceId,
        by_path: HashMap<String, UnitId>,
        external_references: usize,
    ) -> Self {
        Self {
            namespaces,
            units,
            edges,
            root,
            by_path,
            external_references,
        }
    }

    pub fn namespaces(&self) -> &NamespaceTree {
        &self.namespaces
    }

    /// The scan root namespace declared by the snapshot.
    pub fn root(&self) -> NamespaceId {
        self.root
    }

    pub fn root_path(&self) -> String {
        self.namespaces.path(self.root)
    }

    pub fn unit(&self, id: UnitId) -> &Unit {
        &self.units[id.0]
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn unit_ids(&self) -> impl Iterator<Item = UnitId> {
        (0..self.units.len()).map(UnitId)
    }

    /// Deduplicated reference edges between units in the snapshot.
    pub fn edges(&self) -> &[(UnitId, UnitId)] {
        &self.edges
    }

    /// References to targets outside the scanned codebase, dropped during
    /// validation; they never participate in violation detection.
    pub fn external_references(&self) -> usize {
        self.external_references
    }

    pub fn find_unit(&self, qualified_path: &str) -> Option<UnitId> {
        self.by_path.get(qualified_path).copied()
    }

    /// Fully qualified dotted path of a unit.
    pub fn qualified_path(&self, id: UnitId) -> String {
        let unit = &self.units[id.0];
        let ns = self.namespaces.path(unit.namespace);
        if ns.is_empty() {
            unit.name.clone()
        } else {
            format!("{}.{}", ns, unit.name)
        }
    }
}
