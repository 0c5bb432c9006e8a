mod codebase;
mod module;
mod namespace;
mod unit;
mod violation;

pub use codebase::Codebase;
pub use module::{Module, ModuleId, ModuleTree, NamedInterface, Openness};
pub use namespace::{NamespaceId, NamespaceTree};
pub use unit::{Tag, TagKind, Unit, UnitId, Visibility};
pub use violation::{ConfigIssue, ConfigIssueKind, Violation, ViolationReason};

use petgraph::graph::DiGraph;

/// Everything one verification run produced: the validated codebase, the
/// detected module tree, the findings, and the inter-module graph.
#[derive(Debug)]
pub struct Verification {
    /// Root namespace the detection ran under.
    pub root: String,
    pub codebase: Codebase,
    pub modules: ModuleTree,
    /// Sorted by source module, then source unit path, then target unit path.
    pub violations: Vec<Violation>,
    pub config_issues: Vec<ConfigIssue>,
    /// Module-level reference graph; node weights are qualified module
    /// names, edge weights count unit-level references.
    pub module_graph: DiGraph<String, usize>,
    /// Reference cycles between modules, informational only.
    pub cycles: Vec<Vec<String>>,
    pub stats: VerificationStats,
}

impl Verification {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VerificationStats {
    pub units: usize,
    pub references: usize,
    pub external_references: usize,
    /// Units outside every detected module base.
    pub unassigned_units: usize,
}
