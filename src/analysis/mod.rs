mod deps;
mod detect;
mod graph;
mod interfaces;
mod violations;

pub use deps::{DependencyExpr, DependencyPolicies, Policy};
pub use detect::{CandidateSource, detect_modules};
pub use graph::ModuleGraph;
pub use interfaces::{InterfaceDecl, resolve_interfaces};
pub use violations::detect_violations;

use crate::config::Config;
use crate::model::{Codebase, Verification, VerificationStats};

/// Run the verification pipeline over a validated codebase: detect the
/// module tree, resolve interfaces and dependency policies, walk the
/// reference graph. Each stage is total; recoverable configuration
/// problems accumulate in the returned issue list instead of aborting.
pub fn verify(
    codebase: Codebase,
    config: &Config,
    custom: Option<&dyn CandidateSource>,
) -> Verification {
    let mut config_issues = Vec::new();

    let mut modules = detect_modules(&codebase, config, custom, &mut config_issues);
    resolve_interfaces(&codebase, &mut modules, config, custom, &mut config_issues);
    let policies = DependencyPolicies::resolve(&modules, &mut config_issues);
    let violations = detect_violations(&codebase, &modules, &policies);

    let graph = ModuleGraph::build(&codebase, &modules);
    let cycles = graph.cycles();

    let stats = VerificationStats {
        units: codebase.unit_count(),
        references: codebase.edges().len(),
        external_references: codebase.external_references(),
        unassigned_units: codebase
            .unit_ids()
            .filter(|&unit| modules.owner_of(unit).is_none())
            .count(),
    };

    Verification {
        root: codebase.root_path(),
        codebase,
        modules,
        violations,
        config_issues,
        module_graph: graph.into_inner(),
        cycles,
        stats,
    }
}
