use super::deps::DependencyPolicies;
use crate::model::{Codebase, ModuleId, ModuleTree, UnitId, Violation};
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Walk every reference edge and collect the ones that cross a module
/// boundary without permission.
///
/// Edges are grouped by source module and classified per group in
/// parallel; no edge's outcome depends on another edge's. The merged
/// result is sorted by source module name, then source unit path, then
/// target unit path, so identical input always renders identically.
pub fn detect_violations(
    codebase: &Codebase,
    tree: &ModuleTree,
    policies: &DependencyPolicies,
) -> Vec<Violation> {
    let mut by_source: BTreeMap<ModuleId, Vec<(UnitId, UnitId)>> = BTreeMap::new();
    for &(from, to) in codebase.edges() {
        // Unassigned endpoints sit outside every module and never raise
        // violations, on either side of the edge.
        let (Some(source), Some(target)) = (tree.owner_of(from), tree.owner_of(to)) else {
            continue;
        };
        if source == target {
            continue;
        }
        by_source.entry(source).or_default().push((from, to));
    }

    let groups: Vec<(ModuleId, Vec<(UnitId, UnitId)>)> = by_source.into_iter().collect();
    let mut violations: Vec<Violation> = groups
        .par_iter()
        .flat_map_iter(|(source, edges)| {
            edges
                .iter()
                .filter_map(|&(from, to)| classify(codebase, tree, policies, *source, from, to))
                .collect::<Vec<_>>()
        })
        .collect();

    violations.sort_by(|a, b| {
        (&a.source_module, &a.source, &a.target).cmp(&(&b.source_module, &b.source, &b.target))
    });
    violations
}

/// Classify one cross-module edge. None means the reference is allowed.
fn classify(
    codebase: &Codebase,
    tree: &ModuleTree,
    policies: &DependencyPolicies,
    source: ModuleId,
    from: UnitId,
    to: UnitId,
) -> Option<Violation> {
    let target = tree.owner_of(to)?;
    let exposed = codebase.unit(to).is_exposed();

    // Nesting shortcuts, no policy lookup. Nested code reaches up into
    // its ancestors (internals included); within one module family,
    // exposed surface is mutually reachable; and nested code reaches any
    // top-level module's exposed surface.
    if tree.is_ancestor(target, source) {
        return None;
    }
    if exposed {
        if tree.common_ancestor(source, target).is_some() {
            return None;
        }
        if !tree.is_top_level(source) && tree.is_top_level(target) {
            return None;
        }
    }

    let describe = || {
        (
            codebase.qualified_path(from),
            codebase.qualified_path(to),
            tree.module(source).name.clone(),
            tree.module(target).name.clone(),
        )
    };

    // Internal targets are denied cross-module without exception; an
    // exposed unit claimed by no interface of its (closed) module is
    // just as unreachable.
    let claim = tree.module(target).claim_slot(to);
    let Some(slot) = (if exposed { claim } else { None }) else {
        let (s, t, sm, tm) = describe();
        return Some(Violation::internal_access(s, t, sm, tm));
    };

    if policies.permits(source, target, slot) {
        return None;
    }
    let (s, t, sm, tm) = describe();
    if policies.mentions(tree, source, target) {
        Some(Violation::missing_grant(s, t, sm, tm))
    } else {
        Some(Violation::unknown_target(s, t, sm, tm))
    }
}
