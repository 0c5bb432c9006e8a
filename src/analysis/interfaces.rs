use super::detect::CandidateSource;
use crate::config::Config;
use crate::model::{
    Codebase, ConfigIssue, ModuleId, ModuleTree, NamedInterface, NamespaceId, NamespaceTree,
    TagKind, UnitId,
};
use rayon::prelude::*;
use std::collections::HashMap;

/// A named-interface declaration before membership is resolved: interface
/// name, declaration namespace, whether descendants are in scope, and
/// optional include/exclude globs over slash-form qualified paths.
#[derive(Debug, Clone)]
pub struct InterfaceDecl {
    pub name: String,
    pub namespace: NamespaceId,
    pub recursive: bool,
    pub include: Option<String>,
    pub exclude: Option<String>,
}

/// Resolve every module's interface partition.
///
/// Declarations come from namespace tags, config entries and the optional
/// delegate, visited depth-first over the module's owned namespaces. Each
/// exposed owned unit goes to the most specific matching declaration;
/// equal-depth conflicts keep the first-declared one and surface an issue.
/// Open modules then sweep every unclaimed exposed owned unit into the
/// unnamed interface; closed modules keep the unnamed interface strictly
/// to the base namespace. Modules resolve independently, so they run in
/// parallel and merge in module order.
pub fn resolve_interfaces(
    codebase: &Codebase,
    tree: &mut ModuleTree,
    config: &Config,
    custom: Option<&dyn CandidateSource>,
    issues: &mut Vec<ConfigIssue>,
) {
    let declarations = gather_declarations(codebase, tree, config, custom, issues);

    let mut owned_units: Vec<Vec<UnitId>> = vec![Vec::new(); tree.len()];
    for unit in codebase.unit_ids() {
        if let Some(owner) = tree.owner_of(unit) {
            owned_units[owner.0].push(unit);
        }
    }

    let shared: &ModuleTree = tree;
    let ids: Vec<ModuleId> = shared.ids().collect();
    let resolved: Vec<(Vec<NamedInterface>, Vec<ConfigIssue>)> = ids
        .par_iter()
        .map(|&id| resolve_module(codebase, shared, id, &declarations[id.0], &owned_units[id.0]))
        .collect();

    for (id, (interfaces, module_issues)) in ids.into_iter().zip(resolved) {
        tree.module_mut(id).interfaces = interfaces;
        issues.extend(module_issues);
    }
}

/// Per-module declaration lists in precedence order: depth-first over the
/// module's owned namespaces, tag declarations first at each namespace,
/// then config entries, then delegate contributions.
fn gather_declarations(
    codebase: &Codebase,
    tree: &ModuleTree,
    config: &Config,
    custom: Option<&dyn CandidateSource>,
    issues: &mut Vec<ConfigIssue>,
) -> Vec<Vec<InterfaceDecl>> {
    let namespaces = codebase.namespaces();
    let base_to_module: HashMap<NamespaceId, ModuleId> =
        tree.ids().map(|id| (tree.module(id).base, id)).collect();

    // Config entries bind by explicit namespace first, then logical name.
    // Entries matching no module were already reported during detection.
    let mut config_for: HashMap<ModuleId, Vec<&crate::config::InterfaceConfig>> = HashMap::new();
    for (name, declared) in &config.modules {
        let target = declared
            .namespace
            .as_deref()
            .and_then(|ns| namespaces.find(ns))
            .and_then(|ns| base_to_module.get(&ns).copied())
            .or_else(|| tree.resolve_name(name));
        if let Some(id) = target {
            config_for
                .entry(id)
                .or_default()
                .extend(declared.interfaces.iter());
        }
    }

    let mut per_module: Vec<Vec<InterfaceDecl>> = vec![Vec::new(); tree.len()];
    for id in tree.ids() {
        let module = tree.module(id);

        let mut pending: Vec<InterfaceDecl> = Vec::new();
        for raw in config_for.get(&id).map(Vec::as_slice).unwrap_or(&[]) {
            let namespace = match &raw.namespace {
                None => module.base,
                Some(path) => match namespaces.find(path) {
                    Some(ns) => ns,
                    None => {
                        issues.push(ConfigIssue::invalid_interface(
                            &module.name,
                            &format!("namespace '{path}' does not exist"),
                        ));
                        continue;
                    }
                },
            };
            if !owned_by(namespaces, &base_to_module, namespace, id) {
                issues.push(ConfigIssue::invalid_interface(
                    &module.name,
                    &format!(
                        "namespace '{}' is not owned by this module",
                        namespaces.path(namespace)
                    ),
                ));
                continue;
            }
            pending.push(InterfaceDecl {
                name: raw.name.clone(),
                namespace,
                recursive: raw.recursive,
                include: raw.include.clone(),
                exclude: raw.exclude.clone(),
            });
        }

        let mut delegated = custom
            .map(|source| source.interfaces(codebase, module.base))
            .unwrap_or_default();
        delegated.retain(|decl| {
            if owned_by(namespaces, &base_to_module, decl.namespace, id) {
                true
            } else {
                issues.push(ConfigIssue::invalid_interface(
                    &module.name,
                    &format!(
                        "namespace '{}' is not owned by this module",
                        namespaces.path(decl.namespace)
                    ),
                ));
                false
            }
        });

        for ns in namespaces.descendants(module.base) {
            if !owned_by(namespaces, &base_to_module, ns, id) {
                continue;
            }
            for &unit in namespaces.units(ns) {
                for tag in codebase.unit(unit).tags_of(&TagKind::NamedInterface) {
                    match tag.attr("name") {
                        Some(name) => per_module[id.0].push(InterfaceDecl {
                            name: name.to_string(),
                            namespace: ns,
                            recursive: tag.flag("recursive"),
                            include: tag.attr("include").map(str::to_string),
                            exclude: tag.attr("exclude").map(str::to_string),
                        }),
                        None => issues.push(ConfigIssue::invalid_interface(
                            &module.name,
                            &format!(
                                "tag on '{}' is missing the 'name' attribute",
                                codebase.qualified_path(unit)
                            ),
                        )),
                    }
                }
            }
            per_module[id.0].extend(drain_at(&mut pending, ns));
            per_module[id.0].extend(drain_at(&mut delegated, ns));
        }
    }
    per_module
}

fn resolve_module(
    codebase: &Codebase,
    tree: &ModuleTree,
    id: ModuleId,
    declarations: &[InterfaceDecl],
    owned: &[UnitId],
) -> (Vec<NamedInterface>, Vec<ConfigIssue>) {
    let module = tree.module(id);
    let namespaces = codebase.namespaces();
    let mut issues = Vec::new();

    // Winning declaration per claimed unit.
    let mut claimed: HashMap<UnitId, usize> = HashMap::new();
    for &unit in owned {
        if !codebase.unit(unit).is_exposed() {
            continue;
        }
        let mut best: Option<usize> = None;
        let mut contested: Option<usize> = None;
        for (index, decl) in declarations.iter().enumerate() {
            if !decl_matches(codebase, decl, unit) {
                continue;
            }
            match best {
                None => best = Some(index),
                Some(current) => {
                    let current_depth = namespaces.depth(declarations[current].namespace);
                    let depth = namespaces.depth(decl.namespace);
                    if depth > current_depth {
                        // A more specific claim supersedes earlier ones.
                        best = Some(index);
                        contested = None;
                    } else if depth == current_depth
                        && contested.is_none()
                        && declarations[current].name != decl.name
                    {
                        contested = Some(index);
                    }
                }
            }
        }
        if let (Some(winner), Some(loser)) = (best, contested) {
            issues.push(ConfigIssue::ambiguous_claim(
                &module.name,
                &codebase.qualified_path(unit),
                &declarations[winner].name,
                &declarations[loser].name,
            ));
        }
        if let Some(winner) = best {
            claimed.insert(unit, winner);
        }
    }

    // Interface order is declaration order; declared-but-empty interfaces
    // are kept so grants against them resolve.
    let mut interfaces = vec![NamedInterface::unnamed()];
    let mut slot_of: HashMap<&str, usize> = HashMap::new();
    for decl in declarations {
        if !slot_of.contains_key(decl.name.as_str()) {
            slot_of.insert(&decl.name, interfaces.len());
            interfaces.push(NamedInterface {
                name: Some(decl.name.clone()),
                members: Vec::new(),
            });
        }
    }
    for (&unit, &winner) in &claimed {
        let slot = slot_of[declarations[winner].name.as_str()];
        interfaces[slot].members.push(unit);
    }

    for &unit in owned {
        let u = codebase.unit(unit);
        if !u.is_exposed() || claimed.contains_key(&unit) {
            continue;
        }
        if u.namespace == module.base || module.is_open() {
            interfaces[0].members.push(unit);
        }
    }

    for interface in &mut interfaces {
        interface.members.sort();
    }
    (interfaces, issues)
}

fn decl_matches(codebase: &Codebase, decl: &InterfaceDecl, unit: UnitId) -> bool {
    let u = codebase.unit(unit);
    let namespaces = codebase.namespaces();
    let in_scope = u.namespace == decl.namespace
        || (decl.recursive && namespaces.is_within(u.namespace, decl.namespace));
    if !in_scope {
        return false;
    }
    let path = codebase.qualified_path(unit).replace('.', "/");
    if let Some(include) = &decl.include {
        if !glob_match(include, &path) {
            return false;
        }
    }
    if let Some(exclude) = &decl.exclude {
        if glob_match(exclude, &path) {
            return false;
        }
    }
    true
}

/// Whether the deepest module base prefixing `ns` belongs to `module`.
fn owned_by(
    namespaces: &NamespaceTree,
    base_to_module: &HashMap<NamespaceId, ModuleId>,
    ns: NamespaceId,
    module: ModuleId,
) -> bool {
    let mut current = Some(ns);
    while let Some(candidate) = current {
        if let Some(&owner) = base_to_module.get(&candidate) {
            return owner == module;
        }
        current = namespaces.parent(candidate);
    }
    false
}

/// Pull out the declarations sitting at `ns`, preserving order.
fn drain_at(pending: &mut Vec<InterfaceDecl>, ns: NamespaceId) -> Vec<InterfaceDecl> {
    let mut taken = Vec::new();
    let mut index = 0;
    while index < pending.len() {
        if pending[index].namespace == ns {
            taken.push(pending.remove(index));
        } else {
            index += 1;
        }
    }
    taken
}

/// Glob matching with ** (any segments) and * (within one segment) over
/// slash-separated qualified paths.
fn glob_match(pattern: &str, path: &str) -> bool {
    if let Some(pos) = pattern.find("**") {
        let prefix = &pattern[..pos];
        let suffix = &pattern[pos + 2..];
        let suffix = suffix.strip_prefix('/').unwrap_or(suffix);

        if !prefix.is_empty() && !path.starts_with(prefix) {
            return false;
        }

        let remaining = &path[prefix.len()..];

        if suffix.is_empty() {
            return true;
        }

        for (i, _) in remaining.char_indices() {
            if glob_match(suffix, &remaining[i..]) {
                return true;
            }
        }
        glob_match(suffix, "")
    } else if let Some(pos) = pattern.find('*') {
        let prefix = &pattern[..pos];
        let suffix = &pattern[pos + 1..];

        if !path.starts_with(prefix) {
            return false;
        }

        let remaining = &path[prefix.len()..];

        // * stops at segment boundaries.
        for (i, c) in remaining.char_indices() {
            if c == '/' {
                return glob_match(suffix, &remaining[i..]);
            }
            if glob_match(suffix, &remaining[i..]) {
                return true;
            }
        }
        glob_match(suffix, "")
    } else {
        pattern == path || path.ends_with(&format!("/{pattern}"))
    }
}
