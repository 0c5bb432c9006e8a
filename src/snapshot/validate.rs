use super::serialize::CodebaseSnapshot;
use crate::model::{Codebase, NamespaceTree, Unit, UnitId};
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

/// A snapshot that breaks the indexer contract. Fatal: an inconsistent
/// symbol graph cannot be analyzed, so the run halts here instead of
/// producing a partial tree.
#[derive(Debug, Error)]
pub enum ContractError {
    #[error("malformed namespace path '{namespace}' ({context})")]
    MalformedNamespace { context: String, namespace: String },
    #[error("malformed unit name '{name}' in namespace '{namespace}'")]
    MalformedUnitName { namespace: String, name: String },
    #[error("duplicate unit '{qualified}' in snapshot")]
    DuplicateUnit { qualified: String },
    #[error("unit '{referrer}' references '{target}', which is not in the snapshot and not marked external")]
    DanglingReference { referrer: String, target: String },
}

/// Check the indexer contract and build the immutable [`Codebase`] arenas.
///
/// Verified here: well-formed namespace paths and unit names, unique
/// qualified paths, and referential integrity of every non-external edge.
/// External references are counted and dropped; duplicate edges collapse
/// to one.
pub fn validate_snapshot(snapshot: &CodebaseSnapshot) -> Result<Codebase, ContractError> {
    if !well_formed_namespace(&snapshot.root) {
        return Err(ContractError::MalformedNamespace {
            context: "snapshot root".to_string(),
            namespace: snapshot.root.clone(),
        });
    }

    let mut namespaces = NamespaceTree::new();
    let root = namespaces.intern(&snapshot.root);

    let mut units = Vec::with_capacity(snapshot.units.len());
    let mut by_path: HashMap<String, UnitId> = HashMap::with_capacity(snapshot.units.len());

    for record in &snapshot.units {
        if !well_formed_namespace(&record.namespace) {
            return Err(ContractError::MalformedNamespace {
                context: format!("unit '{}'", record.name),
                namespace: record.namespace.clone(),
            });
        }
        if !well_formed_name(&record.name) {
            return Err(ContractError::MalformedUnitName {
                namespace: record.namespace.clone(),
                name: record.name.clone(),
            });
        }

        let namespace = namespaces.intern(&record.namespace);
        let id = UnitId(units.len());
        let qualified = record.qualified_path();
        if by_path.insert(qualified.clone(), id).is_some() {
            return Err(ContractError::DuplicateUnit { qualified });
        }
        namespaces.add_unit(namespace, id);
        units.push(Unit {
            namespace,
            name: record.name.clone(),
            visibility: record.visibility,
            tags: record.tags.clone(),
        });
    }

    let mut edges: BTreeSet<(UnitId, UnitId)> = BTreeSet::new();
    let mut external_references = 0usize;
    for (index, record) in snapshot.units.iter().enumerate() {
        let from = UnitId(index);
        for reference in &record.references {
            if reference.external {
                external_references += 1;
                continue;
            }
            let Some(&to) = by_path.get(&reference.to) else {
                return Err(ContractError::DanglingReference {
                    referrer: record.qualified_path(),
                    target: reference.to.clone(),
                });
            };
            edges.insert((from, to));
        }
    }

    Ok(Codebase::new(
        namespaces,
        units,
        edges.into_iter().collect(),
        root,
        by_path,
        external_references,
    ))
}

fn well_formed_namespace(path: &str) -> bool {
    path.is_empty() || path.split('.').all(well_formed_segment)
}

fn well_formed_segment(segment: &str) -> bool {
    !segment.is_empty() && !segment.chars().any(char::is_whitespace)
}

fn well_formed_name(name: &str) -> bool {
    well_formed_segment(name) && !name.contains('.')
}
