use super::interfaces::InterfaceDecl;
use crate::config::{Config, StrategyKind};
use crate::model::{
    Codebase, ConfigIssue, Module, ModuleId, ModuleTree, NamedInterface, NamespaceId,
    NamespaceTree, Openness, Tag, TagKind,
};
use std::collections::{HashMap, HashSet};

/// The one capability a detection strategy needs: enumerate candidate
/// module base namespaces under a scope. External strategies implement
/// this and are passed in through the library API; a second, optional
/// capability lets them contribute interface declarations as well.
pub trait CandidateSource: Send + Sync {
    fn candidates(&self, codebase: &Codebase, scope: NamespaceId) -> Vec<NamespaceId>;

    /// Extra interface declarations for a module base. Default: none.
    fn interfaces(&self, codebase: &Codebase, base: NamespaceId) -> Vec<InterfaceDecl> {
        let _ = (codebase, base);
        Vec::new()
    }
}

/// Build the module tree for one run.
///
/// Candidates come from the primary strategy applied to the scan root and
/// every contributed extra root, merged with explicitly contributed bases.
/// Within each candidate the same detection recurs to find nested modules.
/// Parenting is by containment: a base's parent is the deepest other base
/// strictly prefixing it. Bases whose subtree holds no units produce no
/// module. Candidate order is normalized by base path, so the tree is
/// identical across runs.
pub fn detect_modules(
    codebase: &Codebase,
    config: &Config,
    custom: Option<&dyn CandidateSource>,
    issues: &mut Vec<ConfigIssue>,
) -> ModuleTree {
    let namespaces = codebase.namespaces();

    if let StrategyKind::Custom(id) = &config.detection.strategy {
        if custom.is_none() {
            issues.push(ConfigIssue::unknown_strategy(id));
        }
    }

    // Scan roots: the snapshot root plus contributed extras. Unknown
    // namespaces contribute nothing, same as empty ones.
    let mut scan_roots = vec![codebase.root()];
    for root in &config.detection.roots {
        if let Some(ns) = namespaces.find(root) {
            scan_roots.push(ns);
        }
    }

    let mut bases: HashSet<NamespaceId> = HashSet::new();
    let mut primary_count = 0usize;
    for &root in &scan_roots {
        for candidate in primary_scan(codebase, config, custom, root) {
            primary_count += 1;
            bases.insert(candidate);
        }
    }

    if config.detection.strategy == StrategyKind::ExplicitlyAnnotated && primary_count == 0 {
        issues.push(ConfigIssue::no_candidates(&codebase.root_path()));
    }

    // Explicitly contributed bases, from [detection] and from per-module
    // namespace declarations.
    for base in contributed_bases(config) {
        if let Some(ns) = namespaces.find(&base) {
            bases.insert(ns);
        }
    }

    // Nested closure: recur the detection inside every base until no new
    // base turns up.
    let mut queue: Vec<NamespaceId> = bases.iter().copied().collect();
    while let Some(base) = queue.pop() {
        for nested in nested_scan(codebase, config, custom, base) {
            if bases.insert(nested) {
                queue.push(nested);
            }
        }
    }

    // A base with no units anywhere beneath it cannot own anything.
    let mut kept: Vec<NamespaceId> = bases
        .into_iter()
        .filter(|&base| namespaces.units_within(base) > 0)
        .collect();
    kept.sort_by_key(|&base| namespaces.path(base));

    build_tree(codebase, config, issues, &kept)
}

fn primary_scan(
    codebase: &Codebase,
    config: &Config,
    custom: Option<&dyn CandidateSource>,
    scope: NamespaceId,
) -> Vec<NamespaceId> {
    match &config.detection.strategy {
        StrategyKind::DirectChildren => codebase.namespaces().children(scope).collect(),
        StrategyKind::ExplicitlyAnnotated => {
            annotated_scan(codebase, scope, config.detection.max_depth)
        }
        StrategyKind::Custom(_) => custom
            .map(|source| source.candidates(codebase, scope))
            .unwrap_or_default(),
    }
}

fn nested_scan(
    codebase: &Codebase,
    config: &Config,
    custom: Option<&dyn CandidateSource>,
    base: NamespaceId,
) -> Vec<NamespaceId> {
    match (&config.detection.strategy, custom) {
        (StrategyKind::Custom(_), Some(source)) => source.candidates(codebase, base),
        _ => annotated_scan(codebase, base, config.detection.max_depth),
    }
}

/// Namespaces strictly below `scope` whose directly declared units carry a
/// module tag, optionally bounded by depth relative to `scope`.
fn annotated_scan(
    codebase: &Codebase,
    scope: NamespaceId,
    max_depth: Option<usize>,
) -> Vec<NamespaceId> {
    let namespaces = codebase.namespaces();
    let scope_depth = namespaces.depth(scope);
    namespaces
        .descendants(scope)
        .into_iter()
        .filter(|&ns| ns != scope)
        .filter(|&ns| match max_depth {
            Some(bound) => namespaces.depth(ns) - scope_depth <= bound,
            None => true,
        })
        .filter(|&ns| is_module_tagged(codebase, ns))
        .collect()
}

fn is_module_tagged(codebase: &Codebase, ns: NamespaceId) -> bool {
    codebase
        .namespaces()
        .units(ns)
        .iter()
        .any(|&unit| codebase.unit(unit).tags_of(&TagKind::Module).next().is_some())
}

fn contributed_bases(config: &Config) -> Vec<String> {
    let mut bases = config.detection.bases.clone();
    for module in config.modules.values() {
        if let Some(namespace) = &module.namespace {
            bases.push(namespace.clone());
        }
    }
    bases
}

/// The module tag declared on a base namespace, if any: the first module
/// tag on a unit declared directly in it, in snapshot order.
fn module_tag(codebase: &Codebase, base: NamespaceId) -> Option<&Tag> {
    codebase
        .namespaces()
        .units(base)
        .iter()
        .find_map(|&unit| codebase.unit(unit).tags_of(&TagKind::Module).next())
}

fn build_tree(
    codebase: &Codebase,
    config: &Config,
    issues: &mut Vec<ConfigIssue>,
    kept: &[NamespaceId],
) -> ModuleTree {
    let namespaces = codebase.namespaces();

    // Config entries that pin a namespace also pin the module's name.
    let mut config_names: HashMap<String, &str> = HashMap::new();
    for (name, module) in &config.modules {
        if let Some(namespace) = &module.namespace {
            config_names.insert(namespace.clone(), name.as_str());
        }
    }

    let mut modules: Vec<Module> = Vec::with_capacity(kept.len());
    let mut roots: Vec<ModuleId> = Vec::new();
    let mut base_to_module: HashMap<NamespaceId, ModuleId> = HashMap::new();

    // Ancestors sort before descendants, so a parent always exists by the
    // time its children are built.
    for &base in kept {
        let id = ModuleId(modules.len());
        let base_path = namespaces.path(base);
        let tag = module_tag(codebase, base);

        let name = config_names
            .get(&base_path)
            .map(|s| s.to_string())
            .or_else(|| tag.and_then(|t| t.attr("name")).map(str::to_string))
            .unwrap_or_else(|| last_segment(&base_path));

        let openness = match tag.map(|t| t.flag("open")) {
            Some(true) => Openness::Open,
            _ => Openness::Closed,
        };

        let allowed_dependencies = tag
            .and_then(|t| t.attr("allowed-dependencies"))
            .map(split_expressions)
            .unwrap_or_default();

        let parent = containing_base(namespaces, &base_to_module, base);
        match parent {
            Some(parent_id) => modules[parent_id.0].children.push(id),
            None => roots.push(id),
        }

        modules.push(Module {
            name,
            base,
            parent,
            children: Vec::new(),
            openness,
            allowed_dependencies,
            interfaces: vec![NamedInterface::unnamed()],
        });
        base_to_module.insert(base, id);
    }

    // Unit ownership: the deepest base prefixing the unit's namespace.
    // Units outside every base stay unassigned.
    let mut owner = HashMap::new();
    for unit in codebase.unit_ids() {
        let ns = codebase.unit(unit).namespace;
        if let Some(module) = deepest_owner(namespaces, &base_to_module, ns) {
            owner.insert(unit, module);
        }
    }

    let mut tree = ModuleTree::from_parts(modules, roots, owner, HashMap::new(), HashMap::new());
    index_names(&mut tree);
    apply_config(codebase, config, &mut tree, issues);
    tree
}

/// Deepest already-built base strictly containing `base`.
fn containing_base(
    namespaces: &NamespaceTree,
    base_to_module: &HashMap<NamespaceId, ModuleId>,
    base: NamespaceId,
) -> Option<ModuleId> {
    let mut current = namespaces.parent(base);
    while let Some(ns) = current {
        if let Some(&module) = base_to_module.get(&ns) {
            return Some(module);
        }
        current = namespaces.parent(ns);
    }
    None
}

/// Deepest base containing `ns`, the namespace itself included.
fn deepest_owner(
    namespaces: &NamespaceTree,
    base_to_module: &HashMap<NamespaceId, ModuleId>,
    ns: NamespaceId,
) -> Option<ModuleId> {
    let mut current = Some(ns);
    while let Some(candidate) = current {
        if let Some(&module) = base_to_module.get(&candidate) {
            return Some(module);
        }
        current = namespaces.parent(candidate);
    }
    None
}

/// Fill the name and path lookup tables. First module in depth-first order
/// wins a contested logical name.
fn index_names(tree: &mut ModuleTree) {
    let mut by_name = HashMap::new();
    let mut by_path = HashMap::new();
    for id in tree.dfs() {
        by_name
            .entry(tree.module(id).name.clone())
            .or_insert(id);
        by_path.entry(tree.qualified_name(id)).or_insert(id);
    }
    tree.set_indexes(by_name, by_path);
}

/// Overlay per-module config declarations onto the detected tree. Config
/// wins over tag-derived openness and expressions. Entries matching no
/// module are reported, not dropped silently.
fn apply_config(
    codebase: &Codebase,
    config: &Config,
    tree: &mut ModuleTree,
    issues: &mut Vec<ConfigIssue>,
) {
    for (name, declared) in &config.modules {
        let target = declared
            .namespace
            .as_deref()
            .and_then(|ns| codebase.namespaces().find(ns))
            .and_then(|ns| tree.ids().find(|&id| tree.module(id).base == ns))
            .or_else(|| tree.resolve_name(name));

        let Some(id) = target else {
            issues.push(ConfigIssue::unmatched_declaration(name));
            continue;
        };

        let module = tree.module_mut(id);
        if let Some(open) = declared.open {
            module.openness = if open { Openness::Open } else { Openness::Closed };
        }
        if let Some(expressions) = &declared.allowed_dependencies {
            module.allowed_dependencies = expressions.clone();
        }
    }
}

fn last_segment(path: &str) -> String {
    path.rsplit('.').next().unwrap_or(path).to_string()
}

fn split_expressions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Tag, Visibility};
    use crate::snapshot::{CodebaseSnapshot, UnitRecord, validate_snapshot};

    fn unit(namespace: &str, name: &str) -> UnitRecord {
        UnitRecord {
            namespace: namespace.to_string(),
            name: name.to_string(),
            visibility: Visibility::Exposed,
            tags: Vec::new(),
            references: Vec::new(),
        }
    }

    fn tagged(namespace: &str, name: &str, tag: Tag) -> UnitRecord {
        let mut record = unit(namespace, name);
        record.tags.push(tag);
        record
    }

    fn codebase(root: &str, units: Vec<UnitRecord>) -> Codebase {
        validate_snapshot(&CodebaseSnapshot {
            root: root.to_string(),
            units,
        })
        .unwrap()
    }

    fn detect(codebase: &Codebase, config: &Config) -> (ModuleTree, Vec<ConfigIssue>) {
        let mut issues = Vec::new();
        let tree = detect_modules(codebase, config, None, &mut issues);
        (tree, issues)
    }

    #[test]
    fn test_direct_children_become_modules() {
        let codebase = codebase(
            "shop",
            vec![
                unit("shop.inventory", "InventoryManagement"),
                unit("shop.order", "OrderManagement"),
                unit("shop", "Application"),
            ],
        );
        let (tree, issues) = detect(&codebase, &Config::default());

        assert!(issues.is_empty());
        assert_eq!(tree.len(), 2);
        let names: Vec<&str> = tree
            .dfs()
            .into_iter()
            .map(|id| tree.module(id).name.as_str())
            .collect();
        assert_eq!(names, vec!["inventory", "order"]);
        // The unit at the root itself stays unassigned.
        let app = codebase.find_unit("shop.Application").unwrap();
        assert_eq!(tree.owner_of(app), None);
    }

    #[test]
    fn test_nested_module_via_tag() {
        let codebase = codebase(
            "shop",
            vec![
                unit("shop.inventory", "InventoryManagement"),
                tagged(
                    "shop.inventory.nested",
                    "NestedApi",
                    Tag::new(TagKind::Module),
                ),
            ],
        );
        let (tree, _) = detect(&codebase, &Config::default());

        assert_eq!(tree.len(), 2);
        let inventory = tree.resolve_name("inventory").unwrap();
        let nested = tree.resolve_name("nested").unwrap();
        assert_eq!(tree.module(nested).parent, Some(inventory));
        assert!(tree.is_ancestor(inventory, nested));
        assert_eq!(tree.qualified_name(nested), "inventory.nested");

        let api = codebase.find_unit("shop.inventory.nested.NestedApi").unwrap();
        assert_eq!(tree.owner_of(api), Some(nested));
    }

    #[test]
    fn test_annotated_strategy_with_depth_bound() {
        let mut config = Config::default();
        config.detection.strategy = StrategyKind::ExplicitlyAnnotated;
        config.detection.max_depth = Some(1);

        let codebase = codebase(
            "shop",
            vec![
                tagged("shop.order", "OrderManagement", Tag::new(TagKind::Module)),
                tagged("shop.a.b", "TooDeep", Tag::new(TagKind::Module)),
                unit("shop.untagged", "Nothing"),
            ],
        );
        let (tree, issues) = detect(&codebase, &config);

        assert!(issues.is_empty());
        assert_eq!(tree.len(), 1);
        assert!(tree.resolve_name("order").is_some());
        assert!(tree.resolve_name("b").is_none());
    }

    #[test]
    fn test_annotated_zero_candidates_reported_not_fatal() {
        let mut config = Config::default();
        config.detection.strategy = StrategyKind::ExplicitlyAnnotated;

        let codebase = codebase("shop", vec![unit("shop.order", "OrderManagement")]);
        let (tree, issues) = detect(&codebase, &config);

        assert!(tree.is_empty());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, crate::model::ConfigIssueKind::NoCandidates);
    }

    #[test]
    fn test_contributed_bases_and_roots() {
        let mut config = Config::default();
        config.detection.roots = vec!["platform".to_string()];
        config.detection.bases = vec!["shop.order.billing".to_string()];

        let codebase = codebase(
            "shop",
            vec![
                unit("shop.order", "OrderManagement"),
                unit("shop.order.billing", "BillingService"),
                unit("platform.audit", "AuditLog"),
            ],
        );
        let (tree, issues) = detect(&codebase, &config);

        assert!(issues.is_empty());
        // order + nested billing under it + audit under the extra root.
        assert_eq!(tree.len(), 3);
        let billing = tree.resolve_name("billing").unwrap();
        assert_eq!(tree.qualified_name(billing), "order.billing");
        assert!(tree.resolve_name("audit").is_some());
    }

    #[test]
    fn test_unknown_contributed_base_is_ignored() {
        let mut config = Config::default();
        config.detection.bases = vec!["shop.ghost".to_string(), "shop.order".to_string()];

        let codebase = codebase("shop", vec![unit("shop.order", "OrderManagement")]);
        let (tree, issues) = detect(&codebase, &config);

        assert!(issues.is_empty());
        assert_eq!(tree.len(), 1);
        assert!(tree.resolve_name("ghost").is_none());
    }

    #[test]
    fn test_name_precedence() {
        let mut config = Config::default();
        config.modules.insert(
            "warehouse".to_string(),
            crate::config::ModuleConfig {
                namespace: Some("shop.inventory".to_string()),
                ..Default::default()
            },
        );

        let codebase = codebase(
            "shop",
            vec![
                unit("shop.inventory", "InventoryManagement"),
                tagged(
                    "shop.order",
                    "OrderManagement",
                    Tag::new(TagKind::Module).with_attr("name", "ordering"),
                ),
                unit("shop.catalog", "Catalog"),
            ],
        );
        let (tree, _) = detect(&codebase, &config);

        // Config name beats tag name beats last segment.
        assert!(tree.resolve_name("warehouse").is_some());
        assert!(tree.resolve_name("ordering").is_some());
        assert!(tree.resolve_name("catalog").is_some());
        assert!(tree.resolve_name("inventory").is_none());
        assert!(tree.resolve_name("order").is_none());
    }

    #[test]
    fn test_config_overlay_wins_over_tags() {
        let mut config = Config::default();
        config.modules.insert(
            "order".to_string(),
            crate::config::ModuleConfig {
                open: Some(true),
                allowed_dependencies: Some(vec!["inventory".to_string()]),
                ..Default::default()
            },
        );

        let codebase = codebase(
            "shop",
            vec![
                tagged(
                    "shop.order",
                    "OrderManagement",
                    Tag::new(TagKind::Module)
                        .with_attr("allowed-dependencies", "catalog, inventory :: spi"),
                ),
                unit("shop.inventory", "InventoryManagement"),
            ],
        );
        let (tree, issues) = detect(&codebase, &config);

        assert!(issues.is_empty());
        let order = tree.resolve_name("order").unwrap();
        assert_eq!(tree.module(order).openness, Openness::Open);
        assert_eq!(tree.module(order).allowed_dependencies, vec!["inventory"]);
    }

    #[test]
    fn test_tag_declared_expressions_are_split() {
        let codebase = codebase(
            "shop",
            vec![
                tagged(
                    "shop.order",
                    "OrderManagement",
                    Tag::new(TagKind::Module)
                        .with_attr("allowed-dependencies", "catalog, inventory :: spi"),
                ),
                unit("shop.inventory", "InventoryManagement"),
            ],
        );
        let (tree, _) = detect(&codebase, &Config::default());
        let order = tree.resolve_name("order").unwrap();
        assert_eq!(
            tree.module(order).allowed_dependencies,
            vec!["catalog", "inventory :: spi"]
        );
    }

    #[test]
    fn test_unmatched_config_declaration_is_reported() {
        let mut config = Config::default();
        config
            .modules
            .insert("ghost".to_string(), crate::config::ModuleConfig::default());

        let codebase = codebase("shop", vec![unit("shop.order", "OrderManagement")]);
        let (_, issues) = detect(&codebase, &config);

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, crate::model::ConfigIssueKind::UnknownModule);
        assert_eq!(issues[0].module.as_deref(), Some("ghost"));
    }

    #[test]
    fn test_custom_strategy_without_source_is_reported() {
        let mut config = Config::default();
        config.detection.strategy = StrategyKind::Custom("my-plugin".to_string());

        let codebase = codebase("shop", vec![unit("shop.order", "OrderManagement")]);
        let (tree, issues) = detect(&codebase, &config);

        assert!(tree.is_empty());
        assert_eq!(issues.len(), 1);
        assert_eq!(
            issues[0].kind,
            crate::model::ConfigIssueKind::UnknownStrategy
        );
    }

    #[test]
    fn test_custom_source_candidates_and_nesting() {
        struct EveryNamespaceWithUnits;
        impl CandidateSource for EveryNamespaceWithUnits {
            fn candidates(&self, codebase: &Codebase, scope: NamespaceId) -> Vec<NamespaceId> {
                codebase
                    .namespaces()
                    .descendants(scope)
                    .into_iter()
                    .filter(|&ns| ns != scope)
                    .filter(|&ns| !codebase.namespaces().units(ns).is_empty())
                    .collect()
            }
        }

        let mut config = Config::default();
        config.detection.strategy = StrategyKind::Custom("every".to_string());

        let codebase = codebase(
            "shop",
            vec![
                unit("shop.order", "OrderManagement"),
                unit("shop.order.billing", "BillingService"),
            ],
        );
        let mut issues = Vec::new();
        let tree = detect_modules(&codebase, &config, Some(&EveryNamespaceWithUnits), &mut issues);

        assert!(issues.is_empty());
        assert_eq!(tree.len(), 2);
        let billing = tree.resolve_name("billing").unwrap();
        let order = tree.resolve_name("order").unwrap();
        assert_eq!(tree.module(billing).parent, Some(order));
    }

    #[test]
    fn test_deterministic_across_input_order() {
        let forward = codebase(
            "shop",
            vec![
                unit("shop.inventory", "A"),
                unit("shop.order", "B"),
                unit("shop.catalog", "C"),
            ],
        );
        let backward = codebase(
            "shop",
            vec![
                unit("shop.catalog", "C"),
                unit("shop.order", "B"),
                unit("shop.inventory", "A"),
            ],
        );
        let (tree_a, _) = detect(&forward, &Config::default());
        let (tree_b, _) = detect(&backward, &Config::default());

        let names = |tree: &ModuleTree| -> Vec<String> {
            tree.dfs()
                .into_iter()
                .map(|id| tree.qualified_name(id))
                .collect()
        };
        assert_eq!(names(&tree_a), names(&tree_b));
    }
}
