use super::CommandContext;
use crate::cli::TreeArgs;
use crate::model::{Codebase, ModuleId, ModuleTree, Verification};
use crate::style;

pub fn cmd_tree(args: TreeArgs) -> i32 {
    let ctx = match CommandContext::new(&args.path, args.strategy.as_deref()) {
        Ok(ctx) => ctx,
        Err(code) => return code,
    };

    let verification = match ctx.run_verification(args.snapshot.as_deref()) {
        Ok(verification) => verification,
        Err(code) => return code,
    };

    print!("{}", render_tree(&verification));

    for issue in &verification.config_issues {
        style::warning(&issue.to_string());
    }
    0
}

/// Plain-text module tree: one block per module with openness,
/// interfaces (member counts) and declared grants, nested by indentation.
fn render_tree(verification: &Verification) -> String {
    let tree = &verification.modules;
    let mut out = String::new();

    let root = if verification.root.is_empty() {
        "<root>"
    } else {
        verification.root.as_str()
    };
    out.push_str(&format!("{root}\n"));

    if tree.is_empty() {
        out.push_str("  (no modules detected)\n");
        return out;
    }
    for &module in tree.roots() {
        render_module(&verification.codebase, tree, module, 1, &mut out);
    }
    out
}

fn render_module(
    codebase: &Codebase,
    tree: &ModuleTree,
    id: ModuleId,
    depth: usize,
    out: &mut String,
) {
    let module = tree.module(id);
    let indent = "  ".repeat(depth);
    let openness = if module.is_open() { "open" } else { "closed" };
    out.push_str(&format!(
        "{indent}{} [{openness}] ({})\n",
        module.name,
        codebase.namespaces().path(module.base)
    ));

    for interface in &module.interfaces {
        let label = interface.name.as_deref().unwrap_or("(unnamed)");
        out.push_str(&format!(
            "{indent}  :: {label}: {} unit(s)\n",
            interface.members.len()
        ));
    }
    if !module.allowed_dependencies.is_empty() {
        out.push_str(&format!(
            "{indent}  allowed -> {}\n",
            module.allowed_dependencies.join(", ")
        ));
    }
    for &child in &module.children {
        render_module(codebase, tree, child, depth + 1, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ModuleConfig};
    use crate::model::Visibility;
    use crate::snapshot::{CodebaseSnapshot, UnitRecord};
    use crate::verify_snapshot;

    #[test]
    fn test_render_tree_lists_modules_and_interfaces() {
        let mut config = Config::default();
        config.modules.insert(
            "inventory".to_string(),
            ModuleConfig {
                allowed_dependencies: Some(vec!["order".to_string()]),
                ..Default::default()
            },
        );
        let snapshot = CodebaseSnapshot {
            root: "shop".to_string(),
            units: vec![
                UnitRecord {
                    namespace: "shop.inventory".to_string(),
                    name: "InventoryManagement".to_string(),
                    visibility: Visibility::Exposed,
                    tags: Vec::new(),
                    references: Vec::new(),
                },
                UnitRecord {
                    namespace: "shop.order".to_string(),
                    name: "OrderManagement".to_string(),
                    visibility: Visibility::Exposed,
                    tags: Vec::new(),
                    references: Vec::new(),
                },
            ],
        };
        let verification = verify_snapshot(&snapshot, &config, None).unwrap();
        let rendered = render_tree(&verification);

        assert!(rendered.starts_with("shop\n"));
        assert!(rendered.contains("inventory [closed] (shop.inventory)"));
        assert!(rendered.contains(":: (unnamed): 1 unit(s)"));
        assert!(rendered.contains("allowed -> order"));
    }

    #[test]
    fn test_render_tree_empty() {
        let snapshot = CodebaseSnapshot {
            root: "shop".to_string(),
            units: Vec::new(),
        };
        let verification = verify_snapshot(&snapshot, &Config::default(), None).unwrap();
        assert!(render_tree(&verification).contains("(no modules detected)"));
    }
}
