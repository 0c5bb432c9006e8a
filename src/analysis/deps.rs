use crate::model::{ConfigIssue, ModuleId, ModuleTree};

/// A parsed allowed-dependency expression. The target is a logical module
/// name or a dotted root-relative path; resolution happens once per run,
/// never per edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyExpr {
    /// `module`: the target's unnamed interface.
    Module(String),
    /// `module :: name`: exactly that explicit interface.
    Interface(String, String),
    /// `module :: *`: every explicitly declared interface of the target.
    Wildcard(String),
}

impl DependencyExpr {
    /// Parse one expression; whitespace around `::` is free. Returns None
    /// for anything outside the grammar.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let mut parts = raw.split("::").map(str::trim);
        let target = parts.next()?;
        if target.is_empty() || target.chars().any(char::is_whitespace) {
            return None;
        }
        let Some(interface) = parts.next() else {
            return Some(Self::Module(target.to_string()));
        };
        if parts.next().is_some() {
            return None;
        }
        if interface == "*" {
            return Some(Self::Wildcard(target.to_string()));
        }
        if interface.is_empty() || interface.chars().any(char::is_whitespace) {
            return None;
        }
        Some(Self::Interface(target.to_string(), interface.to_string()))
    }

    pub fn target(&self) -> &str {
        match self {
            Self::Module(target) | Self::Interface(target, _) | Self::Wildcard(target) => target,
        }
    }
}

/// What one module may reach. A grant names a target module and one of its
/// interface slots (slot 0 = unnamed).
#[derive(Debug, Clone)]
pub enum Policy {
    /// No expressions declared: everything exported anywhere is fair game.
    Unrestricted,
    Restricted {
        grants: Vec<(ModuleId, usize)>,
        /// Modules any expression successfully named, even when the
        /// interface part failed to resolve. Used to tell "wrong
        /// interface" apart from "module never mentioned".
        mentioned: Vec<ModuleId>,
    },
}

/// Per-source-module dependency policies, resolved once against the tree.
pub struct DependencyPolicies {
    policies: Vec<Policy>,
}

impl DependencyPolicies {
    /// Parse and resolve every module's expressions. Bad entries degrade
    /// to issues and grant nothing; the rest of the module's policy
    /// stands.
    pub fn resolve(tree: &ModuleTree, issues: &mut Vec<ConfigIssue>) -> Self {
        let policies = tree
            .ids()
            .map(|id| resolve_policy(tree, id, issues))
            .collect();
        Self { policies }
    }

    pub fn policy(&self, module: ModuleId) -> &Policy {
        &self.policies[module.0]
    }

    pub fn is_restricted(&self, module: ModuleId) -> bool {
        matches!(self.policies[module.0], Policy::Restricted { .. })
    }

    /// Whether `source` holds a grant on `target`'s interface slot.
    pub fn permits(&self, source: ModuleId, target: ModuleId, slot: usize) -> bool {
        match &self.policies[source.0] {
            Policy::Unrestricted => true,
            Policy::Restricted { grants, .. } => grants.contains(&(target, slot)),
        }
    }

    /// Whether any of `source`'s expressions named `target` or one of its
    /// ancestors. Referencing a family by its top module counts as
    /// mentioning the nested modules inside it.
    pub fn mentions(&self, tree: &ModuleTree, source: ModuleId, target: ModuleId) -> bool {
        match &self.policies[source.0] {
            Policy::Unrestricted => true,
            Policy::Restricted { mentioned, .. } => mentioned
                .iter()
                .any(|&m| m == target || tree.is_ancestor(m, target)),
        }
    }
}

fn resolve_policy(tree: &ModuleTree, id: ModuleId, issues: &mut Vec<ConfigIssue>) -> Policy {
    let module = tree.module(id);
    if module.allowed_dependencies.is_empty() {
        return Policy::Unrestricted;
    }

    let mut grants = Vec::new();
    let mut mentioned = Vec::new();
    for raw in &module.allowed_dependencies {
        let Some(expr) = DependencyExpr::parse(raw) else {
            issues.push(ConfigIssue::malformed_expression(&module.name, raw));
            continue;
        };
        let Some(target) = tree.resolve_name(expr.target()) else {
            issues.push(ConfigIssue::unknown_module(&module.name, raw));
            continue;
        };
        if !mentioned.contains(&target) {
            mentioned.push(target);
        }
        match expr {
            DependencyExpr::Module(_) => grants.push((target, 0)),
            DependencyExpr::Interface(_, name) => {
                match tree.module(target).interface_slot(&name) {
                    Some(slot) => grants.push((target, slot)),
                    None => issues.push(ConfigIssue::unknown_named_interface(
                        &module.name,
                        raw,
                        &tree.module(target).name,
                    )),
                }
            }
            DependencyExpr::Wildcard(_) => {
                // Explicit interfaces only; slot 0 stays out.
                for slot in 1..tree.module(target).interfaces.len() {
                    grants.push((target, slot));
                }
            }
        }
    }
    Policy::Restricted { grants, mentioned }
}
