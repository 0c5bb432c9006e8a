use super::namespace::NamespaceId;
use super::unit::UnitId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Index of a module in the [`ModuleTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModuleId(pub(crate) usize);

/// Whether exposed units in sub-namespaces join the unnamed interface
/// implicitly (`Open`) or stay unexported unless explicitly claimed
/// (`Closed`). Modules are closed unless declared otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Openness {
    Open,
    #[default]
    Closed,
}

/// A partition of a module's exposed units. `name: None` is the implicit
/// unnamed interface every module has; named ones come from explicit
/// declarations. Members are kept sorted for binary search and stable output.
#[derive(Debug, Clone)]
pub struct NamedInterface {
    pub name: Option<String>,
    pub members: Vec<UnitId>,
}

impl NamedInterface {
    pub fn unnamed() -> Self {
        Self {
            name: None,
            members: Vec::new(),
        }
    }

    pub fn is_unnamed(&self) -> bool {
        self.name.is_none()
    }

    pub fn contains(&self, unit: UnitId) -> bool {
        self.members.binary_search(&unit).is_ok()
    }
}

/// A node in the module tree.
#[derive(Debug, Clone)]
pub struct Module {
    /// Logical name: explicit (tag or config) or the base's last segment.
    pub name: String,
    pub base: NamespaceId,
    pub parent: Option<ModuleId>,
    pub children: Vec<ModuleId>,
    pub openness: Openness,
    /// Ordered raw allowed-dependency expressions. Empty means the module is
    /// unrestricted.
    pub allowed_dependencies: Vec<String>,
    /// Index 0 is always the unnamed interface.
    pub interfaces: Vec<NamedInterface>,
}

impl Module {
    pub fn is_open(&self) -> bool {
        self.openness == Openness::Open
    }

    pub fn is_restricted(&self) -> bool {
        !self.allowed_dependencies.is_empty()
    }

    pub fn unnamed_interface(&self) -> &NamedInterface {
        &self.interfaces[0]
    }

    pub fn named_interface(&self, name: &str) -> Option<&NamedInterface> {
        self.interfaces
            .iter()
            .find(|i| i.name.as_deref() == Some(name))
    }

    /// Slot of the explicit interface called `name`. Slot 0 is the unnamed
    /// interface, so a hit is always >= 1.
    pub fn interface_slot(&self, name: &str) -> Option<usize> {
        self.interfaces
            .iter()
            .position(|i| i.name.as_deref() == Some(name))
    }

    /// Slot of the interface claiming `unit`, if any.
    pub fn claim_slot(&self, unit: UnitId) -> Option<usize> {
        self.interfaces.iter().position(|i| i.contains(unit))
    }

    /// The explicitly declared interfaces, unnamed one excluded.
    pub fn explicit_interfaces(&self) -> impl Iterator<Item = &NamedInterface> {
        self.interfaces.iter().filter(|i| !i.is_unnamed())
    }

    /// Which interface of this module claims `unit`, if any. `Some(None)`
    /// means the unnamed interface.
    pub fn interface_claim(&self, unit: UnitId) -> Option<Option<&str>> {
        self.interfaces
            .iter()
            .find(|i| i.contains(unit))
            .map(|i| i.name.as_deref())
    }
}

/// Arena of modules under a synthetic application root. Top-level modules
/// have no parent; nesting is expressed through parent/child index lists.
#[derive(Debug, Clone)]
pub struct ModuleTree {
    modules: Vec<Module>,
    roots: Vec<ModuleId>,
    owner: HashMap<UnitId, ModuleId>,
    by_name: HashMap<String, ModuleId>,
    by_path: HashMap<String, ModuleId>,
}

impl ModuleTree {
    pub(crate) fn from_parts(
        modules: Vec<Module>,
        roots: Vec<ModuleId>,
        owner: HashMap<UnitId, ModuleId>,
        by_name: HashMap<String, ModuleId>,
        by_path: HashMap<String, ModuleId>,
    ) -> Self {
        Self {
            modules,
            roots,
            owner,
            by_name,
            by_path,
        }
    }

    pub fn empty() -> Self {
        Self {
            modules: Vec::new(),
            roots: Vec::new(),
            owner: HashMap::new(),
            by_name: HashMap::new(),
            by_path: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.0]
    }

    pub(crate) fn module_mut(&mut self, id: ModuleId) -> &mut Module {
        &mut self.modules[id.0]
    }

    /// Install the name/path lookup tables, computed after the arena is
    /// fully linked.
    pub(crate) fn set_indexes(
        &mut self,
        by_name: HashMap<String, ModuleId>,
        by_path: HashMap<String, ModuleId>,
    ) {
        self.by_name = by_name;
        self.by_path = by_path;
    }

    pub fn ids(&self) -> impl Iterator<Item = ModuleId> {
        (0..self.modules.len()).map(ModuleId)
    }

    /// Top-level modules in base-path order.
    pub fn roots(&self) -> &[ModuleId] {
        &self.roots
    }

    /// The module owning `unit`, or None when the unit is unassigned.
    pub fn owner_of(&self, unit: UnitId) -> Option<ModuleId> {
        self.owner.get(&unit).copied()
    }

    /// Resolve a module reference from a dependency expression: a logical
    /// name (first depth-first match wins on collision) or a dotted
    /// root-relative base path such as `inventory.nested`.
    pub fn resolve_name(&self, name: &str) -> Option<ModuleId> {
        self.by_name
            .get(name)
            .or_else(|| self.by_path.get(name))
            .copied()
    }

    /// Root-relative dotted base path of a module (unique within the tree).
    pub fn qualified_name(&self, id: ModuleId) -> String {
        let mut segments = vec![self.modules[id.0].name.clone()];
        let mut current = self.modules[id.0].parent;
        while let Some(parent) = current {
            segments.push(self.modules[parent.0].name.clone());
            current = self.modules[parent.0].parent;
        }
        segments.reverse();
        segments.join(".")
    }

    /// Whether `ancestor` is a proper ancestor of `module`.
    pub fn is_ancestor(&self, ancestor: ModuleId, module: ModuleId) -> bool {
        let mut current = self.modules[module.0].parent;
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.modules[parent.0].parent;
        }
        false
    }

    /// Deepest module appearing in both ancestor chains (self-inclusive).
    /// None when the two modules live in different top-level families.
    pub fn common_ancestor(&self, a: ModuleId, b: ModuleId) -> Option<ModuleId> {
        let mut chain = Vec::new();
        let mut current = Some(a);
        while let Some(id) = current {
            chain.push(id);
            current = self.modules[id.0].parent;
        }
        let mut current = Some(b);
        while let Some(id) = current {
            if chain.contains(&id) {
                return Some(id);
            }
            current = self.modules[id.0].parent;
        }
        None
    }

    pub fn is_top_level(&self, id: ModuleId) -> bool {
        self.modules[id.0].parent.is_none()
    }

    /// Depth-first pre-order over the whole tree, children in insertion
    /// order (base-path sorted at build time).
    pub fn dfs(&self) -> Vec<ModuleId> {
        let mut out = Vec::new();
        let mut stack: Vec<ModuleId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            for child in self.modules[id.0].children.iter().rev() {
                stack.push(*child);
            }
        }
        out
    }
}
