use super::unit::UnitId;
use std::collections::BTreeMap;

/// Index of a namespace in the [`NamespaceTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NamespaceId(pub(crate) usize);

#[derive(Debug, Clone)]
pub struct NamespaceNode {
    pub segment: String,
    pub parent: Option<NamespaceId>,
    /// Children keyed by segment; BTreeMap keeps traversal order stable.
    pub children: BTreeMap<String, NamespaceId>,
    /// Units declared directly in this namespace.
    pub units: Vec<UnitId>,
}

/// Arena of namespace nodes rooted at a synthetic empty-path node.
///
/// Parent/child links are stored as indices so the structure is acyclic by
/// construction and can be shared freely across rayon workers.
#[derive(Debug, Clone)]
pub struct NamespaceTree {
    nodes: Vec<NamespaceNode>,
}

impl NamespaceTree {
    pub const ROOT: NamespaceId = NamespaceId(0);

    pub fn new() -> Self {
        Self {
            nodes: vec![NamespaceNode {
                segment: String::new(),
                parent: None,
                children: BTreeMap::new(),
                units: Vec::new(),
            }],
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    pub fn node(&self, id: NamespaceId) -> &NamespaceNode {
        &self.nodes[id.0]
    }

    /// Intern a dotted path, creating intermediate nodes as needed.
    /// An empty path yields the synthetic root.
    pub fn intern(&mut self, path: &str) -> NamespaceId {
        if path.is_empty() {
            return Self::ROOT;
        }
        let mut current = Self::ROOT;
        for segment in path.split('.') {
            current = self.child_or_insert(current, segment);
        }
        current
    }

    fn child_or_insert(&mut self, parent: NamespaceId, segment: &str) -> NamespaceId {
        if let Some(&existing) = self.nodes[parent.0].children.get(segment) {
            return existing;
        }
        let id = NamespaceId(self.nodes.len());
        self.nodes.push(NamespaceNode {
            segment: segment.to_string(),
            parent: Some(parent),
            children: BTreeMap::new(),
            units: Vec::new(),
        });
        self.nodes[parent.0]
            .children
            .insert(segment.to_string(), id);
        id
    }

    /// Look up an already-interned dotted path.
    pub fn find(&self, path: &str) -> Option<NamespaceId> {
        if path.is_empty() {
            return Some(Self::ROOT);
        }
        let mut current = Self::ROOT;
        for segment in path.split('.') {
            current = *self.nodes[current.0].children.get(segment)?;
        }
        Some(current)
    }

    /// Dotted path of a namespace; the synthetic root renders as "".
    pub fn path(&self, id: NamespaceId) -> String {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(ns) = current {
            let node = &self.nodes[ns.0];
            if !node.segment.is_empty() {
                segments.push(node.segment.as_str());
            }
            current = node.parent;
        }
        segments.reverse();
        segments.join(".")
    }

    pub fn parent(&self, id: NamespaceId) -> Option<NamespaceId> {
        self.nodes[id.0].parent
    }

    /// Number of segments below the synthetic root.
    pub fn depth(&self, id: NamespaceId) -> usize {
        let mut depth = 0;
        let mut current = self.nodes[id.0].parent;
        while let Some(ns) = current {
            depth += 1;
            current = self.nodes[ns.0].parent;
        }
        depth
    }

    /// Direct children in segment order.
    pub fn children(&self, id: NamespaceId) -> impl Iterator<Item = NamespaceId> + '_ {
        self.nodes[id.0].children.values().copied()
    }

    pub fn units(&self, id: NamespaceId) -> &[UnitId] {
        &self.nodes[id.0].units
    }

    pub(crate) fn add_unit(&mut self, ns: NamespaceId, unit: UnitId) {
        self.nodes[ns.0].units.push(unit);
    }

    /// Whether `id` equals `scope` or lies somewhere beneath it.
    pub fn is_within(&self, id: NamespaceId, scope: NamespaceId) -> bool {
        let mut current = Some(id);
        while let Some(ns) = current {
            if ns == scope {
                return true;
            }
            current = self.nodes[ns.0].parent;
        }
        false
    }

    /// Depth-first pre-order walk of `scope` and everything beneath it,
    /// children visited in segment order.
    pub fn descendants(&self, scope: NamespaceId) -> Vec<NamespaceId> {
        let mut out = Vec::new();
        let mut stack = vec![scope];
        while let Some(ns) = stack.pop() {
            out.push(ns);
            // Reverse so the BTreeMap order comes out of the stack first.
            for child in self.nodes[ns.0].children.values().rev() {
                stack.push(*child);
            }
        }
        out
    }

    /// Total number of units declared in `scope` or beneath it.
    pub fn units_within(&self, scope: NamespaceId) -> usize {
        self.descendants(scope)
            .iter()
            .map(|ns| self.nodes[ns.0].units.len())
            .sum()
    }
}

impl Default for NamespaceTree {
    fn default() -> Self {
        Self::new()
    }
}
