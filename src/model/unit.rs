use super::namespace::NamespaceId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Index of a unit in the [`Codebase`](super::Codebase) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnitId(pub(crate) usize);

/// Declared visibility of a unit, as reported by the indexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Exposed,
    Internal,
}

/// Kind of a declaration tag. The two structural kinds drive module and
/// named-interface detection; anything else is carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TagKind {
    Module,
    NamedInterface,
    Other(String),
}

impl From<String> for TagKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "module" => TagKind::Module,
            "named-interface" => TagKind::NamedInterface,
            _ => TagKind::Other(s),
        }
    }
}

impl From<TagKind> for String {
    fn from(kind: TagKind) -> Self {
        match kind {
            TagKind::Module => "module".to_string(),
            TagKind::NamedInterface => "named-interface".to_string(),
            TagKind::Other(s) => s,
        }
    }
}

/// A declaration-level tag: a kind plus string key-value attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub kind: TagKind,
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
}

impl Tag {
    pub fn new(kind: TagKind) -> Self {
        Self {
            kind,
            attrs: BTreeMap::new(),
        }
    }

    pub fn with_attr(mut self, key: &str, value: &str) -> Self {
        self.attrs.insert(key.to_string(), value.to_string());
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(|v| v.as_str())
    }

    /// True when the attribute is present and equals "true".
    pub fn flag(&self, key: &str) -> bool {
        self.attr(key) == Some("true")
    }
}

/// A declared code element. Immutable once built from the snapshot.
#[derive(Debug, Clone)]
pub struct Unit {
    pub namespace: NamespaceId,
    pub name: String,
    pub visibility: Visibility,
    pub tags: Vec<Tag>,
}

impl Unit {
    pub fn is_exposed(&self) -> bool {
        self.visibility == Visibility::Exposed
    }

    pub fn tags_of(&self, kind: &TagKind) -> impl Iterator<Item = &Tag> {
        self.tags.iter().filter(move |t| &t.kind == kind)
    }
}
