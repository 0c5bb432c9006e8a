use crate::fs::{FileSystem, default_fs};
use crate::model::{Tag, Visibility};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Unit inventory handed over by a codebase indexer. This is the wire
/// boundary: modfence never parses source text itself, it consumes one of
/// these per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodebaseSnapshot {
    /// Root namespace the units were collected under, dotted form.
    /// Empty means the whole namespace tree.
    pub root: String,
    pub units: Vec<UnitRecord>,
}

/// One unit as the indexer saw it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitRecord {
    /// Dotted namespace path the unit is declared in.
    pub namespace: String,
    pub name: String,
    pub visibility: Visibility,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub references: Vec<ReferenceRecord>,
}

/// Outgoing reference by target identity. Targets marked `external` sit
/// outside the scanned root and are dropped before analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceRecord {
    /// Qualified path (`namespace.Name`) of the referenced unit.
    pub to: String,
    #[serde(default)]
    pub external: bool,
}

impl UnitRecord {
    pub fn qualified_path(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot '{path}' is not valid JSON: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

pub fn load_snapshot(path: &Path) -> Result<CodebaseSnapshot, SnapshotError> {
    load_snapshot_with_fs(default_fs(), path)
}

pub fn load_snapshot_with_fs(
    fs: &dyn FileSystem,
    path: &Path,
) -> Result<CodebaseSnapshot, SnapshotError> {
    let content = fs.read_to_string(path).map_err(|source| SnapshotError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| SnapshotError::Parse {
        path: path.display().to_string(),
        source,
    })
}

/// Write a snapshot as pretty JSON. Mainly for indexer front-ends and test
/// fixtures; verification itself only reads.
pub fn save_snapshot(snapshot: &CodebaseSnapshot, path: &Path) -> std::io::Result<()> {
    save_snapshot_with_fs(default_fs(), snapshot, path)
}

pub fn save_snapshot_with_fs(
    fs: &dyn FileSystem,
    snapshot: &CodebaseSnapshot,
    path: &Path,
) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(snapshot).map_err(std::io::Error::other)?;
    fs.write(path, &json)
}
