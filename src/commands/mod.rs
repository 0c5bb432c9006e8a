mod init;
mod tree;
mod verify;

pub use init::cmd_init;
pub use tree::cmd_tree;
pub use verify::cmd_verify;

use crate::config::{Config, DEFAULT_SNAPSHOT_FILE, StrategyKind};
use crate::model::Verification;
use crate::snapshot::load_snapshot;
use crate::style;
use crate::verify_snapshot;
use std::path::{Path, PathBuf};

/// Shared setup for command execution: resolved project path plus loaded
/// configuration with any CLI strategy override applied.
pub struct CommandContext {
    pub path: PathBuf,
    pub config: Config,
}

impl CommandContext {
    /// Resolve the path and load the config. Returns Err(exit_code) when
    /// setup fails.
    pub fn new(path: &Path, strategy: Option<&str>) -> Result<Self, i32> {
        let resolved_path = match path.canonicalize() {
            Ok(p) => p,
            Err(_) => {
                style::error(&format!("Could not resolve path: {}", style::path(path)));
                return Err(1);
            }
        };

        let config = Config::load(&resolved_path).unwrap_or_else(|e| {
            style::warning(&format!("Failed to load config: {}. Using defaults.", e));
            Config::default()
        });

        let mut ctx = Self {
            path: resolved_path,
            config,
        };
        if let Some(value) = strategy {
            ctx.config.detection.strategy = StrategyKind::parse(value);
        }
        Ok(ctx)
    }

    /// Load the snapshot and run the pipeline. Contract breaches and
    /// unreadable snapshots are fatal to the command.
    pub fn run_verification(&self, snapshot: Option<&Path>) -> Result<Verification, i32> {
        let snapshot_path = match snapshot {
            Some(file) if file.is_absolute() => file.to_path_buf(),
            Some(file) => self.path.join(file),
            None => self.path.join(DEFAULT_SNAPSHOT_FILE),
        };

        let snapshot = match load_snapshot(&snapshot_path) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                style::error(&e.to_string());
                style::hint("generate a snapshot with your codebase indexer first");
                return Err(1);
            }
        };

        match verify_snapshot(&snapshot, &self.config, None) {
            Ok(verification) => Ok(verification),
            Err(e) => {
                style::error(&format!("indexer contract breach: {}", e));
                Err(1)
            }
        }
    }
}
