//! Library API for modfence.
//!
//! The CLI commands print reports and return exit codes; these functions
//! return proper Result types for embedding the engine in other tools,
//! indexer front-ends included.
//!
//! # Example
//!
//! ```no_run
//! use modfence::{verify_path, VerifyOptions};
//! use std::path::Path;
//!
//! let verification = verify_path(Path::new("."), VerifyOptions::default())?;
//! for violation in &verification.violations {
//!     println!("{}", violation);
//! }
//! # Ok::<(), modfence::ModfenceError>(())
//! ```

use crate::analysis::{self, CandidateSource};
use crate::config::{Config, ConfigError, DEFAULT_SNAPSHOT_FILE, StrategyKind};
use crate::model::Verification;
use crate::snapshot::{
    CodebaseSnapshot, ContractError, SnapshotError, load_snapshot, validate_snapshot,
};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors a verification run can fail with. `Contract` is the only one
/// raised after loading succeeds; everything downstream of validation is
/// reported through the `Verification` itself.
#[derive(Debug, Error)]
pub enum ModfenceError {
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Indexer contract error: {0}")]
    Contract(#[from] ContractError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Options for [`verify_path`].
#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    /// Snapshot file, relative to the project path unless absolute.
    /// Defaults to `modfence.units.json` in the project root.
    pub snapshot: Option<PathBuf>,

    /// Detection strategy override; the config file's choice (or
    /// `direct-children`) applies when unset.
    pub strategy: Option<StrategyKind>,
}

/// Load `.modfence.toml` and the codebase snapshot under `path`, then run
/// the verification pipeline.
///
/// Custom detection strategies need a live [`CandidateSource`]; callers
/// registering one should load their inputs themselves and go through
/// [`verify_snapshot`].
pub fn verify_path(path: &Path, options: VerifyOptions) -> Result<Verification, ModfenceError> {
    let resolved = path
        .canonicalize()
        .map_err(|_| ModfenceError::PathNotFound(path.to_path_buf()))?;

    let mut config = Config::load(&resolved)?;
    if let Some(strategy) = options.strategy {
        config.detection.strategy = strategy;
    }

    let snapshot_path = match options.snapshot {
        Some(file) if file.is_absolute() => file,
        Some(file) => resolved.join(file),
        None => resolved.join(DEFAULT_SNAPSHOT_FILE),
    };
    let snapshot = load_snapshot(&snapshot_path)?;

    Ok(verify_snapshot(&snapshot, &config, None)?)
}

/// Validate a snapshot and run the pipeline over it. Pure apart from
/// rayon: no filesystem access, repeatable given identical input.
pub fn verify_snapshot(
    snapshot: &CodebaseSnapshot,
    config: &Config,
    custom: Option<&dyn CandidateSource>,
) -> Result<Verification, ContractError> {
    let codebase = validate_snapshot(snapshot)?;
    Ok(analysis::verify(codebase, config, custom))
}
