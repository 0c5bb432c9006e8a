pub mod analysis;
mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod fs;
pub mod model;
pub mod output;
pub mod snapshot;
pub mod style;

pub use analysis::CandidateSource;
pub use api::{ModfenceError, VerifyOptions, verify_path, verify_snapshot};
pub use commands::{cmd_init, cmd_tree, cmd_verify};
pub use config::Config;
pub use model::{Verification, Violation, ViolationReason};
