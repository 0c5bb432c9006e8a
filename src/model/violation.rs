use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a reference crossing a module boundary is disallowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationReason {
    /// Target unit is internal to its module, or exposed but not part of
    /// any interface of a closed module.
    InternalAccess,
    /// Source module restricts its dependencies and mentions the target
    /// module, but no grant covers the interface the target unit sits in.
    MissingNamedInterfaceGrant,
    /// Source module restricts its dependencies and no grant mentions the
    /// target module at all.
    UnknownModuleTarget,
}

impl fmt::Display for ViolationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InternalAccess => write!(f, "internal access"),
            Self::MissingNamedInterfaceGrant => write!(f, "missing named interface grant"),
            Self::UnknownModuleTarget => write!(f, "unknown module target"),
        }
    }
}

/// One disallowed reference between two units in different modules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Qualified path of the referencing unit.
    pub source: String,
    /// Qualified path of the referenced unit.
    pub target: String,
    pub source_module: String,
    pub target_module: String,
    pub reason: ViolationReason,
}

impl Violation {
    pub fn internal_access(
        source: String,
        target: String,
        source_module: String,
        target_module: String,
    ) -> Self {
        Self {
            source,
            target,
            source_module,
            target_module,
            reason: ViolationReason::InternalAccess,
        }
    }

    pub fn missing_grant(
        source: String,
        target: String,
        source_module: String,
        target_module: String,
    ) -> Self {
        Self {
            source,
            target,
            source_module,
            target_module,
            reason: ViolationReason::MissingNamedInterfaceGrant,
        }
    }

    pub fn unknown_target(
        source: String,
        target: String,
        source_module: String,
        target_module: String,
    ) -> Self {
        Self {
            source,
            target,
            source_module,
            target_module,
            reason: ViolationReason::UnknownModuleTarget,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} ({}): {}",
            self.source, self.target, self.target_module, self.reason
        )
    }
}

/// Category of a recoverable configuration problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfigIssueKind {
    UnknownModule,
    UnknownNamedInterface,
    UnknownStrategy,
    NoCandidates,
    AmbiguousInterfaceClaim,
    InvalidInterface,
    MalformedExpression,
}

/// A configuration problem that degrades a single declaration instead of
/// aborting the run. The offending grant or declaration is ignored; the
/// rest of the verification proceeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigIssue {
    pub kind: ConfigIssueKind,
    /// Logical name of the module the issue belongs to, when there is one.
    pub module: Option<String>,
    pub message: String,
}

impl ConfigIssue {
    pub fn unknown_module(module: &str, expression: &str) -> Self {
        Self {
            kind: ConfigIssueKind::UnknownModule,
            module: Some(module.to_string()),
            message: format!("allowed dependency '{expression}' names no known module"),
        }
    }

    pub fn unmatched_declaration(module: &str) -> Self {
        Self {
            kind: ConfigIssueKind::UnknownModule,
            module: Some(module.to_string()),
            message: format!("configuration declares module '{module}', which was not detected"),
        }
    }

    pub fn unknown_named_interface(module: &str, expression: &str, target: &str) -> Self {
        Self {
            kind: ConfigIssueKind::UnknownNamedInterface,
            module: Some(module.to_string()),
            message: format!(
                "allowed dependency '{expression}' names no interface of module '{target}'"
            ),
        }
    }

    pub fn unknown_strategy(id: &str) -> Self {
        Self {
            kind: ConfigIssueKind::UnknownStrategy,
            module: None,
            message: format!("no candidate source registered under id '{id}'"),
        }
    }

    pub fn no_candidates(root: &str) -> Self {
        Self {
            kind: ConfigIssueKind::NoCandidates,
            module: None,
            message: format!("detection produced no modules under '{root}'"),
        }
    }

    pub fn ambiguous_claim(module: &str, unit: &str, chosen: &str, ignored: &str) -> Self {
        Self {
            kind: ConfigIssueKind::AmbiguousInterfaceClaim,
            module: Some(module.to_string()),
            message: format!(
                "unit '{unit}' is claimed by interfaces '{chosen}' and '{ignored}' at the same depth; keeping '{chosen}'"
            ),
        }
    }

    pub fn invalid_interface(module: &str, detail: &str) -> Self {
        Self {
            kind: ConfigIssueKind::InvalidInterface,
            module: Some(module.to_string()),
            message: format!("interface declaration ignored: {detail}"),
        }
    }

    pub fn malformed_expression(module: &str, expression: &str) -> Self {
        Self {
            kind: ConfigIssueKind::MalformedExpression,
            module: Some(module.to_string()),
            message: format!("allowed dependency '{expression}' is not a valid expression"),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.module {
            Some(module) => write!(f, "[{module}] {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}
