use crate::model::{ConfigIssue, Verification, Violation};
use crate::output::OutputFormatter;
use serde::Serialize;
use std::io::Write;

/// Full machine-readable view of a verification, for downstream report
/// renderers and CI tooling.
#[derive(Default)]
pub struct JsonOutput;

impl JsonOutput {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Serialize)]
struct JsonVerification<'a> {
    root: &'a str,
    modules: Vec<JsonModule<'a>>,
    violations: &'a [Violation],
    config_issues: &'a [ConfigIssue],
    cycles: &'a [Vec<String>],
    stats: JsonStats,
}

#[derive(Serialize)]
struct JsonModule<'a> {
    name: &'a str,
    qualified_name: String,
    base: String,
    open: bool,
    parent: Option<String>,
    allowed_dependencies: &'a [String],
    interfaces: Vec<JsonInterface<'a>>,
}

#[derive(Serialize)]
struct JsonInterface<'a> {
    name: Option<&'a str>,
    members: Vec<String>,
}

#[derive(Serialize)]
struct JsonStats {
    modules: usize,
    units: usize,
    references: usize,
    external_references: usize,
    unassigned_units: usize,
}

impl OutputFormatter for JsonOutput {
    fn format<W: Write>(
        &self,
        verification: &Verification,
        writer: &mut W,
    ) -> std::io::Result<()> {
        let tree = &verification.modules;
        let codebase = &verification.codebase;

        // dfs order keeps the module list stable across runs.
        let modules = tree
            .dfs()
            .into_iter()
            .map(|id| {
                let module = tree.module(id);
                JsonModule {
                    name: &module.name,
                    qualified_name: tree.qualified_name(id),
                    base: codebase.namespaces().path(module.base),
                    open: module.is_open(),
                    parent: module.parent.map(|p| tree.qualified_name(p)),
                    allowed_dependencies: &module.allowed_dependencies,
                    interfaces: module
                        .interfaces
                        .iter()
                        .map(|interface| JsonInterface {
                            name: interface.name.as_deref(),
                            members: interface
                                .members
                                .iter()
                                .map(|&unit| codebase.qualified_path(unit))
                                .collect(),
                        })
                        .collect(),
                }
            })
            .collect();

        let view = JsonVerification {
            root: &verification.root,
            modules,
            violations: &verification.violations,
            config_issues: &verification.config_issues,
            cycles: &verification.cycles,
            stats: JsonStats {
                modules: tree.len(),
                units: verification.stats.units,
                references: verification.stats.references,
                external_references: verification.stats.external_references,
                unassigned_units: verification.stats.unassigned_units,
            },
        };

        let json = serde_json::to_string_pretty(&view).map_err(std::io::Error::other)?;
        writeln!(writer, "{}", json)
    }
}
