use crate::model::{ModuleId, Verification, ViolationReason};
use crate::output::OutputFormatter;
use std::io::Write;

/// Markdown structural report: module tree, violations grouped by
/// reason, configuration issues, module cycles, run stats. Every section
/// renders in a deterministic order.
#[derive(Default)]
pub struct MarkdownOutput;

impl MarkdownOutput {
    pub fn new() -> Self {
        Self
    }
}

impl OutputFormatter for MarkdownOutput {
    fn format<W: Write>(
        &self,
        verification: &Verification,
        writer: &mut W,
    ) -> std::io::Result<()> {
        let root = if verification.root.is_empty() {
            "<root>"
        } else {
            verification.root.as_str()
        };
        writeln!(writer, "# Module Boundary Report: {}\n", root)?;

        write_modules(verification, writer)?;
        write_violations(verification, writer)?;
        write_config_issues(verification, writer)?;
        write_cycles(verification, writer)?;
        write_stats(verification, writer)?;

        Ok(())
    }
}

fn write_modules<W: Write>(verification: &Verification, writer: &mut W) -> std::io::Result<()> {
    writeln!(writer, "## Module Tree\n")?;

    let tree = &verification.modules;
    if tree.is_empty() {
        writeln!(writer, "No modules detected.")?;
        return Ok(());
    }

    fn write_module<W: Write>(
        verification: &Verification,
        id: ModuleId,
        depth: usize,
        writer: &mut W,
    ) -> std::io::Result<()> {
        let tree = &verification.modules;
        let module = tree.module(id);
        let indent = "  ".repeat(depth);
        let openness = if module.is_open() { "open" } else { "closed" };

        let interfaces: Vec<String> = module
            .interfaces
            .iter()
            .map(|i| {
                format!(
                    "`{}` ({})",
                    i.name.as_deref().unwrap_or("unnamed"),
                    i.members.len()
                )
            })
            .collect();
        writeln!(
            writer,
            "{}- **{}** [{}] ({}) - interfaces: {}",
            indent,
            module.name,
            openness,
            verification.codebase.namespaces().path(module.base),
            interfaces.join(", ")
        )?;
        if !module.allowed_dependencies.is_empty() {
            writeln!(
                writer,
                "{}  allowed: {}",
                indent,
                module
                    .allowed_dependencies
                    .iter()
                    .map(|e| format!("`{}`", e))
                    .collect::<Vec<_>>()
                    .join(", ")
            )?;
        }
        for &child in &module.children {
            write_module(verification, child, depth + 1, writer)?;
        }
        Ok(())
    }

    for &module in tree.roots() {
        write_module(verification, module, 0, writer)?;
    }
    Ok(())
}

fn write_violations<W: Write>(verification: &Verification, writer: &mut W) -> std::io::Result<()> {
    if verification.violations.is_empty() {
        writeln!(writer, "\n## No Violations\n")?;
        writeln!(writer, "Every cross-module reference respects its grants.")?;
        return Ok(());
    }

    writeln!(writer, "\n## Violations\n")?;

    let sections = [
        (ViolationReason::InternalAccess, "🔴 Internal Access"),
        (
            ViolationReason::MissingNamedInterfaceGrant,
            "🟡 Missing Named Interface Grant",
        ),
        (ViolationReason::UnknownModuleTarget, "🟡 Unknown Module Target"),
    ];

    for (reason, title) in sections {
        let matching: Vec<_> = verification
            .violations
            .iter()
            .filter(|v| v.reason == reason)
            .collect();
        if matching.is_empty() {
            continue;
        }
        writeln!(writer, "### {}\n", title)?;
        for violation in matching {
            writeln!(
                writer,
                "- `{}` → `{}` ({} → {})",
                violation.source, violation.target, violation.source_module, violation.target_module
            )?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

fn write_config_issues<W: Write>(
    verification: &Verification,
    writer: &mut W,
) -> std::io::Result<()> {
    if verification.config_issues.is_empty() {
        return Ok(());
    }
    writeln!(writer, "## Configuration Issues\n")?;
    for issue in &verification.config_issues {
        writeln!(writer, "- {}", issue)?;
    }
    writeln!(writer)?;
    Ok(())
}

fn write_cycles<W: Write>(verification: &Verification, writer: &mut W) -> std::io::Result<()> {
    if verification.cycles.is_empty() {
        return Ok(());
    }
    writeln!(writer, "## Module Cycles\n")?;
    for cycle in &verification.cycles {
        let mut chain = cycle.join("` → `");
        chain.push_str("` → `");
        chain.push_str(&cycle[0]);
        writeln!(writer, "- `{}`", chain)?;
    }
    writeln!(writer)?;
    Ok(())
}

fn write_stats<W: Write>(verification: &Verification, writer: &mut W) -> std::io::Result<()> {
    let stats = &verification.stats;
    writeln!(writer, "## Stats\n")?;
    writeln!(writer, "- modules: {}", verification.modules.len())?;
    writeln!(writer, "- units: {}", stats.units)?;
    writeln!(writer, "- references: {}", stats.references)?;
    writeln!(writer, "- external references: {}", stats.external_references)?;
    writeln!(writer, "- unassigned units: {}", stats.unassigned_units)?;
    writeln!(writer, "- violations: {}", verification.violations.len())?;
    Ok(())
}
