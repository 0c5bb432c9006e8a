use super::CommandContext;
use crate::cli::{OutputFormat, VerifyArgs};
use crate::fs::{FileSystem, default_fs};
use crate::output::{JsonOutput, MarkdownOutput, OutputFormatter};
use crate::style;
use std::io::{self, Write};

pub fn cmd_verify(args: VerifyArgs) -> i32 {
    cmd_verify_with_fs(args, default_fs())
}

fn cmd_verify_with_fs(args: VerifyArgs, fs: &dyn FileSystem) -> i32 {
    let ctx = match CommandContext::new(&args.path, args.strategy.as_deref()) {
        Ok(ctx) => ctx,
        Err(code) => return code,
    };

    let verification = match ctx.run_verification(args.snapshot.as_deref()) {
        Ok(verification) => verification,
        Err(code) => return code,
    };

    if !args.quiet {
        // Format to a buffer first so a formatting failure never leaves
        // a half-written report behind.
        let mut buffer = Vec::new();
        let format_result = match args.format {
            OutputFormat::Markdown => MarkdownOutput::new().format(&verification, &mut buffer),
            OutputFormat::Json => JsonOutput::new().format(&verification, &mut buffer),
        };
        if let Err(e) = format_result {
            style::error(&format!("Failed to format report: {}", e));
            return 1;
        }
        let report = String::from_utf8_lossy(&buffer);

        let write_result = match &args.output {
            Some(output_path) => fs.write(output_path, &report),
            None if args.format == OutputFormat::Markdown => {
                style::render_markdown(&report, &mut io::stdout())
            }
            None => write!(io::stdout(), "{}", report),
        };
        if let Err(e) = write_result {
            style::error(&format!("Failed to write report: {}", e));
            return 1;
        }
    }

    if verification.is_clean() {
        if args.quiet {
            style::success(&format!(
                "{} modules, {} references, no violations",
                verification.modules.len(),
                verification.stats.references
            ));
        }
        // Config issues do not fail the run; violations do (CI contract).
        0
    } else {
        if args.quiet {
            style::error(&format!(
                "{} boundary violation(s) across {} modules",
                verification.violations.len(),
                verification.modules.len()
            ));
        }
        1
    }
}
