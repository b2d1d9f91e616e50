//! Stack commands: create, destroy, prepare, diff, show, list

use anyhow::Result;
use colored::Colorize;
use declarative::{ApplyOptions, DiffSummary, ExecuteSummary, ResourceDiff, ResourceState};
use std::path::PathBuf;

use cfnstack::config::{Settings, StacksFile};
use cfnstack::declaration::{StackAttributes, StackDeclaration};
use cfnstack::driver::{Action, Driver, Invocation};
use cfnstack::error::Error;
use cfnstack::paths;

use crate::Context;
use crate::cli::{ActionArgs, StackArgs};
use crate::ui;

pub fn create(ctx: &Context, args: ActionArgs) -> Result<()> {
    run_action(ctx, args, Action::Create)
}

pub fn destroy(ctx: &Context, args: ActionArgs) -> Result<()> {
    run_action(ctx, args, Action::Destroy)
}

/// Converge the toolchain without invoking the control script
pub fn prepare(ctx: &Context, args: ActionArgs) -> Result<()> {
    let (settings, decl) = resolve(ctx, &args.stack)?;
    let driver = Driver::system(settings)?;
    let opts = apply_options(ctx, args.dry_run);

    if !ctx.quiet {
        ui::header(&format!("Preparing {}", decl.name()));
    }
    let mut reporter = ui::StageReporter::new(driver.stages(&decl).len(), ctx.quiet);
    let preparation = driver.prepare_with(&decl, opts, &mut reporter)?;

    if !ctx.quiet {
        print_summary(&preparation.summary(), args.dry_run);
    }
    Ok(())
}

fn run_action(ctx: &Context, args: ActionArgs, action: Action) -> Result<()> {
    let (settings, decl) = resolve(ctx, &args.stack)?;
    let driver = Driver::system(settings)?;
    let opts = apply_options(ctx, args.dry_run);

    if !ctx.quiet {
        ui::header(&format!("{} {}", capitalize(action.as_str()), decl.stack_name()));
    }
    let mut reporter = ui::StageReporter::new(driver.stages(&decl).len(), ctx.quiet);

    let outcome = match driver.execute_action_with(&decl, action, opts, &mut reporter) {
        Ok(outcome) => outcome,
        Err(err) => {
            if let Error::Execution { stdout, stderr, .. } = &err {
                print_captured(stdout, stderr);
            }
            return Err(err.into());
        }
    };

    if !outcome.executed {
        ui::info(&format!("Dry run, would run: {}", outcome.invocation));
        return Ok(());
    }

    if !ctx.quiet {
        print_summary(&outcome.preparation.summary(), false);
        println!();
        print_captured(&outcome.stdout, &outcome.stderr);
    }
    ui::success(&format!(
        "{} {} finished ({})",
        outcome.action,
        decl.stack_name(),
        exit_status(outcome.code)
    ));
    Ok(())
}

/// Print which stages would change
pub fn diff(ctx: &Context, args: StackArgs) -> Result<()> {
    let (settings, decl) = resolve(ctx, &args)?;
    let driver = Driver::system(settings)?;
    let diffs = driver.diff(&decl)?;

    display_diff(&diffs);

    let summary = DiffSummary::from_diffs(&diffs);
    if summary.has_changes() && !ctx.quiet {
        println!();
        ui::dim(&format!(
            "{} to add, {} to modify",
            summary.additions, summary.modifications
        ));
    }
    Ok(())
}

/// Print the resolved declaration and its invocation
pub fn show(ctx: &Context, args: StackArgs) -> Result<()> {
    let (settings, decl) = resolve(ctx, &args)?;

    ui::header(&format!("Stack {}", decl.name()));
    ui::kv("stack name", decl.stack_name());
    ui::kv("bucket", decl.bucket());
    ui::kv("key", decl.key());
    ui::kv("region", decl.region());
    ui::kv("virtualenv", &decl.environment_path().display().to_string());
    ui::kv("packages", &decl.dependencies().join(", "));
    ui::kv("template", &decl.template().to_string());
    ui::kv("script", &decl.script_path().display().to_string());

    ui::header("Invocation");
    println!("  {}", Invocation::new(&decl, Action::Create));
    println!("  {}", Invocation::new(&decl, Action::Destroy));

    ui::header("Settings");
    ui::kv("cache root", &settings.cache_root.display().to_string());
    ui::kv("audit log", &settings.audit_log.display().to_string());
    Ok(())
}

/// List the stacks declared in the declaration file
pub fn list(ctx: &Context) -> Result<()> {
    let path = stacks_path(ctx)?;
    let file = load_file(ctx, &path)?;

    let handles: Vec<_> = file.handles().collect();
    if handles.is_empty() {
        ui::dim(&format!("No stacks declared in {}", path.display()));
        return Ok(());
    }

    ui::header(&format!("Stacks ({})", path.display()));
    for handle in handles {
        let bucket = file
            .stack(handle)
            .and_then(|attrs| attrs.bucket.as_deref())
            .unwrap_or("-");
        println!("  {} {}", handle.bold(), bucket.dimmed());
    }
    Ok(())
}

fn stacks_path(ctx: &Context) -> Result<PathBuf> {
    match &ctx.file {
        Some(path) => Ok(path.clone()),
        None => paths::stacks_file(),
    }
}

/// An explicit `--file` must exist; the default location may be absent
fn load_file(ctx: &Context, path: &std::path::Path) -> Result<StacksFile> {
    let file = if ctx.file.is_some() {
        StacksFile::load(path)?
    } else {
        StacksFile::load_or_default(path)?
    };
    Ok(file)
}

fn resolve(ctx: &Context, args: &StackArgs) -> Result<(Settings, StackDeclaration)> {
    let path = stacks_path(ctx)?;
    let file = load_file(ctx, &path)?;
    let settings = file.settings()?;

    let attrs = resolve_attributes(&file, args);
    let decl = StackDeclaration::from_attributes(&args.stack, attrs, &settings)
        .map_err(Error::from)?;
    Ok((settings, decl))
}

/// File attributes for the handle, overlaid with command-line flags
fn resolve_attributes(file: &StacksFile, args: &StackArgs) -> StackAttributes {
    let base = match file.stack(&args.stack) {
        Some(attrs) => attrs.clone(),
        None => {
            log::debug!("Stack '{}' not in declaration file, using flags only", args.stack);
            StackAttributes::default()
        }
    };
    base.merge(args.attributes())
}

fn apply_options(ctx: &Context, dry_run: bool) -> ApplyOptions {
    ApplyOptions {
        dry_run,
        verbose: ctx.verbose > 0,
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn exit_status(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit {code}"),
        None => "no exit code".to_string(),
    }
}

fn print_captured(stdout: &str, stderr: &str) {
    for line in stdout.lines() {
        ui::dim(line);
    }
    for line in stderr.lines() {
        eprintln!("  {}", line.red());
    }
}

fn display_diff(diffs: &[ResourceDiff]) {
    if diffs.is_empty() {
        println!();
        println!("  {} No changes needed", "✓".green());
        return;
    }

    println!();
    for diff in diffs {
        let symbol = match (&diff.current, &diff.desired) {
            (ResourceState::Absent, ResourceState::Present { .. }) => "+".green(),
            (ResourceState::Present { .. }, ResourceState::Absent) => "-".red(),
            (ResourceState::Modified { .. }, _) => "~".yellow(),
            _ => "?".dimmed(),
        };
        let detail = match &diff.current {
            ResourceState::Modified { from, to } => format!(" ({from} → {to})"),
            _ => String::new(),
        };
        println!(
            "  {} {}{}",
            symbol,
            diff.description,
            detail.dimmed()
        );
    }
}

fn print_summary(summary: &ExecuteSummary, dry_run: bool) {
    println!();
    if dry_run {
        println!(
            "  {} {} stages would change",
            "ℹ".blue(),
            summary.skipped
        );
        return;
    }

    if summary.total_changes() == 0 {
        println!("  {} Already up to date", "✓".green().bold());
        return;
    }

    println!("  {} Toolchain prepared", "✓".green().bold());
    if summary.created > 0 {
        println!("    • {} stages created", summary.created);
    }
    if summary.modified > 0 {
        println!("    • {} stages modified", summary.modified);
    }
    if summary.no_change > 0 {
        println!("    • {} stages unchanged", summary.no_change);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn stacks() -> StacksFile {
        StacksFile::parse(
            r#"
[stacks.web]
stack_name = "web-stack"
bucket = "my-bucket"
region = "eu-west-1"
"#,
            Path::new("stacks.toml"),
        )
        .unwrap()
    }

    #[test]
    fn test_flags_override_file() {
        let args = StackArgs {
            stack: "web".to_string(),
            region: Some("us-west-2".to_string()),
            ..StackArgs::default()
        };

        let attrs = resolve_attributes(&stacks(), &args);

        assert_eq!(attrs.stack_name.as_deref(), Some("web-stack"));
        assert_eq!(attrs.bucket.as_deref(), Some("my-bucket"));
        assert_eq!(attrs.region.as_deref(), Some("us-west-2"));
    }

    #[test]
    fn test_undeclared_stack_uses_flags_only() {
        let args = StackArgs {
            stack: "adhoc".to_string(),
            stack_name: Some("adhoc-stack".to_string()),
            bucket: Some("b".to_string()),
            ..StackArgs::default()
        };

        let attrs = resolve_attributes(&stacks(), &args);
        let decl =
            StackDeclaration::from_attributes("adhoc", attrs, &Settings::new("/tmp/cache")).unwrap();

        assert_eq!(decl.name(), "adhoc");
        assert_eq!(decl.stack_name(), "adhoc-stack");
        assert_eq!(decl.bucket(), "b");
    }

    #[test]
    fn test_undeclared_stack_needs_stack_name() {
        let args = StackArgs {
            stack: "typo".to_string(),
            bucket: Some("b".to_string()),
            ..StackArgs::default()
        };

        let attrs = resolve_attributes(&stacks(), &args);
        let err = StackDeclaration::from_attributes("typo", attrs, &Settings::new("/tmp/cache"))
            .unwrap_err();

        assert_eq!(err.field, "stack_name");
    }

    #[test]
    fn test_exit_status() {
        assert_eq!(exit_status(Some(0)), "exit 0");
        assert_eq!(exit_status(None), "no exit code");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("create"), "Create");
        assert_eq!(capitalize(""), "");
    }
}
