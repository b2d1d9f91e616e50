use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use cfnstack::declaration::StackAttributes;
use cfnstack::paths;

#[derive(Parser)]
#[command(name = "cfnstack")]
#[command(version)]
#[command(about = "Converge CloudFormation stacks through a managed python toolchain", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Declaration file (defaults to stacks.toml in the config directory)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Prepare the toolchain and create or update the stack
    Create(ActionArgs),

    /// Prepare the toolchain and destroy the stack
    Destroy(ActionArgs),

    /// Ensure virtualenv, packages and control script without invoking it
    Prepare(ActionArgs),

    /// Show which preparation stages would change
    Diff(StackArgs),

    /// Show the resolved declaration and the command it would run
    Show(StackArgs),

    /// List stacks declared in the declaration file
    List,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// A stack handle plus attribute overrides
#[derive(Args, Debug, Default)]
pub struct StackArgs {
    /// Stack handle (a `[stacks.<handle>]` table, or a new name)
    pub stack: String,

    /// Externally visible stack name (required unless declared in the file)
    #[arg(long)]
    pub stack_name: Option<String>,

    /// S3 bucket holding the stack template
    #[arg(long)]
    pub bucket: Option<String>,

    /// Object key of the stack template within the bucket
    #[arg(long)]
    pub key: Option<String>,

    /// Cloud region
    #[arg(long)]
    pub region: Option<String>,

    /// Virtualenv directory
    #[arg(long, value_name = "PATH")]
    pub venv: Option<PathBuf>,

    /// Python package to install (repeatable, replaces the defaults)
    #[arg(long = "package", value_name = "NAME")]
    pub packages: Vec<String>,

    /// Control script template name
    #[arg(long)]
    pub template: Option<String>,

    /// Template source ("cloudformation" for the built-in, or a directory)
    #[arg(long)]
    pub template_source: Option<String>,
}

impl StackArgs {
    /// Flag values as attributes, to be layered over the declaration file.
    ///
    /// `--venv` is expanded the same way as `environment_path` in `stacks.toml`.
    pub fn attributes(&self) -> StackAttributes {
        StackAttributes {
            name: None,
            stack_name: self.stack_name.clone(),
            dependencies: (!self.packages.is_empty()).then(|| self.packages.clone()),
            environment_path: self
                .venv
                .as_deref()
                .map(|path| paths::expand(&path.to_string_lossy())),
            template: self.template.clone(),
            template_source: self.template_source.clone(),
            region: self.region.clone(),
            bucket: self.bucket.clone(),
            key: self.key.clone(),
        }
    }
}

#[derive(Args, Debug)]
pub struct ActionArgs {
    #[command(flatten)]
    pub stack: StackArgs,

    /// Dry run - show what would be done
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_create_with_overrides() {
        let cli = Cli::try_parse_from([
            "cfnstack",
            "-vv",
            "create",
            "web",
            "--bucket",
            "my-bucket",
            "--package",
            "boto3",
            "--package",
            "pyyaml",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        let Command::Create(args) = cli.command else {
            panic!("expected create");
        };
        assert!(args.dry_run);

        let attrs = args.stack.attributes();
        assert_eq!(attrs.bucket.as_deref(), Some("my-bucket"));
        assert_eq!(
            attrs.dependencies,
            Some(vec!["boto3".to_string(), "pyyaml".to_string()])
        );
        assert_eq!(attrs.region, None);
    }

    #[test]
    fn test_no_packages_keeps_file_dependencies() {
        let args = StackArgs {
            stack: "web".to_string(),
            ..StackArgs::default()
        };
        let attrs = StackAttributes::default()
            .dependencies(["boto3"])
            .merge(args.attributes());

        assert_eq!(attrs.dependencies, Some(vec!["boto3".to_string()]));
    }

    #[test]
    fn test_venv_tilde_expanded() {
        let cli = Cli::try_parse_from(["cfnstack", "prepare", "web", "--venv", "~/envs/cf"]).unwrap();
        let Command::Prepare(args) = cli.command else {
            panic!("expected prepare");
        };

        let venv = args.stack.attributes().environment_path.unwrap();
        if let Some(home) = dirs::home_dir() {
            assert!(!venv.starts_with("~"));
            assert_eq!(venv, home.join("envs").join("cf"));
        }
    }

    #[test]
    fn test_global_file_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["cfnstack", "show", "web", "-f", "/tmp/stacks.toml"]).unwrap();
        assert_eq!(cli.file, Some(PathBuf::from("/tmp/stacks.toml")));
    }
}
