mod cli;
mod commands;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::path::PathBuf;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    /// Explicit declaration file, if given
    pub file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        file: cli.file,
    };

    match cli.command {
        Command::Create(args) => commands::stack::create(&ctx, args),
        Command::Destroy(args) => commands::stack::destroy(&ctx, args),
        Command::Prepare(args) => commands::stack::prepare(&ctx, args),
        Command::Diff(args) => commands::stack::diff(&ctx, args),
        Command::Show(args) => commands::stack::show(&ctx, args),
        Command::List => commands::stack::list(&ctx),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "cfnstack", &mut io::stdout());
            Ok(())
        }
    }
}
