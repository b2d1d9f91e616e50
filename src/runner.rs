use anyhow::{Context, Result};
use declarative::CommandOutput;
use std::ffi::OsStr;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::backend::CommandRunner;

/// Runs commands as child processes, without a shell
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &Path, args: &[String]) -> Result<CommandOutput> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to execute: {}", display(program, args)))?;
        Ok(output.into())
    }
}

/// Run a command and capture output, failing on non-zero exit
pub fn run_capture<I, S>(program: &Path, args: I) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let args: Vec<_> = args.into_iter().collect();
    let output = Command::new(program)
        .args(&args)
        .output()
        .with_context(|| format!("Failed to execute: {}", display(program, &args)))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!(
            "Command failed: {}: {}",
            display(program, &args),
            stderr.trim()
        )
    }
}

/// Run a command silently, returning success/failure
pub fn run_quiet<I, S>(program: &Path, args: I) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    Command::new(program)
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Space-joined command line for messages and the audit log
pub fn display<S: AsRef<OsStr>>(program: &Path, args: &[S]) -> String {
    let mut line = program.display().to_string();
    for arg in args {
        line.push(' ');
        line.push_str(&arg.as_ref().to_string_lossy());
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let line = display(Path::new("/env/bin/python"), &["script.py", "create"]);
        assert_eq!(line, "/env/bin/python script.py create");
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_captures_output() {
        let output = SystemRunner
            .run(
                Path::new("/bin/sh"),
                &["-c".to_string(), "echo out; echo err >&2; exit 3".to_string()],
            )
            .unwrap();
        assert!(!output.success);
        assert_eq!(output.code, Some(3));
        assert_eq!(output.stdout_str(), "out\n");
        assert_eq!(output.stderr_str(), "err\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_run_quiet_and_capture() {
        assert!(run_quiet(Path::new("/bin/sh"), ["-c", "exit 0"]));
        assert!(!run_quiet(Path::new("/bin/sh"), ["-c", "exit 1"]));
        assert_eq!(
            run_capture(Path::new("/bin/sh"), ["-c", "echo hi"]).unwrap(),
            "hi"
        );
        assert!(run_capture(Path::new("/bin/sh"), ["-c", "exit 1"]).is_err());
    }

    #[test]
    fn test_missing_program_is_error() {
        let result = SystemRunner.run(Path::new("/nonexistent/cfnstack-test-binary"), &[]);
        assert!(result.is_err());
    }
}
