//! Python virtualenv backend using `python3 -m venv` and pip.

use anyhow::{Context, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use super::EnvironmentBackend;
use crate::runner;

/// Environment backend that executes the host's python and the env's pip.
#[derive(Debug, Clone)]
pub struct VirtualenvBackend {
    /// Interpreter used to create new environments
    python: PathBuf,
}

impl VirtualenvBackend {
    /// Create a backend using `python3` (or `python`) from `PATH`.
    pub fn new() -> Result<Self> {
        let python = which::which("python3")
            .or_else(|_| which::which("python"))
            .context("No python3 interpreter found on PATH")?;
        log::debug!("Using host interpreter {}", python.display());
        Ok(Self { python })
    }

    /// Create a backend using a specific host interpreter.
    pub fn with_interpreter(python: impl Into<PathBuf>) -> Self {
        Self {
            python: python.into(),
        }
    }

    /// Interpreter inside the environment at `env`
    pub fn env_python(env: &Path) -> PathBuf {
        env.join("bin").join("python")
    }
}

impl EnvironmentBackend for VirtualenvBackend {
    fn environment_exists(&self, path: &Path) -> Result<bool> {
        Ok(Self::env_python(path).is_file())
    }

    fn create_environment(&self, path: &Path) -> Result<()> {
        log::info!("Creating virtualenv at {}", path.display());
        runner::run_capture(
            &self.python,
            [OsStr::new("-m"), OsStr::new("venv"), path.as_os_str()],
        )
        .with_context(|| format!("Failed to create virtualenv at {}", path.display()))?;
        Ok(())
    }

    fn package_installed(&self, name: &str, env: &Path) -> Result<bool> {
        let python = Self::env_python(env);
        if !python.is_file() {
            return Ok(false);
        }
        Ok(runner::run_quiet(
            &python,
            ["-m", "pip", "show", "--quiet", name],
        ))
    }

    fn install_package(&self, name: &str, env: &Path) -> Result<()> {
        log::info!("Installing {} into {}", name, env.display());
        let python = Self::env_python(env);
        runner::run_capture(
            &python,
            ["-m", "pip", "install", "--quiet", "--disable-pip-version-check", name],
        )
        .with_context(|| format!("Failed to install {name}"))?;
        Ok(())
    }
}
