//! Capabilities the driver delegates to.
//!
//! Each trait abstracts one external mechanism, allowing for:
//! - Real host implementations (`python3 -m venv`, pip, minijinja, processes)
//! - In-memory fakes for testing
//!
//! Every `ensure_*`/`render` operation is idempotent and reports whether it
//! changed anything.

pub mod template;
pub mod virtualenv;

use anyhow::{Context, Result};
use declarative::CommandOutput;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use crate::declaration::TemplateRef;

pub use template::MiniJinjaRenderer;
pub use virtualenv::VirtualenvBackend;

/// Variables passed to a template
pub type Variables = BTreeMap<String, String>;

/// Creates isolated interpreter environments and installs packages into them.
pub trait EnvironmentBackend: Send + Sync {
    /// Whether a usable environment exists at `path`.
    fn environment_exists(&self, path: &Path) -> Result<bool>;

    /// Create an environment at `path`.
    fn create_environment(&self, path: &Path) -> Result<()>;

    /// Whether package `name` is installed in the environment at `env`.
    fn package_installed(&self, name: &str, env: &Path) -> Result<bool>;

    /// Install package `name` into the environment at `env`.
    fn install_package(&self, name: &str, env: &Path) -> Result<()>;

    /// Create the environment unless it already exists.
    fn ensure_environment(&self, path: &Path) -> Result<bool> {
        if self.environment_exists(path)? {
            return Ok(false);
        }
        self.create_environment(path)?;
        Ok(true)
    }

    /// Install the package unless it is already installed.
    fn ensure_package(&self, name: &str, env: &Path) -> Result<bool> {
        if self.package_installed(name, env)? {
            return Ok(false);
        }
        self.install_package(name, env)?;
        Ok(true)
    }
}

/// Materializes a file from a named template plus variables.
pub trait TemplateRenderer: Send + Sync {
    /// Render `template` to a string.
    fn render_to_string(&self, template: &TemplateRef, vars: &Variables) -> Result<String>;

    /// Whether something is already present at `destination`.
    fn destination_exists(&self, destination: &Path) -> bool {
        destination.exists()
    }

    /// Whether rendering would change the content of `destination`.
    fn would_change(
        &self,
        template: &TemplateRef,
        destination: &Path,
        vars: &Variables,
    ) -> Result<bool> {
        let rendered = self.render_to_string(template, vars)?;
        Ok(read_existing(destination)?.as_deref() != Some(rendered.as_str()))
    }

    /// Render to `destination`, writing only when the content differs.
    fn render(&self, template: &TemplateRef, destination: &Path, vars: &Variables) -> Result<bool> {
        let rendered = self.render_to_string(template, vars)?;
        if read_existing(destination)?.as_deref() == Some(rendered.as_str()) {
            return Ok(false);
        }

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(destination, &rendered)
            .with_context(|| format!("Failed to write {}", destination.display()))?;
        make_executable(destination)?;
        Ok(true)
    }
}

/// Runs a command to completion and captures its output.
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args`. A non-zero exit is not an error here;
    /// only failing to start the process is.
    fn run(&self, program: &Path, args: &[String]) -> Result<CommandOutput>;
}

/// Read a file, returning `None` when it does not exist
fn read_existing(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(path)
        .with_context(|| format!("Failed to stat {}", path.display()))?
        .permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms)
        .with_context(|| format!("Failed to chmod {}", path.display()))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
