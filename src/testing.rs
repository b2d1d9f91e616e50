//! In-memory capabilities for driver and resource tests

use anyhow::{Result, bail};
use declarative::CommandOutput;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::audit;
use crate::backend::{CommandRunner, EnvironmentBackend, TemplateRenderer, Variables};
use crate::declaration::TemplateRef;
use crate::runner;

/// Environment backend that tracks environments and packages in memory
#[derive(Default)]
pub struct FakeEnvironment {
    environments: Mutex<BTreeSet<PathBuf>>,
    packages: Mutex<BTreeSet<(PathBuf, String)>>,
    calls: Mutex<Vec<String>>,
    fail_environment: bool,
    fail_package: Option<String>,
}

impl FakeEnvironment {
    pub fn failing_environment() -> Self {
        Self {
            fail_environment: true,
            ..Self::default()
        }
    }

    pub fn failing_package(name: &str) -> Self {
        Self {
            fail_package: Some(name.to_string()),
            ..Self::default()
        }
    }

    /// Every query and change, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Installed package names
    pub fn installed(&self) -> Vec<String> {
        self.packages
            .lock()
            .unwrap()
            .iter()
            .map(|(_, name)| name.clone())
            .collect()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl EnvironmentBackend for FakeEnvironment {
    fn environment_exists(&self, path: &Path) -> Result<bool> {
        self.record(format!("exists {}", path.display()));
        Ok(self.environments.lock().unwrap().contains(path))
    }

    fn create_environment(&self, path: &Path) -> Result<()> {
        self.record(format!("create {}", path.display()));
        if self.fail_environment {
            bail!("python3 -m venv failed");
        }
        self.environments.lock().unwrap().insert(path.to_path_buf());
        Ok(())
    }

    fn package_installed(&self, name: &str, env: &Path) -> Result<bool> {
        self.record(format!("installed? {name}"));
        Ok(self
            .packages
            .lock()
            .unwrap()
            .contains(&(env.to_path_buf(), name.to_string())))
    }

    fn install_package(&self, name: &str, env: &Path) -> Result<()> {
        self.record(format!("install {name}"));
        if self.fail_package.as_deref() == Some(name) {
            bail!("pip install {name} failed");
        }
        self.packages
            .lock()
            .unwrap()
            .insert((env.to_path_buf(), name.to_string()));
        Ok(())
    }
}

/// Renderer that keeps rendered files in memory
#[derive(Default)]
pub struct FakeRenderer {
    files: Mutex<BTreeMap<PathBuf, String>>,
    renders: Mutex<Vec<PathBuf>>,
    fail: Mutex<bool>,
}

impl FakeRenderer {
    /// Make every subsequent render fail
    pub fn fail_renders(&self) {
        *self.fail.lock().unwrap() = true;
    }

    /// Destinations written so far
    pub fn renders(&self) -> Vec<PathBuf> {
        self.renders.lock().unwrap().clone()
    }

    pub fn file(&self, path: &Path) -> Option<String> {
        self.files.lock().unwrap().get(path).cloned()
    }
}

impl TemplateRenderer for FakeRenderer {
    fn render_to_string(&self, template: &TemplateRef, vars: &Variables) -> Result<String> {
        if *self.fail.lock().unwrap() {
            bail!("template {template} not found");
        }
        let mut content = format!("# {template}\n");
        for (key, value) in vars {
            content.push_str(&format!("{key}={value}\n"));
        }
        Ok(content)
    }

    fn destination_exists(&self, destination: &Path) -> bool {
        self.files.lock().unwrap().contains_key(destination)
    }

    fn would_change(
        &self,
        template: &TemplateRef,
        destination: &Path,
        vars: &Variables,
    ) -> Result<bool> {
        let rendered = self.render_to_string(template, vars)?;
        Ok(self.file(destination).as_deref() != Some(rendered.as_str()))
    }

    fn render(&self, template: &TemplateRef, destination: &Path, vars: &Variables) -> Result<bool> {
        if !self.would_change(template, destination, vars)? {
            return Ok(false);
        }
        let rendered = self.render_to_string(template, vars)?;
        self.files
            .lock()
            .unwrap()
            .insert(destination.to_path_buf(), rendered);
        self.renders.lock().unwrap().push(destination.to_path_buf());
        Ok(true)
    }
}

/// Runner that records command lines and returns a canned exit
pub struct FakeRunner {
    code: i32,
    stdout: String,
    stderr: String,
    calls: Mutex<Vec<String>>,
    audit_log: Option<PathBuf>,
    audit_lines_seen: Mutex<Vec<usize>>,
    spawn_fails: bool,
}

impl FakeRunner {
    pub fn succeeding() -> Self {
        Self::exiting(0, "", "")
    }

    pub fn exiting(code: i32, stdout: &str, stderr: &str) -> Self {
        Self {
            code,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            calls: Mutex::new(Vec::new()),
            audit_log: None,
            audit_lines_seen: Mutex::new(Vec::new()),
            spawn_fails: false,
        }
    }

    /// Runner whose program can never be started
    pub fn unspawnable() -> Self {
        Self {
            spawn_fails: true,
            ..Self::succeeding()
        }
    }

    /// Record the audit log's line count at the moment each command runs
    pub fn watching(mut self, audit_log: &Path) -> Self {
        self.audit_log = Some(audit_log.to_path_buf());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn audit_lines_seen(&self) -> Vec<usize> {
        self.audit_lines_seen.lock().unwrap().clone()
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, program: &Path, args: &[String]) -> Result<CommandOutput> {
        if let Some(log) = &self.audit_log {
            let lines = audit::line_count(log)?;
            self.audit_lines_seen.lock().unwrap().push(lines);
        }
        self.calls
            .lock()
            .unwrap()
            .push(runner::display(program, args));
        if self.spawn_fails {
            bail!("Failed to execute {}: No such file or directory", program.display());
        }

        Ok(CommandOutput {
            stdout: self.stdout.as_bytes().to_vec(),
            stderr: self.stderr.as_bytes().to_vec(),
            success: self.code == 0,
            code: Some(self.code),
        })
    }
}
