//! Convergence driver: stage prerequisites, then run the requested action.
//!
//! Every call walks the full chain
//! `environment -> dependencies -> script -> invocation`. Each stage is
//! idempotent on its own, so a repeated walk with nothing to do only
//! re-issues the action command.

use declarative::{
    ApplyOptions, BoxedResource, ExecuteSummary, NoProgress, ProgressCallback, ResourceDiff,
    StageFailure, StageResult, compute_diffs, converge,
};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use crate::audit;
use crate::backend::{
    CommandRunner, EnvironmentBackend, MiniJinjaRenderer, TemplateRenderer, Variables,
    VirtualenvBackend,
};
use crate::config::Settings;
use crate::declaration::{StackAttributes, StackDeclaration};
use crate::error::{Error, Result};
use crate::resource::{PipPackage, ScriptTemplate, Virtualenv};
use crate::runner::{self, SystemRunner};

/// Requested stack action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Destroy,
}

impl Action {
    /// Token passed to the control script
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Destroy => "destroy",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "create" => Ok(Self::Create),
            "destroy" => Ok(Self::Destroy),
            other => Err(format!("unknown action '{other}' (expected create or destroy)")),
        }
    }
}

/// The constructed control-script command
///
/// `<interpreter> <script> <action> <stack_name> <bucket> <key> <region>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(decl: &StackDeclaration, action: Action) -> Self {
        Self {
            program: decl.interpreter(),
            args: vec![
                decl.script_path().display().to_string(),
                action.as_str().to_string(),
                decl.stack_name().to_string(),
                decl.bucket().to_string(),
                decl.key().to_string(),
                decl.region().to_string(),
            ],
        }
    }

    /// Full command line, as written to the audit log
    pub fn command_line(&self) -> String {
        runner::display(&self.program, &self.args)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// Ordered results of the staging chain
#[derive(Debug, Clone, Default)]
pub struct Preparation {
    pub stages: Vec<StageResult>,
}

impl Preparation {
    /// Whether any stage changed something
    pub fn changed(&self) -> bool {
        self.stages.iter().any(StageResult::is_change)
    }

    pub fn summary(&self) -> ExecuteSummary {
        ExecuteSummary::from_stages(&self.stages)
    }
}

/// Result of a successful (or dry-run) action
#[derive(Debug, Clone)]
pub struct Outcome {
    pub action: Action,
    pub preparation: Preparation,
    pub invocation: Invocation,
    /// False for dry runs: the command was neither logged nor run
    pub executed: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Stages prerequisites and runs stack actions through injected capabilities.
pub struct Driver {
    settings: Settings,
    environment: Arc<dyn EnvironmentBackend>,
    renderer: Arc<dyn TemplateRenderer>,
    runner: Arc<dyn CommandRunner>,
}

impl Driver {
    pub fn new(
        settings: Settings,
        environment: Arc<dyn EnvironmentBackend>,
        renderer: Arc<dyn TemplateRenderer>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            settings,
            environment,
            renderer,
            runner,
        }
    }

    /// Driver backed by the host's python, minijinja and child processes
    pub fn system(settings: Settings) -> anyhow::Result<Self> {
        Ok(Self::new(
            settings,
            Arc::new(VirtualenvBackend::new()?),
            Arc::new(MiniJinjaRenderer),
            Arc::new(SystemRunner),
        ))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Validate attributes into a declaration using this driver's settings
    pub fn declare(&self, handle: &str, attrs: StackAttributes) -> Result<StackDeclaration> {
        Ok(StackDeclaration::from_attributes(
            handle,
            attrs,
            &self.settings,
        )?)
    }

    /// The staging chain for `decl`, in order
    pub fn stages(&self, decl: &StackDeclaration) -> Vec<BoxedResource> {
        let env = decl.environment_path();
        let mut stages: Vec<BoxedResource> = Vec::with_capacity(decl.dependencies().len() + 2);

        stages.push(Box::new(Virtualenv::new(env, Arc::clone(&self.environment))));
        for name in decl.dependencies() {
            stages.push(Box::new(PipPackage::new(
                name,
                env,
                Arc::clone(&self.environment),
            )));
        }
        stages.push(Box::new(ScriptTemplate::new(
            decl.template().clone(),
            decl.script_path(),
            template_variables(decl),
            Arc::clone(&self.renderer),
        )));

        stages
    }

    /// Ensure environment, dependencies and script are in place
    pub fn prepare(&self, decl: &StackDeclaration, opts: ApplyOptions) -> Result<Preparation> {
        self.prepare_with(decl, opts, &mut NoProgress)
    }

    pub fn prepare_with<P: ProgressCallback>(
        &self,
        decl: &StackDeclaration,
        opts: ApplyOptions,
        progress: &mut P,
    ) -> Result<Preparation> {
        log::debug!(
            "Preparing {} in {}",
            decl.name(),
            decl.environment_path().display()
        );
        let stages = converge(&self.stages(decl), opts, progress).map_err(preparation_error)?;
        let preparation = Preparation { stages };
        log::info!(
            "Prepared {} ({})",
            decl.name(),
            if preparation.changed() {
                "changed"
            } else {
                "unchanged"
            }
        );
        Ok(preparation)
    }

    /// Prepare, then run the control script with `action`
    pub fn execute_action(
        &self,
        decl: &StackDeclaration,
        action: Action,
        opts: ApplyOptions,
    ) -> Result<Outcome> {
        self.execute_action_with(decl, action, opts, &mut NoProgress)
    }

    pub fn execute_action_with<P: ProgressCallback>(
        &self,
        decl: &StackDeclaration,
        action: Action,
        opts: ApplyOptions,
        progress: &mut P,
    ) -> Result<Outcome> {
        let preparation = self.prepare_with(decl, opts, progress)?;
        let invocation = Invocation::new(decl, action);
        let command_line = invocation.command_line();

        if opts.dry_run {
            log::info!("Dry run, not invoking: {}", command_line);
            return Ok(Outcome {
                action,
                preparation,
                invocation,
                executed: false,
                code: None,
                stdout: String::new(),
                stderr: String::new(),
            });
        }

        audit::append(&self.settings.audit_log, &command_line).map_err(|source| {
            Error::AuditLog {
                path: self.settings.audit_log.clone(),
                source,
            }
        })?;

        log::info!("Running {}", command_line);
        let output = self
            .runner
            .run(&invocation.program, &invocation.args)
            .map_err(|e| Error::Spawn {
                invocation: command_line.clone(),
                source: e.into(),
            })?;

        if !output.success {
            log::warn!("{} {} failed with {:?}", action, decl.stack_name(), output.code);
            return Err(Error::Execution {
                invocation: command_line,
                code: output.code,
                stdout: output.stdout_str(),
                stderr: output.stderr_str(),
            });
        }

        Ok(Outcome {
            action,
            preparation,
            invocation,
            executed: true,
            code: output.code,
            stdout: output.stdout_str(),
            stderr: output.stderr_str(),
        })
    }

    /// Stages whose current state differs from the declaration
    pub fn diff(&self, decl: &StackDeclaration) -> anyhow::Result<Vec<ResourceDiff>> {
        compute_diffs(&self.stages(decl))
    }
}

/// Variables exposed to the control-script template
pub fn template_variables(decl: &StackDeclaration) -> Variables {
    let mut vars = Variables::new();
    vars.insert(
        "interpreter".to_string(),
        decl.interpreter().display().to_string(),
    );
    vars.insert("stack_name".to_string(), decl.stack_name().to_string());
    vars.insert("bucket".to_string(), decl.bucket().to_string());
    vars.insert("key".to_string(), decl.key().to_string());
    vars.insert("region".to_string(), decl.region().to_string());
    vars
}

fn preparation_error(failure: StageFailure) -> Error {
    Error::Preparation {
        stage: failure.id,
        resource_type: failure.resource_type,
        source: failure.error.into(),
    }
}
