//! pip package resource

use anyhow::Result;
use declarative::{ApplyContext, ApplyResult, Resource, ResourceState};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use super::dry_run_result;
use crate::backend::EnvironmentBackend;

/// A package installed into a virtualenv
pub struct PipPackage {
    pub name: String,
    pub env: PathBuf,
    backend: Arc<dyn EnvironmentBackend>,
}

impl PipPackage {
    pub fn new(name: &str, env: impl Into<PathBuf>, backend: Arc<dyn EnvironmentBackend>) -> Self {
        Self {
            name: name.to_string(),
            env: env.into(),
            backend,
        }
    }
}

impl fmt::Debug for PipPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipPackage")
            .field("name", &self.name)
            .field("env", &self.env)
            .finish_non_exhaustive()
    }
}

impl Resource for PipPackage {
    fn id(&self) -> String {
        format!("pip:{}", self.name)
    }

    fn description(&self) -> String {
        format!("Install {} into {}", self.name, self.env.display())
    }

    fn resource_type(&self) -> &'static str {
        "pip_package"
    }

    fn current_state(&self) -> Result<ResourceState> {
        if self.backend.package_installed(&self.name, &self.env)? {
            Ok(ResourceState::Present { details: None })
        } else {
            Ok(ResourceState::Absent)
        }
    }

    fn desired_state(&self) -> ResourceState {
        ResourceState::Present { details: None }
    }

    fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult> {
        if ctx.dry_run {
            let installed = self.backend.package_installed(&self.name, &self.env)?;
            return Ok(dry_run_result(!installed));
        }

        if self.backend.ensure_package(&self.name, &self.env)? {
            Ok(ApplyResult::Created)
        } else {
            Ok(ApplyResult::NoChange)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeEnvironment;

    #[test]
    fn test_install_then_no_change() {
        let backend = Arc::new(FakeEnvironment::default());
        let pkg = PipPackage::new("boto3", "/tmp/env", backend.clone());
        let mut ctx = ApplyContext::default();

        assert_eq!(pkg.current_state().unwrap(), ResourceState::Absent);
        assert_eq!(pkg.apply(&mut ctx).unwrap(), ApplyResult::Created);
        assert_eq!(pkg.apply(&mut ctx).unwrap(), ApplyResult::NoChange);
        assert_eq!(backend.installed(), vec!["boto3".to_string()]);
    }

    #[test]
    fn test_dry_run_installs_nothing() {
        let backend = Arc::new(FakeEnvironment::default());
        let pkg = PipPackage::new("docopt", "/tmp/env", backend.clone());
        let mut ctx = ApplyContext::new(true, false);

        assert!(matches!(
            pkg.apply(&mut ctx).unwrap(),
            ApplyResult::Skipped { .. }
        ));
        assert!(backend.installed().is_empty());
    }
}
