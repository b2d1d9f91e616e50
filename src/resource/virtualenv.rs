//! Virtualenv resource

use anyhow::Result;
use declarative::{ApplyContext, ApplyResult, Resource, ResourceState};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use super::dry_run_result;
use crate::backend::EnvironmentBackend;

/// An isolated interpreter environment
pub struct Virtualenv {
    pub path: PathBuf,
    backend: Arc<dyn EnvironmentBackend>,
}

impl Virtualenv {
    pub fn new(path: impl Into<PathBuf>, backend: Arc<dyn EnvironmentBackend>) -> Self {
        Self {
            path: path.into(),
            backend,
        }
    }
}

impl fmt::Debug for Virtualenv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Virtualenv")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl Resource for Virtualenv {
    fn id(&self) -> String {
        format!("venv:{}", self.path.display())
    }

    fn description(&self) -> String {
        format!("Create virtualenv at {}", self.path.display())
    }

    fn resource_type(&self) -> &'static str {
        "virtualenv"
    }

    fn current_state(&self) -> Result<ResourceState> {
        if self.backend.environment_exists(&self.path)? {
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
            return Ok(dry_run_result(!self.backend.environment_exists(&self.path)?));
        }

        if self.backend.ensure_environment(&self.path)? {
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
    fn test_created_once() {
        let backend = Arc::new(FakeEnvironment::default());
        let venv = Virtualenv::new("/tmp/envs/cf/", backend.clone());
        let mut ctx = ApplyContext::default();

        assert_eq!(venv.id(), "venv:/tmp/envs/cf/");
        assert_eq!(venv.apply(&mut ctx).unwrap(), ApplyResult::Created);
        assert_eq!(venv.apply(&mut ctx).unwrap(), ApplyResult::NoChange);
        assert_eq!(
            backend
                .calls()
                .iter()
                .filter(|c| c.starts_with("create"))
                .count(),
            1
        );
    }
}
