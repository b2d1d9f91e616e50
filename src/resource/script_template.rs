//! Rendered control script resource

use anyhow::Result;
use declarative::{ApplyContext, ApplyResult, Resource, ResourceState};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use super::dry_run_result;
use crate::backend::{TemplateRenderer, Variables};
use crate::declaration::TemplateRef;

/// A script rendered from a template into the environment's `bin/`
pub struct ScriptTemplate {
    pub template: TemplateRef,
    pub destination: PathBuf,
    pub variables: Variables,
    renderer: Arc<dyn TemplateRenderer>,
}

impl ScriptTemplate {
    pub fn new(
        template: TemplateRef,
        destination: impl Into<PathBuf>,
        variables: Variables,
        renderer: Arc<dyn TemplateRenderer>,
    ) -> Self {
        Self {
            template,
            destination: destination.into(),
            variables,
            renderer,
        }
    }

    fn would_change(&self) -> Result<bool> {
        self.renderer
            .would_change(&self.template, &self.destination, &self.variables)
    }
}

impl fmt::Debug for ScriptTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptTemplate")
            .field("template", &self.template)
            .field("destination", &self.destination)
            .field("variables", &self.variables)
            .finish_non_exhaustive()
    }
}

impl Resource for ScriptTemplate {
    fn id(&self) -> String {
        format!("template:{}", self.destination.display())
    }

    fn description(&self) -> String {
        format!(
            "Render {} to {}",
            self.template,
            self.destination.display()
        )
    }

    fn resource_type(&self) -> &'static str {
        "script_template"
    }

    fn current_state(&self) -> Result<ResourceState> {
        if !self.renderer.destination_exists(&self.destination) {
            return Ok(ResourceState::Absent);
        }
        if self.would_change()? {
            Ok(ResourceState::Modified {
                from: "content on disk".to_string(),
                to: format!("rendered {}", self.template),
            })
        } else {
            Ok(ResourceState::Present { details: None })
        }
    }

    fn desired_state(&self) -> ResourceState {
        ResourceState::Present { details: None }
    }

    fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult> {
        if ctx.dry_run {
            return Ok(dry_run_result(self.would_change()?));
        }

        let existed = self.renderer.destination_exists(&self.destination);
        let changed = self
            .renderer
            .render(&self.template, &self.destination, &self.variables)?;

        Ok(match (changed, existed) {
            (false, _) => ApplyResult::NoChange,
            (true, true) => ApplyResult::Modified,
            (true, false) => ApplyResult::Created,
        })
    }
}
