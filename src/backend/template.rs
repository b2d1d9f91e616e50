//! Template rendering with minijinja.
//!
//! Templates owned by the `cloudformation` source are compiled into the
//! binary. Any other source names a directory holding the template file.

use anyhow::{Context, Result, bail};
use minijinja::{Environment, UndefinedBehavior};
use std::fs;
use std::path::Path;

use super::{TemplateRenderer, Variables};
use crate::declaration::TemplateRef;

const CFNTOOLS_TEMPLATE: &str = include_str!("../../templates/cfntools.py.j2");

/// Built-in templates by name
const BUILTIN_TEMPLATES: &[(&str, &str)] = &[("cfntools.py.j2", CFNTOOLS_TEMPLATE)];

/// Renderer backed by minijinja with strict undefined handling.
#[derive(Debug, Clone, Copy, Default)]
pub struct MiniJinjaRenderer;

impl MiniJinjaRenderer {
    /// Fetch the raw template text for `template`
    fn load_source(&self, template: &TemplateRef) -> Result<String> {
        if template.is_builtin() {
            return match BUILTIN_TEMPLATES
                .iter()
                .find(|(name, _)| *name == template.name)
            {
                Some((_, source)) => Ok((*source).to_string()),
                None => bail!("Unknown built-in template: {}", template.name),
            };
        }

        let path = Path::new(&template.source).join(&template.name);
        fs::read_to_string(&path)
            .with_context(|| format!("Could not read template {}", path.display()))
    }
}

impl TemplateRenderer for MiniJinjaRenderer {
    fn render_to_string(&self, template: &TemplateRef, vars: &Variables) -> Result<String> {
        let source = self.load_source(template)?;

        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        env.add_template(&template.name, &source)
            .with_context(|| format!("Invalid template {template}"))?;

        let rendered = env
            .get_template(&template.name)?
            .render(vars)
            .with_context(|| format!("Failed to render {template}"))?;
        Ok(rendered)
    }
}
