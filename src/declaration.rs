//! Stack declaration: the immutable desired state for one action.
//!
//! Attributes arrive as [`StackAttributes`] (from the declaration file, CLI
//! flags, or code) and are validated into a [`StackDeclaration`]. Building a
//! declaration has no side effects.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::error::ValidationError;

/// Namespace for environments and the built-in template source
pub const SYSTEM_NAME: &str = "cloudformation";

/// Region used when none is declared
pub const DEFAULT_REGION: &str = "us-east-1";

/// Packages installed when none are declared
pub const DEFAULT_DEPENDENCIES: [&str; 2] = ["boto3", "docopt"];

/// Template rendered when none is declared
pub const DEFAULT_TEMPLATE: &str = "cfntools.py.j2";

/// File name of the rendered control script inside `bin/`
pub const SCRIPT_NAME: &str = "cfntools.py";

/// Reference to a control-script template and the source that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRef {
    /// Template name within its source
    pub name: String,
    /// Owning source: [`SYSTEM_NAME`] for the built-in templates,
    /// otherwise a directory holding the template file
    pub source: String,
}

impl TemplateRef {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Whether this template ships with cfnstack
    pub fn is_builtin(&self) -> bool {
        self.source == SYSTEM_NAME
    }
}

impl Default for TemplateRef {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE, SYSTEM_NAME)
    }
}

impl std::fmt::Display for TemplateRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.source, self.name)
    }
}

/// Caller-supplied attributes, all optional until validated.
///
/// This is also the shape of a `[stacks.<handle>]` table in `stacks.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StackAttributes {
    pub name: Option<String>,
    pub stack_name: Option<String>,
    pub dependencies: Option<Vec<String>>,
    pub environment_path: Option<PathBuf>,
    pub template: Option<String>,
    pub template_source: Option<String>,
    pub region: Option<String>,
    pub bucket: Option<String>,
    pub key: Option<String>,
}

impl StackAttributes {
    pub fn stack_name(mut self, value: impl Into<String>) -> Self {
        self.stack_name = Some(value.into());
        self
    }

    pub fn bucket(mut self, value: impl Into<String>) -> Self {
        self.bucket = Some(value.into());
        self
    }

    pub fn key(mut self, value: impl Into<String>) -> Self {
        self.key = Some(value.into());
        self
    }

    pub fn region(mut self, value: impl Into<String>) -> Self {
        self.region = Some(value.into());
        self
    }

    pub fn environment_path(mut self, value: impl Into<PathBuf>) -> Self {
        self.environment_path = Some(value.into());
        self
    }

    pub fn dependencies<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn template(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.template = Some(name.into());
        self.template_source = Some(source.into());
        self
    }

    /// Layer `overrides` on top of these attributes; set fields win.
    pub fn merge(self, overrides: Self) -> Self {
        Self {
            name: overrides.name.or(self.name),
            stack_name: overrides.stack_name.or(self.stack_name),
            dependencies: overrides.dependencies.or(self.dependencies),
            environment_path: overrides.environment_path.or(self.environment_path),
            template: overrides.template.or(self.template),
            template_source: overrides.template_source.or(self.template_source),
            region: overrides.region.or(self.region),
            bucket: overrides.bucket.or(self.bucket),
            key: overrides.key.or(self.key),
        }
    }
}

/// Validated desired state of one stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackDeclaration {
    name: String,
    stack_name: String,
    dependencies: Vec<String>,
    environment_path: PathBuf,
    template: TemplateRef,
    region: String,
    bucket: String,
    key: String,
}

impl StackDeclaration {
    /// Validate `attrs` into a declaration identified by `handle`.
    ///
    /// Defaults are filled in from `settings` (the cache root for the
    /// environment path) and the module constants.
    pub fn from_attributes(
        handle: &str,
        attrs: StackAttributes,
        settings: &Settings,
    ) -> Result<Self, ValidationError> {
        let name = attrs.name.unwrap_or_else(|| handle.to_string());
        if name.is_empty() {
            return Err(ValidationError::new("name", "must not be empty"));
        }

        let stack_name = match attrs.stack_name {
            Some(stack_name) => token("stack_name", stack_name)?,
            None => return Err(ValidationError::new("stack_name", "is required")),
        };

        let bucket = match attrs.bucket {
            Some(bucket) => token("bucket", bucket)?,
            None => return Err(ValidationError::new("bucket", "is required")),
        };

        let region = token(
            "region",
            attrs.region.unwrap_or_else(|| DEFAULT_REGION.to_string()),
        )?;

        let key = token(
            "key",
            attrs.key.unwrap_or_else(|| format!("{stack_name}.json")),
        )?;

        let dependencies = match attrs.dependencies {
            Some(names) => dedupe(names)?,
            None => DEFAULT_DEPENDENCIES.iter().map(|s| s.to_string()).collect(),
        };

        let environment_path = attrs
            .environment_path
            .unwrap_or_else(|| default_environment_path(settings));
        if environment_path.as_os_str().is_empty() {
            return Err(ValidationError::new("environment_path", "must not be empty"));
        }

        let template = TemplateRef::new(
            attrs.template.unwrap_or_else(|| DEFAULT_TEMPLATE.to_string()),
            attrs.template_source.unwrap_or_else(|| SYSTEM_NAME.to_string()),
        );
        if template.name.is_empty() {
            return Err(ValidationError::new("template", "must not be empty"));
        }
        if template.source.is_empty() {
            return Err(ValidationError::new("template_source", "must not be empty"));
        }

        Ok(Self {
            name,
            stack_name,
            dependencies,
            environment_path,
            template,
            region,
            bucket,
            key,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stack_name(&self) -> &str {
        &self.stack_name
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn environment_path(&self) -> &Path {
        &self.environment_path
    }

    pub fn template(&self) -> &TemplateRef {
        &self.template
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// `<environment_path>/bin`
    pub fn bin_dir(&self) -> PathBuf {
        self.environment_path.join("bin")
    }

    /// The environment's python interpreter
    pub fn interpreter(&self) -> PathBuf {
        self.bin_dir().join("python")
    }

    /// Where the control script is rendered
    pub fn script_path(&self) -> PathBuf {
        self.bin_dir().join(SCRIPT_NAME)
    }
}

/// `<cache_root>/virtualenvs/<system-name>/`
pub fn default_environment_path(settings: &Settings) -> PathBuf {
    settings
        .cache_root
        .join("virtualenvs")
        .join(SYSTEM_NAME)
        .join("")
}

/// A positional argument: non-empty and free of whitespace.
fn token(field: &'static str, value: String) -> Result<String, ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(ValidationError::new(
            field,
            format!("'{value}' must not contain whitespace"),
        ));
    }
    Ok(value)
}

/// Drop duplicate package names, keeping first occurrence.
fn dedupe(names: Vec<String>) -> Result<Vec<String>, ValidationError> {
    if names.is_empty() {
        return Err(ValidationError::new(
            "dependencies",
            "must list at least one package",
        ));
    }

    let mut unique: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let name = token("dependencies", name)?;
        if !unique.contains(&name) {
            unique.push(name);
        }
    }
    Ok(unique)
}
