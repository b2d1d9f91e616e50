//! Settings and the `stacks.toml` declaration file

use anyhow::Result;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::declaration::StackAttributes;
use crate::error::Error;
use crate::paths;

/// Host configuration injected into declarations and the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Shared cache root; default environments live below it
    pub cache_root: PathBuf,
    /// Append-only log of every attempted invocation
    pub audit_log: PathBuf,
}

impl Settings {
    pub fn new(cache_root: impl Into<PathBuf>) -> Self {
        Self {
            cache_root: cache_root.into(),
            audit_log: PathBuf::from(paths::DEFAULT_AUDIT_LOG),
        }
    }

    pub fn with_audit_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.audit_log = path.into();
        self
    }
}

/// Optional `[settings]` table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsSection {
    pub cache_root: Option<String>,
    pub audit_log: Option<String>,
}

/// Parsed `stacks.toml`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StacksFile {
    #[serde(default)]
    pub settings: SettingsSection,
    #[serde(default)]
    pub stacks: BTreeMap<String, StackAttributes>,
}

impl StacksFile {
    /// Load a declaration file
    pub fn load(path: &Path) -> std::result::Result<Self, Error> {
        let content = fs::read_to_string(path).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::parse(&content, path)
    }

    /// Load a declaration file, treating a missing file as empty
    pub fn load_or_default(path: &Path) -> std::result::Result<Self, Error> {
        if !path.exists() {
            log::debug!("No declaration file at {}", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Parse declaration file content; `path` is only used for errors
    pub fn parse(content: &str, path: &Path) -> std::result::Result<Self, Error> {
        let mut file: Self = toml::from_str(content).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        for attrs in file.stacks.values_mut() {
            if let Some(env) = attrs.environment_path.take() {
                attrs.environment_path = Some(paths::expand(&env.to_string_lossy()));
            }
        }

        Ok(file)
    }

    /// Attributes declared for `handle`
    pub fn stack(&self, handle: &str) -> Option<&StackAttributes> {
        self.stacks.get(handle)
    }

    /// Declared stack handles, sorted
    pub fn handles(&self) -> impl Iterator<Item = &str> {
        self.stacks.keys().map(String::as_str)
    }

    /// Settings from the `[settings]` table, falling back to the environment
    /// (see [`crate::paths`]) for keys the table leaves out
    pub fn settings(&self) -> Result<Settings> {
        self.settings_or(paths::cache_dir, paths::audit_log)
    }

    /// Like [`StacksFile::settings`] with explicit fallbacks. Each fallback is
    /// only called when its key is absent from the table.
    pub fn settings_or(
        &self,
        cache_root: impl FnOnce() -> Result<PathBuf>,
        audit_log: impl FnOnce() -> PathBuf,
    ) -> Result<Settings> {
        let cache_root = match self.settings.cache_root.as_deref() {
            Some(path) => paths::expand(path),
            None => cache_root()?,
        };
        let audit_log = match self.settings.audit_log.as_deref() {
            Some(path) => paths::expand(path),
            None => audit_log(),
        };
        Ok(Settings {
            cache_root,
            audit_log,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
[settings]
cache_root = "/srv/cache"
audit_log = "/srv/log/cmd.log"

[stacks.web]
stack_name = "web-stack"
bucket = "my-bucket"
key = "k1"
region = "eu-west-1"
environment_path = "/tmp/envs/cf/"

[stacks.batch]
bucket = "batch-bucket"
dependencies = ["boto3", "docopt", "pyyaml"]
template = "batch.py.j2"
template_source = "/etc/cfnstack/templates"
"#;

    #[test]
    fn test_parse_stacks() {
        let file = StacksFile::parse(SAMPLE, Path::new("stacks.toml")).unwrap();

        assert_eq!(file.handles().collect::<Vec<_>>(), vec!["batch", "web"]);

        let web = file.stack("web").unwrap();
        assert_eq!(web.stack_name.as_deref(), Some("web-stack"));
        assert_eq!(web.environment_path, Some(PathBuf::from("/tmp/envs/cf/")));

        let batch = file.stack("batch").unwrap();
        assert_eq!(batch.dependencies.as_ref().unwrap().len(), 3);
        assert_eq!(
            batch.template_source.as_deref(),
            Some("/etc/cfnstack/templates")
        );
    }

    fn no_cache_dir() -> Result<PathBuf> {
        Err(anyhow::anyhow!("Could not determine cache directory"))
    }

    #[test]
    fn test_settings_override() {
        let file = StacksFile::parse(SAMPLE, Path::new("stacks.toml")).unwrap();
        let settings = file
            .settings_or(|| Ok(PathBuf::from("/default")), || PathBuf::from("/tmp/x.log"))
            .unwrap();
        assert_eq!(settings.cache_root, PathBuf::from("/srv/cache"));
        assert_eq!(settings.audit_log, PathBuf::from("/srv/log/cmd.log"));

        let empty = StacksFile::default()
            .settings_or(
                || Ok(PathBuf::from("/default")),
                || PathBuf::from(paths::DEFAULT_AUDIT_LOG),
            )
            .unwrap();
        assert_eq!(empty.cache_root, PathBuf::from("/default"));
        assert_eq!(empty.audit_log, PathBuf::from("/tmp/cmd.log"));
    }

    #[test]
    fn test_file_cache_root_does_not_need_platform_dir() {
        let file = StacksFile::parse(SAMPLE, Path::new("stacks.toml")).unwrap();
        let settings = file
            .settings_or(no_cache_dir, || PathBuf::from("/unused"))
            .unwrap();
        assert_eq!(settings.cache_root, PathBuf::from("/srv/cache"));
    }

    #[test]
    fn test_missing_cache_root_surfaces_platform_error() {
        let err = StacksFile::default()
            .settings_or(no_cache_dir, || PathBuf::from("/unused"))
            .unwrap_err();
        assert!(err.to_string().contains("cache directory"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = StacksFile::parse("[stacks.web]\nbuckett = \"x\"\n", Path::new("s.toml"))
            .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = TempDir::new().unwrap();
        let file = StacksFile::load_or_default(&dir.path().join("stacks.toml")).unwrap();
        assert_eq!(file.stacks.len(), 0);
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let err = StacksFile::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(err.to_string().contains("nope.toml"));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stacks.toml");
        fs::write(&path, SAMPLE).unwrap();
        let file = StacksFile::load(&path).unwrap();
        assert!(file.stack("web").is_some());
    }
}
