//! Centralized path resolution for cfnstack
//!
//! # Environment Variables
//!
//! - `CFNSTACK_CONFIG_DIR` - Override config directory (holds `stacks.toml`)
//! - `CFNSTACK_CACHE_DIR` - Override the shared cache root (virtualenvs live below it)
//! - `CFNSTACK_AUDIT_LOG` - Override the audit log file
//!
//! # Path Resolution Priority
//!
//! For config_dir():
//! 1. `CFNSTACK_CONFIG_DIR` environment variable
//! 2. `XDG_CONFIG_HOME/cfnstack` (if set)
//! 3. `~/.config/cfnstack`
//!
//! For cache_dir():
//! 1. `CFNSTACK_CACHE_DIR` environment variable
//! 2. `XDG_CACHE_HOME/cfnstack` (if set)
//! 3. Platform cache dir (`~/.cache/cfnstack` on Linux)

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "CFNSTACK_CONFIG_DIR";

/// Environment variable for cache root override
pub const ENV_CACHE_DIR: &str = "CFNSTACK_CACHE_DIR";

/// Environment variable for audit log override
pub const ENV_AUDIT_LOG: &str = "CFNSTACK_AUDIT_LOG";

/// Audit log used when nothing else is configured
pub const DEFAULT_AUDIT_LOG: &str = "/tmp/cmd.log";

/// Name of the declaration file inside the config directory
pub const STACKS_FILE: &str = "stacks.toml";

/// Get the cfnstack config directory path
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = expand(&dir);
        log::debug!(
            "Using config dir from {}: {}",
            ENV_CONFIG_DIR,
            path.display()
        );
        return Ok(path);
    }

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config).join("cfnstack");
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".config").join("cfnstack");
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

/// Get the shared cache root
pub fn cache_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CACHE_DIR) {
        let path = expand(&dir);
        log::debug!("Using cache dir from {}: {}", ENV_CACHE_DIR, path.display());
        return Ok(path);
    }

    if let Ok(xdg_cache) = std::env::var("XDG_CACHE_HOME") {
        let path = PathBuf::from(xdg_cache).join("cfnstack");
        log::debug!("Using XDG_CACHE_HOME: {}", path.display());
        return Ok(path);
    }

    let base = dirs::cache_dir().context("Could not determine cache directory")?;
    let path = base.join("cfnstack");
    log::debug!("Using default cache dir: {}", path.display());
    Ok(path)
}

/// Get the audit log path
pub fn audit_log() -> PathBuf {
    match std::env::var(ENV_AUDIT_LOG) {
        Ok(path) => expand(&path),
        Err(_) => PathBuf::from(DEFAULT_AUDIT_LOG),
    }
}

/// Get the default declaration file path
pub fn stacks_file() -> Result<PathBuf> {
    Ok(config_dir()?.join(STACKS_FILE))
}

/// Expand ~ and environment variables in a path string.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    /// Helper to run a test with temporary env var
    ///
    /// Each variable is only ever touched by one test, so tests
    /// running in parallel do not observe each other's values.
    fn with_env_var<F, R>(key: &str, value: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let original = env::var(key).ok();
        // SAFETY: no other test reads or writes this variable
        unsafe { env::set_var(key, value) };
        let result = f();
        match original {
            // SAFETY: see above
            Some(v) => unsafe { env::set_var(key, v) },
            None => unsafe { env::remove_var(key) },
        }
        result
    }

    #[test]
    fn test_config_dir_env_override() {
        with_env_var(ENV_CONFIG_DIR, "/custom/config/path", || {
            let result = config_dir().unwrap();
            assert_eq!(result, PathBuf::from("/custom/config/path"));
            assert_eq!(
                stacks_file().unwrap(),
                PathBuf::from("/custom/config/path/stacks.toml")
            );
        });
    }

    #[test]
    fn test_cache_dir_env_override_with_tilde() {
        let home = dirs::home_dir().unwrap();
        with_env_var(ENV_CACHE_DIR, "~/cfnstack-cache-test", || {
            let result = cache_dir().unwrap();
            assert_eq!(result, home.join("cfnstack-cache-test"));
        });
    }

    #[test]
    fn test_audit_log_env_override() {
        with_env_var(ENV_AUDIT_LOG, "/var/log/cfn.log", || {
            assert_eq!(audit_log(), PathBuf::from("/var/log/cfn.log"));
        });
    }

    #[test]
    fn test_expand_with_tilde() {
        let result = expand("~/test/path");
        let home = dirs::home_dir().unwrap();
        assert_eq!(result, home.join("test").join("path"));
    }

    #[test]
    fn test_expand_absolute() {
        let result = expand("/absolute/path");
        assert_eq!(result, PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_expand_with_env_var() {
        with_env_var("CFNSTACK_TEST_VAR", "test_value", || {
            let result = expand("/path/$CFNSTACK_TEST_VAR/file");
            assert_eq!(result, PathBuf::from("/path/test_value/file"));
        });
    }
}
