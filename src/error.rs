//! Error types for stack convergence.
//!
//! Each variant maps to one phase of an action: validating the declaration,
//! preparing the environment, recording the invocation, and running it.
//! Errors are surfaced to the caller unmodified; nothing here retries.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Boxed cause carried by preparation and spawn failures
pub type Cause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A declaration attribute is missing or malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    /// Attribute that failed validation
    pub field: &'static str,
    /// Why it was rejected
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors that can occur while converging a stack.
#[derive(Debug, Error)]
pub enum Error {
    /// Declaration rejected before any side effect
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Environment, dependency or script stage failed; nothing was invoked
    #[error("{resource_type} stage {stage} failed: {source}")]
    Preparation {
        /// Identifier of the failing stage (e.g. "pip:boto3")
        stage: String,
        /// Stage type (e.g. "pip_package")
        resource_type: String,
        /// Underlying cause
        #[source]
        source: Cause,
    },

    /// The invocation could not be recorded; nothing was invoked
    #[error("could not append to audit log {}: {source}", path.display())]
    AuditLog {
        /// Audit log path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// The action command could not be started
    #[error("could not run `{invocation}`: {source}")]
    Spawn {
        /// The constructed command line
        invocation: String,
        /// Underlying cause
        #[source]
        source: Cause,
    },

    /// The action command ran and exited non-zero
    #[error("`{invocation}` {}", exit_label(.code))]
    Execution {
        /// The constructed command line
        invocation: String,
        /// Exit code, `None` if terminated by a signal
        code: Option<i32>,
        /// Captured standard output
        stdout: String,
        /// Captured standard error
        stderr: String,
    },

    /// The declaration file could not be read or parsed
    #[error("invalid declaration file {}: {message}", path.display())]
    Config {
        /// File that was being loaded
        path: PathBuf,
        /// Read or parse error
        message: String,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {code}"),
        None => "was terminated by a signal".to_string(),
    }
}

impl Error {
    /// Failing stage identifier, for preparation errors
    pub fn stage(&self) -> Option<&str> {
        match self {
            Self::Preparation { stage, .. } => Some(stage),
            _ => None,
        }
    }

    /// Whether the action command was actually started
    pub fn was_invoked(&self) -> bool {
        matches!(self, Self::Execution { .. })
    }
}

/// Result type for stack operations.
pub type Result<T> = std::result::Result<T, Error>;
