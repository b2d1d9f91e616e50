//! Apply context and progress reporting
//!
//! These traits allow the declarative crate to be used without
//! depending on a specific terminal UI.

use crate::types::{ApplyOptions, ApplyResult};

/// Progress callback for chain execution
///
/// Implement this trait to receive progress updates while a chain converges.
pub trait ProgressCallback {
    /// Called when starting to apply a single resource
    fn on_resource_start(&mut self, id: &str, description: &str);

    /// Called when a resource application completes
    fn on_resource_complete(&mut self, id: &str, result: &ApplyResult);

    /// Called when a resource fails and the chain stops
    fn on_resource_failed(&mut self, _id: &str, _error: &anyhow::Error) {}
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_resource_start(&mut self, _id: &str, _description: &str) {}
    fn on_resource_complete(&mut self, _id: &str, _result: &ApplyResult) {}
}

/// Context passed to resource apply operations
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyContext {
    /// Whether this is a dry run (no actual changes)
    pub dry_run: bool,
    /// Whether to output verbose information
    pub verbose: bool,
}

impl ApplyContext {
    /// Create a new apply context
    pub fn new(dry_run: bool, verbose: bool) -> Self {
        Self { dry_run, verbose }
    }
}

impl From<ApplyOptions> for ApplyContext {
    fn from(opts: ApplyOptions) -> Self {
        Self::new(opts.dry_run, opts.verbose)
    }
}
