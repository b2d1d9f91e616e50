//! Execution engine - converges an ordered chain of resources
//!
//! Resources are applied one at a time, in the order given. The first
//! resource that fails stops the chain: nothing after it is touched.

use crate::context::{ApplyContext, NoProgress, ProgressCallback};
use crate::resource::Resource;
use crate::types::{ApplyOptions, StageResult};

/// A resource in a chain failed to apply
#[derive(Debug, thiserror::Error)]
#[error("{resource_type} {id} failed: {error:#}")]
pub struct StageFailure {
    /// Identifier of the failing resource
    pub id: String,
    /// Type of the failing resource
    pub resource_type: String,
    /// Results of the stages that completed before the failure
    pub completed: Vec<StageResult>,
    /// Underlying cause
    pub error: anyhow::Error,
}

/// Converge a chain of resources in order
///
/// # Arguments
/// * `resources` - The resources to apply, in dependency order
/// * `opts` - Apply options (dry_run, verbose)
/// * `progress` - Progress callback
///
/// # Returns
/// One [`StageResult`] per resource, in the same order, or the first failure.
pub fn converge<P: ProgressCallback>(
    resources: &[Box<dyn Resource>],
    opts: ApplyOptions,
    progress: &mut P,
) -> Result<Vec<StageResult>, StageFailure> {
    let mut results = Vec::with_capacity(resources.len());

    for resource in resources {
        let id = resource.id();
        progress.on_resource_start(&id, &resource.description());

        match apply_resource(resource.as_ref(), opts) {
            Ok(result) => {
                log::debug!("{} -> {}", id, result.label());
                progress.on_resource_complete(&id, &result);
                results.push(StageResult {
                    id,
                    resource_type: resource.resource_type().to_string(),
                    description: resource.description(),
                    result,
                });
            }
            Err(error) => {
                log::debug!("{} failed: {:#}", id, error);
                progress.on_resource_failed(&id, &error);
                return Err(StageFailure {
                    id,
                    resource_type: resource.resource_type().to_string(),
                    completed: results,
                    error,
                });
            }
        }
    }

    Ok(results)
}

/// Converge without progress reporting
pub fn converge_simple(
    resources: &[Box<dyn Resource>],
    opts: ApplyOptions,
) -> Result<Vec<StageResult>, StageFailure> {
    converge(resources, opts, &mut NoProgress)
}

/// Apply a single resource
fn apply_resource(
    resource: &dyn Resource,
    opts: ApplyOptions,
) -> anyhow::Result<crate::types::ApplyResult> {
    let mut ctx = ApplyContext::from(opts);
    resource.apply(&mut ctx)
}
