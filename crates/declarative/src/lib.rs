//! # Declarative
//!
//! A framework for declarative resource management.
//!
//! This crate provides the core abstractions for declaring desired state,
//! detecting current state, and converging systems to match the desired state.
//!
//! ## Core Concepts
//!
//! - **Resource**: Something with state that can be managed (environments, packages, files)
//! - **ResourceState**: The current or desired state of a resource
//! - **StageResult**: What applying one resource of a chain did
//! - **converge**: Applies an ordered chain of resources, stopping at the first failure
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{
//!     Resource, ResourceState, ApplyResult, ApplyContext, ApplyOptions, converge_simple,
//! };
//!
//! #[derive(Debug)]
//! struct FileResource { path: String, content: String }
//!
//! impl Resource for FileResource {
//!     fn id(&self) -> String { self.path.clone() }
//!     fn description(&self) -> String { format!("File: {}", self.path) }
//!     fn resource_type(&self) -> &'static str { "file" }
//!
//!     fn current_state(&self) -> anyhow::Result<ResourceState> {
//!         if std::path::Path::new(&self.path).exists() {
//!             Ok(ResourceState::Present { details: None })
//!         } else {
//!             Ok(ResourceState::Absent)
//!         }
//!     }
//!
//!     fn desired_state(&self) -> ResourceState {
//!         ResourceState::Present { details: None }
//!     }
//!
//!     fn apply(&self, ctx: &mut ApplyContext) -> anyhow::Result<ApplyResult> {
//!         if ctx.dry_run {
//!             return Ok(ApplyResult::Skipped { reason: "Dry run".into() });
//!         }
//!         std::fs::write(&self.path, &self.content)?;
//!         Ok(ApplyResult::Created)
//!     }
//! }
//!
//! let chain: Vec<Box<dyn Resource>> = vec![Box::new(FileResource {
//!     path: "/tmp/test.txt".into(),
//!     content: "hello".into(),
//! })];
//!
//! let stages = converge_simple(&chain, ApplyOptions::default())?;
//! ```

pub mod context;
pub mod diff;
pub mod executor;
pub mod resource;
pub mod types;

// Re-export main types at crate root
pub use context::{ApplyContext, NoProgress, ProgressCallback};
pub use diff::{DiffSummary, ResourceDiff, compute_diffs};
pub use executor::{StageFailure, converge, converge_simple};
pub use resource::{BoxedResource, Resource};
pub use types::{
    ApplyOptions, ApplyResult, CommandOutput, ExecuteSummary, ResourceState, StageResult,
};
