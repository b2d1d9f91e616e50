//! Staging resources for a stack declaration
//!
//! Each prerequisite of an action is modeled as a [`declarative::Resource`]:
//! - [`Virtualenv`] - the isolated interpreter environment
//! - [`PipPackage`] - one dependency installed into it
//! - [`ScriptTemplate`] - the rendered control script
//!
//! The resources hold no state of their own; every check and change goes
//! through a backend capability.

pub mod pip_package;
pub mod script_template;
pub mod virtualenv;

pub use pip_package::PipPackage;
pub use script_template::ScriptTemplate;
pub use virtualenv::Virtualenv;

use declarative::ApplyResult;

/// Result for a stage that would change but is not applied in a dry run
pub(crate) fn dry_run_result(needs_change: bool) -> ApplyResult {
    if needs_change {
        ApplyResult::Skipped {
            reason: "Dry run".to_string(),
        }
    } else {
        ApplyResult::NoChange
    }
}
