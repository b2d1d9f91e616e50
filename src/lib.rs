//! # cfnstack
//!
//! Converge CloudFormation stacks through a managed python toolchain.
//!
//! For a stack declaration this crate:
//! - Ensures a python virtualenv exists
//! - Installs the control script's python dependencies into it
//! - Renders the `cfntools.py` control script from a template
//! - Appends the command to an audit log, then runs it with `create` or `destroy`
//!
//! ## Example
//!
//! ```no_run
//! use cfnstack::config::Settings;
//! use cfnstack::declaration::StackAttributes;
//! use cfnstack::driver::{Action, Driver};
//! use declarative::ApplyOptions;
//!
//! let driver = Driver::system(Settings::new("/var/cache/cfnstack"))?;
//! let decl = driver.declare(
//!     "web",
//!     StackAttributes::default()
//!         .stack_name("web-stack")
//!         .bucket("my-bucket"),
//! )?;
//!
//! let outcome = driver.execute_action(&decl, Action::Create, ApplyOptions::default())?;
//! println!("ran {}", outcome.invocation);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod audit;
pub mod backend;
pub mod config;
pub mod declaration;
pub mod driver;
pub mod error;
pub mod paths;
pub mod resource;
pub mod runner;

#[cfg(test)]
mod testing;

pub use config::{Settings, StacksFile};
pub use declaration::{StackAttributes, StackDeclaration, TemplateRef};
pub use driver::{Action, Driver, Invocation, Outcome, Preparation};
pub use error::{Error, Result, ValidationError};
