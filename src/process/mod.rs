//! External process execution and cancellation
//!
//! - [`scope`]: the deadline/cancellation scope shared by one scheduling run
//! - [`executor`]: the [`CommandExecutor`] seam jobs use to start processes,
//!   and its operating-system implementation

pub mod executor;
pub mod scope;

pub use executor::{CommandExecutor, ProcessCommand, ProcessError, ProcessOutput, SystemExecutor};
pub use scope::{Scope, ScopeEnd};
