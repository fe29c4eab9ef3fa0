//! Resolvr - dependency manifest discovery and resolution
//!
//! Scans source trees for package manifests, runs the ecosystem build tools
//! to write dependency lock files, and generates call graphs for Java and Go
//! projects.

pub mod archive;
pub mod batch;
pub mod callgraph;
pub mod config;
pub mod constants;
pub mod job;
pub mod logger;
pub mod outcome;
pub mod process;
pub mod report;
pub mod resolution;
pub mod scheduler;
pub mod services;
pub mod strategy;
pub mod utils;

pub type Result<T> = anyhow::Result<T>;

// Re-export commonly used types
pub use callgraph::{Generation, Generator};
pub use config::Config;
pub use job::{ErrorCollector, Job, JobBase, JobError};
pub use outcome::Outcome;
pub use process::{CommandExecutor, Scope};
pub use resolution::{Resolution, Resolver};
pub use scheduler::Scheduler;
pub use services::Services;

/// Load the configuration file from the working directory, or defaults
pub fn load_default_config() -> Result<Config> {
    Config::load_or_default(constants::config::DEFAULT_CONFIG_FILE)
}
