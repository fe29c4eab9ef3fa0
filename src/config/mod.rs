//! Configuration management module

pub mod ecosystems;
pub mod loader;
pub mod validation;

pub use ecosystems::{
    CallgraphConfig, GolangConfig, GomodConfig, GradleConfig, JavaConfig, MavenConfig, PipConfig,
    ResolutionConfig,
};
pub use loader::Config;
