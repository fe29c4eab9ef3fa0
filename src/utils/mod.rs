//! Utility modules for common functionality

pub mod finder;
pub mod paths;

// Re-export commonly used functions
pub use finder::{FileFinder, find_dependency_dirs};
pub use paths::{
    PathMatchError, canonical, greatest_common_dir, group_files_by_dirs, longest_prefix_match,
    normalize,
};
