//! Console logging with consistent formatting
//!
//! Every line is prefixed with a label (an ecosystem, a job directory or a
//! phase name) printed in cyan/bold, so interleaved output from concurrent
//! jobs stays readable.

use colored::*;

/// Logger with consistent `label | message` formatting
///
/// ## Example
///
/// ```rust,no_run
/// use resolvr::logger::Logger;
///
/// let logger = Logger::default();
/// logger.info("maven", "Parsing pom.xml files");
/// logger.success("maven", "Found 3 roots");
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct Logger;

impl Logger {
    pub fn info(&self, label: &str, msg: &str) {
        println!("{} | {}", label.cyan().bold(), msg);
    }

    pub fn success(&self, label: &str, msg: &str) {
        println!("{} | {}", label.cyan().bold(), msg.green());
    }

    pub fn warn(&self, label: &str, msg: &str) {
        println!("{} | {}", label.cyan().bold(), msg.yellow());
    }

    pub fn error(&self, label: &str, msg: &str) {
        eprintln!("{} | {}", label.cyan().bold(), msg.red());
    }

    /// Status line prefixed with a `[done/total]` counter
    pub fn progress(&self, done: usize, total: usize, label: &str, msg: &str) {
        println!(
            "{} {} | {}",
            format!("[{done}/{total}]").dimmed(),
            label.cyan().bold(),
            msg
        );
    }
}
