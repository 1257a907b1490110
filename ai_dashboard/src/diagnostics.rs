//! Colored stderr output shared by the pipeline stages.

use colored::Colorize;

pub fn info(message: impl AsRef<str>) {
    eprintln!("{} {}", "INFO".green().bold(), message.as_ref());
}

pub fn warn(message: impl AsRef<str>) {
    eprintln!("{} {}", "WARN".yellow().bold(), message.as_ref());
}

/// Format an error message with a colored prefix.
pub fn error_message(message: impl AsRef<str>) -> String {
    format!("{} {}", "ERROR".red().bold(), message.as_ref())
}
