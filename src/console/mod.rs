//! Leveled console output for the CLI
//!
//! All user-facing progress reporting goes through these helpers so the
//! prefixes and colors stay consistent across subcommands. Warnings and
//! errors go to stderr; informational and success messages to stdout.

use colored::Colorize;

/// Print an informational message to stdout.
pub fn info(message: &str) {
    println!("{} {}", "[INFO]".cyan().bold(), message);
}

/// Print a success message to stdout.
pub fn success(message: &str) {
    println!("{} {}", "[SUCCESS]".green().bold(), message);
}

/// Print a warning to stderr.
pub fn warn(message: &str) {
    eprintln!("{} {}", "[WARN]".yellow().bold(), message);
}

/// Print an error to stderr. The caller decides the exit code.
pub fn error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), message);
}
