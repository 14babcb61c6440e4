//! External tool lookup and invocation
//!
//! The uploader consumes a handful of system tools rather than
//! reimplementing their formats: `dwarfdump` for debug-info UUIDs, `git`
//! for source-control provenance, and the NDK `llvm-objcopy` for the
//! keep-debug-info transform. This module centralizes locating them on
//! PATH and running them with captured output.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Debug-info dump tool, expected on PATH.
pub const DWARFDUMP: &str = "dwarfdump";

/// Version-control tool, expected on PATH. Provenance queries are
/// best-effort, so absence is not an error.
pub const GIT: &str = "git";

/// Locate a tool on PATH, returning its absolute path if present.
pub fn locate(tool: &str) -> Option<PathBuf> {
    which::which(tool).ok()
}

/// Run a command with captured stdout/stderr, optionally in a working
/// directory. Spawn failures surface as `io::Error`; a non-zero exit is
/// left to the caller to interpret since some tools (dwarfdump among
/// them) emit usable output alongside a failure status.
pub fn run(program: &Path, args: &[&str], cwd: Option<&Path>) -> std::io::Result<Output> {
    let mut cmd = Command::new(program);
    cmd.args(args);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    cmd.output()
}

/// Run a command and return trimmed stdout when it exits successfully.
pub fn run_for_stdout(program: &Path, args: &[&str], cwd: Option<&Path>) -> Option<String> {
    let output = run(program, args, cwd).ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
