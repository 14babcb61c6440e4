//! Source-control provenance
//!
//! Used by the build-report path only. Provenance is best-effort: a
//! missing `git` binary or a non-repository working directory yields
//! empty values, never an error.

use std::path::Path;

use crate::tools;

/// Source-control details for a build report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoInfo {
    pub provider: Option<String>,
    pub repository: Option<String>,
    pub revision: Option<String>,
}

/// Resolve provenance, preferring explicit values over git queries.
pub fn repo_info(
    dir: &Path,
    provider: Option<&str>,
    repository: Option<&str>,
    revision: Option<&str>,
) -> RepoInfo {
    RepoInfo {
        provider: provider.map(str::to_string),
        repository: repository
            .map(str::to_string)
            .or_else(|| remote_url(dir)),
        revision: revision.map(str::to_string).or_else(|| head_revision(dir)),
    }
}

fn remote_url(dir: &Path) -> Option<String> {
    let git = tools::locate(tools::GIT)?;
    tools::run_for_stdout(&git, &["config", "--get", "remote.origin.url"], Some(dir))
}

fn head_revision(dir: &Path) -> Option<String> {
    let git = tools::locate(tools::GIT)?;
    tools::run_for_stdout(&git, &["rev-parse", "HEAD"], Some(dir))
}
