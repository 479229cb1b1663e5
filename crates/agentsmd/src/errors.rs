//! Error kinds surfaced by the composition pipeline.
//!
//! Every failure aborts the run; the binary prints the message to stderr
//! followed by the usage text and exits non-zero.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while loading, resolving, or composing a ruleset.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// The descriptor file is not valid JSON.
    #[error("Invalid JSON in {}: {}", .path.display(), .source)]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The descriptor parsed but violates the ruleset schema.
    /// The message enumerates every violation, not just the first.
    #[error("Invalid ruleset schema in {}: {}", .path.display(), .violations.join("; "))]
    Schema {
        path: PathBuf,
        violations: Vec<String>,
    },

    /// No ruleset descriptor was found at the expected location.
    #[error("Missing ruleset file: {}", .0.display())]
    MissingRuleset(PathBuf),

    /// A rule file named by the descriptor does not exist.
    #[error("Missing file: {}", .0.display())]
    MissingFile(PathBuf),

    /// A local source path does not exist.
    #[error("Missing source path: {}", .0.display())]
    MissingPath(PathBuf),

    /// An expected directory is absent.
    #[error("Missing directory: {}", .0.display())]
    MissingDirectory(PathBuf),

    /// A path that must be a directory is something else.
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// The source locator uses a scheme this tool does not understand.
    #[error("Unsupported source: {0}")]
    UnsupportedSource(String),

    /// The `github:` locator is malformed.
    #[error("Invalid GitHub source (expected github:owner/repo@ref): {0}")]
    InvalidSource(String),

    /// No commit hash or hash-like literal could be determined for a ref.
    #[error("Unable to resolve ref {reference} for {url}")]
    RefResolution { reference: String, url: String },

    /// `apply-rules` requires a clean workspace.
    #[error("Workspace has uncommitted changes: {}", .0.display())]
    DirtyWorkspace(PathBuf),

    /// `apply-rules` requires a branch checkout, not a detached HEAD.
    #[error("Workspace is in detached HEAD state: {}", .0.display())]
    DetachedHead(PathBuf),

    /// A git subprocess exited non-zero; carries its original stderr.
    #[error("{command} failed: {stderr}")]
    GitFailed { command: String, stderr: String },

    /// The git binary is not on PATH.
    #[error("git executable not found on PATH")]
    GitNotFound,
}
