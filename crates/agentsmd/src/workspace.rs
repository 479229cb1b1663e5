//! Persistent editing workspaces for GitHub-sourced rules.
//!
//! The composition cache holds disposable shallow checkouts; the workspace
//! holds one full clone per `(owner, repo)` so rule changes can be edited
//! and pushed upstream.

use crate::errors::ComposeError;
use crate::git::GitClient;
use crate::paths::resolve_from;
use crate::source::{is_github_source, GithubSource, LATEST_REF};
use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the default workspace root.
pub const WORKSPACE_DIR_ENV: &str = "AGENTSMD_WORKSPACE_DIR";

/// Filesystem store for persistent rule workspaces.
#[derive(Debug, Clone)]
pub struct WorkspaceStore {
    root: PathBuf,
}

impl WorkspaceStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Workspace root from `AGENTSMD_WORKSPACE_DIR`, else
    /// `~/.agentsmd/workspace`.
    pub fn from_env() -> Result<Self> {
        if let Some(dir) = env::var_os(WORKSPACE_DIR_ENV) {
            return Ok(Self::new(PathBuf::from(dir)));
        }
        let home = dirs::home_dir().context("Unable to determine home directory")?;
        Ok(Self::new(home.join(".agentsmd").join("workspace")))
    }

    pub fn entry_dir(&self, owner: &str, repo: &str) -> PathBuf {
        self.root.join(owner).join(repo)
    }
}

/// Ensure a full clone exists for the source and check out its ref (unless
/// the ref is `latest`, which tracks whatever the clone has checked out).
pub fn ensure_github_workspace(
    git: &dyn GitClient,
    store: &WorkspaceStore,
    source: &GithubSource,
) -> Result<PathBuf> {
    let workspace = store.entry_dir(&source.owner, &source.repo);

    if !workspace.exists() {
        if let Some(parent) = workspace.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        git.clone_full(&source.url, &workspace)?;
    }

    if source.reference != LATEST_REF {
        git.fetch_all(&workspace)?;
        git.checkout(&workspace, &source.reference)?;
    }

    Ok(workspace)
}

/// Resolve the workspace path for `edit-rules`: a persistent clone for
/// GitHub sources, the resolved local path otherwise.
pub fn edit_rules(
    git: &dyn GitClient,
    store: &WorkspaceStore,
    ruleset_dir: &Path,
    source: &str,
) -> Result<PathBuf> {
    if is_github_source(source) {
        let parsed = GithubSource::parse(source)?;
        ensure_github_workspace(git, store, &parsed)
    } else {
        Ok(resolve_from(ruleset_dir, Path::new(source)))
    }
}

/// Push workspace changes upstream for `apply-rules`. The workspace must be
/// clean and on a branch. Local sources need no push, so this is a no-op
/// for them.
pub fn push_workspace_changes(
    git: &dyn GitClient,
    store: &WorkspaceStore,
    source: &str,
) -> Result<()> {
    if !is_github_source(source) {
        return Ok(());
    }

    let parsed = GithubSource::parse(source)?;
    let workspace = ensure_github_workspace(git, store, &parsed)?;

    let status = git.status_porcelain(&workspace)?;
    if !status.trim().is_empty() {
        return Err(ComposeError::DirtyWorkspace(workspace).into());
    }

    if git.current_branch(&workspace)? == "HEAD" {
        return Err(ComposeError::DetachedHead(workspace).into());
    }

    git.push(&workspace)
}
