//! Git operations behind a client trait.
//!
//! All version control is performed by shelling out to the `git` binary as
//! synchronous subprocess calls. The `GitClient` trait keeps the resolution
//! and fallback logic testable against a fake instead of the network.

use crate::errors::ComposeError;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// One remote tag: its commit hash and the tag name without the
/// `refs/tags/` prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRef {
    pub hash: String,
    pub name: String,
}

/// Subprocess-backed view of the version-control tool.
pub trait GitClient {
    /// List remote tags as `(hash, name)` pairs.
    fn list_tags(&self, url: &str) -> Result<Vec<TagRef>>;

    /// Resolve the remote `HEAD` commit.
    fn resolve_head(&self, url: &str) -> Result<String>;

    /// Resolve a ref against the literal name, then tag refs, then branch
    /// refs. `None` when nothing matches.
    fn resolve_ref(&self, url: &str, reference: &str) -> Result<Option<String>>;

    /// Shallow single-ref clone into `dest`.
    fn clone_shallow(&self, url: &str, reference: &str, dest: &Path) -> Result<()>;

    /// Full clone into `dest`, usable for editing and pushing.
    fn clone_full(&self, url: &str, dest: &Path) -> Result<()>;

    /// Initialize `dest`, add the remote, shallow-fetch one commit, and
    /// check it out.
    fn fetch_commit(&self, url: &str, commit: &str, dest: &Path) -> Result<()>;

    fn fetch_all(&self, dir: &Path) -> Result<()>;

    fn checkout(&self, dir: &Path, reference: &str) -> Result<()>;

    /// `git status --porcelain`; empty output means a clean tree.
    fn status_porcelain(&self, dir: &Path) -> Result<String>;

    /// Current branch name, or the literal `HEAD` when detached.
    fn current_branch(&self, dir: &Path) -> Result<String>;

    fn push(&self, dir: &Path) -> Result<()>;
}

/// Production client invoking the `git` binary.
#[derive(Debug, Default)]
pub struct GitCli;

impl GitCli {
    pub fn new() -> Self {
        Self
    }

    fn run(&self, args: &[&str], cwd: Option<&Path>) -> Result<String> {
        let program = which::which("git").map_err(|_| ComposeError::GitNotFound)?;

        let mut command = Command::new(program);
        command.args(args).stdin(Stdio::null());
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        let output = command
            .output()
            .with_context(|| format!("Failed to run git {}", args.join(" ")))?;

        if !output.status.success() {
            return Err(ComposeError::GitFailed {
                command: format!("git {}", args.join(" ")),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl GitClient for GitCli {
    fn list_tags(&self, url: &str) -> Result<Vec<TagRef>> {
        let raw = self.run(&["ls-remote", "--tags", "--refs", url], None)?;

        let tags = raw
            .lines()
            .filter_map(|line| {
                let mut fields = line.split_whitespace();
                let hash = fields.next()?;
                let reference = fields.next()?;
                let name = reference.strip_prefix("refs/tags/")?;
                Some(TagRef {
                    hash: hash.to_string(),
                    name: name.to_string(),
                })
            })
            .collect();

        Ok(tags)
    }

    fn resolve_head(&self, url: &str) -> Result<String> {
        let raw = self.run(&["ls-remote", url, "HEAD"], None)?;
        match raw.split_whitespace().next() {
            Some(hash) => Ok(hash.to_string()),
            None => Err(ComposeError::RefResolution {
                reference: "HEAD".to_string(),
                url: url.to_string(),
            }
            .into()),
        }
    }

    fn resolve_ref(&self, url: &str, reference: &str) -> Result<Option<String>> {
        let tag_ref = format!("refs/tags/{}", reference);
        let head_ref = format!("refs/heads/{}", reference);
        let raw = self.run(&["ls-remote", url, reference, &tag_ref, &head_ref], None)?;
        Ok(raw.split_whitespace().next().map(str::to_string))
    }

    fn clone_shallow(&self, url: &str, reference: &str, dest: &Path) -> Result<()> {
        let dest = dest.to_string_lossy().into_owned();
        self.run(
            &["clone", "--depth", "1", "--branch", reference, url, &dest],
            None,
        )?;
        Ok(())
    }

    fn clone_full(&self, url: &str, dest: &Path) -> Result<()> {
        let dest = dest.to_string_lossy().into_owned();
        self.run(&["clone", url, &dest], None)?;
        Ok(())
    }

    fn fetch_commit(&self, url: &str, commit: &str, dest: &Path) -> Result<()> {
        fs::create_dir_all(dest)
            .with_context(|| format!("Failed to create {}", dest.display()))?;
        self.run(&["init"], Some(dest))?;
        self.run(&["remote", "add", "origin", url], Some(dest))?;
        self.run(&["fetch", "--depth", "1", "origin", commit], Some(dest))?;
        self.run(&["checkout", "FETCH_HEAD"], Some(dest))?;
        Ok(())
    }

    fn fetch_all(&self, dir: &Path) -> Result<()> {
        self.run(&["fetch", "--all"], Some(dir))?;
        Ok(())
    }

    fn checkout(&self, dir: &Path, reference: &str) -> Result<()> {
        self.run(&["checkout", reference], Some(dir))?;
        Ok(())
    }

    fn status_porcelain(&self, dir: &Path) -> Result<String> {
        self.run(&["status", "--porcelain"], Some(dir))
    }

    fn current_branch(&self, dir: &Path) -> Result<String> {
        self.run(&["rev-parse", "--abbrev-ref", "HEAD"], Some(dir))
    }

    fn push(&self, dir: &Path) -> Result<()> {
        self.run(&["push"], Some(dir))?;
        Ok(())
    }
}

/// One step of the fetch fallback chain. The plan is an explicit ordered
/// list so the retry policy is inspectable data, not nested error handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStrategy {
    /// `git clone --depth 1 --branch <reference>`.
    CloneShallow { reference: String },
    /// init + remote add + `git fetch --depth 1 origin <commit>` + checkout.
    /// Covers bare commit hashes and refs a shallow clone-by-name cannot
    /// fetch directly.
    FetchCommit { commit: String },
}

/// Run the strategies in order, stopping at the first success. When every
/// strategy fails, the last error propagates (with a single-entry plan that
/// is the original clone error).
pub fn run_fetch_plan(
    git: &dyn GitClient,
    url: &str,
    plan: &[FetchStrategy],
    dest: &Path,
) -> Result<()> {
    let mut last_error = None;

    for strategy in plan {
        let attempt = match strategy {
            FetchStrategy::CloneShallow { reference } => git.clone_shallow(url, reference, dest),
            FetchStrategy::FetchCommit { commit } => git.fetch_commit(url, commit, dest),
        };
        match attempt {
            Ok(()) => return Ok(()),
            Err(error) => last_error = Some(error),
        }
    }

    match last_error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

#[cfg(test)]
pub mod fake {
    //! In-memory `GitClient` for tests: canned remote state, a call log,
    //! and configurable failures. Successful clones and fetches materialize
    //! `seed_files` under the destination so composition can run against
    //! the "checkout".

    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Debug, Default)]
    pub struct FakeGit {
        pub tags: Vec<TagRef>,
        pub head: Option<String>,
        /// Ref name to commit hash, consulted by `resolve_ref`.
        pub refs: HashMap<String, String>,
        /// Relative path to content, written on successful clone/fetch.
        pub seed_files: Vec<(String, String)>,
        pub fail_clone_shallow: bool,
        pub fail_fetch_commit: bool,
        pub dirty: bool,
        pub branch: String,
        pub calls: RefCell<Vec<String>>,
    }

    impl FakeGit {
        pub fn new() -> Self {
            Self {
                branch: "main".to_string(),
                ..Self::default()
            }
        }

        pub fn with_seed_rules(mut self) -> Self {
            self.seed_files = vec![
                ("rules/global/10-style.md".to_string(), "# Style".to_string()),
                ("rules/domains/node/20-node.md".to_string(), "# Node".to_string()),
            ];
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }

        fn record(&self, call: impl Into<String>) {
            self.calls.borrow_mut().push(call.into());
        }

        fn materialize(&self, dest: &Path) -> Result<()> {
            for (relative, content) in &self.seed_files {
                let path = dest.join(relative);
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(path, content)?;
            }
            Ok(())
        }
    }

    impl GitClient for FakeGit {
        fn list_tags(&self, _url: &str) -> Result<Vec<TagRef>> {
            self.record("list_tags");
            Ok(self.tags.clone())
        }

        fn resolve_head(&self, url: &str) -> Result<String> {
            self.record("resolve_head");
            self.head.clone().ok_or_else(|| {
                ComposeError::RefResolution {
                    reference: "HEAD".to_string(),
                    url: url.to_string(),
                }
                .into()
            })
        }

        fn resolve_ref(&self, _url: &str, reference: &str) -> Result<Option<String>> {
            self.record(format!("resolve_ref {}", reference));
            Ok(self.refs.get(reference).cloned())
        }

        fn clone_shallow(&self, _url: &str, reference: &str, dest: &Path) -> Result<()> {
            self.record(format!("clone_shallow {}", reference));
            if self.fail_clone_shallow {
                return Err(ComposeError::GitFailed {
                    command: format!("git clone --depth 1 --branch {}", reference),
                    stderr: "Remote branch not found".to_string(),
                }
                .into());
            }
            self.materialize(dest)
        }

        fn clone_full(&self, _url: &str, dest: &Path) -> Result<()> {
            self.record("clone_full");
            fs::create_dir_all(dest)?;
            self.materialize(dest)
        }

        fn fetch_commit(&self, _url: &str, commit: &str, dest: &Path) -> Result<()> {
            self.record(format!("fetch_commit {}", commit));
            if self.fail_fetch_commit {
                return Err(ComposeError::GitFailed {
                    command: format!("git fetch --depth 1 origin {}", commit),
                    stderr: "could not fetch".to_string(),
                }
                .into());
            }
            self.materialize(dest)
        }

        fn fetch_all(&self, _dir: &Path) -> Result<()> {
            self.record("fetch_all");
            Ok(())
        }

        fn checkout(&self, _dir: &Path, reference: &str) -> Result<()> {
            self.record(format!("checkout {}", reference));
            Ok(())
        }

        fn status_porcelain(&self, _dir: &Path) -> Result<String> {
            self.record("status_porcelain");
            Ok(if self.dirty {
                " M rules/global/10-style.md".to_string()
            } else {
                String::new()
            })
        }

        fn current_branch(&self, _dir: &Path) -> Result<String> {
            self.record("current_branch");
            Ok(self.branch.clone())
        }

        fn push(&self, _dir: &Path) -> Result<()> {
            self.record("push");
            Ok(())
        }
    }
}
