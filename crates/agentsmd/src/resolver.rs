//! Source resolution: from a descriptor's `source` string to a rules root
//! directory on disk.
//!
//! GitHub sources go through symbolic-ref resolution and the on-disk cache;
//! local sources resolve relative to the descriptor's directory.

use crate::cache::{sanitize_segment, CacheStore};
use crate::errors::ComposeError;
use crate::git::{run_fetch_plan, FetchStrategy, GitClient};
use crate::paths::{ensure_directory, resolve_from};
use crate::source::{
    is_github_source, looks_like_commit_hash, GithubSource, Version, LATEST_REF,
};
use anyhow::Result;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Subdirectory of a source checkout holding the rule subtrees.
pub const RULES_DIR: &str = "rules";

/// A symbolic ref resolved against the remote: the name to fetch by and,
/// when the remote knows it, the concrete commit hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRef {
    pub name: String,
    pub hash: Option<String>,
}

/// Resolve a GitHub source's ref to something fetchable.
///
/// `latest` selects the maximum parseable version tag, falling back to the
/// remote `HEAD` commit under the literal name `HEAD` when no tag qualifies.
/// Any other ref is resolved against literal/tag/branch refs; a miss is
/// acceptable only when the literal itself looks like a commit hash.
pub fn resolve_github_ref(git: &dyn GitClient, source: &GithubSource) -> Result<ResolvedRef> {
    if source.reference == LATEST_REF {
        let tags = git.list_tags(&source.url)?;
        let best = tags
            .into_iter()
            .filter_map(|tag| Version::parse(&tag.name).map(|version| (version, tag)))
            .max_by(|a, b| a.0.cmp(&b.0));

        if let Some((_, tag)) = best {
            return Ok(ResolvedRef {
                name: tag.name,
                hash: Some(tag.hash),
            });
        }

        let head = git.resolve_head(&source.url)?;
        return Ok(ResolvedRef {
            name: "HEAD".to_string(),
            hash: Some(head),
        });
    }

    let hash = git.resolve_ref(&source.url, &source.reference)?;
    if hash.is_none() && !looks_like_commit_hash(&source.reference) {
        return Err(ComposeError::RefResolution {
            reference: source.reference.clone(),
            url: source.url.clone(),
        }
        .into());
    }

    Ok(ResolvedRef {
        name: source.reference.clone(),
        hash,
    })
}

/// Cache key segment for a resolved ref. `HEAD` caches under its resolved
/// hash so a moved remote HEAD lands in a fresh entry.
pub fn cache_segment(resolved: &ResolvedRef) -> String {
    if resolved.name == "HEAD" {
        sanitize_segment(resolved.hash.as_deref().unwrap_or(&resolved.name))
    } else {
        sanitize_segment(&resolved.name)
    }
}

/// Ordered fetch attempts for a resolved ref: shallow clone by name, then
/// fetch-by-commit when a hash is known (or the name itself is one).
pub fn fetch_plan(resolved: &ResolvedRef) -> Vec<FetchStrategy> {
    let mut plan = vec![FetchStrategy::CloneShallow {
        reference: resolved.name.clone(),
    }];

    match &resolved.hash {
        Some(hash) if looks_like_commit_hash(hash) => plan.push(FetchStrategy::FetchCommit {
            commit: hash.clone(),
        }),
        _ if looks_like_commit_hash(&resolved.name) => plan.push(FetchStrategy::FetchCommit {
            commit: resolved.name.clone(),
        }),
        _ => {}
    }

    plan
}

/// Resolve a GitHub source to its cached rules root, fetching on a cache
/// miss and refetching when `refresh` is set.
pub fn resolve_github_rules_root(
    git: &dyn GitClient,
    cache: &CacheStore,
    source: &GithubSource,
    refresh: bool,
) -> Result<PathBuf> {
    let resolved = resolve_github_ref(git, source)?;
    let entry = cache.entry_dir(&source.owner, &source.repo, &cache_segment(&resolved));

    if refresh {
        cache.remove_entry(&entry)?;
    }

    if !entry.exists() {
        cache.prepare_entry(&entry)?;
        run_fetch_plan(git, &source.url, &fetch_plan(&resolved), &entry)?;
    }

    let rules_root = entry.join(RULES_DIR);
    ensure_directory(&rules_root)?;
    Ok(rules_root)
}

/// Resolve a local source path to its rules root. A path already named
/// `rules` is the root itself; anything else must contain a `rules`
/// subdirectory.
pub fn resolve_local_rules_root(ruleset_dir: &Path, source: &str) -> Result<PathBuf> {
    let resolved = resolve_from(ruleset_dir, Path::new(source));
    if !resolved.exists() {
        return Err(ComposeError::MissingPath(resolved).into());
    }

    let candidate = if resolved.file_name() == Some(OsStr::new(RULES_DIR)) {
        resolved
    } else {
        resolved.join(RULES_DIR)
    };
    ensure_directory(&candidate)?;
    Ok(candidate)
}

/// Resolve any descriptor source to a rules root directory.
pub fn resolve_rules_root(
    git: &dyn GitClient,
    cache: &CacheStore,
    ruleset_dir: &Path,
    source: &str,
    refresh: bool,
) -> Result<PathBuf> {
    if is_github_source(source) {
        let parsed = GithubSource::parse(source)?;
        resolve_github_rules_root(git, cache, &parsed, refresh)
    } else {
        resolve_local_rules_root(ruleset_dir, source)
    }
}
