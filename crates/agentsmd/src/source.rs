//! Rule source locators.
//!
//! A descriptor's `source` field is either a local path (resolved relative to
//! the descriptor's directory) or a `github:owner/repo@ref` locator. This
//! module parses the GitHub form and models the numeric version tags used to
//! resolve the symbolic `latest` ref.

use crate::errors::ComposeError;
use anyhow::Result;
use std::cmp::Ordering;

/// Prefix marking a remote GitHub source.
pub const GITHUB_PREFIX: &str = "github:";

/// Symbolic ref meaning "newest parseable version tag, else remote HEAD".
pub const LATEST_REF: &str = "latest";

/// A parsed `github:owner/repo@ref` locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubSource {
    pub owner: String,
    pub repo: String,
    /// Tag, branch, commit hash, or the literal `latest`.
    pub reference: String,
    /// Clone URL constructed from owner and repo.
    pub url: String,
}

/// Whether `source` names a remote GitHub repository.
pub fn is_github_source(source: &str) -> bool {
    source.trim().starts_with(GITHUB_PREFIX)
}

impl GithubSource {
    /// Parse a `github:owner/repo[@ref]` locator. The ref defaults to
    /// `latest` when omitted or empty.
    pub fn parse(source: &str) -> Result<Self> {
        let trimmed = source.trim();
        let Some(without_prefix) = trimmed.strip_prefix(GITHUB_PREFIX) else {
            return Err(ComposeError::UnsupportedSource(source.to_string()).into());
        };

        let (repo_part, ref_part) = match without_prefix.split_once('@') {
            Some((repo_part, ref_part)) => (repo_part, Some(ref_part)),
            None => (without_prefix, None),
        };

        let Some((owner, repo)) = repo_part.split_once('/') else {
            return Err(ComposeError::InvalidSource(source.to_string()).into());
        };

        if owner.trim().is_empty() || repo.trim().is_empty() {
            return Err(ComposeError::InvalidSource(source.to_string()).into());
        }

        let reference = match ref_part {
            Some(value) if !value.trim().is_empty() => value.to_string(),
            _ => LATEST_REF.to_string(),
        };

        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            reference,
            url: format!("https://github.com/{}/{}.git", owner, repo),
        })
    }
}

/// Whether `value` is recognizable as an abbreviated or full commit hash
/// (7-40 lowercase hex characters).
pub fn looks_like_commit_hash(value: &str) -> bool {
    (7..=40).contains(&value.len())
        && value
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}

/// A version tag with 2-3 numeric dot-separated components and an optional
/// leading `v`. Anything else is a non-candidate, never an error.
///
/// Ordering is component-wise numeric; missing trailing components compare
/// as 0, so `1.2` equals `1.2.0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    parts: Vec<u64>,
}

impl Version {
    /// Parse a tag into a version, or `None` if it does not qualify.
    pub fn parse(tag: &str) -> Option<Self> {
        let cleaned = tag.strip_prefix('v').unwrap_or(tag);
        let parts: Vec<&str> = cleaned.split('.').collect();
        if !(2..=3).contains(&parts.len()) {
            return None;
        }

        let parts = parts
            .iter()
            .map(|part| part.parse::<u64>().ok())
            .collect::<Option<Vec<u64>>>()?;

        Some(Self { parts })
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let width = self.parts.len().max(other.parts.len());
        for i in 0..width {
            let left = self.parts.get(i).copied().unwrap_or(0);
            let right = other.parts.get(i).copied().unwrap_or(0);
            match left.cmp(&right) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
