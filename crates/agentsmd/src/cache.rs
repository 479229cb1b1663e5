//! On-disk cache of fetched rule checkouts.
//!
//! Entries are keyed by `(owner, repo, sanitized ref-or-hash)` under a single
//! cache root. The store is an injected capability so tests can point it at a
//! temp directory instead of the user's home.

use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the default cache root.
pub const CACHE_DIR_ENV: &str = "AGENTSMD_CACHE_DIR";

/// Replace path separators in a cache key segment so refs like
/// `feature/login` cannot escape or collide inside the cache tree.
pub fn sanitize_segment(value: &str) -> String {
    value.replace(['/', '\\'], "__")
}

/// Filesystem store for cached rule checkouts.
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Cache root from `AGENTSMD_CACHE_DIR`, else `~/.agentsmd/cache`.
    pub fn from_env() -> Result<Self> {
        if let Some(dir) = env::var_os(CACHE_DIR_ENV) {
            return Ok(Self::new(PathBuf::from(dir)));
        }
        let home = dirs::home_dir().context("Unable to determine home directory")?;
        Ok(Self::new(home.join(".agentsmd").join("cache")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for one cached checkout. `segment` must already be
    /// sanitized.
    pub fn entry_dir(&self, owner: &str, repo: &str, segment: &str) -> PathBuf {
        self.root.join(owner).join(repo).join(segment)
    }

    /// Create the parent directories an entry will be cloned into.
    pub fn prepare_entry(&self, entry: &Path) -> Result<()> {
        if let Some(parent) = entry.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create cache directory {}", parent.display()))?;
        }
        Ok(())
    }

    /// Delete one cached checkout, if present.
    pub fn remove_entry(&self, entry: &Path) -> Result<()> {
        if entry.exists() {
            fs::remove_dir_all(entry)
                .with_context(|| format!("Failed to remove cache entry {}", entry.display()))?;
        }
        Ok(())
    }

    /// Delete the entire cache root, if present.
    pub fn clear(&self) -> Result<()> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root)
                .with_context(|| format!("Failed to clear cache root {}", self.root.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_are_sanitized() {
        assert_eq!(sanitize_segment("v1.2.0"), "v1.2.0");
        assert_eq!(sanitize_segment("feature/login"), "feature__login");
        assert_eq!(sanitize_segment("a\\b/c"), "a__b__c");
    }

    #[test]
    fn entry_layout_is_owner_repo_segment() {
        let store = CacheStore::new("/tmp/cache");
        assert_eq!(
            store.entry_dir("acme", "rules", "v1.2.0"),
            PathBuf::from("/tmp/cache/acme/rules/v1.2.0")
        );
    }

    #[test]
    fn clear_removes_root() {
        let temp = tempfile::tempdir().unwrap();
        let store = CacheStore::new(temp.path().join("cache"));
        let entry = store.entry_dir("acme", "rules", "main");
        fs::create_dir_all(&entry).unwrap();
        fs::write(entry.join("marker"), "x").unwrap();

        store.clear().unwrap();
        assert!(!store.root().exists());

        // Clearing an absent root is a no-op.
        store.clear().unwrap();
    }

    #[test]
    fn remove_entry_leaves_siblings() {
        let temp = tempfile::tempdir().unwrap();
        let store = CacheStore::new(temp.path());
        let keep = store.entry_dir("acme", "rules", "v1.0.0");
        let stale = store.entry_dir("acme", "rules", "v2.0.0");
        fs::create_dir_all(&keep).unwrap();
        fs::create_dir_all(&stale).unwrap();

        store.remove_entry(&stale).unwrap();
        assert!(keep.exists());
        assert!(!stale.exists());
    }
}
