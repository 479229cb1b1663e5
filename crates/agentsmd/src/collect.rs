//! Markdown rule collection.
//!
//! Walks a rules subtree for `.md` files and merges batches into an ordered,
//! deduplicated list. Traversal order is unspecified; the returned sequence
//! is always sorted by `/`-normalized relative path so output is identical
//! across operating systems.

use crate::errors::ComposeError;
use crate::paths::{ensure_directory, relative_sort_key};
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Collect every markdown file under `root`, sorted by relative path.
pub fn collect_markdown_files(root: &Path) -> Result<Vec<PathBuf>> {
    ensure_directory(root)?;

    let mut results = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = fs::read_dir(&dir)
            .with_context(|| format!("Failed to read directory: {}", dir.display()))?;

        for entry in entries {
            let entry =
                entry.with_context(|| format!("Failed to read directory: {}", dir.display()))?;
            let path = entry.path();
            let file_type = entry
                .file_type()
                .with_context(|| format!("Failed to stat {}", path.display()))?;

            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file() && is_markdown(&path) {
                results.push(path);
            }
        }
    }

    results.sort_by_key(|path| relative_sort_key(root, path));
    Ok(results)
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .map(|extension| extension.eq_ignore_ascii_case("md"))
        .unwrap_or(false)
}

/// Append `paths` to `out`, skipping any file already present and failing
/// eagerly on a path that does not exist. Deduplication is by canonicalized
/// absolute path, so a file reachable through two spellings appears once,
/// at its first position.
pub fn add_unique(
    paths: impl IntoIterator<Item = PathBuf>,
    out: &mut Vec<PathBuf>,
    seen: &mut HashSet<PathBuf>,
) -> Result<()> {
    for path in paths {
        if !path.exists() {
            return Err(ComposeError::MissingFile(path).into());
        }
        let resolved = fs::canonicalize(&path)
            .with_context(|| format!("Failed to resolve {}", path.display()))?;
        if seen.insert(resolved.clone()) {
            out.push(resolved);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn collects_sorted_by_relative_path() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "zz/inner.md", "z");
        write(root, "10-first.md", "a");
        write(root, "20-second.md", "b");
        write(root, "aa/deep/leaf.md", "c");

        let collected = collect_markdown_files(root).unwrap();
        let relative: Vec<String> = collected
            .iter()
            .map(|path| relative_sort_key(root, path))
            .collect();

        assert_eq!(
            relative,
            vec!["10-first.md", "20-second.md", "aa/deep/leaf.md", "zz/inner.md"]
        );
    }

    #[test]
    fn ignores_non_markdown_files() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "keep.md", "x");
        write(temp.path(), "skip.txt", "x");
        write(temp.path(), "no-extension", "x");

        let collected = collect_markdown_files(temp.path()).unwrap();
        assert_eq!(collected.len(), 1);
    }

    #[test]
    fn missing_root_fails() {
        let temp = TempDir::new().unwrap();
        let err = collect_markdown_files(&temp.path().join("absent")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ComposeError>(),
            Some(ComposeError::MissingDirectory(_))
        ));
    }

    #[test]
    fn add_unique_preserves_first_position() {
        let temp = TempDir::new().unwrap();
        let a = write(temp.path(), "a.md", "a");
        let b = write(temp.path(), "b.md", "b");

        let mut out = Vec::new();
        let mut seen = HashSet::new();
        add_unique([a.clone(), b.clone()], &mut out, &mut seen).unwrap();
        add_unique([b, a], &mut out, &mut seen).unwrap();

        assert_eq!(out.len(), 2);
        assert!(out[0].ends_with("a.md"));
        assert!(out[1].ends_with("b.md"));
    }

    #[test]
    fn add_unique_fails_on_missing_file() {
        let temp = TempDir::new().unwrap();
        let mut out = Vec::new();
        let mut seen = HashSet::new();

        let err = add_unique(
            [temp.path().join("absent.md")],
            &mut out,
            &mut seen,
        )
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ComposeError>(),
            Some(ComposeError::MissingFile(_))
        ));
        assert!(out.is_empty());
    }
}
