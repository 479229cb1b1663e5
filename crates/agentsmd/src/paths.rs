//! Small path helpers shared across the pipeline.

use crate::errors::ComposeError;
use anyhow::Result;
use std::path::{Component, Path, PathBuf};

/// Resolve `target` against `base` unless it is already absolute.
pub fn resolve_from(base: &Path, target: &Path) -> PathBuf {
    if target.is_absolute() {
        target.to_path_buf()
    } else {
        base.join(target)
    }
}

/// Render a path with separators normalized to forward slashes.
pub fn normalize_slashes(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Path relative to `root`, `/`-separated. Falls back to the absolute
/// path when `path` lies outside `root`.
pub fn relative_display(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(relative) => relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => normalize_slashes(path),
    }
}

/// Sort key for a file under `root`: the `/`-normalized relative path.
/// Guarantees OS-independent ordering regardless of traversal order.
pub fn relative_sort_key(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter(|component| !matches!(component, Component::RootDir))
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Fail with `MissingFile` unless `path` names an existing file.
pub fn ensure_file(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(ComposeError::MissingFile(path.to_path_buf()).into());
    }
    Ok(())
}

/// Fail with `MissingDirectory`/`NotADirectory` unless `path` is a directory.
pub fn ensure_directory(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(ComposeError::MissingDirectory(path.to_path_buf()).into());
    }
    if !path.is_dir() {
        return Err(ComposeError::NotADirectory(path.to_path_buf()).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_from_keeps_absolute_paths() {
        let base = Path::new("/base");
        assert_eq!(
            resolve_from(base, Path::new("/etc/rules")),
            PathBuf::from("/etc/rules")
        );
        assert_eq!(
            resolve_from(base, Path::new("sub/rules")),
            PathBuf::from("/base/sub/rules")
        );
    }

    #[test]
    fn relative_display_inside_and_outside_root() {
        let root = Path::new("/project");
        assert_eq!(
            relative_display(root, Path::new("/project/docs/AGENTS.md")),
            "docs/AGENTS.md"
        );
        assert_eq!(
            relative_display(root, Path::new("/elsewhere/AGENTS.md")),
            "/elsewhere/AGENTS.md"
        );
    }

    #[test]
    fn ensure_directory_rejects_files() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("plain.txt");
        std::fs::write(&file, "x").unwrap();

        let err = ensure_directory(&file).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ComposeError>(),
            Some(ComposeError::NotADirectory(_))
        ));

        let err = ensure_directory(&temp.path().join("absent")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ComposeError>(),
            Some(ComposeError::MissingDirectory(_))
        ));
    }
}
