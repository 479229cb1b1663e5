//! The composition pipeline.
//!
//! Load the descriptor, resolve its rules root, collect the selected
//! fragments in deterministic order, and write the merged document.

use crate::cache::CacheStore;
use crate::collect::{add_unique, collect_markdown_files};
use crate::git::GitClient;
use crate::paths::{ensure_directory, relative_display, resolve_from};
use crate::resolver::resolve_rules_root;
use crate::ruleset::load_ruleset;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// First line of every composed document, ahead of the repeated top-level
/// headings the merged fragments bring in.
pub const LINT_HEADER: &str = "<!-- markdownlint-disable MD025 -->";

/// Shared tool-rules block prepended to every composition.
pub const TOOL_RULES: &str = include_str!("../assets/tool-rules.md");

/// Options for one composition run.
#[derive(Debug, Default)]
pub struct ComposeOptions {
    /// Delete and refetch any GitHub-sourced cache entry first.
    pub refresh: bool,
    /// Compose from this rules root directly, bypassing source resolution.
    pub rules_root: Option<PathBuf>,
}

/// Compose the descriptor at `ruleset_path` and write its output file.
/// Returns the output path relative to `project_root`, `/`-separated.
pub fn compose(
    git: &dyn GitClient,
    cache: &CacheStore,
    ruleset_path: &Path,
    project_root: &Path,
    options: &ComposeOptions,
) -> Result<String> {
    let ruleset_dir = ruleset_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let descriptor = load_ruleset(ruleset_path)?;
    let output_path = resolve_from(&ruleset_dir, Path::new(&descriptor.output));

    let rules_root = match &options.rules_root {
        Some(root) => {
            ensure_directory(root)?;
            root.clone()
        }
        None => resolve_rules_root(git, cache, &ruleset_dir, &descriptor.source, options.refresh)?,
    };

    let mut resolved = Vec::new();
    let mut seen = HashSet::new();

    if descriptor.global {
        add_unique(
            collect_markdown_files(&rules_root.join("global"))?,
            &mut resolved,
            &mut seen,
        )?;
    }

    let domains_root = rules_root.join("domains");
    for domain in &descriptor.domains {
        add_unique(
            collect_markdown_files(&domains_root.join(domain))?,
            &mut resolved,
            &mut seen,
        )?;
    }

    let extra_paths = descriptor
        .extra
        .iter()
        .map(|path| resolve_from(&ruleset_dir, Path::new(path)));
    add_unique(extra_paths, &mut resolved, &mut seen)?;

    let mut blocks = vec![TOOL_RULES.trim_end().to_string()];
    for path in &resolved {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read rule file: {}", path.display()))?;
        blocks.push(content.trim_end().to_string());
    }

    let document = format!("{}\n{}\n", LINT_HEADER, blocks.join("\n\n"));

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&output_path, document)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    Ok(relative_display(project_root, &output_path))
}
