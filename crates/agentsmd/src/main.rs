//! agentsmd binary.
//!
//! Thin wrapper around the library pipeline: parse arguments, dispatch the
//! requested operation, and map any failure to a one-line message on stderr
//! followed by the usage text and exit code 1.

use agentsmd::cache::CacheStore;
use agentsmd::cli::{Cli, Commands};
use agentsmd::compose::{compose, ComposeOptions};
use agentsmd::errors::ComposeError;
use agentsmd::git::GitCli;
use agentsmd::paths::{ensure_file, resolve_from};
use agentsmd::ruleset::{load_ruleset, DEFAULT_RULESET_NAME};
use agentsmd::schema::descriptor_schema_json;
use agentsmd::workspace::{self, WorkspaceStore};
use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::env;
use std::path::{Path, PathBuf};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            // clap renders help and version itself, on stdout, exit 0.
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                let _ = err.print();
                return;
            }
            // Argument errors already carry the usage text.
            _ => {
                eprintln!("{}", err);
                std::process::exit(1);
            }
        },
    };

    if let Err(err) = run(cli) {
        eprintln!("Error: {}", err);
        eprintln!();
        eprintln!("{}", Cli::command().render_help());
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    if cli.schema {
        println!("{}", descriptor_schema_json()?);
        return Ok(());
    }

    let cache = CacheStore::from_env()?;

    if cli.clear_cache {
        cache.clear()?;
        println!("Cache cleared.");
        return Ok(());
    }

    let current_dir = env::current_dir().context("Unable to determine current directory")?;
    let root = match &cli.root {
        Some(dir) => resolve_from(&current_dir, dir),
        None => current_dir,
    };

    let ruleset_path = locate_ruleset(&cli, &root)?;
    let ruleset_dir = ruleset_path
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| root.clone());

    // --rules-root wins over the environment override.
    let rules_root = cli
        .rules_root
        .clone()
        .or_else(|| env::var_os("AGENT_RULES_ROOT").map(PathBuf::from));

    let git = GitCli::new();

    match cli.command {
        Some(Commands::EditRules) => {
            let descriptor = load_ruleset(&ruleset_path)?;
            let workspaces = WorkspaceStore::from_env()?;
            let path = workspace::edit_rules(&git, &workspaces, &ruleset_dir, &descriptor.source)?;
            println!("Rules workspace: {}", path.display());
        }
        Some(Commands::ApplyRules) => {
            let descriptor = load_ruleset(&ruleset_path)?;
            let workspaces = WorkspaceStore::from_env()?;
            workspace::push_workspace_changes(&git, &workspaces, &descriptor.source)?;

            let options = ComposeOptions {
                refresh: true,
                rules_root,
            };
            let output = compose(&git, &cache, &ruleset_path, &root, &options)?;
            println!("Composed agent rules:\n- {}", output);
        }
        None => {
            let options = ComposeOptions {
                refresh: cli.refresh,
                rules_root,
            };
            let output = compose(&git, &cache, &ruleset_path, &root, &options)?;
            println!("Composed agent rules:\n- {}", output);
        }
    }

    Ok(())
}

/// Find the descriptor: an explicit `--ruleset` path (which must exist) or
/// `<root>/<ruleset-name>`.
fn locate_ruleset(cli: &Cli, root: &Path) -> Result<PathBuf> {
    if let Some(explicit) = &cli.ruleset {
        let resolved = resolve_from(root, explicit);
        ensure_file(&resolved)?;
        return Ok(resolved);
    }

    let name = cli
        .ruleset_name
        .clone()
        .unwrap_or_else(|| DEFAULT_RULESET_NAME.to_string());
    let candidate = root.join(&name);
    if !candidate.exists() {
        return Err(ComposeError::MissingRuleset(candidate).into());
    }
    Ok(candidate)
}
