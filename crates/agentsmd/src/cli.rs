//! Command-line interface definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Compose agent instruction files from shared markdown rule fragments.
///
/// Without a subcommand, reads the project's ruleset descriptor, resolves
/// its rule source (a local directory or a cached GitHub checkout), and
/// writes the merged instructions file.
///
/// Exit codes: 0 on success, 1 on any error.
#[derive(Parser)]
#[command(name = "agentsmd")]
#[command(about = "Compose agent instruction files from shared rule fragments", long_about = None)]
pub struct Cli {
    /// Project root to operate in (default: current directory)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Explicit ruleset descriptor file
    #[arg(long, global = true)]
    pub ruleset: Option<PathBuf>,

    /// Descriptor filename searched under the project root
    #[arg(long, global = true)]
    pub ruleset_name: Option<String>,

    /// Compose from this rules root, bypassing source resolution
    /// (the AGENT_RULES_ROOT environment variable does the same; the flag wins)
    #[arg(long, global = true)]
    pub rules_root: Option<PathBuf>,

    /// Force re-fetch of any GitHub-sourced cache entry before composing
    #[arg(long, global = true)]
    pub refresh: bool,

    /// Delete the entire cache root and exit without composing
    #[arg(long)]
    pub clear_cache: bool,

    /// Print the ruleset descriptor JSON schema and exit
    #[arg(long)]
    pub schema: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ensure a persistent, editable checkout of the rule source and
    /// report its path
    EditRules,

    /// Push workspace rule changes upstream, then recompose with a forced
    /// refresh
    ApplyRules,
}
