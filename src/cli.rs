//! CLI command definitions and argument parsing.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DiagConfig;
use crate::layout::validate_bundle_name;

/// Host diagnostic collector.
///
/// Gathers network state, resource usage, OS configuration and product
/// snapshots into a single archive for offline support analysis. Running
/// without a subcommand performs a full collection.
#[derive(Parser, Debug)]
#[command(name = "hostdiag")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (can be repeated for more verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file
    #[arg(short, long, global = true, env = "HOSTDIAG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute (defaults to collect)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Collect diagnostics into an archive
    Collect(CollectArgs),

    /// List the checks registered for this platform
    Checks,

    /// Show the detected platform
    Platform,
}

/// Arguments for the collect command.
#[derive(Args, Debug, Default, Clone)]
pub struct CollectArgs {
    /// Directory for the bundle tree and archive
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Bundle name (default: <prefix>-<hostname>-<timestamp>)
    #[arg(short, long, value_parser = parse_bundle_name)]
    pub name: Option<String>,

    /// Product installation directory to snapshot
    #[arg(long, env = "HOSTDIAG_PRODUCT_HOME")]
    pub product_home: Option<PathBuf>,

    /// Keep the bundle tree after archiving
    #[arg(long)]
    pub keep_tree: bool,

    /// Redact IP and MAC addresses, usernames and home paths from captured output
    #[arg(long)]
    pub redact: bool,

    /// Free space required in the output directory, in MiB
    #[arg(long)]
    pub min_free_mb: Option<u64>,
}

fn parse_bundle_name(name: &str) -> Result<String, String> {
    validate_bundle_name(name)
        .map(|()| name.to_string())
        .map_err(|e| e.to_string())
}

impl CollectArgs {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut DiagConfig) {
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(home) = &self.product_home {
            config.product.home = Some(home.clone());
        }
        if self.keep_tree {
            config.keep_tree = true;
        }
        if self.redact {
            config.redaction.enabled = true;
        }
        if let Some(mb) = self.min_free_mb {
            config.min_free_mb = mb;
        }
    }
}
