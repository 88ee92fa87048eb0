//! Host Diagnostic CLI
//!
//! Collects host diagnostics into a single archive. Running without
//! arguments performs a full collection with the configured defaults.

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use tracing_subscriber::EnvFilter;

use hostdiag::{
    cli::{Cli, CollectArgs, Commands},
    collect::Collector,
    config::{ConfigLoader, DiagConfig},
    platform::Platform,
    preflight, Error,
};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", style("error:").red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let default_level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let mut config = ConfigLoader::new(cli.config.clone())
        .load()
        .context("Failed to load configuration")?;

    match cli.command {
        None => run_collect(CollectArgs::default(), config, cli.quiet),
        Some(Commands::Collect(args)) => {
            args.apply(&mut config);
            run_collect(args, config, cli.quiet)
        }
        Some(Commands::Checks) => list_checks(config),
        Some(Commands::Platform) => show_platform(),
    }
}

/// Run the collect command.
fn run_collect(args: CollectArgs, config: DiagConfig, quiet: bool) -> Result<()> {
    config.validate().context("Invalid configuration")?;
    let platform = Platform::detect().context("Failed to detect platform")?;

    if !preflight::is_root() {
        tracing::warn!("Not running as root, some checks may be incomplete");
    }

    let collector = Collector::new(config, platform);
    let bundle_name = args.name.unwrap_or_else(|| collector.bundle_name());

    if !quiet {
        eprintln!(
            "{}",
            style(format!(
                "Collecting diagnostics for {} ({})...",
                collector.platform().hostname,
                collector.platform().os
            ))
            .cyan()
        );
    }

    let collection = match collector.run(&bundle_name) {
        Ok(collection) => collection,
        Err(Error::InsufficientSpace {
            path,
            available,
            required,
        }) => {
            anyhow::bail!(
                "Not enough free disk space in {}: {} MiB available, {} MiB required. \
                 Free up space or choose another directory with --output-dir.",
                path,
                available / (1024 * 1024),
                required / (1024 * 1024)
            );
        }
        Err(e) => return Err(e).context("Collection failed"),
    };

    if !quiet {
        let incomplete = collection.incomplete();
        if incomplete > 0 {
            eprintln!(
                "{}",
                style(format!(
                    "{} of {} checks did not complete, see summary.txt in the bundle",
                    incomplete,
                    collection.records.len()
                ))
                .yellow()
            );
        }
        if let Some(tree) = &collection.tree {
            eprintln!("Bundle tree kept at {}", tree.display());
        }
        eprintln!("{}", style("Diagnostics collected.").green());
    }

    println!("{}", collection.archive.path.display());
    Ok(())
}

/// List the checks registered for this platform.
fn list_checks(config: DiagConfig) -> Result<()> {
    config.validate().context("Invalid configuration")?;
    let platform = Platform::detect().context("Failed to detect platform")?;
    let collector = Collector::new(config, platform);

    for check in collector.checks() {
        println!(
            "{:<22} {:<40} {}",
            check.name,
            format!("{}/{}", check.category, check.output),
            check.action
        );
    }

    Ok(())
}

/// Show the detected platform.
fn show_platform() -> Result<()> {
    let platform = Platform::detect().context("Failed to detect platform")?;

    println!("{}", style("Platform").bold().cyan());
    println!("{}", style("=".repeat(30)).dim());
    println!("  OS family: {}", platform.os);
    println!(
        "  Package manager: {}",
        platform
            .package_manager
            .map(|pm| pm.to_string())
            .unwrap_or_else(|| "none".to_string())
    );
    println!("  Hostname: {}", platform.hostname);
    println!("  Architecture: {}", platform.arch);
    println!("  Root: {}", if preflight::is_root() { "yes" } else { "no" });

    Ok(())
}
