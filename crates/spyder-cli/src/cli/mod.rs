//! CLI argument parsing and command dispatch.

pub mod args;

use anyhow::{Context as _, Result};
use args::{Cli, Commands, ConfigCommands, ScanArgs};
use clap::Parser;
use colored::Colorize;
use spyder::{CancellationToken, CandidateSource, CertStream, Engine, Mode, ResolverPool};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::output::{self, OutputFormat};

/// Run the CLI application.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);
    if cli.no_color {
        colored::control::set_override(false);
    }

    // Load configuration
    let config = Config::load()?;

    // Determine output format
    let output_format = cli
        .output
        .or(config.output_format)
        .unwrap_or(OutputFormat::Pretty);

    match cli.command {
        Some(Commands::Config(args)) => show_config(&config, args.command, output_format),
        None => enumerate(config, cli.scan, output_format).await,
    }
}

/// Log to stderr so stdout carries only results.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A subscriber may already be installed when embedded.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Apply command-line overrides on top of the file configuration.
fn apply_overrides(config: &mut Config, scan: &ScanArgs) {
    if !scan.resolvers.is_empty() {
        config.resolver.resolvers.clone_from(&scan.resolvers);
    }
    if let Some(ms) = scan.rate_limit {
        config.resolver.min_interval_ms = ms;
    }
    if let Some(threads) = scan.threads {
        config.engine.brute_concurrency = threads;
    }
    if let Some(depth) = scan.depth {
        config.engine.max_depth = depth;
    }
    if let Some(secs) = scan.passive_window {
        config.engine.passive_window_secs = secs;
    }
}

async fn enumerate(mut config: Config, scan: ScanArgs, format: OutputFormat) -> Result<()> {
    let target = scan.domain.clone().ok_or_else(|| {
        anyhow::anyhow!(
            "Target domain required.\n\n\
             Usage:\n  \
             spyder -d example.com [--mode active|passive|both] [-w wordlist]"
        )
    })?;
    apply_overrides(&mut config, &scan);

    let pool = ResolverPool::from_config(&config.resolver).context("Invalid resolver settings")?;
    info!(
        resolvers = pool.len(),
        min_interval_ms = config.resolver.min_interval_ms,
        "resolver pool ready"
    );

    let mut engine = Engine::new(Arc::new(pool), config.engine.clone());
    if scan.mode.is_passive() {
        let feed = CertStream::new(&config.engine.certstream_url)
            .context("Invalid certstream URL")?;
        engine = engine.with_passive_source(feed);
    }

    let cancel = CancellationToken::new();
    spawn_cancel_triggers(&cancel, Duration::from_secs(scan.timeout.saturating_mul(60)));

    let found = engine
        .run(
            &target,
            scan.mode,
            &CandidateSource::file(&scan.wordlist),
            &cancel,
        )
        .await
        .with_context(|| match scan.mode {
            Mode::Passive => format!("Enumeration of {target} failed"),
            Mode::Active | Mode::Both => format!(
                "Enumeration of {target} failed (wordlist: {})",
                scan.wordlist.display()
            ),
        })?;
    cancel.cancel();

    print!("{}", output::render(&found, &target, format)?);

    if let Some(path) = &scan.out {
        output::write_names(&found, path)
            .with_context(|| format!("Cannot write {}", path.display()))?;
        info!(path = %path.display(), count = found.len(), "results written");
    }

    Ok(())
}

/// Cancel `cancel` on Ctrl-C or once `limit` elapses.
fn spawn_cancel_triggers(cancel: &CancellationToken, limit: Duration) {
    let token = cancel.clone();
    tokio::spawn(async move {
        tokio::select! {
            () = token.cancelled() => {}
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    warn!(error = %e, "cannot listen for Ctrl-C");
                    return;
                }
                warn!("interrupted, returning partial results");
                token.cancel();
            }
        }
    });

    let token = cancel.clone();
    tokio::spawn(async move {
        tokio::select! {
            () = token.cancelled() => {}
            () = tokio::time::sleep(limit) => {
                warn!(minutes = limit.as_secs() / 60, "timeout reached, returning partial results");
                token.cancel();
            }
        }
    });
}

/// Write `config` to `path`, refusing to replace a file unless `force`.
fn init_config(config: &Config, path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {}\n\n\
             Use --force to overwrite it.",
            path.display()
        );
    }
    config.save_to(path)
}

fn show_config(config: &Config, command: ConfigCommands, format: OutputFormat) -> Result<()> {
    match command {
        ConfigCommands::Path => {
            println!("{}", Config::path()?.display());
        }
        ConfigCommands::Init { force } => {
            let path = Config::path()?;
            init_config(config, &path, force)?;
            println!("{} Configuration written to {}.", "Success:".green().bold(), path.display());
        }
        ConfigCommands::Show => match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
            OutputFormat::Plain => print!("{}", toml::to_string_pretty(config)?),
            OutputFormat::Pretty => {
                println!("{}", "Current Configuration:".bold());
                println!();
                println!(
                    "  {} {}",
                    "resolvers:".bold(),
                    config.resolver.resolvers.join(", ")
                );
                println!("  {} {}ms", "timeout:".bold(), config.resolver.timeout_ms);
                println!(
                    "  {} {}ms",
                    "min_interval:".bold(),
                    config.resolver.min_interval_ms
                );
                println!("  {} {}", "max_attempts:".bold(), config.resolver.max_attempts);
                println!(
                    "  {} {}",
                    "brute_concurrency:".bold(),
                    config.engine.brute_concurrency
                );
                println!(
                    "  {} {}",
                    "expand_concurrency:".bold(),
                    config.engine.expand_concurrency
                );
                println!("  {} {}", "max_depth:".bold(), config.engine.max_depth);
                println!(
                    "  {} {}",
                    "passive_window:".bold(),
                    config
                        .engine
                        .passive_window_duration()
                        .map_or_else(|| "unbounded".to_string(), |w| format!("{}s", w.as_secs()))
                );
                println!("  {} {}", "certstream_url:".bold(), config.engine.certstream_url);
                println!(
                    "  {} {}",
                    "output_format:".bold(),
                    config.output_format.unwrap_or_default()
                );
            }
        },
    }

    Ok(())
}
