// SPDX-FileCopyrightText: 2026 Harvest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Harvest - resumable channel ingestion with link extraction.
//!
//! This is the binary entry point: it ingests one channel into the local
//! store, then writes the top-domains report.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod run;
mod shutdown;
mod summary;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

/// Harvest - ingest a channel and report the most mentioned domains.
#[derive(Parser, Debug)]
#[command(name = "harvest", version, about, long_about = None)]
struct Cli {
    /// Channel identifier understood by the source gateway (e.g. `@news`).
    #[arg(long)]
    channel: String,

    /// Load this configuration file instead of the standard lookup chain.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of domains in the report (overrides `report.top_k`).
    #[arg(long, value_parser = parse_top_k)]
    top_k: Option<usize>,

    /// Disable colors in the terminal summary.
    #[arg(long)]
    plain: bool,
}

fn parse_top_k(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(k) => Ok(k),
        Err(e) => Err(e.to_string()),
    }
}

// Messages of one run are processed cooperatively on a single thread.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => harvest_config::load_and_validate_path(path),
        None => harvest_config::load_and_validate(),
    };
    let mut config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            harvest_config::render_errors(&errors);
            return ExitCode::FAILURE;
        }
    };
    if let Some(top_k) = cli.top_k {
        config.report.top_k = top_k;
    }

    init_tracing(&config.harvest.log_level);
    info!(channel = %cli.channel, "starting harvest");

    match run::run(&config, &cli.channel).await {
        Ok(outcome) => {
            let use_color = !cli.plain && std::io::stdout().is_terminal();
            print!(
                "{}",
                summary::format_summary(&outcome, use_color, config.report.chart_width)
            );
            if outcome.is_interrupted() {
                ExitCode::from(130)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            error!(channel = %cli.channel, error = %e, "harvest failed");
            eprintln!("harvest: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize the tracing subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("harvest={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = harvest_config::load_and_validate_str("").unwrap();
        assert_eq!(config.report.top_k, 10);
        assert_eq!(config.ingest.batch_size, 100);
    }

    #[test]
    fn cli_requires_a_channel() {
        assert!(Cli::try_parse_from(["harvest"]).is_err());

        let cli = Cli::try_parse_from(["harvest", "--channel", "@news"]).unwrap();
        assert_eq!(cli.channel, "@news");
        assert!(cli.config.is_none());
        assert!(cli.top_k.is_none());
        assert!(!cli.plain);
    }

    #[test]
    fn cli_accepts_overrides() {
        let cli = Cli::try_parse_from([
            "harvest",
            "--channel",
            "@news",
            "--config",
            "/tmp/harvest.toml",
            "--top-k",
            "5",
            "--plain",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/harvest.toml")));
        assert_eq!(cli.top_k, Some(5));
        assert!(cli.plain);
    }

    #[test]
    fn cli_rejects_zero_top_k() {
        let result = Cli::try_parse_from(["harvest", "--channel", "@news", "--top-k", "0"]);
        assert!(result.is_err());
    }
}
