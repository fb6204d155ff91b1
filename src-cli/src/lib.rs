//! Spiralscan command-line shell.
//!
//! This is the thin shell that loads configuration, sets up logging and hands
//! over to the scanner crate. Scanning logic lives in `crates/`.

mod replay;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use spiralscan_core::AppConfig;
use spiralscan_scanner::{
    estimated_cycle_time, scan_jobs, MapObjectsClient, ScanCoordinator, ScanSettings, TracingSink,
};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub use replay::ReplayClient;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "spiralscan", version, about = "Spiral scanning for short-lived map sightings")]
pub struct Cli {
    /// Config file; defaults to the platform config directory
    #[arg(long, short, env = "SPIRALSCAN_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the spiral layout and how it is split across accounts
    Plan {
        /// Dump every coordinate as JSON
        #[arg(long)]
        json: bool,
    },
    /// Scan against recorded map-objects responses
    Scan {
        /// JSON array of responses; `null` entries simulate transport errors
        #[arg(long)]
        replay: PathBuf,
    },
}

/// Initialize tracing subscriber for logging
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,spiralscan=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}

/// Parse arguments and run the selected command.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    info!("Starting Spiralscan v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Plan { json } => plan(&config, json),
        Command::Scan { replay } => {
            let runtime = tokio::runtime::Runtime::new().context("failed to start runtime")?;
            runtime.block_on(scan(&config, &replay))
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = AppConfig::load_with_env(path).context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Lay out the spiral and print it.
pub fn plan(config: &AppConfig, as_json: bool) -> Result<()> {
    if config.accounts.is_empty() {
        bail!("no accounts configured");
    }

    let settings = ScanSettings::from(config);
    let coordinates = settings.spiral().generate(settings.origin);
    let jobs = scan_jobs(&coordinates, config.accounts.len())?;

    if as_json {
        let partitions: Vec<_> = jobs
            .iter()
            .zip(&config.accounts)
            .map(|(job, account)| {
                json!({
                    "account": account.username,
                    "coordinates": job.coordinates,
                })
            })
            .collect();
        let plan = json!({
            "origin": settings.origin,
            "coordinates": coordinates.len(),
            "partitions": partitions,
        });
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    let cycle = estimated_cycle_time(&jobs, settings.poller.cadence);

    println!("Origin:       {}", settings.origin);
    println!("Coordinates:  {}", coordinates.len());
    println!("Cells/query:  {}", 2 * settings.poller.cell_radius + 1);
    for (job, account) in jobs.iter().zip(&config.accounts) {
        println!(
            "  {:<20} {} coordinates",
            account.username,
            job.coordinates.len()
        );
    }
    println!("Full cycle:   ~{} seconds", cycle.as_secs());
    Ok(())
}

/// Run the coordinator with one replay client per configured account until
/// interrupted.
pub async fn scan(config: &AppConfig, replay: &Path) -> Result<()> {
    let responses = ReplayClient::load_responses(replay)?;

    let clients: Vec<Arc<dyn MapObjectsClient>> = config
        .accounts
        .iter()
        .map(|account| {
            Arc::new(ReplayClient::new(&account.username, Arc::clone(&responses)))
                as Arc<dyn MapObjectsClient>
        })
        .collect();

    let watch_list = config.watch_list();
    let names = config.species_names();
    let unnamed = names.missing_from(&watch_list);
    if !unnamed.is_empty() {
        warn!("Watched species without a name: {:?}", unnamed);
    }

    let coordinator = ScanCoordinator::new(
        &ScanSettings::from(config),
        clients,
        Arc::new(watch_list),
        Arc::new(TracingSink::new(Arc::new(names))),
    )
    .context("failed to set up scan")?;

    let cancel = coordinator.cancellation_token();
    tokio::spawn(stop_on_interrupt(tokio::signal::ctrl_c(), cancel));

    coordinator.run().await;
    Ok(())
}

/// Cancel `cancel` once `interrupt` fires. If the signal cannot be watched
/// the scan keeps running.
async fn stop_on_interrupt<F>(interrupt: F, cancel: CancellationToken)
where
    F: Future<Output = std::io::Result<()>>,
{
    match interrupt.await {
        Ok(()) => {
            info!("Interrupted, stopping workers");
            cancel.cancel();
        }
        Err(e) => warn!("Unable to listen for Ctrl-C, scan will not stop on interrupt: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spiralscan_core::{AccountConfig, AuthService};

    fn config_with_accounts(count: usize) -> AppConfig {
        let mut config = AppConfig::default();
        config.origin.latitude = 10.0;
        config.origin.longitude = 20.0;
        config.scanning.step_limit = 20;
        config.accounts = (0..count)
            .map(|i| AccountConfig {
                username: format!("walker{i}"),
                auth_service: AuthService::Ptc,
            })
            .collect();
        config
    }

    #[test]
    fn test_cli_parses_commands() {
        let cli = Cli::try_parse_from(["spiralscan", "plan", "--json"]).expect("parse plan");
        assert!(matches!(cli.command, Command::Plan { json: true }));

        let cli = Cli::try_parse_from([
            "spiralscan",
            "--config",
            "scan.toml",
            "scan",
            "--replay",
            "responses.json",
        ])
        .expect("parse scan");
        assert_eq!(cli.config, Some(PathBuf::from("scan.toml")));
        assert!(matches!(cli.command, Command::Scan { .. }));

        assert!(Cli::try_parse_from(["spiralscan", "scan"]).is_err());
    }

    #[test]
    fn test_plan_requires_accounts() {
        let err = plan(&config_with_accounts(0), false).expect_err("no accounts");
        assert!(err.to_string().contains("no accounts"));
    }

    #[test]
    fn test_plan_prints_for_accounts() {
        plan(&config_with_accounts(3), false).expect("plan");
        plan(&config_with_accounts(3), true).expect("plan json");
    }

    #[tokio::test]
    async fn test_interrupt_cancels_scan() {
        let cancel = CancellationToken::new();
        stop_on_interrupt(async { Ok(()) }, cancel.clone()).await;
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_unwatchable_interrupt_keeps_scan_running() {
        let cancel = CancellationToken::new();
        let unavailable = async { Err(std::io::Error::other("no signal handler")) };
        stop_on_interrupt(unavailable, cancel.clone()).await;
        assert!(!cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_scan_without_accounts_fails() {
        let tmp = tempfile::TempDir::new().expect("create temp dir");
        let replay = tmp.path().join("responses.json");
        std::fs::write(&replay, r#"[{"responses": {"GET_MAP_OBJECTS": {"status": 1}}}]"#)
            .expect("write replay file");

        let err = scan(&config_with_accounts(0), &replay)
            .await
            .expect_err("no workers");
        assert!(format!("{err:#}").contains("no authenticated workers"));
    }
}
