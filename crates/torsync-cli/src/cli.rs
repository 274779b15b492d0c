//! Argument parsing and the migrate command.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tokio::sync::watch;
use torsync_clients::{QbittorrentAdapter, TransmissionAdapter};
use torsync_config::{DEFAULT_CONFIG_PATH, MigrationConfig, load_config};
use torsync_core::{ClientAdapter, MigrationRunner, MigrationSettings, render_report};
use torsync_telemetry::{LogFormat, LoggingConfig, TelemetryError, init_logging};
use tracing::{info, warn};

use crate::error::{CliError, CliResult, EXIT_FAILURE, EXIT_INTERRUPTED};

const DEFAULT_TEMP_DIR: &str = ".migration-state";

#[derive(Parser, Debug)]
#[command(
    name = "torsync",
    about = "Migrate torrents between Transmission and qBittorrent",
    version
)]
pub(crate) struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Migration direction.
    #[arg(short, long, value_enum)]
    direction: Direction,
    /// Show what would be migrated without changing either client.
    #[arg(short = 'n', long)]
    dry_run: bool,
    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
    /// Scratch directory for exported `.torrent` files.
    #[arg(short, long, default_value = DEFAULT_TEMP_DIR)]
    temp_dir: PathBuf,
    /// Log output format; inferred from the build profile when omitted.
    #[arg(long, value_parser = parse_log_format)]
    log_format: Option<LogFormat>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Direction {
    /// Transmission to qBittorrent.
    #[value(name = "tr2qb")]
    Tr2qb,
    /// qBittorrent to Transmission.
    #[value(name = "qb2tr")]
    Qb2tr,
}

fn parse_log_format(input: &str) -> Result<LogFormat, String> {
    input.parse().map_err(|err: TelemetryError| err.to_string())
}

/// Parses CLI arguments, runs the migration, and prints the report.
/// Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let logging = LoggingConfig::for_verbosity(cli.verbose, cli.log_format);
    if let Err(err) = init_logging(&logging) {
        eprintln!("error: {err}");
        return EXIT_FAILURE;
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let signal_task = tokio::spawn(watch_interrupts(shutdown_tx));

    let result = execute(&cli, shutdown_rx).await;
    signal_task.abort();

    match result {
        Ok(exit_code) => exit_code,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            EXIT_FAILURE
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interrupt {
    /// Finish the torrent in flight, then stop.
    Graceful,
    /// Exit immediately.
    Force,
}

const fn interrupt_action(received: u32) -> Interrupt {
    if received <= 1 {
        Interrupt::Graceful
    } else {
        Interrupt::Force
    }
}

async fn watch_interrupts(shutdown: watch::Sender<bool>) {
    let mut received = 0_u32;
    while tokio::signal::ctrl_c().await.is_ok() {
        received = received.saturating_add(1);
        match interrupt_action(received) {
            Interrupt::Graceful => {
                warn!("interrupt received; finishing the current torrent before stopping");
                eprintln!("Press Ctrl+C again to force exit immediately.");
                shutdown.send_replace(true);
            }
            Interrupt::Force => {
                eprintln!("forced exit");
                std::process::exit(EXIT_INTERRUPTED);
            }
        }
    }
}

async fn execute(cli: &Cli, shutdown: watch::Receiver<bool>) -> CliResult<i32> {
    let config =
        load_config(&cli.config).map_err(|err| CliError::validation(err.to_string()))?;

    fs::create_dir_all(&cli.temp_dir)
        .with_context(|| {
            format!(
                "failed to create scratch directory {}",
                cli.temp_dir.display()
            )
        })
        .map_err(CliError::failure)?;

    let mut qbittorrent = qbittorrent_adapter(&config)?;
    let mut transmission = transmission_adapter(&config)?;
    connect(&mut qbittorrent).await?;
    connect(&mut transmission).await?;

    let (source, destination): (&dyn ClientAdapter, &dyn ClientAdapter) = match cli.direction {
        Direction::Tr2qb => (&transmission, &qbittorrent),
        Direction::Qb2tr => (&qbittorrent, &transmission),
    };
    info!(
        source = %source.kind(),
        destination = %destination.kind(),
        dry_run = cli.dry_run,
        "starting migration"
    );

    let settings = MigrationSettings {
        dry_run: cli.dry_run,
        pause_source: config.migration.pause_source,
        skip_checking_complete: config.migration.skip_checking_complete,
        rate_limit_sleep: config.migration.rate_limit_delay(),
        scratch_dir: cli.temp_dir.clone(),
    };
    let report = MigrationRunner::new(source, destination, settings)
        .with_shutdown(shutdown)
        .run()
        .await
        .map_err(CliError::failure)?;

    println!("{}", render_report(&report));
    Ok(report.exit_code())
}

fn qbittorrent_adapter(config: &MigrationConfig) -> CliResult<QbittorrentAdapter> {
    let settings = &config.qbittorrent;
    let base_url = settings
        .base_url()
        .map_err(|err| CliError::validation(err.to_string()))?;
    QbittorrentAdapter::new(
        base_url,
        settings.username.clone(),
        settings.password.expose(),
        settings.timeout(),
    )
    .map_err(CliError::failure)
}

fn transmission_adapter(config: &MigrationConfig) -> CliResult<TransmissionAdapter> {
    let settings = &config.transmission;
    let rpc_url = settings
        .rpc_url()
        .map_err(|err| CliError::validation(err.to_string()))?;
    let credentials = settings
        .credentials()
        .map(|(username, password)| (username.to_string(), password.to_string()));
    TransmissionAdapter::new(
        rpc_url,
        credentials,
        settings.torrent_dir.clone(),
        settings.timeout(),
    )
    .map_err(CliError::failure)
}

async fn connect(adapter: &mut dyn ClientAdapter) -> CliResult<()> {
    let client = adapter.kind();
    let version = adapter.connect().await.map_err(|err| {
        CliError::failure(anyhow::Error::new(err).context(format!("could not connect to {client}")))
    })?;
    info!(
        %client,
        version = %version.version,
        api_version = version.api_version.as_deref().unwrap_or("n/a"),
        "connected"
    );
    Ok(())
}
