use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use maven_poller::config::{self, PollerConfig};
use maven_poller::poller::{PackageRevision, Poller};

#[derive(Parser)]
#[command(name = "maven-poller")]
#[command(version, about = "Poll a Maven repository for the latest artifact revision")]
struct Cli {
    /// Write logs to the data directory instead of stderr
    #[arg(long, global = true)]
    log_file: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the latest revision as JSON, or null
    Latest {
        #[arg(long)]
        config: PathBuf,
    },
    /// Print the latest revision if it differs from a known one
    Since {
        #[arg(long)]
        config: PathBuf,
        /// Previously reported revision, e.g. `1.2-SNAPSHOT (20160809.063223-25)`
        #[arg(long)]
        known: String,
        /// Timestamp of the previously reported revision (RFC 3339)
        #[arg(long)]
        known_timestamp: Option<DateTime<Utc>>,
    },
    /// Check connectivity to the repository and the package
    Check {
        #[arg(long)]
        config: PathBuf,
    },
}

fn init_logging(log_file: bool) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
    );

    if log_file {
        let path = config::log_path();
        let directory = path.parent().map(PathBuf::from).unwrap_or_default();
        let file_name = path.file_name().map(PathBuf::from).unwrap_or_default();
        let (writer, guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::never(directory, file_name));
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(writer),
            )
            .init();
        Some(guard)
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
        None
    }
}

fn load_poller(path: &Path) -> anyhow::Result<Poller> {
    let config = PollerConfig::from_file(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    Ok(Poller::from_config(config)?)
}

async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Latest { config } => {
            let revision = load_poller(&config)?.latest_revision().await?;
            println!("{}", serde_json::to_string_pretty(&revision)?);
        }
        Command::Since {
            config,
            known,
            known_timestamp,
        } => {
            let previously_known = PackageRevision::known(
                known,
                known_timestamp.unwrap_or(DateTime::<Utc>::MIN_UTC),
            );
            let revision = load_poller(&config)?
                .latest_modification_since(&previously_known)
                .await?;
            println!("{}", serde_json::to_string_pretty(&revision)?);
        }
        Command::Check { config } => {
            let status = load_poller(&config)?.check_package_connection().await;
            println!("{}", serde_json::to_string_pretty(&status)?);
            if !status.success {
                anyhow::bail!("connection check failed");
            }
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.log_file);

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli.command))
}
