//! sojourn ingestion binary.
//!
//! Reads `sojourn.toml` (or the path given with `--config`) plus `SOJOURN_*`
//! environment variables, opens the SQLite store, and runs either today's
//! cycle or a backfill. Meant to be driven by a scheduler (cron, systemd
//! timer):
//!
//! ```text
//! sojourn today
//! sojourn backfill --days 7
//! ```
//!
//! Reports are printed to stdout as JSON. The process exits non-zero when a
//! run fails or any backfilled day fails.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use sojourn_core::session::StaticSession;
use sojourn_ingest::{
  IngestConfig,
  pipeline::{Pipeline, PipelineOptions},
  places::{PlacesClient, PlacesConfig},
  track::HttpTrackSource,
};
use sojourn_store_sqlite::SqliteStore;
use tokio_util::sync::CancellationToken;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Sojourn location-history ingestion")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "sojourn.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Ingest today's track.
  Today,
  /// Ingest the last N days, today included.
  Backfill {
    #[arg(short, long, default_value_t = 7)]
    days: u32,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("SOJOURN"))
    .build()
    .context("failed to read config file")?;

  let cfg: IngestConfig = settings
    .try_deserialize()
    .context("failed to deserialise IngestConfig")?;

  let store_path = expand_tilde(&cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let source = HttpTrackSource::from_config(&cfg).context("failed to build track client")?;
  let resolver =
    PlacesClient::new(PlacesConfig::from(&cfg)).context("failed to build places client")?;

  let pipeline = Pipeline::new(
    StaticSession::new(cfg.session_cookie.clone()),
    source,
    resolver,
    Arc::new(store),
    PipelineOptions::from(&cfg),
  );

  // Ctrl-C stops new work; committed stays remain.
  let cancel = CancellationToken::new();
  tokio::spawn({
    let cancel = cancel.clone();
    async move {
      if tokio::signal::ctrl_c().await.is_ok() {
        tracing::warn!("interrupted; cancelling");
        cancel.cancel();
      }
    }
  });

  match cli.command {
    Command::Today => {
      let report = pipeline
        .run_today(&cancel)
        .await
        .context("today's ingestion failed")?;
      println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Command::Backfill { days } => {
      let report = pipeline
        .run_backfill(days, &cancel)
        .await
        .context("backfill failed")?;

      let succeeded: Vec<_> = report.succeeded().collect();
      println!("{}", serde_json::to_string_pretty(&succeeded)?);

      let failed: Vec<_> = report.failures().collect();
      for (date, error) in &failed {
        eprintln!("{date}: {error}");
      }
      if !failed.is_empty() {
        anyhow::bail!("{} of {} days failed", failed.len(), report.days.len());
      }
    }
  }

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
