mod api;
mod app;
mod cache;
mod commands;
mod config;
mod event;
mod grouping;
mod query;
mod suggest;
mod ui;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::config::StartView;

#[derive(Parser, Debug)]
#[command(name = "trove")]
#[command(about = "A terminal UI for the Trove personal item tracker")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/trove/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// View to open on startup: items or docs
  #[arg(short, long)]
  view: Option<String>,
}

/// Log to a file - the terminal belongs to the UI.
fn init_logging() -> Result<tracing_appender::non_blocking::WorkerGuard> {
  let log_dir = dirs::state_dir()
    .or_else(dirs::data_dir)
    .ok_or_else(|| eyre!("Could not determine a directory for logs"))?
    .join("trove");
  std::fs::create_dir_all(&log_dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", log_dir.display(), e))?;

  let appender = tracing_appender::rolling::never(log_dir, "trove.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _log_guard = init_logging()?;

  let mut config = config::Config::load(args.config.as_deref())?;

  // Override start view if specified on command line
  if let Some(view) = args.view.as_deref() {
    config.default_view = match view {
      "items" | "item" => StartView::Items,
      "docs" | "doc" | "documents" => StartView::Docs,
      other => return Err(eyre!("Unknown view '{}': expected items or docs", other)),
    };
  }

  let mut app = app::App::new(config)?;
  app.run().await?;

  Ok(())
}
