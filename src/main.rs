mod app;
mod cache;
mod config;
mod event;
mod store;
mod theme;
mod ui;

use clap::Parser;
use color_eyre::Result;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tuido")]
#[command(about = "A keyboard-driven terminal to-do list with offline asset caching")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/tuido/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Data directory for the task snapshot, theme, cache and log
  #[arg(short, long)]
  data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?;
  let data_dir = config.resolve_data_dir(args.data_dir.as_deref())?;
  std::fs::create_dir_all(&data_dir)?;

  // The terminal belongs to ratatui, so logs go to a file.
  let _guard = init_tracing(&data_dir);

  // Initialize and run the app
  let mut app = app::App::new(config, data_dir)?;
  app.run().await?;

  Ok(())
}

fn init_tracing(data_dir: &Path) -> tracing_appender::non_blocking::WorkerGuard {
  let file = tracing_appender::rolling::never(data_dir, "tuido.log");
  let (writer, guard) = tracing_appender::non_blocking(file);

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(writer)
    .with_ansi(false)
    .init();

  guard
}
