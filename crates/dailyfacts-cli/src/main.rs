//! `dailyfacts`: the Daily Facts delivery agent.
//!
//! # Usage
//!
//! ```text
//! dailyfacts init
//! dailyfacts fact
//! dailyfacts settings --categories space,animals --time 08:30
//! dailyfacts run
//! ```

mod alarm;
mod app;
mod client;
mod notify;


use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use app::App;
use chrono::Local;
use clap::{Args as ClapArgs, Parser, Subcommand};
use client::{ApiClient, ApiConfig};
use dailyfacts_core::{delivery::{Background, SettingsUpdate}, pause::PauseRequest};
use dailyfacts_store_sqlite::SqliteStore;
use notify::ConsoleNotifier;
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const DEFAULT_URL: &str = "http://localhost:3000";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "dailyfacts", version, about = "A new fact every day")]
struct Args {
  /// Path to a TOML config file (url, state_path).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the Daily Facts backend.
  #[arg(long, env = "DAILYFACTS_URL")]
  url: Option<String>,

  /// Local state database.
  #[arg(long, env = "DAILYFACTS_STATE", value_name = "FILE")]
  state: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Write default settings (existing values are kept).
  Init,
  /// Get a fact now. Counts against the free daily limit.
  Fact,
  /// Show a fact you have not seen recently, without using the daily limit.
  Browse {
    /// Allow facts shown within the last 180 days.
    #[arg(long)]
    recycle: bool,
  },
  /// Save the fact most recently shown.
  Save,
  /// Manage saved facts.
  Saved {
    #[command(subcommand)]
    action: Option<SavedAction>,
  },
  /// Pause scheduled notifications.
  Pause(PauseArgs),
  /// Resume scheduled notifications.
  Resume,
  /// Show or change settings.
  Settings {
    /// Comma-separated category names, or `all`.
    #[arg(long, value_delimiter = ',')]
    categories: Option<Vec<String>>,
    /// Daily notification time, `HH:MM`.
    #[arg(long)]
    time: Option<String>,
  },
  /// Activate Premium with a completed payment.
  Upgrade {
    payment_intent_id: String,
  },
  /// Show plan, quota, pause and schedule.
  Status,
  /// List categories; selected ones are marked.
  Categories,
  /// Run in the foreground and deliver the daily fact on schedule.
  Run,
}

#[derive(Subcommand, Debug)]
enum SavedAction {
  List,
  Remove { id: String },
  Clear,
}

#[derive(ClapArgs, Debug)]
#[group(required = true, multiple = false)]
struct PauseArgs {
  /// Until 9 AM tomorrow.
  #[arg(long)]
  tomorrow: bool,
  /// Until `resume`.
  #[arg(long)]
  indefinitely: bool,
  /// For this many minutes.
  #[arg(long, value_name = "N")]
  minutes: Option<i64>,
}

impl PauseArgs {
  fn request(&self) -> dailyfacts_core::Result<PauseRequest> {
    match self.minutes {
      Some(minutes) => app::timed_pause(minutes),
      None if self.tomorrow => Ok(PauseRequest::Tomorrow),
      None => Ok(PauseRequest::Manual),
    }
  }
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default, Debug, PartialEq)]
struct ConfigFile {
  #[serde(default)]
  url:        String,
  state_path: Option<PathBuf>,
}

fn default_config_path() -> Option<PathBuf> {
  dirs::config_dir().map(|d| d.join("dailyfacts").join("config.toml"))
}

fn default_state_path() -> PathBuf {
  dirs::data_dir()
    .unwrap_or_else(|| PathBuf::from("."))
    .join("dailyfacts")
    .join("agent.db")
}

fn load_config(explicit: Option<&Path>) -> Result<ConfigFile> {
  let path = match explicit {
    Some(path) => path.to_path_buf(),
    None => match default_config_path().filter(|p| p.exists()) {
      Some(path) => path,
      None => return Ok(ConfigFile::default()),
    },
  };
  let raw = std::fs::read_to_string(&path)
    .with_context(|| format!("reading config file {}", path.display()))?;
  toml::from_str(&raw).context("parsing config file")
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();
  let file_cfg = load_config(args.config.as_deref())?;

  // CLI flags override config file, which overrides defaults.
  let base_url = args
    .url
    .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
    .unwrap_or_else(|| DEFAULT_URL.to_string());
  let state_path = expand_tilde(
    &args
      .state
      .or(file_cfg.state_path)
      .unwrap_or_else(default_state_path),
  );

  if let Some(parent) = state_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("creating {}", parent.display()))?;
  }
  let store = SqliteStore::open(&state_path)
    .await
    .with_context(|| format!("opening state at {}", state_path.display()))?;
  let client = ApiClient::new(ApiConfig { base_url }).context("building HTTP client")?;
  let notifier = ConsoleNotifier { timestamps: matches!(args.command, Command::Run) };

  let app = App::new(Background::new(store, client, notifier, Local));

  if let Err(e) = dispatch(&app, args.command).await {
    tracing::debug!(error = ?e, "command failed");
    eprintln!("{}", e.user_message());
    std::process::exit(1);
  }
  Ok(())
}

async fn dispatch(app: &App, command: Command) -> dailyfacts_core::Result<()> {
  match command {
    Command::Init => app.init().await,
    Command::Fact => app.fact().await.map(drop),
    Command::Browse { recycle } => app.browse(recycle).await.map(drop),
    Command::Save => app.save().await,
    Command::Saved { action } => match action.unwrap_or(SavedAction::List) {
      SavedAction::List => app.saved_list().await,
      SavedAction::Remove { id } => app.saved_remove(&id).await.map(drop),
      SavedAction::Clear => app.saved_clear().await,
    },
    Command::Pause(pause) => app.pause(pause.request()?).await.map(drop),
    Command::Resume => app.resume().await,
    Command::Settings { categories, time } => app
      .settings(SettingsUpdate { categories, notification_time: time })
      .await
      .map(drop),
    Command::Upgrade { payment_intent_id } => app.upgrade(&payment_intent_id).await.map(drop),
    Command::Status => app.status().await.map(drop),
    Command::Categories => app.categories().await,
    Command::Run => app.run().await,
  }
}
