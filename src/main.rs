mod app;
mod catalog;
mod cli;
mod config;
mod db;
mod event;
mod local;
mod logging;
mod offline;
mod task;
mod ui;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use catalog::{AnySource, CatalogController};
use config::Config;
use local::{KeyValueStore, MemoryStore, SqliteStore};
use logging::LogTarget;
use offline::{HttpNetwork, OfflineAgent, SiteAgent, SqliteStorage};
use ui::views::CatalogView;

#[derive(Parser, Debug)]
#[command(name = "ug9x")]
#[command(about = "Browse the Unblocked Games 9x catalog from the terminal")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./ug9x.yaml or $XDG_CONFIG_HOME/ug9x/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Site base URL
  #[arg(short, long)]
  url: Option<String>,

  /// Catalog location: URL, file path, or path relative to the site
  #[arg(long)]
  catalog: Option<String>,

  #[command(subcommand)]
  command: Option<cli::Command>,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let mut config = Config::load(args.config.as_deref())?;

  // Command line overrides the file
  if let Some(url) = args.url {
    config.base_url = url;
  }
  if let Some(catalog) = args.catalog {
    config.catalog = catalog;
  }
  let base = config.base()?;

  let target = if args.command.is_some() {
    LogTarget::Stderr
  } else {
    LogTarget::File
  };
  let _log_guard = logging::init(&config, target)?;

  let db_path = db::default_path()?;
  let client = build_client()?;
  let source = AnySource::resolve(&config.catalog, &base, client.clone())?;
  let store = open_store(&db_path);

  match args.command {
    None => run_browser(config, store, source, &db_path, client).await,
    Some(command) => {
      let mut out = std::io::stdout();
      match command {
        cli::Command::List(list_args) => {
          let ctx = cli::Context {
            config,
            store,
            source,
          };
          cli::list(&ctx, list_args, &mut out).await
        }
        cli::Command::Favorite { slug } => {
          let ctx = cli::Context {
            config,
            store,
            source,
          };
          cli::favorite(&ctx, slug.as_deref(), &mut out).await
        }
        cli::Command::Report { text } => cli::report(store.as_ref(), &text, &mut out),
        cli::Command::Cache { action } => {
          let agent = open_agent(&config, &db_path, client)?;
          cli::cache(&agent, &base, action, &mut out).await
        }
      }
    }
  }
}

fn build_client() -> Result<reqwest::Client> {
  reqwest::Client::builder()
    .user_agent(concat!("ug9x/", env!("CARGO_PKG_VERSION")))
    .build()
    .map_err(|e| eyre!("Failed to build HTTP client: {}", e))
}

/// Preferences database, falling back to memory so the browser still works
/// when the file cannot be opened.
fn open_store(path: &Path) -> Arc<dyn KeyValueStore> {
  match SqliteStore::open(path) {
    Ok(store) => Arc::new(store),
    Err(e) => {
      tracing::warn!("Preferences will not persist: {}", e);
      Arc::new(MemoryStore::new())
    }
  }
}

fn open_agent(config: &Config, db_path: &Path, client: reqwest::Client) -> Result<SiteAgent> {
  let manifest = SiteAgent::manifest_from_paths(&config.base()?, &config.offline.assets)?;
  let storage = SqliteStorage::open(db_path)?;
  Ok(OfflineAgent::new(
    storage,
    HttpNetwork::new(client),
    config.cache_version(),
    manifest,
  ))
}

async fn run_browser(
  config: Config,
  store: Arc<dyn KeyValueStore>,
  source: AnySource,
  db_path: &Path,
  client: reqwest::Client,
) -> Result<()> {
  let agent = if config.offline.enabled {
    match open_agent(&config, db_path, client) {
      Ok(agent) => Some(Arc::new(agent)),
      Err(e) => {
        tracing::warn!("Offline cache disabled: {}", e);
        None
      }
    }
  } else {
    None
  };

  let controller = CatalogController::new(store, config.play_page_url()?);
  let mut view: CatalogView<SqliteStorage, HttpNetwork> =
    CatalogView::new(controller, source, config.base_url.clone(), agent);
  view.start();

  tracing::info!("Starting browser for {}", config.base_url);
  let mut app = app::App::new(Box::new(view));
  app.run().await
}
