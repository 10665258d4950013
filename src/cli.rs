//! One-shot commands run instead of the terminal browser.

use clap::{Args, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::io::Write;
use std::sync::Arc;

use crate::catalog::{AnySource, CatalogController, CatalogSource, ToggleOutcome};
use crate::config::Config;
use crate::local::{KeyValueStore, Report};
use crate::offline::{AgentState, CacheStorage, Method, Network, OfflineAgent, Request};
use crate::ui::views::{EMPTY_MESSAGE, LOAD_ERROR_MESSAGE};
use url::Url;

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Print the catalog, filtered and sorted as the browser shows it
  List(ListArgs),
  /// Add a game to favorites, or remove it if already there. Without a slug,
  /// list the favorites
  Favorite {
    /// Slug of the game
    slug: Option<String>,
  },
  /// Save a problem report, or show the last one when no text is given
  Report {
    /// What went wrong
    text: Vec<String>,
  },
  /// Drive the offline asset cache
  Cache {
    #[command(subcommand)]
    action: CacheCommand,
  },
}

#[derive(Args, Debug, Default)]
pub struct ListArgs {
  /// Only show this category
  #[arg(long)]
  pub category: Option<String>,
  /// Case-insensitive match on title or tags
  #[arg(long)]
  pub search: Option<String>,
  /// Only show favorites
  #[arg(long)]
  pub favorites: bool,
}

#[derive(Subcommand, Debug)]
pub enum CacheCommand {
  /// Fetch every manifest asset into the current cache version
  Install,
  /// Delete every other cache version and start intercepting
  Activate,
  /// Install then activate
  Sync,
  /// Fetch a path through the agent and report where the answer came from
  Fetch {
    /// Path relative to the site, e.g. /styles.css
    path: String,
    /// HTTP method; only GET is answered from the cache
    #[arg(long, default_value = "GET")]
    method: String,
  },
  /// Show cache versions and their contents
  Status,
}

/// Shared state for command handlers
pub struct Context {
  pub config: Config,
  pub store: Arc<dyn KeyValueStore>,
  pub source: AnySource,
}

impl Context {
  async fn controller(&self) -> Result<CatalogController> {
    let play_page = self.config.play_page_url()?;
    let mut controller = CatalogController::new(Arc::clone(&self.store), play_page);
    controller.load(&self.source).await;
    if let Some(e) = controller.load_error() {
      return Err(eyre!("{} ({}: {})", LOAD_ERROR_MESSAGE, self.source.describe(), e));
    }
    Ok(controller)
  }
}

pub async fn list(ctx: &Context, args: ListArgs, out: &mut impl Write) -> Result<()> {
  let mut controller = ctx.controller().await?;
  if let Some(category) = &args.category {
    controller.select_category(category);
  }
  if let Some(search) = &args.search {
    controller.set_search(search);
  }
  controller.set_favorites_only(args.favorites);

  if controller.is_empty() {
    writeln!(out, "{}", EMPTY_MESSAGE)?;
    return Ok(());
  }

  for card in controller.visible() {
    let featured = if card.featured { " (featured)" } else { "" };
    writeln!(
      out,
      "{} {} [{}]{}",
      card.favorite.icon(),
      card.title,
      card.category,
      featured
    )?;
    if !card.tags.is_empty() {
      writeln!(out, "    {}", card.tags)?;
    }
    if !card.thumb.is_empty() {
      writeln!(out, "    art: {}", card.thumb)?;
    }
    writeln!(out, "    {}", card.target)?;
  }
  Ok(())
}

pub async fn favorite(ctx: &Context, slug: Option<&str>, out: &mut impl Write) -> Result<()> {
  let mut controller = ctx.controller().await?;
  let Some(slug) = slug else {
    if controller.favorites().is_empty() {
      writeln!(out, "No favorites yet")?;
    }
    for slug in controller.favorites().iter() {
      match controller.catalog().get(slug) {
        Some(item) => writeln!(out, "★ {} ({})", item.title, slug)?,
        None => writeln!(out, "★ {} (no longer in the catalog)", slug)?,
      }
    }
    return Ok(());
  };

  let title = controller
    .catalog()
    .get(slug)
    .map(|item| item.title.clone())
    .unwrap_or_else(|| slug.to_string());
  match controller.toggle_favorite(slug) {
    ToggleOutcome::Added => writeln!(out, "★ {} added to favorites", title)?,
    ToggleOutcome::Removed => writeln!(out, "☆ {} removed from favorites", title)?,
    ToggleOutcome::UnknownSlug => return Err(eyre!("No game with slug '{}'", slug)),
  }
  if controller.persistence_degraded() {
    return Err(eyre!("Favorites could not be saved"));
  }
  Ok(())
}

pub fn report(store: &dyn KeyValueStore, text: &[String], out: &mut impl Write) -> Result<()> {
  if text.is_empty() {
    match Report::last(store)? {
      Some(last) => writeln!(out, "{}  {}", last.date.to_rfc3339(), last.text)?,
      None => writeln!(out, "No report saved")?,
    }
    return Ok(());
  }

  match Report::submit(store, &text.join(" "))? {
    Some(saved) => writeln!(out, "Report saved at {}", saved.date.to_rfc3339())?,
    None => return Err(eyre!("Report text is empty")),
  }
  Ok(())
}

pub async fn cache<S: CacheStorage, N: Network>(
  agent: &OfflineAgent<S, N>,
  base: &Url,
  action: CacheCommand,
  out: &mut impl Write,
) -> Result<()> {
  match action {
    CacheCommand::Install => {
      agent.install().await?;
      writeln!(
        out,
        "Installed {} assets into {}",
        agent.manifest().len(),
        agent.version()
      )?;
    }
    CacheCommand::Activate => {
      agent.resume()?;
      print_deleted(&agent.activate()?, out)?;
    }
    CacheCommand::Sync => {
      let deleted = agent.register().await?;
      writeln!(
        out,
        "Installed {} assets into {}",
        agent.manifest().len(),
        agent.version()
      )?;
      print_deleted(&deleted, out)?;
    }
    CacheCommand::Fetch { path, method } => {
      agent.resume()?;
      let url = base
        .join(&path)
        .map_err(|e| eyre!("Invalid path '{}': {}", path, e))?;
      let request = Request::new(Method::parse(&method)?, url);
      let result = agent.fetch(&request).await?;
      writeln!(
        out,
        "{} {} ({} bytes, from {})",
        result.data.status,
        result.data.url,
        result.data.body.len(),
        result.source.label()
      )?;
      agent.wait_for_refreshes().await;
    }
    CacheCommand::Status => {
      let state = agent.resume()?;
      writeln!(out, "version: {}", agent.version())?;
      writeln!(out, "state: {}", state_label(state))?;
      if agent.skip_waiting() {
        writeln!(out, "skip waiting: yes")?;
      }
      if agent.clients_claimed() {
        writeln!(out, "clients claimed: yes")?;
      }
      for name in agent.storage().namespaces()? {
        let marker = if name == agent.version().as_str() { "*" } else { " " };
        let entries = agent.storage().urls(&name)?.len();
        writeln!(out, "{} {} ({} entries)", marker, name, entries)?;
      }
    }
  }
  Ok(())
}

fn print_deleted(deleted: &[String], out: &mut impl Write) -> Result<()> {
  if deleted.is_empty() {
    writeln!(out, "No stale cache versions")?;
  }
  for name in deleted {
    writeln!(out, "Deleted {}", name)?;
  }
  Ok(())
}

fn state_label(state: AgentState) -> &'static str {
  match state {
    AgentState::New => "not installed",
    AgentState::Installed => "installed",
    AgentState::Active => "active",
  }
}
