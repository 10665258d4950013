//! The catalog controller: the single owner of catalog state.
//!
//! All mutation goes through [`CatalogController`]. After every mutation the
//! controller recomputes the derived views (visible cards, featured cards),
//! so the UI only ever reads them.

use color_eyre::Result;
use std::sync::Arc;
use url::Url;

use super::favorites::FavoriteSet;
use super::filter::visible_items;
use super::render::{render_cards, render_featured, Card};
use super::source::{fetch_catalog, CatalogSource};
use super::types::{Catalog, FilterState};
use crate::local::{KeyValueStore, ThemeMode};

/// Outcome of a favorite toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
  Added,
  Removed,
  /// The slug is not in the catalog and was not favorited before
  UnknownSlug,
}

/// Catalog state plus the views derived from it.
pub struct CatalogController {
  store: Arc<dyn KeyValueStore>,
  play_page: Url,
  catalog: Catalog,
  categories: Vec<String>,
  filters: FilterState,
  favorites: FavoriteSet,
  theme: ThemeMode,
  load_error: Option<String>,
  persistence_degraded: bool,
  visible: Vec<Card>,
  featured: Vec<Card>,
  revision: u64,
}

impl CatalogController {
  /// Create a controller with an empty catalog, reading favorites and theme
  /// from `store`.
  pub fn new(store: Arc<dyn KeyValueStore>, play_page: Url) -> Self {
    let favorites = FavoriteSet::load(store.as_ref()).unwrap_or_else(|e| {
      tracing::warn!("Could not read favorites: {}", e);
      FavoriteSet::default()
    });
    let theme = ThemeMode::load(store.as_ref()).unwrap_or_else(|e| {
      tracing::warn!("Could not read theme: {}", e);
      ThemeMode::default()
    });

    let mut controller = Self {
      store,
      play_page,
      catalog: Catalog::default(),
      categories: Catalog::default().categories(),
      filters: FilterState::default(),
      favorites,
      theme,
      load_error: None,
      persistence_degraded: false,
      visible: Vec::new(),
      featured: Vec::new(),
      revision: 0,
    };
    controller.refresh();
    controller
  }

  /// Fetch and install the catalog from `source`.
  pub async fn load<S: CatalogSource>(&mut self, source: &S) {
    let result = fetch_catalog(source).await;
    self.apply_load(result);
  }

  /// Install the result of a catalog fetch. A failure leaves an empty
  /// catalog and records the error for the retry hint.
  pub fn apply_load(&mut self, result: Result<Catalog>) {
    match result {
      Ok(catalog) => {
        if catalog.is_empty() {
          tracing::warn!("Catalog document has no items");
        } else {
          tracing::info!("Loaded catalog with {} items", catalog.len());
        }
        self.catalog = catalog;
        self.load_error = None;
      }
      Err(e) => {
        tracing::warn!("Catalog load failed: {}", e);
        self.catalog = Catalog::default();
        self.load_error = Some(e.to_string());
      }
    }
    self.categories = self.catalog.categories();
    self.refresh();
  }

  pub fn select_category(&mut self, category: &str) {
    self.filters.selected_category = category.to_string();
    self.refresh();
  }

  pub fn set_search(&mut self, term: &str) {
    self.filters.search_term = term.to_string();
    self.refresh();
  }

  pub fn clear_search(&mut self) {
    self.set_search("");
  }

  pub fn set_favorites_only(&mut self, favorites_only: bool) {
    self.filters.favorites_only = favorites_only;
    self.refresh();
  }

  pub fn toggle_favorites_only(&mut self) {
    self.set_favorites_only(!self.filters.favorites_only);
  }

  /// Flip `slug` in the favorite set and persist the set.
  ///
  /// Slugs missing from the catalog can be removed but not added. A storage
  /// failure keeps the change in memory and marks persistence as degraded.
  pub fn toggle_favorite(&mut self, slug: &str) -> ToggleOutcome {
    if !self.favorites.contains(slug) && !self.catalog.contains_slug(slug) {
      tracing::warn!("Refusing to favorite unknown slug '{}'", slug);
      return ToggleOutcome::UnknownSlug;
    }

    let added = self.favorites.toggle(slug);
    match self.favorites.save(self.store.as_ref()) {
      Ok(()) => self.persistence_degraded = false,
      Err(e) => {
        tracing::warn!("Favorites kept in memory only: {}", e);
        self.persistence_degraded = true;
      }
    }
    self.refresh();

    if added {
      ToggleOutcome::Added
    } else {
      ToggleOutcome::Removed
    }
  }

  /// Move to the next theme and persist it.
  pub fn cycle_theme(&mut self) -> ThemeMode {
    self.theme = self.theme.next();
    if let Err(e) = self.theme.save(self.store.as_ref()) {
      tracing::warn!("Could not save theme: {}", e);
    }
    self.revision += 1;
    self.theme
  }

  /// Recompute the derived views
  fn refresh(&mut self) {
    let items = self.catalog.items();
    self.visible = render_cards(
      visible_items(items, &self.filters, &self.favorites),
      &self.favorites,
      &self.play_page,
    );
    self.featured = render_featured(items, &self.favorites, &self.play_page);
    self.revision += 1;
  }

  pub fn visible(&self) -> &[Card] {
    &self.visible
  }

  pub fn featured(&self) -> &[Card] {
    &self.featured
  }

  /// True when the filtered list has nothing to show
  pub fn is_empty(&self) -> bool {
    self.visible.is_empty()
  }

  pub fn categories(&self) -> &[String] {
    &self.categories
  }

  pub fn filters(&self) -> &FilterState {
    &self.filters
  }

  pub fn favorites(&self) -> &FavoriteSet {
    &self.favorites
  }

  pub fn catalog(&self) -> &Catalog {
    &self.catalog
  }

  pub fn theme(&self) -> ThemeMode {
    self.theme
  }

  pub fn load_error(&self) -> Option<&str> {
    self.load_error.as_deref()
  }

  pub fn persistence_degraded(&self) -> bool {
    self.persistence_degraded
  }

  /// Bumped every time the derived views may have changed
  pub fn revision(&self) -> u64 {
    self.revision
  }
}
