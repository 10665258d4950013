use serde::{Deserialize, Serialize};

/// Name of the synthetic category that disables category filtering
pub const ALL_CATEGORY: &str = "All";

/// A single catalog entry, as read from `games.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
  pub slug: String,
  pub title: String,
  pub category: String,
  #[serde(default)]
  pub tags: Vec<String>,
  #[serde(default)]
  pub thumb: String,
  #[serde(default)]
  pub featured: bool,
}

/// Ordered, read-only list of items for one session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
  items: Vec<Item>,
}

impl Catalog {
  #[cfg(test)]
  pub fn new(items: Vec<Item>) -> Self {
    Self { items }
  }

  /// Parse a catalog document (a JSON array of items)
  pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
    let items: Vec<Item> = serde_json::from_slice(bytes)?;
    Ok(Self { items })
  }

  pub fn items(&self) -> &[Item] {
    &self.items
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn contains_slug(&self, slug: &str) -> bool {
    self.items.iter().any(|item| item.slug == slug)
  }

  pub fn get(&self, slug: &str) -> Option<&Item> {
    self.items.iter().find(|item| item.slug == slug)
  }

  /// Facet list for the category chips: "All" first, then every category in
  /// first-seen order.
  pub fn categories(&self) -> Vec<String> {
    let mut categories = vec![ALL_CATEGORY.to_string()];
    for item in &self.items {
      if !categories.iter().any(|c| c == &item.category) {
        categories.push(item.category.clone());
      }
    }
    categories
  }
}

/// Transient filter inputs for the visible list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
  pub selected_category: String,
  pub search_term: String,
  pub favorites_only: bool,
}

impl Default for FilterState {
  fn default() -> Self {
    Self {
      selected_category: ALL_CATEGORY.to_string(),
      search_term: String::new(),
      favorites_only: false,
    }
  }
}

impl FilterState {
  /// True when nothing narrows the catalog
  pub fn is_default(&self) -> bool {
    *self == Self::default()
  }
}
