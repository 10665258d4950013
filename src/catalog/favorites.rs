//! The user's favorite slugs and their persisted form.

use color_eyre::{eyre::eyre, Result};
use std::collections::BTreeSet;

use crate::local::KeyValueStore;

/// Storage key holding the JSON array of favorite slugs
pub const FAVORITES_KEY: &str = "favorites";

/// Set of favorited item slugs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FavoriteSet {
  slugs: BTreeSet<String>,
}

impl FavoriteSet {
  #[cfg(test)]
  pub fn new() -> Self {
    Self::default()
  }

  pub fn contains(&self, slug: &str) -> bool {
    self.slugs.contains(slug)
  }

  pub fn len(&self) -> usize {
    self.slugs.len()
  }

  pub fn is_empty(&self) -> bool {
    self.slugs.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &str> {
    self.slugs.iter().map(String::as_str)
  }

  /// Flip membership of `slug`. Returns true if it is now a favorite.
  pub fn toggle(&mut self, slug: &str) -> bool {
    if self.slugs.remove(slug) {
      false
    } else {
      self.slugs.insert(slug.to_string());
      true
    }
  }

  /// Serialize as a JSON array of slugs
  pub fn to_json(&self) -> Result<String> {
    serde_json::to_string(&self.slugs).map_err(|e| eyre!("Failed to serialize favorites: {}", e))
  }

  pub fn from_json(json: &str) -> Result<Self> {
    let slugs: Vec<String> =
      serde_json::from_str(json).map_err(|e| eyre!("Failed to parse favorites: {}", e))?;
    Ok(Self {
      slugs: slugs.into_iter().collect(),
    })
  }

  /// Read the persisted set. A missing key yields an empty set; a corrupt
  /// value is logged and treated the same way.
  pub fn load(store: &dyn KeyValueStore) -> Result<Self> {
    match store.get(FAVORITES_KEY)? {
      Some(json) => Ok(Self::from_json(&json).unwrap_or_else(|e| {
        tracing::warn!("Ignoring stored favorites: {}", e);
        Self::default()
      })),
      None => Ok(Self::default()),
    }
  }

  pub fn save(&self, store: &dyn KeyValueStore) -> Result<()> {
    store.set(FAVORITES_KEY, &self.to_json()?)
  }
}

impl FromIterator<String> for FavoriteSet {
  fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
    Self {
      slugs: iter.into_iter().collect(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::local::MemoryStore;

  #[test]
  fn test_toggle_is_involution() {
    let mut favorites: FavoriteSet = ["a".to_string()].into_iter().collect();
    let before = favorites.clone();

    assert!(favorites.toggle("b"));
    assert!(!favorites.toggle("b"));
    assert_eq!(favorites, before);

    assert!(!favorites.toggle("a"));
    assert!(favorites.toggle("a"));
    assert_eq!(favorites, before);
  }

  #[test]
  fn test_store_round_trip() {
    let store = MemoryStore::new();
    let favorites: FavoriteSet = ["run-3", "2048", "chess-pro"]
      .into_iter()
      .map(String::from)
      .collect();

    favorites.save(&store).unwrap();
    let loaded = FavoriteSet::load(&store).unwrap();

    assert_eq!(loaded, favorites);
  }

  #[test]
  fn test_load_reads_any_array_order() {
    let store = MemoryStore::new();
    store.set(FAVORITES_KEY, r#"["z","a","m"]"#).unwrap();

    let loaded = FavoriteSet::load(&store).unwrap();
    assert_eq!(loaded.len(), 3);
    assert!(loaded.contains("z"));
    assert!(loaded.contains("a"));
    assert!(loaded.contains("m"));
  }

  #[test]
  fn test_load_missing_key_is_empty() {
    let store = MemoryStore::new();
    assert!(FavoriteSet::load(&store).unwrap().is_empty());
  }

  #[test]
  fn test_load_corrupt_value_is_empty() {
    let store = MemoryStore::new();
    store.set(FAVORITES_KEY, "not json").unwrap();
    assert!(FavoriteSet::load(&store).unwrap().is_empty());
  }
}
