//! Projection of catalog items into display records.
//!
//! Nothing here touches the terminal. The UI layer binds [`Card`]s to
//! widgets, and tests assert on them directly.

use url::Url;

use super::favorites::FavoriteSet;
use super::types::Item;

/// Maximum number of cards in the featured carousel
pub const FEATURED_LIMIT: usize = 10;

/// Number of tags shown on a card
pub const CARD_TAG_LIMIT: usize = 2;

/// Separator between the tags shown on a card
pub const TAG_SEPARATOR: &str = " • ";

/// Visual state of a card's favorite button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FavoriteToggle {
  pub pressed: bool,
}

impl FavoriteToggle {
  pub fn label(&self) -> &'static str {
    if self.pressed {
      "★ Favorited"
    } else {
      "☆ Favorite"
    }
  }

  pub fn icon(&self) -> &'static str {
    if self.pressed {
      "★"
    } else {
      "☆"
    }
  }
}

/// Display record for one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
  pub slug: String,
  pub title: String,
  pub category: String,
  pub tags: String,
  pub thumb: String,
  pub featured: bool,
  pub target: Url,
  pub favorite: FavoriteToggle,
}

/// Build the "play" link for a slug: the play page with a single `slug`
/// query parameter.
pub fn navigation_target(play_page: &Url, slug: &str) -> Url {
  let mut target = play_page.clone();
  target.set_query(None);
  target.query_pairs_mut().append_pair("slug", slug);
  target
}

pub fn render_card(item: &Item, favorites: &FavoriteSet, play_page: &Url) -> Card {
  Card {
    slug: item.slug.clone(),
    title: item.title.clone(),
    category: item.category.clone(),
    tags: item
      .tags
      .iter()
      .take(CARD_TAG_LIMIT)
      .map(String::as_str)
      .collect::<Vec<_>>()
      .join(TAG_SEPARATOR),
    thumb: item.thumb.clone(),
    featured: item.featured,
    target: navigation_target(play_page, &item.slug),
    favorite: FavoriteToggle {
      pressed: favorites.contains(&item.slug),
    },
  }
}

pub fn render_cards<'a>(
  items: impl IntoIterator<Item = &'a Item>,
  favorites: &FavoriteSet,
  play_page: &Url,
) -> Vec<Card> {
  items
    .into_iter()
    .map(|item| render_card(item, favorites, play_page))
    .collect()
}

/// Cards for the featured carousel: the first featured items in catalog
/// order, unsorted.
pub fn render_featured(items: &[Item], favorites: &FavoriteSet, play_page: &Url) -> Vec<Card> {
  render_cards(
    items.iter().filter(|item| item.featured).take(FEATURED_LIMIT),
    favorites,
    play_page,
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  fn play_page() -> Url {
    Url::parse("https://games.example.org/game.html").unwrap()
  }

  fn item(slug: &str, tags: &[&str], featured: bool) -> Item {
    Item {
      slug: slug.to_string(),
      title: format!("Title {}", slug),
      category: "Arcade".to_string(),
      tags: tags.iter().map(|t| t.to_string()).collect(),
      thumb: format!("assets/{}.png", slug),
      featured,
    }
  }

  #[test]
  fn test_card_shows_first_two_tags() {
    let card = render_card(
      &item("pac", &["retro", "maze", "ghosts"], false),
      &FavoriteSet::new(),
      &play_page(),
    );
    assert_eq!(card.tags, "retro • maze");
    assert_eq!(card.category, "Arcade");
    assert_eq!(card.thumb, "assets/pac.png");
  }

  #[test]
  fn test_card_without_tags() {
    let card = render_card(&item("pac", &[], false), &FavoriteSet::new(), &play_page());
    assert_eq!(card.tags, "");
  }

  #[test]
  fn test_navigation_target_escapes_slug() {
    let target = navigation_target(&play_page(), "tom & jerry/2");
    assert_eq!(target.path(), "/game.html");

    let pairs: Vec<(String, String)> = target.query_pairs().into_owned().collect();
    assert_eq!(
      pairs,
      vec![("slug".to_string(), "tom & jerry/2".to_string())]
    );
    assert!(!target.query().unwrap_or_default().contains('&'));
  }

  #[test]
  fn test_favorite_toggle_state() {
    let favorites: FavoriteSet = ["pac".to_string()].into_iter().collect();
    let card = render_card(&item("pac", &[], false), &favorites, &play_page());
    assert!(card.favorite.pressed);
    assert_eq!(card.favorite.label(), "★ Favorited");

    let card = render_card(&item("dig", &[], false), &favorites, &play_page());
    assert!(!card.favorite.pressed);
    assert_eq!(card.favorite.label(), "☆ Favorite");
  }

  #[test]
  fn test_featured_keeps_catalog_order_and_limit() {
    let mut items = vec![item("plain", &[], false)];
    for i in (0..12).rev() {
      items.push(item(&format!("f{:02}", i), &[], true));
    }
    let favorites: FavoriteSet = ["f03".to_string()].into_iter().collect();

    let featured = render_featured(&items, &favorites, &play_page());
    let slugs: Vec<&str> = featured.iter().map(|c| c.slug.as_str()).collect();

    assert_eq!(featured.len(), FEATURED_LIMIT);
    assert_eq!(slugs[0], "f11");
    assert_eq!(slugs[9], "f02");
    assert!(!slugs.contains(&"plain"));
  }
}
