//! Pure filter and sort over the catalog.

use std::cmp::Ordering;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::favorites::FavoriteSet;
use super::types::{FilterState, Item, ALL_CATEGORY};

pub fn matches_category(item: &Item, category: &str) -> bool {
  category == ALL_CATEGORY || item.category == category
}

/// Case-insensitive substring match on the title or any tag.
/// An empty term matches everything.
pub fn matches_search(item: &Item, term: &str) -> bool {
  if term.is_empty() {
    return true;
  }
  let term = term.to_lowercase();
  item.title.to_lowercase().contains(&term)
    || item.tags.iter().any(|tag| tag.to_lowercase().contains(&term))
}

pub fn matches_favorites(item: &Item, favorites: &FavoriteSet, favorites_only: bool) -> bool {
  !favorites_only || favorites.contains(&item.slug)
}

/// Apply the category, search and favorites filters, in that order.
pub fn filter_items<'a>(
  items: &'a [Item],
  state: &FilterState,
  favorites: &FavoriteSet,
) -> Vec<&'a Item> {
  items
    .iter()
    .filter(|item| matches_category(item, &state.selected_category))
    .filter(|item| matches_search(item, &state.search_term))
    .filter(|item| matches_favorites(item, favorites, state.favorites_only))
    .collect()
}

/// Stable sort: favorites first, then featured, then title.
pub fn sort_items(items: &mut [&Item], favorites: &FavoriteSet) {
  items.sort_by(|a, b| {
    let fav_a = favorites.contains(&a.slug);
    let fav_b = favorites.contains(&b.slug);
    fav_b
      .cmp(&fav_a)
      .then_with(|| b.featured.cmp(&a.featured))
      .then_with(|| locale_cmp(&a.title, &b.title))
  });
}

/// The visible list for a filter state: filtered, then sorted.
pub fn visible_items<'a>(
  items: &'a [Item],
  state: &FilterState,
  favorites: &FavoriteSet,
) -> Vec<&'a Item> {
  let mut list = filter_items(items, state, favorites);
  sort_items(&mut list, favorites);
  list
}

/// Title ordering close to a user-facing collation. Base letters compare
/// first, ignoring accents and case; accents break ties next, and only then
/// case, lowercase first.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
  let base = |s: &str| {
    s.nfd()
      .filter(|c| !is_combining_mark(*c))
      .flat_map(char::to_lowercase)
      .collect::<Vec<_>>()
  };
  let accented = |s: &str| s.nfd().flat_map(char::to_lowercase).collect::<Vec<_>>();
  let case = |s: &str| s.nfd().map(char::is_uppercase).collect::<Vec<_>>();

  base(a)
    .cmp(&base(b))
    .then_with(|| accented(a).cmp(&accented(b)))
    .then_with(|| case(a).cmp(&case(b)))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn item(slug: &str, title: &str, category: &str, tags: &[&str], featured: bool) -> Item {
    Item {
      slug: slug.to_string(),
      title: title.to_string(),
      category: category.to_string(),
      tags: tags.iter().map(|t| t.to_string()).collect(),
      thumb: format!("assets/{}.png", slug),
      featured,
    }
  }

  fn sample_items() -> Vec<Item> {
    vec![
      item("chess-pro", "Chess Pro", "Board", &["strategy", "classic"], false),
      item("run-3", "Run 3", "Action", &["runner", "Space"], true),
      item("2048", "2048", "Puzzle", &["numbers"], false),
      item("slope", "Slope", "Action", &["ball", "speed"], false),
      item("sudoku", "Sudoku", "Puzzle", &["numbers", "Logic"], true),
    ]
  }

  fn slugs(list: &[&Item]) -> Vec<String> {
    list.iter().map(|i| i.slug.clone()).collect()
  }

  fn favorites(slugs: &[&str]) -> FavoriteSet {
    slugs.iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn test_search_title_case_insensitive() {
    let chess = item("chess-pro", "Chess Pro", "Board", &[], false);
    assert!(matches_search(&chess, "chess"));
    assert!(matches_search(&chess, "PRO"));
    assert!(!matches_search(&chess, "checkers"));
  }

  #[test]
  fn test_search_tags_case_insensitive() {
    let items = sample_items();
    let state = FilterState {
      search_term: "LOGIC".to_string(),
      ..FilterState::default()
    };
    let list = filter_items(&items, &state, &FavoriteSet::new());
    assert_eq!(slugs(&list), vec!["sudoku"]);

    let state = FilterState {
      search_term: "space".to_string(),
      ..FilterState::default()
    };
    let list = filter_items(&items, &state, &FavoriteSet::new());
    assert_eq!(slugs(&list), vec!["run-3"]);
  }

  #[test]
  fn test_category_filter() {
    let items = sample_items();
    let state = FilterState {
      selected_category: "Puzzle".to_string(),
      ..FilterState::default()
    };
    let list = filter_items(&items, &state, &FavoriteSet::new());
    assert_eq!(slugs(&list), vec!["2048", "sudoku"]);
  }

  #[test]
  fn test_unknown_category_matches_nothing() {
    let items = sample_items();
    let state = FilterState {
      selected_category: "Racing".to_string(),
      ..FilterState::default()
    };
    assert!(filter_items(&items, &state, &FavoriteSet::new()).is_empty());
  }

  #[test]
  fn test_favorites_only() {
    let items = sample_items();
    let favs = favorites(&["slope", "gone-item"]);
    let state = FilterState {
      favorites_only: true,
      ..FilterState::default()
    };
    let list = filter_items(&items, &state, &favs);
    assert_eq!(slugs(&list), vec!["slope"]);
  }

  #[test]
  fn test_filters_commute_and_stay_in_catalog() {
    let items = sample_items();
    let favs = favorites(&["sudoku", "run-3", "chess-pro"]);
    let categories = ["All", "Action", "Puzzle", "Board"];
    let terms = ["", "s", "NUM", "pro"];

    for category in categories {
      for term in terms {
        for favorites_only in [false, true] {
          let state = FilterState {
            selected_category: category.to_string(),
            search_term: term.to_string(),
            favorites_only,
          };
          let reference = slugs(&filter_items(&items, &state, &favs));

          let predicates: [&dyn Fn(&Item) -> bool; 3] = [
            &|i: &Item| matches_category(i, category),
            &|i: &Item| matches_search(i, term),
            &|i: &Item| matches_favorites(i, &favs, favorites_only),
          ];
          let orders = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
          ];
          for order in orders {
            let mut list: Vec<&Item> = items.iter().collect();
            for idx in order {
              list.retain(|i| predicates[idx](i));
            }
            assert_eq!(slugs(&list), reference, "order {:?}", order);
          }

          for slug in &reference {
            assert!(items.iter().any(|i| &i.slug == slug));
          }
        }
      }
    }
  }

  #[test]
  fn test_featured_before_title() {
    let items = vec![
      item("a", "Zed", "Action", &[], false),
      item("b", "Ant", "Action", &[], true),
    ];
    let list = visible_items(&items, &FilterState::default(), &FavoriteSet::new());
    let titles: Vec<&str> = list.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["Ant", "Zed"]);
  }

  #[test]
  fn test_favorites_before_featured() {
    let items = sample_items();
    let favs = favorites(&["slope"]);
    let list = visible_items(&items, &FilterState::default(), &favs);
    assert_eq!(
      slugs(&list),
      vec!["slope", "run-3", "sudoku", "2048", "chess-pro"]
    );
  }

  #[test]
  fn test_sort_is_stable_for_equal_keys() {
    let items = vec![
      item("first", "Tetris", "Puzzle", &[], false),
      item("other", "Pacman", "Arcade", &[], false),
      item("second", "Tetris", "Puzzle", &["remake"], false),
    ];
    let list = visible_items(&items, &FilterState::default(), &FavoriteSet::new());
    assert_eq!(slugs(&list), vec!["other", "first", "second"]);
  }

  #[test]
  fn test_locale_cmp_ignores_case_first() {
    assert_eq!(locale_cmp("apple", "Banana"), Ordering::Less);
    assert_eq!(locale_cmp("Zebra", "apple"), Ordering::Greater);
    assert_eq!(locale_cmp("chess", "Chess"), Ordering::Less);
    assert_eq!(locale_cmp("Chess", "Chess"), Ordering::Equal);
    assert_eq!(locale_cmp("Run", "Run 3"), Ordering::Less);
  }

  #[test]
  fn test_locale_cmp_accents() {
    assert_eq!(locale_cmp("Éclair", "Zed"), Ordering::Less);
    assert_eq!(locale_cmp("Éclair", "Dash"), Ordering::Greater);
    assert_eq!(locale_cmp("eclair", "éclair"), Ordering::Less);
    assert_eq!(locale_cmp("Pokémon", "Pokemon Go"), Ordering::Less);
  }

  #[test]
  fn test_accented_titles_sort_with_their_letter() {
    let items = vec![
      item("zed", "Zed", "Action", &[], false),
      item("eclair", "Éclair", "Arcade", &[], false),
      item("apple", "Apple", "Puzzle", &[], false),
    ];
    let list = visible_items(&items, &FilterState::default(), &FavoriteSet::new());
    assert_eq!(slugs(&list), vec!["apple", "eclair", "zed"]);
  }
}
