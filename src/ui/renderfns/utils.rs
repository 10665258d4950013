use crate::local::ThemeMode;
use ratatui::prelude::Color;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Colors for one theme mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
  pub accent: Color,
  pub text: Color,
  pub dim: Color,
  pub background: Color,
  pub favorite: Color,
}

impl Palette {
  pub fn for_theme(theme: ThemeMode) -> Self {
    match theme {
      ThemeMode::Light => Self {
        accent: Color::Blue,
        text: Color::Black,
        dim: Color::DarkGray,
        background: Color::White,
        favorite: Color::Magenta,
      },
      // Auto leaves the terminal background alone
      ThemeMode::Dark | ThemeMode::Auto => Self {
        accent: Color::Cyan,
        text: Color::White,
        dim: Color::Gray,
        background: if theme == ThemeMode::Dark {
          Color::Black
        } else {
          Color::Reset
        },
        favorite: Color::Yellow,
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
  }

  #[test]
  fn test_truncate_exact_length() {
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_truncate_multibyte() {
    assert_eq!(truncate("Pokémon Showdown", 7), "Poké...");
  }

  #[test]
  fn test_palette_per_theme() {
    assert_eq!(Palette::for_theme(ThemeMode::Light).accent, Color::Blue);
    assert_eq!(Palette::for_theme(ThemeMode::Dark).background, Color::Black);
    assert_eq!(Palette::for_theme(ThemeMode::Auto).background, Color::Reset);
  }
}
