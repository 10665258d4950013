use super::KeyResult;
use crate::catalog::ALL_CATEGORY;
use crate::ui::renderfns::{truncate, Palette};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Events emitted by the category bar that parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryEvent {
  /// User moved to a different category chip
  Selected(String),
}

/// Row of category chips, "All" first
#[derive(Debug, Clone)]
pub struct CategoryBar {
  categories: Vec<String>,
  selected: usize,
}

impl Default for CategoryBar {
  fn default() -> Self {
    Self::new()
  }
}

impl CategoryBar {
  pub fn new() -> Self {
    Self {
      categories: vec![ALL_CATEGORY.to_string()],
      selected: 0,
    }
  }

  pub fn selected(&self) -> &str {
    self
      .categories
      .get(self.selected)
      .map(String::as_str)
      .unwrap_or(ALL_CATEGORY)
  }

  /// Replace the chips, keeping the current category selected if it survives
  pub fn set_categories(&mut self, categories: Vec<String>, current: &str) {
    self.selected = categories.iter().position(|c| c == current).unwrap_or(0);
    self.categories = categories;
  }

  /// Handle a key event
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<CategoryEvent> {
    if self.categories.len() < 2 {
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::PageUp | KeyCode::Char('[') => {
        self.navigate(-1);
        KeyResult::Event(CategoryEvent::Selected(self.selected().to_string()))
      }
      KeyCode::PageDown | KeyCode::Char(']') => {
        self.navigate(1);
        KeyResult::Event(CategoryEvent::Selected(self.selected().to_string()))
      }
      _ => KeyResult::NotHandled,
    }
  }

  /// Move between chips with wrapping
  fn navigate(&mut self, direction: i32) {
    let total = self.categories.len();
    if total == 0 {
      return;
    }

    self.selected = if direction > 0 {
      (self.selected + 1) % total
    } else if self.selected == 0 {
      total - 1
    } else {
      self.selected - 1
    };
  }

  /// Render the category bar
  pub fn render(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
    let mut spans = vec![Span::styled("[Category] ", Style::default().fg(Color::Yellow))];

    for (idx, category) in self.categories.iter().enumerate() {
      if idx > 0 {
        spans.push(Span::styled("│", Style::default().fg(Color::DarkGray)));
      }
      let style = if idx == self.selected {
        Style::default().fg(Color::Black).bg(palette.accent)
      } else {
        Style::default().fg(palette.dim)
      };
      spans.push(Span::styled(format!(" {} ", truncate(category, 15)), style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn bar() -> CategoryBar {
    let mut bar = CategoryBar::new();
    bar.set_categories(
      vec!["All".to_string(), "Action".to_string(), "Puzzle".to_string()],
      "All",
    );
    bar
  }

  #[test]
  fn test_navigation_wraps() {
    let mut bar = bar();
    assert_eq!(
      bar.handle_key(key(KeyCode::PageUp)),
      KeyResult::Event(CategoryEvent::Selected("Puzzle".to_string()))
    );
    assert_eq!(
      bar.handle_key(key(KeyCode::PageDown)),
      KeyResult::Event(CategoryEvent::Selected("All".to_string()))
    );
    assert_eq!(
      bar.handle_key(key(KeyCode::Char(']'))),
      KeyResult::Event(CategoryEvent::Selected("Action".to_string()))
    );
  }

  #[test]
  fn test_only_all_ignores_keys() {
    let mut bar = CategoryBar::new();
    assert_eq!(bar.handle_key(key(KeyCode::PageDown)), KeyResult::NotHandled);
    assert_eq!(bar.selected(), "All");
  }

  #[test]
  fn test_set_categories_keeps_selection() {
    let mut bar = bar();
    bar.set_categories(vec!["All".to_string(), "Puzzle".to_string()], "Puzzle");
    assert_eq!(bar.selected(), "Puzzle");

    bar.set_categories(vec!["All".to_string(), "Racing".to_string()], "Puzzle");
    assert_eq!(bar.selected(), "All");
  }
}
