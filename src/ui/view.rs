use crossterm::event::KeyEvent;
use ratatui::prelude::*;

/// Actions that a view can request in response to user input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewAction {
  /// No action needed
  None,
  /// Leave the application
  Quit,
}

/// Trait for view behavior
///
/// Views handle their own input modes (search, focus) and return actions
/// for the App to execute: App → View → Components.
///
/// Views that load data asynchronously should hold a `Task<T>` and poll it
/// in the tick() method.
pub trait View {
  /// Handle a key event, returning an action for App to execute
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction;

  /// Render the view to the frame
  fn render(&mut self, frame: &mut Frame, area: Rect);

  /// Called on each tick to allow views to poll background tasks
  fn tick(&mut self) {}
}
