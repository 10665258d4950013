use crate::catalog::{
  fetch_catalog, AnySource, Card, Catalog, CatalogController, CatalogSource, ToggleOutcome,
};
use crate::offline::{CacheResult, CacheStorage, Network, OfflineAgent, Request, Response};
use crate::task::Task;
use crate::ui::components::{CategoryBar, CategoryEvent, KeyResult, SearchEvent, SearchInput};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{draw_header, header::HeaderCounts, truncate, Palette};
use crate::ui::view::{View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use std::sync::Arc;

pub const EMPTY_MESSAGE: &str = "No games match your filters.";
pub const LOAD_ERROR_MESSAGE: &str = "Failed to load catalog. Press 'r' to retry.";
pub const DEGRADED_MESSAGE: &str = "favorites not saved";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
  List,
  Featured,
}

/// The catalog browser: header, category chips, featured strip, card list
/// and status bar over one [`CatalogController`].
pub struct CatalogView<S: CacheStorage, N: Network> {
  controller: CatalogController,
  source: AnySource,
  site_url: String,
  agent: Option<Arc<OfflineAgent<S, N>>>,
  load: Task<Catalog>,
  register: Task<Vec<String>>,
  open: Task<CacheResult<Response>>,
  list_state: ListState,
  featured_index: usize,
  focus: Focus,
  search: SearchInput,
  categories: CategoryBar,
  status: Option<String>,
  seen_revision: u64,
}

impl<S: CacheStorage, N: Network> CatalogView<S, N> {
  pub fn new(
    controller: CatalogController,
    source: AnySource,
    site_url: String,
    agent: Option<Arc<OfflineAgent<S, N>>>,
  ) -> Self {
    let mut categories = CategoryBar::new();
    categories.set_categories(
      controller.categories().to_vec(),
      &controller.filters().selected_category,
    );

    let seen_revision = controller.revision();
    Self {
      controller,
      source,
      site_url,
      agent,
      load: Task::idle(),
      register: Task::idle(),
      open: Task::idle(),
      list_state: ListState::default(),
      featured_index: 0,
      focus: Focus::List,
      search: SearchInput::new(),
      categories,
      status: None,
      seen_revision,
    }
  }

  /// Kick off the catalog load and, when an agent is configured, its
  /// registration.
  pub fn start(&mut self) {
    self.reload();

    if let Some(agent) = &self.agent {
      let agent = Arc::clone(agent);
      self.register = Task::spawn(async move { agent.register().await });
    }
  }

  fn reload(&mut self) {
    let source = self.source.clone();
    self.load.restart(async move { fetch_catalog(&source).await });
    self.status = Some(format!("Loading catalog from {}...", self.source.describe()));
  }

  pub fn controller(&self) -> &CatalogController {
    &self.controller
  }

  pub fn status(&self) -> Option<&str> {
    self.status.as_deref()
  }

  /// Card under the cursor, in whichever region has focus
  pub fn selected_card(&self) -> Option<&Card> {
    match self.focus {
      Focus::List => self
        .list_state
        .selected()
        .and_then(|idx| self.controller.visible().get(idx)),
      Focus::Featured => self.controller.featured().get(self.featured_index),
    }
  }

  fn apply_load(&mut self, result: color_eyre::Result<Catalog>) {
    self.controller.apply_load(result);
    self.categories.set_categories(
      self.controller.categories().to_vec(),
      &self.controller.filters().selected_category,
    );
    // The chip bar falls back to "All" when the old category vanished
    let selected = self.categories.selected().to_string();
    if selected != self.controller.filters().selected_category {
      self.controller.select_category(&selected);
    }
    self.featured_index = 0;
    self.status = self.controller.load_error().map(|_| LOAD_ERROR_MESSAGE.to_string());
  }

  fn toggle_selected_favorite(&mut self) {
    let Some(slug) = self.selected_card().map(|card| card.slug.clone()) else {
      return;
    };
    self.status = Some(match self.controller.toggle_favorite(&slug) {
      ToggleOutcome::Added => format!("Added {} to favorites", slug),
      ToggleOutcome::Removed => format!("Removed {} from favorites", slug),
      ToggleOutcome::UnknownSlug => format!("Unknown game: {}", slug),
    });
  }

  /// Fetch the selected card's play page, through the offline agent when
  /// one is configured.
  fn open_selected(&mut self) {
    let Some(card) = self.selected_card().cloned() else {
      return;
    };

    match &self.agent {
      Some(agent) => {
        let agent = Arc::clone(agent);
        let request = Request::get(card.target.clone());
        self.open.restart(async move { agent.fetch(&request).await });
        self.status = Some(format!("Opening {}...", card.title));
      }
      None => {
        self.status = Some(format!("Play at {}", card.target));
      }
    }
  }

  fn move_featured(&mut self, delta: isize) {
    let len = self.controller.featured().len();
    if len == 0 {
      return;
    }
    self.featured_index = (self.featured_index as isize + delta).rem_euclid(len as isize) as usize;
  }

  fn render_featured(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
    let mut spans = vec![Span::styled("Featured ", Style::default().fg(Color::Yellow))];
    for (idx, card) in self.controller.featured().iter().enumerate() {
      let style = if self.focus == Focus::Featured && idx == self.featured_index {
        Style::default().fg(Color::Black).bg(palette.accent)
      } else {
        Style::default().fg(palette.text)
      };
      spans.push(Span::styled(
        format!(" {} {} ", card.favorite.icon(), truncate(&card.title, 20)),
        style,
      ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect, palette: &Palette) {
    let len = self.controller.visible().len();
    ensure_valid_selection(&mut self.list_state, len);

    let title = if self.load.is_running() {
      " Games (loading...) ".to_string()
    } else {
      let filters = self.controller.filters();
      let filtered = if filters.is_default() { "" } else { ", filtered" };
      format!(
        " Games [{}] ({} of {}{}) ",
        filters.selected_category,
        len,
        self.controller.catalog().len(),
        filtered
      )
    };

    let border = if self.focus == Focus::List {
      palette.accent
    } else {
      Color::DarkGray
    };
    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(border));

    if self.controller.is_empty() {
      let content = if self.load.is_running() {
        "Loading catalog..."
      } else if self.controller.load_error().is_some() {
        LOAD_ERROR_MESSAGE
      } else {
        EMPTY_MESSAGE
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let items: Vec<ListItem> = self
      .controller
      .visible()
      .iter()
      .map(|card| {
        let star_style = if card.favorite.pressed {
          Style::default().fg(palette.favorite)
        } else {
          Style::default().fg(Color::DarkGray)
        };
        let line = Line::from(vec![
          Span::styled(card.favorite.icon(), star_style),
          Span::raw(" "),
          Span::styled(
            format!("{:<32}", truncate(&card.title, 32)),
            Style::default().fg(palette.text),
          ),
          Span::raw(" "),
          Span::styled(
            format!("{:<12}", truncate(&card.category, 12)),
            Style::default().fg(palette.accent),
          ),
          Span::raw(" "),
          Span::styled(card.tags.clone(), Style::default().fg(palette.dim)),
        ]);
        ListItem::new(line)
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }

  fn render_status(&self, frame: &mut Frame, area: Rect, palette: &Palette) {
    let mut spans = Vec::new();
    if self.controller.persistence_degraded() {
      spans.push(Span::styled(
        format!(" {} ", DEGRADED_MESSAGE),
        Style::default().fg(Color::Black).bg(Color::Red),
      ));
    }
    if self.controller.filters().favorites_only {
      spans.push(Span::styled(" ★ only ", Style::default().fg(palette.favorite)));
    }
    if !self.controller.filters().search_term.is_empty() {
      spans.push(Span::styled(
        format!(" /{} ", self.controller.filters().search_term),
        Style::default().fg(palette.accent),
      ));
    }
    let message = if self.search.is_active() {
      "enter:done  esc:clear".to_string()
    } else if let Some(status) = &self.status {
      status.clone()
    } else {
      let favorite = self
        .selected_card()
        .map(|card| card.favorite.label())
        .unwrap_or_default();
      format!(
        "{}  j/k:nav  h/l:featured  tab:focus  [/]:category  enter:open  r:reload",
        favorite
      )
    };
    spans.push(Span::styled(format!(" {}", message), Style::default().fg(Color::DarkGray)));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
  }

  fn dispatch_key(&mut self, key: KeyEvent) -> ViewAction {
    // Search overlay gets first look so typed letters never trigger shortcuts
    match self.search.handle_key(key) {
      KeyResult::Event(SearchEvent::Changed(term)) => {
        self.controller.set_search(&term);
        return ViewAction::None;
      }
      KeyResult::Event(SearchEvent::Submitted) | KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    if let KeyResult::Event(CategoryEvent::Selected(category)) = self.categories.handle_key(key) {
      self.controller.select_category(&category);
      return ViewAction::None;
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        self.focus = Focus::List;
        self.list_state.select_next();
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.focus = Focus::List;
        self.list_state.select_previous();
      }
      KeyCode::Char('l') | KeyCode::Right => {
        self.focus = Focus::Featured;
        self.move_featured(1);
      }
      KeyCode::Char('h') | KeyCode::Left => {
        self.focus = Focus::Featured;
        self.move_featured(-1);
      }
      KeyCode::Tab => {
        self.focus = match self.focus {
          Focus::List => Focus::Featured,
          Focus::Featured => Focus::List,
        };
      }
      KeyCode::Char('f') | KeyCode::Char(' ') => self.toggle_selected_favorite(),
      KeyCode::Char('v') => self.controller.toggle_favorites_only(),
      KeyCode::Char('t') => {
        let theme = self.controller.cycle_theme();
        self.status = Some(format!("Theme: {}", theme.as_str()));
      }
      KeyCode::Char('r') => self.reload(),
      KeyCode::Enter => self.open_selected(),
      KeyCode::Esc => {
        if !self.controller.filters().search_term.is_empty() {
          self.search.reset();
          self.controller.clear_search();
        }
        self.status = None;
      }
      KeyCode::Char('q') => return ViewAction::Quit,
      _ => {}
    }
    ViewAction::None
  }

  /// Keep the list cursor on the same game after the list was re-derived
  fn follow_selection(&mut self, slug: Option<String>) {
    if self.controller.revision() == self.seen_revision {
      return;
    }
    self.seen_revision = self.controller.revision();

    let position = slug.and_then(|slug| {
      self
        .controller
        .visible()
        .iter()
        .position(|card| card.slug == slug)
    });
    if let Some(idx) = position {
      self.list_state.select(Some(idx));
    }
    if self.featured_index >= self.controller.featured().len() {
      self.featured_index = 0;
    }
  }
}

impl<S: CacheStorage, N: Network> View for CatalogView<S, N> {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    let selected = self
      .list_state
      .selected()
      .and_then(|idx| self.controller.visible().get(idx))
      .map(|card| card.slug.clone());
    let action = self.dispatch_key(key);
    self.follow_selection(selected);
    action
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let palette = Palette::for_theme(self.controller.theme());
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(1), // Header
        Constraint::Length(1), // Category chips
        Constraint::Length(1), // Featured strip
        Constraint::Min(3),    // Card list
        Constraint::Length(1), // Status bar
      ])
      .split(area);

    let counts = HeaderCounts {
      visible: self.controller.visible().len(),
      total: self.controller.catalog().len(),
      favorites: self.controller.favorites().len(),
    };
    draw_header(
      frame,
      chunks[0],
      &self.site_url,
      counts,
      self.controller.theme(),
      &palette,
    );
    self.categories.render(frame, chunks[1], &palette);
    self.render_featured(frame, chunks[2], &palette);
    self.render_list(frame, chunks[3], &palette);
    self.render_status(frame, chunks[4], &palette);

    self.search.render_overlay(frame, chunks[3], palette.accent);
  }

  fn tick(&mut self) {
    if let Some(result) = self.load.poll() {
      self.apply_load(result);
    }

    if let Some(result) = self.register.poll() {
      match result {
        Ok(deleted) => {
          tracing::info!("Offline cache ready, removed {} stale namespaces", deleted.len());
        }
        Err(e) => {
          tracing::warn!("Offline cache unavailable: {}", e);
          self.status = Some(format!("Offline cache unavailable: {}", e));
        }
      }
    }

    if let Some(result) = self.open.poll() {
      self.status = Some(match result {
        Ok(opened) => {
          let cached = opened
            .cached_at
            .map(|at| format!(", cached {}", at.format("%Y-%m-%d %H:%M")))
            .unwrap_or_default();
          format!(
            "Opened {} [{}] {} bytes from {}{}",
            opened.data.url,
            opened.data.status,
            opened.data.body.len(),
            opened.source.label(),
            cached
          )
        }
        Err(e) => format!("Could not open game: {}", e),
      });
    }
  }
}
