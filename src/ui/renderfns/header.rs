use super::Palette;
use crate::local::ThemeMode;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Counts shown next to the site name
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderCounts {
  pub visible: usize,
  pub total: usize,
  pub favorites: usize,
}

/// Draw the header bar with logo, site, counts, and shortcuts
pub fn draw_header(
  frame: &mut Frame,
  area: Rect,
  site_url: &str,
  counts: HeaderCounts,
  theme: ThemeMode,
  palette: &Palette,
) {
  let domain = extract_domain(site_url);
  let key_style = Style::default().fg(palette.accent);
  let label_style = Style::default().fg(Color::DarkGray);

  let mut spans = vec![
    Span::styled(" ug9x ", Style::default().fg(palette.accent).bold()),
    Span::styled("│", label_style),
    Span::styled(format!(" {} ", domain), Style::default().fg(palette.text)),
    Span::styled("│", label_style),
    Span::styled(
      format!(
        " {}/{} games ★{} ",
        counts.visible, counts.total, counts.favorites
      ),
      Style::default().fg(Color::Yellow).bold(),
    ),
    Span::styled("│", label_style),
    Span::styled(format!(" {} ", theme.as_str()), label_style),
    Span::raw(" "),
  ];

  for (key, label) in [("/", "search"), ("f", "favorite"), ("v", "favorites only"), ("t", "theme"), ("q", "quit")] {
    spans.push(Span::styled(format!("<{}>", key), key_style));
    spans.push(Span::styled(format!(" {}  ", label), label_style));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(palette.background));
  frame.render_widget(paragraph, area);
}

/// Extract host and port from a site URL
fn extract_domain(url: &str) -> &str {
  url
    .strip_prefix("https://")
    .or_else(|| url.strip_prefix("http://"))
    .unwrap_or(url)
    .split('/')
    .next()
    .unwrap_or(url)
}
