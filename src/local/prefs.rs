use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};

use super::KeyValueStore;

const THEME_KEY: &str = "theme";
const REPORT_KEY: &str = "lastReport";

/// Display theme preference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ThemeMode {
  #[default]
  Auto,
  Dark,
  Light,
}

impl ThemeMode {
  pub fn as_str(&self) -> &'static str {
    match self {
      ThemeMode::Auto => "auto",
      ThemeMode::Dark => "dark",
      ThemeMode::Light => "light",
    }
  }

  /// Unknown values fall back to `Auto`
  pub fn parse(value: &str) -> Self {
    match value {
      "dark" => ThemeMode::Dark,
      "light" => ThemeMode::Light,
      _ => ThemeMode::Auto,
    }
  }

  /// dark -> light -> auto -> dark
  pub fn next(&self) -> Self {
    match self {
      ThemeMode::Dark => ThemeMode::Light,
      ThemeMode::Light => ThemeMode::Auto,
      ThemeMode::Auto => ThemeMode::Dark,
    }
  }

  pub fn load(store: &dyn KeyValueStore) -> Result<Self> {
    Ok(
      store
        .get(THEME_KEY)?
        .map(|v| Self::parse(&v))
        .unwrap_or_default(),
    )
  }

  pub fn save(&self, store: &dyn KeyValueStore) -> Result<()> {
    store.set(THEME_KEY, self.as_str())
  }
}

/// A problem report kept on this machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
  pub text: String,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub date: DateTime<Utc>,
}

impl Report {
  /// Store `text` as the last report. Blank text is ignored and yields `None`.
  pub fn submit(store: &dyn KeyValueStore, text: &str) -> Result<Option<Self>> {
    let text = text.trim();
    if text.is_empty() {
      return Ok(None);
    }

    let report = Report {
      text: text.to_string(),
      date: Utc::now(),
    };
    let json =
      serde_json::to_string(&report).map_err(|e| eyre!("Failed to serialize report: {}", e))?;
    store.set(REPORT_KEY, &json)?;

    Ok(Some(report))
  }

  pub fn last(store: &dyn KeyValueStore) -> Result<Option<Self>> {
    match store.get(REPORT_KEY)? {
      Some(json) => serde_json::from_str(&json)
        .map(Some)
        .map_err(|e| eyre!("Failed to parse stored report: {}", e)),
      None => Ok(None),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::local::MemoryStore;

  #[test]
  fn test_theme_cycle() {
    assert_eq!(ThemeMode::Auto.next(), ThemeMode::Dark);
    assert_eq!(ThemeMode::Dark.next(), ThemeMode::Light);
    assert_eq!(ThemeMode::Light.next(), ThemeMode::Auto);
  }

  #[test]
  fn test_theme_persistence() {
    let store = MemoryStore::new();
    assert_eq!(ThemeMode::load(&store).unwrap(), ThemeMode::Auto);

    ThemeMode::Light.save(&store).unwrap();
    assert_eq!(ThemeMode::load(&store).unwrap(), ThemeMode::Light);

    store.set(THEME_KEY, "sepia").unwrap();
    assert_eq!(ThemeMode::load(&store).unwrap(), ThemeMode::Auto);
  }

  #[test]
  fn test_report_submit() {
    let store = MemoryStore::new();
    let report = Report::submit(&store, "  Run 3 does not load  ")
      .unwrap()
      .unwrap();
    assert_eq!(report.text, "Run 3 does not load");

    let last = Report::last(&store).unwrap().unwrap();
    assert_eq!(last.text, report.text);
    assert_eq!(last.date.timestamp_millis(), report.date.timestamp_millis());
  }

  #[test]
  fn test_blank_report_is_ignored() {
    let store = MemoryStore::new();
    assert_eq!(Report::submit(&store, "   ").unwrap(), None);
    assert_eq!(Report::last(&store).unwrap(), None);
  }
}
