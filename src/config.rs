use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

use crate::offline::{CacheVersion, DEFAULT_ASSETS};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Site the catalog, play page and offline assets are served from
  pub base_url: String,
  /// Catalog location: URL, path, or a path relative to `base_url`
  pub catalog: String,
  /// Page that plays a game, relative to `base_url`
  pub play_page: String,
  pub offline: OfflineConfig,
  pub log: LogConfig,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      base_url: "http://localhost:8080/".to_string(),
      catalog: "games.json".to_string(),
      play_page: "game.html".to_string(),
      offline: OfflineConfig::default(),
      log: LogConfig::default(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OfflineConfig {
  /// Register the offline agent when the browser starts
  pub enabled: bool,
  /// Name of the current cache namespace
  pub version: String,
  /// Asset paths to pre-populate at install time
  pub assets: Vec<String>,
}

impl Default for OfflineConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      version: CacheVersion::default().to_string(),
      assets: DEFAULT_ASSETS.iter().map(|s| s.to_string()).collect(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
  /// Default filter directive; `RUST_LOG` takes precedence
  pub level: String,
  /// Directory for the browser's log file
  pub directory: Option<PathBuf>,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: "info".to_string(),
      directory: None,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided (must exist)
  /// 2. ./ug9x.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/ug9x/config.yaml
  ///
  /// Without a file every setting keeps its default.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("ug9x.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("ug9x").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn from_yaml(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents).map_err(|e| eyre!("{}", e))?;
    config.base()?;
    Ok(config)
  }

  /// The site base URL. A missing trailing slash is added so relative paths
  /// resolve inside it.
  pub fn base(&self) -> Result<Url> {
    let mut raw = self.base_url.clone();
    if !raw.ends_with('/') {
      raw.push('/');
    }
    Url::parse(&raw).map_err(|e| eyre!("Invalid base_url '{}': {}", self.base_url, e))
  }

  pub fn play_page_url(&self) -> Result<Url> {
    self
      .base()?
      .join(&self.play_page)
      .map_err(|e| eyre!("Invalid play_page '{}': {}", self.play_page, e))
  }

  pub fn cache_version(&self) -> CacheVersion {
    CacheVersion::new(self.offline.version.clone())
  }

  /// Where the browser writes its log file
  pub fn log_directory(&self) -> PathBuf {
    self.log.directory.clone().unwrap_or_else(|| {
      dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("ug9x")
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.catalog, "games.json");
    assert_eq!(config.offline.version, "ug9x-v1");
    assert_eq!(config.offline.assets.len(), 7);
    assert!(config.offline.enabled);
    assert_eq!(
      config.play_page_url().unwrap().as_str(),
      "http://localhost:8080/game.html"
    );
  }

  #[test]
  fn test_partial_yaml_keeps_defaults() {
    let config = Config::from_yaml(
      r#"
base_url: https://games.example.org/arcade
offline:
  version: ug9x-v2
"#,
    )
    .unwrap();

    assert_eq!(
      config.base().unwrap().as_str(),
      "https://games.example.org/arcade/"
    );
    assert_eq!(
      config.play_page_url().unwrap().as_str(),
      "https://games.example.org/arcade/game.html"
    );
    assert_eq!(config.cache_version().as_str(), "ug9x-v2");
    assert_eq!(config.offline.assets[0], "/");
    assert_eq!(config.log.level, "info");
  }

  #[test]
  fn test_invalid_base_url() {
    assert!(Config::from_yaml("base_url: 'not a url'").is_err());
  }

  #[test]
  fn test_missing_explicit_path() {
    assert!(Config::load(Some(Path::new("/nonexistent/ug9x.yaml"))).is_err());
  }
}
