//! Where the catalog document comes from.

use color_eyre::{eyre::eyre, Result};
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use std::future::Future;
use std::path::PathBuf;
use url::Url;

use super::types::Catalog;

/// Trait for anything that can produce the raw catalog document.
pub trait CatalogSource: Send + Sync {
  /// Read the whole document, bypassing any intermediate cache.
  fn fetch_document(&self) -> impl Future<Output = Result<Vec<u8>>> + Send;

  /// Human-readable location for logs and the status bar
  fn describe(&self) -> String;
}

/// Fetch the document from `source` and parse it.
pub async fn fetch_catalog<S: CatalogSource>(source: &S) -> Result<Catalog> {
  let bytes = source.fetch_document().await?;
  Catalog::from_json(&bytes)
    .map_err(|e| eyre!("Failed to parse catalog from {}: {}", source.describe(), e))
}

/// Catalog served over HTTP(S)
#[derive(Clone)]
pub struct HttpCatalogSource {
  client: reqwest::Client,
  url: Url,
}

impl HttpCatalogSource {
  pub fn new(client: reqwest::Client, url: Url) -> Self {
    Self { client, url }
  }
}

impl CatalogSource for HttpCatalogSource {
  async fn fetch_document(&self) -> Result<Vec<u8>> {
    let response = self
      .client
      .get(self.url.clone())
      .header(CACHE_CONTROL, "no-store")
      .header(PRAGMA, "no-cache")
      .send()
      .await
      .map_err(|e| eyre!("Failed to fetch catalog from {}: {}", self.url, e))?
      .error_for_status()
      .map_err(|e| eyre!("Catalog request failed: {}", e))?;

    let bytes = response
      .bytes()
      .await
      .map_err(|e| eyre!("Failed to read catalog body: {}", e))?;

    Ok(bytes.to_vec())
  }

  fn describe(&self) -> String {
    self.url.to_string()
  }
}

/// Catalog read from the local filesystem
#[derive(Debug, Clone)]
pub struct FileCatalogSource {
  path: PathBuf,
}

impl FileCatalogSource {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }
}

impl CatalogSource for FileCatalogSource {
  async fn fetch_document(&self) -> Result<Vec<u8>> {
    tokio::fs::read(&self.path)
      .await
      .map_err(|e| eyre!("Failed to read catalog {}: {}", self.path.display(), e))
  }

  fn describe(&self) -> String {
    self.path.display().to_string()
  }
}

/// Either kind of source, picked from configuration.
#[derive(Clone)]
pub enum AnySource {
  Http(HttpCatalogSource),
  File(FileCatalogSource),
}

impl AnySource {
  /// `http(s)://` locations go over the network, `file://` URLs and plain
  /// paths are read from disk. Relative locations resolve against `base`.
  pub fn resolve(location: &str, base: &Url, client: reqwest::Client) -> Result<Self> {
    if let Ok(url) = Url::parse(location) {
      return Self::from_url(url, client);
    }

    let path = PathBuf::from(location);
    if path.is_absolute() || path.exists() {
      return Ok(AnySource::File(FileCatalogSource::new(path)));
    }

    let url = base
      .join(location)
      .map_err(|e| eyre!("Invalid catalog location '{}': {}", location, e))?;
    Self::from_url(url, client)
  }

  fn from_url(url: Url, client: reqwest::Client) -> Result<Self> {
    match url.scheme() {
      "http" | "https" => Ok(AnySource::Http(HttpCatalogSource::new(client, url))),
      "file" => {
        let path = url
          .to_file_path()
          .map_err(|_| eyre!("Invalid file URL: {}", url))?;
        Ok(AnySource::File(FileCatalogSource::new(path)))
      }
      other => Err(eyre!("Unsupported catalog scheme '{}'", other)),
    }
  }
}

impl CatalogSource for AnySource {
  async fn fetch_document(&self) -> Result<Vec<u8>> {
    match self {
      AnySource::Http(source) => source.fetch_document().await,
      AnySource::File(source) => source.fetch_document().await,
    }
  }

  fn describe(&self) -> String {
    match self {
      AnySource::Http(source) => source.describe(),
      AnySource::File(source) => source.describe(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn base() -> Url {
    Url::parse("https://games.example.org/").unwrap()
  }

  #[test]
  fn test_resolve_relative_against_base() {
    let source = AnySource::resolve("games.json", &base(), reqwest::Client::new()).unwrap();
    match source {
      AnySource::Http(http) => assert_eq!(http.url.as_str(), "https://games.example.org/games.json"),
      AnySource::File(_) => panic!("expected http source"),
    }
  }

  #[test]
  fn test_resolve_absolute_url() {
    let source =
      AnySource::resolve("http://mirror.local/list.json", &base(), reqwest::Client::new()).unwrap();
    assert_eq!(source.describe(), "http://mirror.local/list.json");
  }

  #[test]
  fn test_resolve_file_url() {
    let source = AnySource::resolve("file:///srv/games.json", &base(), reqwest::Client::new()).unwrap();
    assert!(matches!(source, AnySource::File(_)));
  }

  #[test]
  fn test_resolve_unsupported_scheme() {
    assert!(AnySource::resolve("ftp://host/games.json", &base(), reqwest::Client::new()).is_err());
  }

  #[tokio::test]
  async fn test_file_source_missing_file() {
    let source = FileCatalogSource::new("/nonexistent/ug9x/games.json");
    assert!(fetch_catalog(&source).await.is_err());
  }

  #[tokio::test]
  async fn test_file_source_reads_document() {
    let path = std::env::temp_dir().join(format!("ug9x-catalog-{}.json", std::process::id()));
    std::fs::write(
      &path,
      r#"[{"slug":"a","title":"Zed","category":"Action","thumb":"","featured":false}]"#,
    )
    .unwrap();

    let catalog = fetch_catalog(&FileCatalogSource::new(&path)).await.unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog.items()[0].title, "Zed");
  }
}
