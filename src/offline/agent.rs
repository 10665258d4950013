//! Offline cache agent: install, activate and fetch interception.

use color_eyre::{eyre::eyre, Result};
use std::sync::{Arc, Mutex};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};
use url::Url;

use super::network::Network;
use super::storage::CacheStorage;
use super::types::{CacheResult, CacheVersion, Request, Response};

/// Default asset manifest, resolved against the site base URL
pub const DEFAULT_ASSETS: &[&str] = &[
  "/",
  "/index.html",
  "/styles.css",
  "/app.js",
  "/manifest.json",
  "/assets/icon-192.png",
  "/assets/icon-512.png",
];

/// Lifecycle of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
  /// Not installed yet, or the last install failed
  New,
  /// Current namespace populated, waiting to activate
  Installed,
  /// Old namespaces removed, requests are intercepted
  Active,
}

#[derive(Debug)]
struct Lifecycle {
  state: AgentState,
  skip_waiting: bool,
  clients_claimed: bool,
}

/// Agent that sits in front of every static-resource fetch.
///
/// Uses a cache-first policy: a cached copy is answered immediately while a
/// background request refreshes it; without a copy the live response is used.
pub struct OfflineAgent<S: CacheStorage, N: Network> {
  storage: Arc<S>,
  network: Arc<N>,
  version: CacheVersion,
  manifest: Vec<Url>,
  lifecycle: Mutex<Lifecycle>,
  /// Network legs still warming the cache after a cached answer
  refreshes: Mutex<JoinSet<()>>,
}

impl<S: CacheStorage, N: Network> OfflineAgent<S, N> {
  pub fn new(storage: S, network: N, version: CacheVersion, manifest: Vec<Url>) -> Self {
    Self {
      storage: Arc::new(storage),
      network: Arc::new(network),
      version,
      manifest,
      lifecycle: Mutex::new(Lifecycle {
        state: AgentState::New,
        skip_waiting: false,
        clients_claimed: false,
      }),
      refreshes: Mutex::new(JoinSet::new()),
    }
  }

  /// Resolve asset paths against `base`.
  pub fn manifest_from_paths(base: &Url, paths: &[String]) -> Result<Vec<Url>> {
    paths
      .iter()
      .map(|path| {
        base
          .join(path)
          .map_err(|e| eyre!("Invalid asset path '{}': {}", path, e))
      })
      .collect()
  }

  pub fn version(&self) -> &CacheVersion {
    &self.version
  }

  pub fn manifest(&self) -> &[Url] {
    &self.manifest
  }

  pub fn storage(&self) -> &S {
    &self.storage
  }

  pub fn state(&self) -> AgentState {
    self.with_lifecycle(|l| l.state)
  }

  /// True once install has asked to take over without waiting
  pub fn skip_waiting(&self) -> bool {
    self.with_lifecycle(|l| l.skip_waiting)
  }

  /// True once activation has taken control of open clients
  pub fn clients_claimed(&self) -> bool {
    self.with_lifecycle(|l| l.clients_claimed)
  }

  fn with_lifecycle<T>(&self, f: impl FnOnce(&mut Lifecycle) -> T) -> T {
    let mut guard = match self.lifecycle.lock() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    };
    f(&mut guard)
  }

  /// Populate the current namespace with every manifest entry.
  ///
  /// All assets are fetched before anything is written; a single failure
  /// (transport error or non-2xx status) aborts the install.
  pub async fn install(&self) -> Result<()> {
    info!(version = %self.version, assets = self.manifest.len(), "Installing offline bundle");
    self.storage.open(self.version.as_str())?;

    let fetches = self.manifest.iter().map(|url| {
      let request = Request::get(url.clone());
      let network = Arc::clone(&self.network);
      async move {
        let response = network.fetch(&request).await?;
        if !response.is_success() {
          return Err(eyre!(
            "Asset {} returned status {}",
            request.url,
            response.status
          ));
        }
        Ok::<_, color_eyre::Report>((request, response))
      }
    });

    let entries = match futures::future::try_join_all(fetches).await {
      Ok(entries) => entries,
      Err(e) => {
        warn!(version = %self.version, "Offline install failed: {}", e);
        self.with_lifecycle(|l| l.state = AgentState::New);
        return Err(e);
      }
    };

    self.storage.put_all(self.version.as_str(), &entries)?;
    self.with_lifecycle(|l| {
      l.state = AgentState::Installed;
      l.skip_waiting = true;
    });
    info!(version = %self.version, "Offline bundle installed");

    Ok(())
  }

  /// Delete every namespace except the current one, then claim clients.
  /// Returns the names of the deleted namespaces.
  pub fn activate(&self) -> Result<Vec<String>> {
    if self.state() == AgentState::New {
      return Err(eyre!(
        "Cannot activate {}: bundle is not installed",
        self.version
      ));
    }

    let mut deleted = Vec::new();
    for name in self.storage.namespaces()? {
      if name != self.version.as_str() && self.storage.delete(&name)? {
        info!(namespace = %name, "Deleted stale cache");
        deleted.push(name);
      }
    }

    self.with_lifecycle(|l| {
      l.state = AgentState::Active;
      l.clients_claimed = true;
    });
    info!(version = %self.version, "Offline agent active");

    Ok(deleted)
  }

  /// Install then activate.
  pub async fn register(&self) -> Result<Vec<String>> {
    self.install().await?;
    self.activate()
  }

  /// Pick up the lifecycle left behind by an earlier process.
  ///
  /// A namespace holding every manifest entry counts as installed; with no
  /// other namespace left beside it the agent is already active.
  pub fn resume(&self) -> Result<AgentState> {
    let namespaces = self.storage.namespaces()?;
    if !namespaces.iter().any(|name| name == self.version.as_str()) {
      return Ok(self.state());
    }

    let stored = self.storage.urls(self.version.as_str())?;
    let complete = self
      .manifest
      .iter()
      .all(|url| stored.iter().any(|s| s == url.as_str()));
    if !complete {
      return Ok(self.state());
    }

    let state = if namespaces.len() == 1 {
      AgentState::Active
    } else {
      AgentState::Installed
    };
    self.with_lifecycle(|l| {
      l.state = state;
      l.skip_waiting = true;
      l.clients_claimed = state == AgentState::Active;
    });
    debug!(version = %self.version, ?state, "Resumed offline agent");

    Ok(state)
  }

  /// Answer a request the way an active agent would.
  ///
  /// Returns `None` when the request is not intercepted (agent not active,
  /// or a method other than GET); the caller then goes to the network as
  /// usual.
  pub async fn intercept(&self, request: &Request) -> Option<Result<CacheResult<Response>>> {
    if self.state() != AgentState::Active || !request.method.is_cacheable() {
      return None;
    }

    let cached = match self.storage.lookup(request) {
      Ok(cached) => cached,
      Err(e) => {
        debug!("Cache lookup failed for {}: {}", request.url, e);
        None
      }
    };

    match cached {
      Some(hit) => {
        self.track_refresh(request.clone());
        debug!(url = %request.url, "Serving cached response");
        Some(Ok(CacheResult::from_cache(hit.response, hit.cached_at)))
      }
      None => {
        let result = match self.spawn_refresh(request.clone()).await {
          Ok(Ok(response)) => Ok(CacheResult::from_network(response)),
          Ok(Err(e)) => Err(e),
          Err(e) => Err(eyre!("Network task for {} failed: {}", request.url, e)),
        };
        Some(result)
      }
    }
  }

  /// Fetch through the agent, going straight to the network when the
  /// request is not intercepted.
  pub async fn fetch(&self, request: &Request) -> Result<CacheResult<Response>> {
    match self.intercept(request).await {
      Some(result) => result,
      None => Ok(CacheResult::passthrough(
        self.network.fetch(request).await?,
      )),
    }
  }

  /// Wait for every background refresh started so far. Short-lived callers
  /// use this before the runtime shuts down.
  pub async fn wait_for_refreshes(&self) {
    let mut pending = {
      let mut guard = match self.refreshes.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
      };
      std::mem::take(&mut *guard)
    };

    while let Some(joined) = pending.join_next().await {
      if let Err(e) = joined {
        debug!("Background refresh task failed: {}", e);
      }
    }
  }

  /// Run the network leg in the background, keeping hold of it so
  /// [`Self::wait_for_refreshes`] can see it through.
  fn track_refresh(&self, request: Request) {
    let refresh = self.spawn_refresh(request);
    let mut guard = match self.refreshes.lock() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    };
    while guard.try_join_next().is_some() {}
    guard.spawn(async move {
      match refresh.await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => debug!("Background refresh failed: {}", e),
        Err(e) => debug!("Background refresh task failed: {}", e),
      }
    });
  }

  /// Start the network leg. A successful response is written back to the
  /// current namespace; write failures are only logged.
  fn spawn_refresh(&self, request: Request) -> JoinHandle<Result<Response>> {
    let storage = Arc::clone(&self.storage);
    let network = Arc::clone(&self.network);
    let namespace = self.version.as_str().to_string();

    tokio::spawn(async move {
      let response = network.fetch(&request).await?;
      if let Err(e) = storage.put(&namespace, &request, &response) {
        debug!("Cache write-back failed for {}: {}", request.url, e);
      }
      Ok::<_, color_eyre::Report>(response)
    })
  }
}
