//! Offline asset cache.
//!
//! This module keeps a versioned copy of the site's static assets:
//! - `install` pre-populates the namespace named by the current version
//! - `activate` garbage-collects every other namespace
//! - `fetch` answers GET requests cache-first and refreshes in the background

mod agent;
mod network;
mod storage;
mod types;

pub use agent::{AgentState, OfflineAgent, DEFAULT_ASSETS};
pub use network::{HttpNetwork, Network};
pub use storage::{CacheStorage, SqliteStorage};
#[cfg(test)]
pub use storage::MemoryStorage;
pub use types::{CacheResult, CacheVersion, Method, Request, Response};

/// The agent as wired up by the application
pub type SiteAgent = OfflineAgent<SqliteStorage, HttpNetwork>;
