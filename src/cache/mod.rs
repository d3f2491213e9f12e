//! Route cache
//!
//! Tracks when each route was last generated so the server can enforce the
//! revalidation window across restarts. This is the only state the system
//! persists locally; the content itself always comes from the backend.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};

/// Cache file name
const CACHE_FILE: &str = ".spacetraveling-cache/db.json";

/// Freshness of a generated route against the revalidation window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale,
    Missing,
}

/// Per-route generation record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteEntry {
    /// Unix timestamp of the last successful generation
    pub generated_at: u64,
}

/// Cache database mapping routes to generation times
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RouteCache {
    /// Version of the cache format
    pub version: u32,
    /// Entries keyed by route, e.g. `/` or `/post/<uid>`
    pub routes: HashMap<String, RouteEntry>,
}

impl RouteCache {
    /// Current cache format version
    const VERSION: u32 = 1;

    /// Load cache from disk, or create a new empty cache
    pub fn load(base_dir: &Path) -> Self {
        let cache_path = base_dir.join(CACHE_FILE);
        if let Ok(content) = fs::read_to_string(&cache_path) {
            if let Ok(cache) = serde_json::from_str::<RouteCache>(&content) {
                if cache.version == Self::VERSION {
                    return cache;
                }
                tracing::info!("Cache version mismatch, discarding cache");
            }
        }
        Self::new()
    }

    /// Save cache to disk
    pub fn save(&self, base_dir: &Path) -> Result<()> {
        let cache_path = base_dir.join(CACHE_FILE);
        if let Some(parent) = cache_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(cache_path, content)?;
        Ok(())
    }

    /// Create a new cache with version set
    pub fn new() -> Self {
        Self {
            version: Self::VERSION,
            ..Default::default()
        }
    }

    /// Record a successful generation of a route
    pub fn mark(&mut self, route: &str) {
        self.routes.insert(
            route.to_string(),
            RouteEntry {
                generated_at: unix_now(),
            },
        );
    }

    /// Forget a route
    pub fn remove(&mut self, route: &str) {
        self.routes.remove(route);
    }

    /// Classify a route against a staleness budget
    pub fn freshness(&self, route: &str, revalidate: Duration) -> Freshness {
        match self.routes.get(route) {
            None => Freshness::Missing,
            Some(entry) => {
                let age = unix_now().saturating_sub(entry.generated_at);
                if Duration::from_secs(age) < revalidate {
                    Freshness::Fresh
                } else {
                    Freshness::Stale
                }
            }
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Delete the cache directory
pub fn clear(base_dir: &Path) -> Result<()> {
    let cache_dir = base_dir.join(".spacetraveling-cache");
    if cache_dir.exists() {
        fs::remove_dir_all(&cache_dir)?;
        tracing::info!("Cache cleared");
    }
    Ok(())
}
