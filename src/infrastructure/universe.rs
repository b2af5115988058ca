//! Instrument universe resolution: remote list, then a fresh cached
//! snapshot, then the built-in default set.

use crate::domain::ports::UniverseSource;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Liquid large caps, ETFs and popular day-trading names
pub fn default_universe() -> Vec<String> {
    [
        // Tech
        "AAPL", "MSFT", "GOOGL", "AMZN", "META", "NVDA", "TSLA", "AMD", "INTC",
        // Finance
        "JPM", "BAC", "WFC", "GS", "MS", "C",
        // Energy
        "XOM", "CVX", "COP", "SLB",
        // Consumer
        "WMT", "HD", "MCD", "NKE", "SBUX",
        // Healthcare
        "JNJ", "PFE", "UNH", "ABBV", "MRK",
        // Day-trading favourites
        "SPY", "QQQ", "PLTR", "SOFI", "RIVN", "LCID", "F", "GM", "BA", "DIS", "NFLX", "PYPL",
        "SQ", "COIN", "ROKU",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Uppercase, trim and dedupe while keeping first-seen order
pub fn normalize_tickers<I, S>(tickers: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = std::collections::HashSet::new();
    tickers
        .into_iter()
        .map(|t| t.as_ref().trim().to_uppercase())
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect()
}

/// A universe list together with when it was fetched and how long it stays
/// usable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniverseSnapshot {
    pub tickers: Vec<String>,
    pub fetched_at: DateTime<Utc>,
    pub ttl_secs: u64,
}

impl UniverseSnapshot {
    pub fn new(tickers: Vec<String>, fetched_at: DateTime<Utc>, ttl_secs: u64) -> Self {
        Self {
            tickers,
            fetched_at,
            ttl_secs,
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        let ttl = i64::try_from(self.ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX);
        self.fetched_at
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        !self.tickers.is_empty() && now < self.expires_at()
    }
}

/// Snapshot persisted as a JSON file
#[derive(Debug, Clone)]
pub struct UniverseCache {
    path: PathBuf,
}

impl UniverseCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when nothing has been cached yet
    pub fn load(&self) -> Result<Option<UniverseSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read universe cache {:?}", self.path))?;
        let snapshot = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse universe cache {:?}", self.path))?;
        Ok(Some(snapshot))
    }

    pub fn save(&self, snapshot: &UniverseSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {:?}", parent))?;
            }
        }
        let content = serde_json::to_string_pretty(snapshot)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write universe cache {:?}", self.path))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UniverseOrigin {
    Explicit,
    Remote,
    Cache,
    Default,
}

impl fmt::Display for UniverseOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniverseOrigin::Explicit => write!(f, "explicit"),
            UniverseOrigin::Remote => write!(f, "remote"),
            UniverseOrigin::Cache => write!(f, "cache"),
            UniverseOrigin::Default => write!(f, "default"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedUniverse {
    pub tickers: Vec<String>,
    pub origin: UniverseOrigin,
}

pub struct UniverseResolver {
    remote: Option<Arc<dyn UniverseSource>>,
    cache: UniverseCache,
    ttl_secs: u64,
}

impl UniverseResolver {
    pub fn new(cache: UniverseCache, ttl_secs: u64) -> Self {
        Self {
            remote: None,
            cache,
            ttl_secs,
        }
    }

    pub fn with_remote(mut self, remote: Arc<dyn UniverseSource>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Never fails: each broken stage degrades to the next one
    pub async fn resolve(&self, now: DateTime<Utc>) -> ResolvedUniverse {
        if let Some(remote) = &self.remote {
            match remote.fetch_universe().await {
                Ok(tickers) if !tickers.is_empty() => {
                    let tickers = normalize_tickers(tickers);
                    info!("Universe: {} tickers from {}", tickers.len(), remote.name());
                    let snapshot = UniverseSnapshot::new(tickers.clone(), now, self.ttl_secs);
                    if let Err(e) = self.cache.save(&snapshot) {
                        warn!("Universe: failed to cache snapshot: {:#}", e);
                    }
                    return ResolvedUniverse {
                        tickers,
                        origin: UniverseOrigin::Remote,
                    };
                }
                Ok(_) => warn!("Universe: {} returned an empty list", remote.name()),
                Err(e) => warn!("Universe: {} failed: {:#}", remote.name(), e),
            }
        }

        match self.cache.load() {
            Ok(Some(snapshot)) if snapshot.is_fresh(now) => {
                info!(
                    "Universe: {} tickers from cache (fetched {})",
                    snapshot.tickers.len(),
                    snapshot.fetched_at
                );
                return ResolvedUniverse {
                    tickers: snapshot.tickers,
                    origin: UniverseOrigin::Cache,
                };
            }
            Ok(Some(snapshot)) => debug!(
                "Universe: cached snapshot expired at {}",
                snapshot.expires_at()
            ),
            Ok(None) => debug!("Universe: no cached snapshot"),
            Err(e) => warn!("Universe: unreadable cache: {:#}", e),
        }

        let tickers = default_universe();
        info!("Universe: falling back to {} default tickers", tickers.len());
        ResolvedUniverse {
            tickers,
            origin: UniverseOrigin::Default,
        }
    }
}

/// Universe list read from a local file, one ticker per line or comma
/// separated. Lines starting with `#` are ignored.
pub struct FileUniverseSource {
    path: PathBuf,
}

impl FileUniverseSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl UniverseSource for FileUniverseSource {
    async fn fetch_universe(&self) -> Result<Vec<String>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read universe file {:?}", self.path))?;
        Ok(normalize_tickers(
            content
                .lines()
                .filter(|l| !l.trim_start().starts_with('#'))
                .flat_map(|l| l.split(',')),
        ))
    }

    fn name(&self) -> &str {
        "universe file"
    }
}
