use std::fs;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheNamespace {
    VersionDiscovery,
    Metadata,
}

impl CacheNamespace {
    fn dir(self) -> &'static str {
        match self {
            CacheNamespace::VersionDiscovery => "version_discovery",
            CacheNamespace::Metadata => "metadata",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CachePolicy {
    pub version_discovery_max_age: Duration,
    pub metadata_max_age: Duration,
}

impl CachePolicy {
    fn max_age(&self, namespace: CacheNamespace) -> Duration {
        match namespace {
            CacheNamespace::VersionDiscovery => self.version_discovery_max_age,
            CacheNamespace::Metadata => self.metadata_max_age,
        }
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            version_discovery_max_age: Duration::from_secs(7 * 24 * 3600),
            metadata_max_age: Duration::from_secs(30 * 24 * 3600),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CacheEntry {
    pub payload: Value,
    pub written_at: i64,
}

#[derive(Debug, Clone)]
pub struct CacheStore {
    root: Utf8PathBuf,
    policy: CachePolicy,
}

impl CacheStore {
    pub fn new(root: Utf8PathBuf, policy: CachePolicy) -> Self {
        Self { root, policy }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn path(&self, namespace: CacheNamespace, identifier: &str) -> Utf8PathBuf {
        self.root
            .join(namespace.dir())
            .join(format!("{identifier}.json"))
    }

    pub fn read(&self, namespace: CacheNamespace, identifier: &str) -> Option<Value> {
        let path = self.path(namespace, identifier);
        if !path.as_std_path().exists() {
            return None;
        }
        let content = match fs::read_to_string(path.as_std_path()) {
            Ok(content) => content,
            Err(err) => {
                warn!("could not read cache entry {path}: {err}");
                return None;
            }
        };
        let entry: CacheEntry = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(err) => {
                warn!("could not parse cache entry {path}: {err}");
                return None;
            }
        };
        let age = Utc::now().timestamp().saturating_sub(entry.written_at);
        if age >= self.policy.max_age(namespace).as_secs() as i64 {
            debug!("cache entry {path} is stale");
            return None;
        }
        Some(entry.payload)
    }

    pub fn write(&self, namespace: CacheNamespace, identifier: &str, payload: &Value) {
        let path = self.path(namespace, identifier);
        let entry = CacheEntry {
            payload: payload.clone(),
            written_at: Utc::now().timestamp(),
        };
        if let Err(err) = write_entry_atomic(&path, &entry) {
            warn!("could not save cache entry {path}: {err}");
        }
    }
}

fn write_entry_atomic(path: &Utf8Path, entry: &CacheEntry) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent.as_std_path())?;
    }
    let content = serde_json::to_vec_pretty(entry)?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(tmp_path.as_std_path(), &content)?;
    fs::rename(tmp_path.as_std_path(), path.as_std_path())
}
