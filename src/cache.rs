use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// On-disk cache keyed by content hash.
///
/// Values are JSON envelopes carrying a storage timestamp. An entry is a hit
/// only while it exists, parses, and is younger than the expiry window
/// (`None` = never expires). Expired or corrupt entries read as a miss and
/// are left on disk for external cleanup; nothing here deletes files.
pub struct ContentCache {
    dir: PathBuf,
    expiry: Option<Duration>,
}

#[derive(Serialize, Deserialize)]
struct Envelope<T> {
    stored_at: DateTime<Utc>,
    value: T,
}

impl ContentCache {
    pub fn open(dir: &Path, expiry: Option<Duration>) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create cache dir {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            expiry,
        })
    }

    /// Look up a cached artifact. Any failure to read, parse, or pass the
    /// expiry check is a miss; the caller recomputes.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let data = std::fs::read_to_string(self.path_for(key)).ok()?;
        let envelope: Envelope<T> = match serde_json::from_str(&data) {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!("Discarding corrupt cache entry {key}: {e}");
                return None;
            }
        };
        if self.expired(&envelope.stored_at) {
            return None;
        }
        Some(envelope.value)
    }

    /// Persist an artifact under its content hash. Atomic write via temp
    /// file + rename so readers never observe a partial entry.
    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let envelope = Envelope {
            stored_at: Utc::now(),
            value,
        };
        let data = serde_json::to_string(&envelope).context("Failed to serialize cache entry")?;
        let path = self.path_for(key);
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, data)
            .with_context(|| format!("Failed to write cache entry {key}"))?;
        std::fs::rename(&tmp_path, &path)
            .with_context(|| format!("Failed to commit cache entry {key}"))?;
        Ok(())
    }

    /// Whether a fresh entry exists for this key.
    pub fn is_valid(&self, key: &str) -> bool {
        let Ok(data) = std::fs::read_to_string(self.path_for(key)) else {
            return false;
        };
        match serde_json::from_str::<Envelope<serde_json::Value>>(&data) {
            Ok(envelope) => !self.expired(&envelope.stored_at),
            Err(_) => false,
        }
    }

    fn expired(&self, stored_at: &DateTime<Utc>) -> bool {
        let Some(window) = self.expiry else {
            return false;
        };
        let age = Utc::now().signed_duration_since(*stored_at);
        age.to_std().map(|age| age > window).unwrap_or(true)
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}
