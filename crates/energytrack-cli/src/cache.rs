//! Disk-backed computation cache so repeated `insights` runs over an
//! unchanged data file skip recomputation.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

use energytrack_core::cache::{Clock, ComputationCache, SystemClock};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Entries older than 30 minutes are treated as missing.
const CACHE_STALE_THRESHOLD_MS: u64 = 30 * 60 * 1000;

/// Keep the file small; the oldest entries go first.
const MAX_ENTRIES: usize = 16;

/// `ENERGYTRACK_CACHE_DIR` overrides `<cache_dir>/energytrack/`.
fn cache_dir() -> Option<PathBuf> {
    match std::env::var("ENERGYTRACK_CACHE_DIR") {
        Ok(dir) if !dir.trim().is_empty() => Some(PathBuf::from(dir)),
        _ => dirs::cache_dir().map(|d| d.join("energytrack")),
    }
}

fn cache_file() -> Option<PathBuf> {
    cache_dir().map(|d| d.join("insights-cache.json"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CachedEntry {
    timestamp: u64,
    value: String,
}

pub struct DiskCache<C: Clock = SystemClock> {
    path: Option<PathBuf>,
    entries: HashMap<String, CachedEntry>,
    clock: C,
}

impl DiskCache<SystemClock> {
    pub fn open() -> Self {
        Self::open_at(cache_file(), SystemClock)
    }
}

impl<C: Clock> DiskCache<C> {
    /// Read the cache file once. A missing or unreadable file starts empty.
    fn open_at(path: Option<PathBuf>, clock: C) -> Self {
        let entries = path
            .as_ref()
            .and_then(|p| File::open(p).ok())
            .and_then(|f| serde_json::from_reader(BufReader::new(f)).ok())
            .unwrap_or_default();

        Self {
            path,
            entries,
            clock,
        }
    }

    fn is_stale(&self, entry: &CachedEntry) -> bool {
        self.clock.now_ms().saturating_sub(entry.timestamp) > CACHE_STALE_THRESHOLD_MS
    }

    fn prune(&mut self) {
        let now = self.clock.now_ms();
        self.entries
            .retain(|_, e| now.saturating_sub(e.timestamp) <= CACHE_STALE_THRESHOLD_MS);

        while self.entries.len() > MAX_ENTRIES {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, e)| e.timestamp)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(key) => {
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }

    /// Write to a temp file first, then rename over the cache file.
    fn save(&self) {
        let Some(cache_path) = self.path.as_ref() else {
            return;
        };

        if let Some(dir) = cache_path.parent() {
            if fs::create_dir_all(dir).is_err() {
                return;
            }
        }

        let temp_path = cache_path.with_extension("json.tmp");
        let file = match File::create(&temp_path) {
            Ok(f) => f,
            Err(_) => return,
        };
        let writer = BufWriter::new(file);

        if serde_json::to_writer(writer, &self.entries).is_ok() {
            if fs::rename(&temp_path, cache_path).is_err() {
                let _ = fs::copy(&temp_path, cache_path);
                let _ = fs::remove_file(&temp_path);
            }
        } else {
            let _ = fs::remove_file(&temp_path);
        }
    }
}

impl<C: Clock> ComputationCache for DiskCache<C> {
    fn get(&mut self, key: &str) -> Option<String> {
        let entry = self.entries.get(key)?;
        if self.is_stale(entry) {
            debug!("stale disk cache entry");
            return None;
        }
        Some(entry.value.clone())
    }

    fn put(&mut self, key: &str, value: String) {
        let timestamp = self.clock.now_ms();
        self.entries
            .insert(key.to_string(), CachedEntry { timestamp, value });
        self.prune();
        self.save();
    }
}
