//! TTL-bounded response cache with write-through persistence.
//!
//! Entries live in memory behind one `RwLock` (the cache's single
//! serialization point) and mirror to one JSON file per fingerprint, so a
//! later session starts warm. Files are replaced atomically; expired
//! entries are evicted lazily when a lookup touches them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, trace, warn};

use crate::error::{CacheError, Result};
use crate::fingerprint::Fingerprint;

/// One cached response.
#[derive(Debug, Clone)]
struct CacheEntry {
    payload: serde_json::Value,
    cached_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    size_bytes: u64,
}

impl CacheEntry {
    fn is_valid(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// On-disk form of an entry. Carries the fingerprint key, since the file
/// name is a hash the key cannot be recovered from.
#[derive(Debug, Serialize, Deserialize)]
struct EntryFile {
    fingerprint: String,
    payload: serde_json::Value,
    cached_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

/// Point-in-time census of the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Entries present, valid or not.
    pub total: usize,

    /// Entries whose expiry has not passed.
    pub valid: usize,

    /// Entries past expiry but not yet evicted.
    pub expired: usize,

    /// Total payload bytes held.
    pub size_bytes: u64,
}

/// Response cache keyed by request fingerprint.
///
/// Cheap to clone; clones share the entry set.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
    inner: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl ResponseCache {
    /// Open (or create) a cache rooted at `dir`, loading any entries a
    /// prior session persisted. Unreadable entry files are skipped and
    /// treated as misses rather than failing the whole cache.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;

        let mut entries = HashMap::new();
        for dirent in std::fs::read_dir(&dir)? {
            let path = dirent?.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            match Self::read_entry_file(&path) {
                Ok((key, entry)) => {
                    entries.insert(key, entry);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable cache entry");
                }
            }
        }

        debug!(dir = %dir.display(), entries = entries.len(), "Response cache opened");

        Ok(Self {
            dir,
            inner: Arc::new(RwLock::new(entries)),
        })
    }

    /// Look up a fingerprint. Expired entries count as misses and are
    /// evicted on the spot.
    pub async fn lookup(&self, fingerprint: &Fingerprint) -> Option<serde_json::Value> {
        let now = Utc::now();
        let mut entries = self.inner.write().await;

        match entries.get(fingerprint.as_str()) {
            Some(entry) if entry.is_valid(now) => {
                trace!(fingerprint = %fingerprint, "Cache hit");
                Some(entry.payload.clone())
            }
            Some(_) => {
                debug!(fingerprint = %fingerprint, "Cache entry expired, evicting");
                entries.remove(fingerprint.as_str());
                self.remove_entry_file(fingerprint);
                None
            }
            None => {
                trace!(fingerprint = %fingerprint, "Cache miss");
                None
            }
        }
    }

    /// Store (or overwrite) the entry for a fingerprint with
    /// `expires_at = now + ttl`.
    ///
    /// A zero TTL disables caching for the call: nothing is stored, since
    /// an entry expiring at its own creation instant is never a hit.
    pub async fn store(
        &self,
        fingerprint: &Fingerprint,
        payload: serde_json::Value,
        ttl: std::time::Duration,
    ) -> Result<()> {
        if ttl.is_zero() {
            debug!(fingerprint = %fingerprint, "Zero TTL, not caching");
            return Ok(());
        }

        let now = Utc::now();
        let entry = CacheEntry {
            size_bytes: payload.to_string().len() as u64,
            payload,
            cached_at: now,
            expires_at: now
                + Duration::from_std(ttl)
                    .map_err(|e| CacheError::Io(format!("TTL out of range: {}", e)))?,
        };

        // File first, map second, both under the write lock: a concurrent
        // lookup sees the entry only after it is durably written.
        let mut entries = self.inner.write().await;
        self.write_entry_file(fingerprint, &entry)?;
        entries.insert(fingerprint.as_str().to_string(), entry);
        trace!(fingerprint = %fingerprint, "Cache entry stored");
        Ok(())
    }

    /// Remove one entry. Removing an absent entry is not an error.
    pub async fn invalidate(&self, fingerprint: &Fingerprint) -> Result<()> {
        let mut entries = self.inner.write().await;
        if entries.remove(fingerprint.as_str()).is_some() {
            debug!(fingerprint = %fingerprint, "Cache entry invalidated");
        }
        self.remove_entry_file(fingerprint);
        Ok(())
    }

    /// Remove all entries.
    pub async fn clear(&self) -> Result<()> {
        let mut entries = self.inner.write().await;
        let count = entries.len();
        entries.clear();

        for dirent in std::fs::read_dir(&self.dir)? {
            let path = dirent?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                std::fs::remove_file(&path)?;
            }
        }

        debug!(count = count, "Cache cleared");
        Ok(())
    }

    /// Point-in-time census. `valid + expired == total`.
    pub async fn stats(&self) -> CacheStats {
        let now = Utc::now();
        let entries = self.inner.read().await;

        let mut stats = CacheStats {
            total: entries.len(),
            valid: 0,
            expired: 0,
            size_bytes: 0,
        };
        for entry in entries.values() {
            if entry.is_valid(now) {
                stats.valid += 1;
            } else {
                stats.expired += 1;
            }
            stats.size_bytes += entry.size_bytes;
        }
        stats
    }

    fn entry_path(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.dir.join(fingerprint.file_name())
    }

    fn read_entry_file(path: &Path) -> Result<(String, CacheEntry)> {
        let content = std::fs::read_to_string(path)?;
        let file: EntryFile = serde_json::from_str(&content)?;
        let entry = CacheEntry {
            size_bytes: file.payload.to_string().len() as u64,
            payload: file.payload,
            cached_at: file.cached_at,
            expires_at: file.expires_at,
        };
        Ok((file.fingerprint, entry))
    }

    fn write_entry_file(&self, fingerprint: &Fingerprint, entry: &CacheEntry) -> Result<()> {
        let file = EntryFile {
            fingerprint: fingerprint.as_str().to_string(),
            payload: entry.payload.clone(),
            cached_at: entry.cached_at,
            expires_at: entry.expires_at,
        };
        let json = serde_json::to_string(&file)?;

        let path = self.entry_path(fingerprint);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove_entry_file(&self, fingerprint: &Fingerprint) {
        let path = self.entry_path(fingerprint);
        if path.exists()
            && let Err(e) = std::fs::remove_file(&path)
        {
            warn!(path = %path.display(), error = %e, "Failed to remove cache entry file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;
    use tempfile::tempdir;

    fn fp(kind: &str) -> Fingerprint {
        Fingerprint::new(kind, &[], &[])
    }

    fn payload(n: u64) -> serde_json::Value {
        serde_json::json!({ "n": n })
    }

    #[tokio::test]
    async fn test_store_then_lookup_hit() {
        let temp = tempdir().unwrap();
        let cache = ResponseCache::open(temp.path()).await.unwrap();

        cache
            .store(&fp("courses"), payload(1), StdDuration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(cache.lookup(&fp("courses")).await, Some(payload(1)));
        assert_eq!(cache.lookup(&fp("announcements")).await, None);
    }

    #[tokio::test]
    async fn test_expiry_is_a_miss_and_evicts() {
        let temp = tempdir().unwrap();
        let cache = ResponseCache::open(temp.path()).await.unwrap();

        cache
            .store(&fp("courses"), payload(1), StdDuration::from_millis(30))
            .await
            .unwrap();
        assert!(cache.lookup(&fp("courses")).await.is_some());

        tokio::time::sleep(StdDuration::from_millis(60)).await;

        assert_eq!(cache.lookup(&fp("courses")).await, None);
        // Lazy eviction removed the entry entirely.
        let stats = cache.stats().await;
        assert_eq!(stats.total, 0);
    }

    #[tokio::test]
    async fn test_stats_census() {
        let temp = tempdir().unwrap();
        let cache = ResponseCache::open(temp.path()).await.unwrap();

        cache
            .store(&fp("live"), payload(1), StdDuration::from_secs(60))
            .await
            .unwrap();
        cache
            .store(&fp("dead"), payload(2), StdDuration::from_millis(20))
            .await
            .unwrap();

        tokio::time::sleep(StdDuration::from_millis(50)).await;

        let stats = cache.stats().await;
        assert_eq!(stats.total, 2);
        assert_eq!(stats.valid, 1);
        assert_eq!(stats.expired, 1);
        assert_eq!(stats.valid + stats.expired, stats.total);
        assert!(stats.size_bytes > 0);
    }

    #[tokio::test]
    async fn test_store_overwrites() {
        let temp = tempdir().unwrap();
        let cache = ResponseCache::open(temp.path()).await.unwrap();

        cache
            .store(&fp("courses"), payload(1), StdDuration::from_secs(60))
            .await
            .unwrap();
        cache
            .store(&fp("courses"), payload(2), StdDuration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(cache.lookup(&fp("courses")).await, Some(payload(2)));
        assert_eq!(cache.stats().await.total, 1);
    }

    #[tokio::test]
    async fn test_invalidate_is_idempotent() {
        let temp = tempdir().unwrap();
        let cache = ResponseCache::open(temp.path()).await.unwrap();

        cache
            .store(&fp("courses"), payload(1), StdDuration::from_secs(60))
            .await
            .unwrap();

        cache.invalidate(&fp("courses")).await.unwrap();
        cache.invalidate(&fp("courses")).await.unwrap();
        cache.invalidate(&fp("never-stored")).await.unwrap();

        assert_eq!(cache.lookup(&fp("courses")).await, None);
    }

    #[tokio::test]
    async fn test_clear() {
        let temp = tempdir().unwrap();
        let cache = ResponseCache::open(temp.path()).await.unwrap();

        for kind in ["a", "b", "c"] {
            cache
                .store(&fp(kind), payload(1), StdDuration::from_secs(60))
                .await
                .unwrap();
        }

        cache.clear().await.unwrap();
        assert_eq!(cache.stats().await.total, 0);

        // Entry files are gone too.
        let survivors = std::fs::read_dir(temp.path()).unwrap().count();
        assert_eq!(survivors, 0);
    }

    #[tokio::test]
    async fn test_entries_survive_reopen() {
        let temp = tempdir().unwrap();
        {
            let cache = ResponseCache::open(temp.path()).await.unwrap();
            cache
                .store(&fp("courses"), payload(7), StdDuration::from_secs(60))
                .await
                .unwrap();
        }

        let reopened = ResponseCache::open(temp.path()).await.unwrap();
        assert_eq!(reopened.lookup(&fp("courses")).await, Some(payload(7)));
    }

    #[tokio::test]
    async fn test_corrupt_entry_file_is_skipped() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join("garbage.json"), "not json").unwrap();

        let cache = ResponseCache::open(temp.path()).await.unwrap();
        assert_eq!(cache.stats().await.total, 0);
    }

    #[tokio::test]
    async fn test_no_temp_files_left_behind() {
        let temp = tempdir().unwrap();
        let cache = ResponseCache::open(temp.path()).await.unwrap();
        cache
            .store(&fp("courses"), payload(1), StdDuration::from_secs(60))
            .await
            .unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(temp.path())
            .unwrap()
            .filter(|e| {
                e.as_ref()
                    .unwrap()
                    .path()
                    .extension()
                    .is_some_and(|ext| ext == "tmp")
            })
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_zero_ttl_is_not_cached() {
        let temp = tempdir().unwrap();
        let cache = ResponseCache::open(temp.path()).await.unwrap();

        cache
            .store(&fp("courses"), payload(1), StdDuration::ZERO)
            .await
            .unwrap();
        assert_eq!(cache.lookup(&fp("courses")).await, None);
        assert_eq!(cache.stats().await.total, 0);
    }

    #[tokio::test]
    async fn test_concurrent_stores_converge_to_one_entry() {
        let temp = tempdir().unwrap();
        let cache = ResponseCache::open(temp.path()).await.unwrap();

        let mut tasks = Vec::new();
        for n in 0..16u64 {
            let cache = cache.clone();
            tasks.push(tokio::spawn(async move {
                cache
                    .store(&fp("courses"), payload(n), StdDuration::from_secs(60))
                    .await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        // One entry survives and it is one of the written payloads, intact.
        let stats = cache.stats().await;
        assert_eq!(stats.total, 1);
        let value = cache.lookup(&fp("courses")).await.unwrap();
        let n = value.get("n").and_then(|v| v.as_u64()).unwrap();
        assert!(n < 16);
    }
}
