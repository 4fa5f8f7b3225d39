//! Resolution cache: recording identifier to resolved backend URL.
//!
//! Written once per successful resolution, read by the stream relay on every
//! proxied request. Entries expire after a TTL and a background task sweeps
//! them out so the map stays bounded over the process lifetime.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

struct CacheEntry {
    url: String,
    inserted_at: Instant,
}

/// Thread-safe map from recording identifier to resolved URL.
pub struct ResolutionCache {
    entries: DashMap<String, CacheEntry>,
    /// Duration after which an entry is considered expired.
    ttl: Duration,
}

impl ResolutionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Store a resolved URL, overwriting any existing mapping for the id.
    pub fn put(&self, record_id: impl Into<String>, url: impl Into<String>) {
        let record_id = record_id.into();
        self.entries.insert(
            record_id.clone(),
            CacheEntry {
                url: url.into(),
                inserted_at: Instant::now(),
            },
        );
        tracing::debug!(record_id = %record_id, "Cached resolved URL");
    }

    /// Look up the current mapping for an id.
    ///
    /// Expired entries are never returned, even if the sweep task has not
    /// removed them yet.
    pub fn get(&self, record_id: &str) -> Option<String> {
        let entry = self.entries.get(record_id)?;
        if entry.inserted_at.elapsed() > self.ttl {
            return None;
        }
        Some(entry.url.clone())
    }

    /// Remove expired entries. Returns the number removed.
    pub fn remove_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.inserted_at.elapsed() <= self.ttl);
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            tracing::debug!(removed, "Swept expired cache entries");
        }
        removed
    }

    /// Number of entries, including any not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Start a background task that periodically sweeps expired entries.
pub fn start_cleanup_task(
    cache: Arc<ResolutionCache>,
    interval_secs: u64,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            cache.remove_expired();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get() {
        let cache = ResolutionCache::new(Duration::from_secs(60));
        cache.put("REC1", "http://dvr1/REC1.mp4");
        assert_eq!(cache.get("REC1").as_deref(), Some("http://dvr1/REC1.mp4"));
    }

    #[test]
    fn get_unknown_id_misses() {
        let cache = ResolutionCache::new(Duration::from_secs(60));
        assert_eq!(cache.get("nope"), None);
    }

    #[test]
    fn put_overwrites() {
        let cache = ResolutionCache::new(Duration::from_secs(60));
        cache.put("REC1", "http://dvr1/REC1.mp4");
        cache.put("REC1", "http://dvr2/REC1.mp4");
        assert_eq!(cache.get("REC1").as_deref(), Some("http://dvr2/REC1.mp4"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn expired_entry_is_not_served() {
        let cache = ResolutionCache::new(Duration::from_millis(10));
        cache.put("REC1", "http://dvr1/REC1.mp4");
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(cache.get("REC1"), None);
    }

    #[test]
    fn sweep_removes_only_expired() {
        let cache = ResolutionCache::new(Duration::from_millis(50));
        cache.put("old", "http://dvr1/old.mp4");
        std::thread::sleep(Duration::from_millis(80));
        cache.put("fresh", "http://dvr1/fresh.mp4");

        let removed = cache.remove_expired();
        assert_eq!(removed, 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("fresh").is_some());
    }

    #[test]
    fn concurrent_put_get() {
        let cache = Arc::new(ResolutionCache::new(Duration::from_secs(60)));
        let mut handles = Vec::new();

        for t in 0..8 {
            let cache = cache.clone();
            handles.push(std::thread::spawn(move || {
                for i in 0..100 {
                    let id = format!("rec-{t}-{i}");
                    let url = format!("http://dvr/{id}.mp4");
                    cache.put(&id, &url);
                    assert_eq!(cache.get(&id).as_deref(), Some(url.as_str()));
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 800);
    }

    #[tokio::test]
    async fn cleanup_task_sweeps() {
        let cache = Arc::new(ResolutionCache::new(Duration::from_millis(10)));
        cache.put("REC1", "http://dvr1/REC1.mp4");

        let handle = start_cleanup_task(cache.clone(), 1);
        tokio::time::sleep(Duration::from_millis(1200)).await;

        assert!(cache.is_empty());
        handle.abort();
    }
}
