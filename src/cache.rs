//! Best-effort key/value cache with per-entry TTL, and the post snapshot
//! that the listing endpoint writes through it.
//!
//! Nothing read from here is trusted for a response. The snapshot is a
//! copy of every post in the store, kept under the caller's key for
//! `ttl`, and the listing always answers from the owner-scoped store query.

use crate::{models::Post, store::PostStore};
use moka::{Expiry, sync::Cache};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Upper bound on live entries; one per user that listed recently.
const CACHE_MAX_CAPACITY: u64 = 10_000;

#[derive(Clone)]
struct CachedValue {
    value: String,
    ttl: Duration,
}

/// Each entry lives for the `ttl` it was last set with.
struct PerEntryTtl;

impl Expiry<String, CachedValue> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

#[derive(Clone)]
pub struct TtlCache {
    entries: Cache<String, CachedValue>,
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TtlCache {
    pub fn new() -> Self {
        let entries = Cache::builder()
            .max_capacity(CACHE_MAX_CAPACITY)
            .expire_after(PerEntryTtl)
            .build();

        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|cached| cached.value)
    }

    pub fn set(&self, key: impl Into<String>, value: String, ttl: Duration) {
        self.entries.insert(key.into(), CachedValue { value, ttl });
    }
}

/// One post as stored in the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedPost {
    pub id: i64,
    pub name: String,
}

impl From<&Post> for CachedPost {
    fn from(post: &Post) -> Self {
        Self {
            id: post.id,
            name: post.text.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSource {
    Hit,
    Miss,
}

#[derive(Clone)]
pub struct PostSnapshotCache {
    cache: TtlCache,
    ttl: Duration,
}

impl PostSnapshotCache {
    pub fn new(cache: TtlCache, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    pub fn key(user_id: i64) -> String {
        format!("post_user{}", user_id)
    }

    pub fn cache(&self) -> &TtlCache {
        &self.cache
    }

    /// Cache-aside read of the all-posts snapshot under `user_id`'s key.
    /// On a miss (or an undecodable entry) the snapshot is rebuilt from
    /// `posts.list_all()` and stored for `ttl`.
    pub fn read_through(&self, user_id: i64, posts: &PostStore) -> (SnapshotSource, Vec<CachedPost>) {
        let key = Self::key(user_id);

        if let Some(raw) = self.cache.get(&key) {
            match serde_json::from_str::<Vec<CachedPost>>(&raw) {
                Ok(snapshot) => {
                    debug!(key = %key, entries = snapshot.len(), "Post snapshot cache hit");
                    return (SnapshotSource::Hit, snapshot);
                }
                Err(e) => warn!(key = %key, "Discarding unreadable post snapshot: {}", e),
            }
        }

        let snapshot: Vec<CachedPost> = posts.list_all().iter().map(CachedPost::from).collect();
        match serde_json::to_string(&snapshot) {
            Ok(raw) => self.cache.set(key.clone(), raw, self.ttl),
            Err(e) => warn!(key = %key, "Could not serialize post snapshot: {}", e),
        }
        debug!(key = %key, entries = snapshot.len(), "Post snapshot cache miss");

        (SnapshotSource::Miss, snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_expire_after_their_ttl() {
        let cache = TtlCache::new();
        cache.set("k", "v".into(), Duration::from_millis(20));
        assert_eq!(cache.get("k").as_deref(), Some("v"));

        std::thread::sleep(Duration::from_millis(40));
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn set_overwrites() {
        let cache = TtlCache::new();
        cache.set("k", "old".into(), Duration::from_secs(5));
        cache.set("k", "new".into(), Duration::from_secs(5));
        assert_eq!(cache.get("k").as_deref(), Some("new"));
    }

    #[test]
    fn overwrite_takes_the_new_ttl() {
        let cache = TtlCache::new();
        cache.set("k", "long".into(), Duration::from_secs(60));
        cache.set("k", "short".into(), Duration::from_millis(20));

        std::thread::sleep(Duration::from_millis(40));
        assert!(cache.get("k").is_none());
    }

    #[test]
    fn entries_expire_independently() {
        let cache = TtlCache::new();
        cache.set("short", "a".into(), Duration::from_millis(20));
        cache.set("long", "b".into(), Duration::from_secs(60));

        std::thread::sleep(Duration::from_millis(40));
        assert!(cache.get("short").is_none());
        assert_eq!(cache.get("long").as_deref(), Some("b"));
    }

    #[test]
    fn miss_stores_every_post_under_the_callers_key() {
        let posts = PostStore::new();
        posts.create("mine".into(), 1).unwrap();
        posts.create("theirs".into(), 2).unwrap();
        let snapshots = PostSnapshotCache::new(TtlCache::new(), Duration::from_secs(5));

        let (source, snapshot) = snapshots.read_through(1, &posts);

        assert_eq!(source, SnapshotSource::Miss);
        assert_eq!(
            snapshot,
            vec![
                CachedPost { id: 1, name: "mine".into() },
                CachedPost { id: 2, name: "theirs".into() },
            ]
        );
        let raw = snapshots.cache().get("post_user1").unwrap();
        assert_eq!(raw, r#"[{"id":1,"name":"mine"},{"id":2,"name":"theirs"}]"#);
    }

    #[test]
    fn hit_serves_the_stale_snapshot_until_it_expires() {
        let posts = PostStore::new();
        posts.create("first".into(), 1).unwrap();
        let snapshots = PostSnapshotCache::new(TtlCache::new(), Duration::from_millis(30));

        snapshots.read_through(1, &posts);
        posts.create("second".into(), 1).unwrap();

        let (source, snapshot) = snapshots.read_through(1, &posts);
        assert_eq!(source, SnapshotSource::Hit);
        assert_eq!(snapshot.len(), 1);

        std::thread::sleep(Duration::from_millis(50));
        let (source, snapshot) = snapshots.read_through(1, &posts);
        assert_eq!(source, SnapshotSource::Miss);
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn unreadable_entry_is_rebuilt() {
        let posts = PostStore::new();
        posts.create("hello".into(), 3).unwrap();
        let snapshots = PostSnapshotCache::new(TtlCache::new(), Duration::from_secs(5));
        snapshots
            .cache()
            .set(PostSnapshotCache::key(3), "{not json".into(), Duration::from_secs(5));

        let (source, snapshot) = snapshots.read_through(3, &posts);
        assert_eq!(source, SnapshotSource::Miss);
        assert_eq!(snapshot.len(), 1);
    }
}
