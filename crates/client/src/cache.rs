//! Query result cache.
//!
//! A [`QueryCache`] holds the last known result for each query key together
//! with the bookkeeping the coordinator needs: when it was fetched, whether
//! it has been invalidated, the last fetch error, and a generation counter.
//!
//! The generation is bumped whenever an optimistic update is applied. A
//! fetch records the generation it started under and only writes its result
//! back if nothing bumped it in the meantime, so a slow fetch can never
//! overwrite an optimistic state it did not observe.
//!
//! The lock is never held across an `.await`.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

/// Key of the shared "all projects" list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    ProjectList,
}

/// Result of looking up a key against a stale time.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<V> {
    /// Cached and younger than the stale time.
    Fresh(V),
    /// Cached, but older than the stale time or explicitly invalidated.
    Stale(V),
    /// Nothing cached for this key.
    Missing,
}

#[derive(Debug)]
struct Slot<V> {
    data: Option<V>,
    fetched_at: Option<Instant>,
    invalidated: bool,
    generation: u64,
    last_error: Option<String>,
    revalidating: bool,
}

impl<V> Default for Slot<V> {
    fn default() -> Self {
        Self {
            data: None,
            fetched_at: None,
            invalidated: false,
            generation: 0,
            last_error: None,
            revalidating: false,
        }
    }
}

/// Process-local cache of query results, keyed by `K`.
///
/// Designed to be owned by one coordinator per application session and
/// shared through it; there is no global instance.
#[derive(Debug)]
pub struct QueryCache<K, V> {
    slots: RwLock<HashMap<K, Slot<V>>>,
}

impl<K, V> Default for QueryCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> QueryCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Cached data for `key`, regardless of staleness.
    pub async fn get(&self, key: &K) -> Option<V> {
        self.slots
            .read()
            .await
            .get(key)
            .and_then(|slot| slot.data.clone())
    }

    /// Classify the cached data for `key` against `stale_time`.
    pub async fn lookup(&self, key: &K, stale_time: Duration) -> Lookup<V> {
        let slots = self.slots.read().await;
        let Some(slot) = slots.get(key) else {
            return Lookup::Missing;
        };
        let Some(data) = slot.data.clone() else {
            return Lookup::Missing;
        };
        let expired = slot
            .fetched_at
            .map_or(true, |at| at.elapsed() >= stale_time);
        if slot.invalidated || expired {
            Lookup::Stale(data)
        } else {
            Lookup::Fresh(data)
        }
    }

    /// Current generation of `key` (0 if never touched).
    pub async fn generation(&self, key: &K) -> u64 {
        self.slots
            .read()
            .await
            .get(key)
            .map_or(0, |slot| slot.generation)
    }

    /// Store a fetch result unconditionally, marking it fresh.
    pub async fn set(&self, key: K, data: V) {
        let mut slots = self.slots.write().await;
        let slot = slots.entry(key).or_default();
        Self::store(slot, data);
    }

    /// Store a fetch result only if `key` is still at `generation`.
    ///
    /// Returns `false` (and leaves the cache untouched) when an optimistic
    /// update happened after the fetch started.
    pub async fn set_if_generation(&self, key: K, data: V, generation: u64) -> bool {
        let mut slots = self.slots.write().await;
        let slot = slots.entry(key).or_default();
        if slot.generation != generation {
            return false;
        }
        Self::store(slot, data);
        true
    }

    fn store(slot: &mut Slot<V>, data: V) {
        slot.data = Some(data);
        slot.fetched_at = Some(Instant::now());
        slot.invalidated = false;
        slot.last_error = None;
    }

    /// Snapshot the cached data for `key`, then mutate it in place with `f`.
    ///
    /// Both steps happen under one write lock and bump the generation.
    /// Returns `None` when nothing is cached (there is nothing for readers to
    /// see, so nothing is applied); otherwise the pre-mutation snapshot and
    /// the closure's result.
    pub async fn apply_optimistic<R>(&self, key: &K, f: impl FnOnce(&mut V) -> R) -> Option<(V, R)> {
        let mut slots = self.slots.write().await;
        let slot = slots.get_mut(key)?;
        let data = slot.data.as_mut()?;
        let snapshot = data.clone();
        let outcome = f(data);
        slot.generation += 1;
        Some((snapshot, outcome))
    }

    /// Put a snapshot taken by [`apply_optimistic`](Self::apply_optimistic)
    /// back verbatim. Freshness bookkeeping is left as it was.
    pub async fn restore(&self, key: K, snapshot: V) {
        let mut slots = self.slots.write().await;
        let slot = slots.entry(key).or_default();
        if slot.data.is_none() {
            slot.invalidated = true;
        }
        slot.data = Some(snapshot);
    }

    /// Mark `key` as needing a refetch. Cached data stays readable.
    pub async fn invalidate(&self, key: &K) {
        if let Some(slot) = self.slots.write().await.get_mut(key) {
            slot.invalidated = true;
        }
    }

    /// Forget everything about `key`.
    pub async fn remove(&self, key: &K) {
        self.slots.write().await.remove(key);
    }

    /// Remember why the last fetch for `key` failed.
    pub async fn record_error(&self, key: K, error: impl Into<String>) {
        let mut slots = self.slots.write().await;
        slots.entry(key).or_default().last_error = Some(error.into());
    }

    /// Message of the last failed fetch, cleared by the next successful one.
    pub async fn last_error(&self, key: &K) -> Option<String> {
        self.slots
            .read()
            .await
            .get(key)
            .and_then(|slot| slot.last_error.clone())
    }

    /// Claim the background revalidation for `key`.
    ///
    /// Returns `false` if another revalidation is already running.
    pub async fn begin_revalidation(&self, key: &K) -> bool {
        let mut slots = self.slots.write().await;
        let slot = slots.entry(key.clone()).or_default();
        if slot.revalidating {
            return false;
        }
        slot.revalidating = true;
        true
    }

    pub async fn end_revalidation(&self, key: &K) {
        if let Some(slot) = self.slots.write().await.get_mut(key) {
            slot.revalidating = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIVE_MINUTES: Duration = Duration::from_secs(300);

    #[tokio::test]
    async fn missing_key_reports_missing() {
        let cache: QueryCache<QueryKey, Vec<u32>> = QueryCache::new();
        assert_eq!(cache.lookup(&QueryKey::ProjectList, FIVE_MINUTES).await, Lookup::Missing);
        assert_eq!(cache.get(&QueryKey::ProjectList).await, None);
    }

    #[tokio::test]
    async fn set_then_lookup_is_fresh_until_invalidated() {
        let cache = QueryCache::new();
        cache.set(QueryKey::ProjectList, vec![1, 2]).await;
        assert_eq!(
            cache.lookup(&QueryKey::ProjectList, FIVE_MINUTES).await,
            Lookup::Fresh(vec![1, 2])
        );

        cache.invalidate(&QueryKey::ProjectList).await;
        assert_eq!(
            cache.lookup(&QueryKey::ProjectList, FIVE_MINUTES).await,
            Lookup::Stale(vec![1, 2])
        );
    }

    #[tokio::test]
    async fn zero_stale_time_is_always_stale() {
        let cache = QueryCache::new();
        cache.set(QueryKey::ProjectList, vec![1]).await;
        assert_eq!(
            cache.lookup(&QueryKey::ProjectList, Duration::ZERO).await,
            Lookup::Stale(vec![1])
        );
    }

    #[tokio::test]
    async fn optimistic_apply_snapshots_and_bumps_generation() {
        let cache = QueryCache::new();
        cache.set(QueryKey::ProjectList, vec![1, 2]).await;
        let before = cache.generation(&QueryKey::ProjectList).await;

        let (snapshot, len) = cache
            .apply_optimistic(&QueryKey::ProjectList, |v| {
                v.push(3);
                v.len()
            })
            .await
            .expect("entry exists");

        assert_eq!(snapshot, vec![1, 2]);
        assert_eq!(len, 3);
        assert_eq!(cache.get(&QueryKey::ProjectList).await, Some(vec![1, 2, 3]));
        assert_eq!(cache.generation(&QueryKey::ProjectList).await, before + 1);

        cache.restore(QueryKey::ProjectList, snapshot).await;
        assert_eq!(cache.get(&QueryKey::ProjectList).await, Some(vec![1, 2]));
    }

    #[tokio::test]
    async fn optimistic_apply_on_missing_key_does_nothing() {
        let cache: QueryCache<QueryKey, Vec<u32>> = QueryCache::new();
        let applied = cache
            .apply_optimistic(&QueryKey::ProjectList, |v| v.push(1))
            .await;
        assert!(applied.is_none());
        assert_eq!(cache.get(&QueryKey::ProjectList).await, None);
    }

    #[tokio::test]
    async fn superseded_fetch_is_discarded() {
        let cache = QueryCache::new();
        cache.set(QueryKey::ProjectList, vec![1]).await;

        let started_at = cache.generation(&QueryKey::ProjectList).await;
        cache
            .apply_optimistic(&QueryKey::ProjectList, |v| v.push(2))
            .await;

        let written = cache
            .set_if_generation(QueryKey::ProjectList, vec![9], started_at)
            .await;
        assert!(!written);
        assert_eq!(cache.get(&QueryKey::ProjectList).await, Some(vec![1, 2]));
    }

    #[tokio::test]
    async fn errors_are_cleared_by_next_success() {
        let cache = QueryCache::new();
        cache.record_error(QueryKey::ProjectList, "HTTP 503").await;
        assert_eq!(
            cache.last_error(&QueryKey::ProjectList).await.as_deref(),
            Some("HTTP 503")
        );

        cache.set(QueryKey::ProjectList, vec![1]).await;
        assert_eq!(cache.last_error(&QueryKey::ProjectList).await, None);
    }

    #[tokio::test]
    async fn only_one_revalidation_at_a_time() {
        let cache: QueryCache<QueryKey, Vec<u32>> = QueryCache::new();
        assert!(cache.begin_revalidation(&QueryKey::ProjectList).await);
        assert!(!cache.begin_revalidation(&QueryKey::ProjectList).await);
        cache.end_revalidation(&QueryKey::ProjectList).await;
        assert!(cache.begin_revalidation(&QueryKey::ProjectList).await);
    }
}
