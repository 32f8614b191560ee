//! License cache with TTL-based expiration
//!
//! Maps an account to its licensed modules. Entries are evicted lazily when a read
//! finds them expired, and actively by a background sweeper running at a fixed
//! interval. A read never returns an entry past its expiry.

use dashmap::DashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use crate::domain::{AccountId, LicensedModules};

/// Default time-to-live for cached entitlements (30 minutes)
pub const DEFAULT_LICENSE_CACHE_TTL: Duration = Duration::from_secs(30 * 60);

/// Default sweep interval (5 minutes)
pub const DEFAULT_LICENSE_CACHE_CLEAN_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Longest TTL a cache accepts; longer values are clamped (7 days)
pub const MAX_LICENSE_CACHE_TTL: Duration = Duration::from_secs(7 * 24 * 3600);

#[derive(Debug, Clone)]
struct CacheEntry {
    modules: LicensedModules,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(modules: LicensedModules, ttl: Duration) -> Self {
        Self { modules, expires_at: Instant::now() + ttl }
    }

    fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

/// Thread-safe license cache keyed by account
#[derive(Debug)]
pub struct LicenseCache {
    entries: DashMap<AccountId, CacheEntry>,
    ttl: Duration,
}

impl LicenseCache {
    /// Create a new cache with the specified TTL
    pub fn new(ttl: Duration) -> Self {
        Self { entries: DashMap::new(), ttl: ttl.min(MAX_LICENSE_CACHE_TTL) }
    }

    /// Get the licensed modules of an account, if cached and not expired
    pub fn get(&self, account_id: &AccountId) -> Option<LicensedModules> {
        {
            let entry = self.entries.get(account_id)?;
            if !entry.is_expired() {
                return Some(entry.modules.clone());
            }
        }

        // The read guard is released above; removing while holding it would deadlock the shard.
        if self.entries.remove_if(account_id, |_, entry| entry.is_expired()).is_some() {
            debug!(account_id = %account_id, "Evicted expired license cache entry on read");
        }
        None
    }

    /// Store the licensed modules of an account, replacing any previous entry
    pub fn set(&self, account_id: AccountId, modules: LicensedModules) {
        debug!(account_id = %account_id, ttl_secs = self.ttl.as_secs(), "Caching licensed modules");
        self.entries.insert(account_id, CacheEntry::new(modules, self.ttl));
    }

    /// Remove the entry of an account
    ///
    /// Returns true if an entry was removed.
    pub fn invalidate(&self, account_id: &AccountId) -> bool {
        self.entries.remove(account_id).is_some()
    }

    /// Remove expired entries
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());

        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!(
                removed = removed,
                remaining = self.entries.len(),
                "Cleaned up expired license cache entries"
            );
        }
        removed
    }

    /// Number of stored entries, including expired ones not yet swept
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the TTL for this cache
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Spawn the background sweeper.
    ///
    /// The task holds a weak reference and exits once the cache has been dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let cache: Weak<LicenseCache> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match cache.upgrade() {
                    Some(cache) => {
                        cache.cleanup_expired();
                    }
                    None => {
                        debug!("License cache dropped, stopping sweeper");
                        break;
                    }
                }
            }
        })
    }
}

impl Default for LicenseCache {
    fn default() -> Self {
        Self::new(DEFAULT_LICENSE_CACHE_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Module;

    fn account(id: &str) -> AccountId {
        AccountId::new(id).unwrap()
    }

    fn ci_licensed() -> LicensedModules {
        [Module::Ci].into_iter().collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_get_set() {
        let cache = LicenseCache::new(Duration::from_secs(60));

        cache.set(account("acct-1"), ci_licensed());

        assert_eq!(cache.get(&account("acct-1")), Some(ci_licensed()));
        assert_eq!(cache.get(&account("acct-2")), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_returned_verbatim_until_ttl() {
        let cache = LicenseCache::new(Duration::from_secs(60));
        cache.set(account("acct-1"), ci_licensed());

        tokio::time::advance(Duration::from_secs(60)).await;
        assert_eq!(cache.get(&account("acct-1")), Some(ci_licensed()));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(cache.get(&account("acct-1")), None);
        // Lazy eviction removed the stale entry.
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_ttl_is_clamped() {
        let cache = LicenseCache::new(Duration::MAX);
        assert_eq!(cache.ttl(), MAX_LICENSE_CACHE_TTL);

        cache.set(account("acct-1"), ci_licensed());
        assert_eq!(cache.get(&account("acct-1")), Some(ci_licensed()));

        tokio::time::advance(MAX_LICENSE_CACHE_TTL + Duration::from_secs(1)).await;
        assert_eq!(cache.get(&account("acct-1")), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_supersedes_previous_entry() {
        let cache = LicenseCache::new(Duration::from_secs(60));
        cache.set(account("acct-1"), LicensedModules::baseline());
        cache.set(account("acct-1"), ci_licensed());

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&account("acct-1")), Some(ci_licensed()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_expired_is_partial() {
        let cache = LicenseCache::new(Duration::from_secs(60));
        cache.set(account("acct-1"), ci_licensed());

        tokio::time::advance(Duration::from_secs(45)).await;
        cache.set(account("acct-2"), ci_licensed());

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(cache.cleanup_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&account("acct-2")).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate() {
        let cache = LicenseCache::new(Duration::from_secs(60));
        cache.set(account("acct-1"), ci_licensed());

        assert!(cache.invalidate(&account("acct-1")));
        assert!(!cache.invalidate(&account("acct-1")));
        assert!(cache.get(&account("acct-1")).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_evicts_without_reads() {
        let cache = Arc::new(LicenseCache::new(Duration::from_secs(10)));
        let handle = cache.spawn_sweeper(Duration::from_secs(5));

        cache.set(account("acct-1"), ci_licensed());
        assert_eq!(cache.len(), 1);

        tokio::time::sleep(Duration::from_secs(16)).await;
        assert_eq!(cache.len(), 0);

        drop(cache);
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(handle.is_finished());
    }

    #[test]
    fn test_concurrent_access() {
        use std::thread;

        let cache = Arc::new(LicenseCache::new(Duration::from_secs(60)));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for j in 0..100 {
                        let id = account(&format!("acct-{}", (i + j) % 4));
                        cache.set(id.clone(), ci_licensed());
                        assert!(cache.get(&id).is_some());
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("Thread panicked");
        }

        assert_eq!(cache.len(), 4);
    }
}
