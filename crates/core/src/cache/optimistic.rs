//! Optimistic mutations with exact rollback
//!
//! 1. `on_mutate`: cancel in-flight fetches for the key, snapshot the cached
//!    value and apply the optimistic transform.
//! 2. The mutation itself runs.
//! 3. `on_error`: write the snapshot back verbatim.
//! 4. `on_settled`: invalidate the key so the next read refetches.
//!
//! Each mutation snapshots after cancelling fetches, so a second mutation on
//! the same key snapshots the first one's optimistic state. If the first
//! then fails, its rollback restores its own snapshot and the second
//! mutation's optimistic write is lost until the refetch (last rollback
//! wins).

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use super::query_cache::{CacheKey, QueryCache};

/// Pre-mutation value of one cache key. Consumed by rollback.
#[derive(Debug)]
pub struct CacheSnapshot<T> {
    key: CacheKey,
    previous: Option<T>,
}

impl<T> CacheSnapshot<T> {
    #[must_use]
    pub const fn key(&self) -> &CacheKey {
        &self.key
    }

    #[must_use]
    pub const fn previous(&self) -> Option<&T> {
        self.previous.as_ref()
    }
}

pub struct OptimisticMutationCoordinator<T> {
    cache: Arc<QueryCache<T>>,
}

impl<T: Clone> OptimisticMutationCoordinator<T> {
    pub fn new(cache: Arc<QueryCache<T>>) -> Self {
        Self { cache }
    }

    #[must_use]
    pub const fn cache(&self) -> &Arc<QueryCache<T>> {
        &self.cache
    }

    /// Cancel fetches, snapshot, apply `transform`.
    ///
    /// Keys with nothing cached are snapshotted as `None` and left alone.
    pub fn on_mutate(&self, key: &CacheKey, transform: impl FnOnce(&T) -> T) -> CacheSnapshot<T> {
        self.cache.cancel_queries(key);
        let previous = self.cache.update(key, transform);
        debug!(%key, had_value = previous.is_some(), "optimistic update applied");
        CacheSnapshot { key: key.clone(), previous }
    }

    /// Restore the snapshot verbatim, discarding the optimistic state.
    pub fn on_error(&self, snapshot: CacheSnapshot<T>) {
        let CacheSnapshot { key, previous } = snapshot;
        self.cache.restore(&key, previous);
        debug!(%key, "optimistic update rolled back");
    }

    /// Invalidate the key so the authoritative server state is refetched.
    pub fn on_settled(&self, key: &CacheKey) {
        self.cache.invalidate(key);
    }

    /// Run the whole protocol around `mutation`.
    ///
    /// # Errors
    ///
    /// The mutation's error, unchanged, after the cache was rolled back.
    pub async fn mutate<R, E, Fut>(
        &self,
        key: &CacheKey,
        transform: impl FnOnce(&T) -> T,
        mutation: Fut,
    ) -> Result<R, E>
    where
        Fut: Future<Output = Result<R, E>>,
        E: Display,
    {
        self.mutate_and_reconcile(key, transform, mutation, |current, _| current.clone()).await
    }

    /// Like [`mutate`](Self::mutate), but on success `reconcile` folds the
    /// server response into the cache before invalidation, e.g. swapping a
    /// create placeholder for the server entity.
    ///
    /// # Errors
    ///
    /// The mutation's error, unchanged, after the cache was rolled back.
    pub async fn mutate_and_reconcile<R, E, Fut>(
        &self,
        key: &CacheKey,
        transform: impl FnOnce(&T) -> T,
        mutation: Fut,
        reconcile: impl FnOnce(&T, &R) -> T,
    ) -> Result<R, E>
    where
        Fut: Future<Output = Result<R, E>>,
        E: Display,
    {
        let snapshot = self.on_mutate(key, transform);
        let result = mutation.await;

        match &result {
            Ok(response) => {
                self.cache.update(key, |current| reconcile(current, response));
            }
            Err(err) => {
                warn!(%key, error = %err, "mutation failed, restoring snapshot");
                self.on_error(snapshot);
            }
        }
        self.on_settled(key);
        result
    }
}
