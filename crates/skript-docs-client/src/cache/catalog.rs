use std::{future::Future, sync::Arc, time::Duration};

use tokio::{sync::Mutex, time::Instant};
use tracing::debug;

/// A single value fetched on demand and reused until it is older than `ttl`.
///
/// The lock is held across the fetch, so concurrent callers that find the
/// value stale wait for one refresh instead of issuing their own.
#[derive(Debug)]
pub struct TimedCatalog<T> {
    ttl: Duration,
    slot: Mutex<Option<CatalogEntry<T>>>,
}

#[derive(Debug)]
struct CatalogEntry<T> {
    fetched_at: Instant,
    value: Arc<T>,
}

impl<T> TimedCatalog<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached value, refetching first when it is missing or expired.
    ///
    /// A failed refetch leaves the previous entry in place (still expired) and
    /// returns the error.
    pub async fn get_or_refresh<F, Fut, E>(&self, fetch: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut slot = self.slot.lock().await;
        if let Some(entry) = slot.as_ref() {
            if entry.fetched_at.elapsed() < self.ttl {
                return Ok(entry.value.clone());
            }
            debug!(
                target: "skript_docs_cache",
                age_secs = entry.fetched_at.elapsed().as_secs(),
                "catalog expired; refetching"
            );
        }

        let value = Arc::new(fetch().await?);
        *slot = Some(CatalogEntry {
            fetched_at: Instant::now(),
            value: value.clone(),
        });
        Ok(value)
    }

    pub async fn is_fresh(&self) -> bool {
        self.slot
            .lock()
            .await
            .as_ref()
            .is_some_and(|entry| entry.fetched_at.elapsed() < self.ttl)
    }

    pub async fn invalidate(&self) {
        self.slot.lock().await.take();
    }
}
