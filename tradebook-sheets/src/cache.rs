//! In-memory cache for spreadsheet datasets.
//!
//! Each dataset is a single slot that is filled lazily by the first reader
//! and then shared by every caller until an explicit refresh replaces it.
//! Reads are lock-free; the lazy fill is a compare-and-set so concurrent
//! first readers agree on a single winning snapshot.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tracing::debug;

use crate::models::{Units, User};

/// Logical tables backed by a spreadsheet range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    Users,
    Units,
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dataset::Users => f.write_str("Users"),
            Dataset::Units => f.write_str("Units"),
        }
    }
}

/// A single cached snapshot of one dataset.
pub struct DatasetCache<T> {
    dataset: Dataset,
    slot: ArcSwapOption<Vec<T>>,
}

impl<T> DatasetCache<T> {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            slot: ArcSwapOption::empty(),
        }
    }

    /// The cached snapshot, if any, without fetching.
    pub fn current(&self) -> Option<Arc<Vec<T>>> {
        self.slot.load_full()
    }

    /// Return the cached snapshot, fetching it first if the slot is empty.
    ///
    /// Concurrent first readers may all call `fetch`, but only the first
    /// result to land is installed and every caller gets that one back.
    /// A failed fetch leaves the slot empty.
    pub async fn get<F, Fut, E>(&self, fetch: F) -> Result<Arc<Vec<T>>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>>,
    {
        if let Some(cached) = self.slot.load_full() {
            return Ok(cached);
        }

        debug!(dataset = %self.dataset, "cache miss, fetching");
        let fetched = Arc::new(fetch().await?);

        let previous = self
            .slot
            .compare_and_swap(&None::<Arc<Vec<T>>>, Some(Arc::clone(&fetched)));
        match &*previous {
            Some(winner) => {
                debug!(dataset = %self.dataset, "lost populate race, using installed snapshot");
                Ok(Arc::clone(winner))
            }
            None => Ok(fetched),
        }
    }

    /// Fetch and overwrite the slot unconditionally. The old snapshot is
    /// kept if `fetch` fails.
    pub async fn refresh<F, Fut, E>(&self, fetch: F) -> Result<Arc<Vec<T>>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>>,
    {
        let fresh = Arc::new(fetch().await?);
        self.slot.store(Some(Arc::clone(&fresh)));
        debug!(dataset = %self.dataset, rows = fresh.len(), "cache refreshed");
        Ok(fresh)
    }
}

/// Process-wide cache of every dataset the application reads.
pub struct ServiceCache {
    users: DatasetCache<User>,
    units: DatasetCache<Units>,
}

impl ServiceCache {
    pub fn new() -> Self {
        Self {
            users: DatasetCache::new(Dataset::Users),
            units: DatasetCache::new(Dataset::Units),
        }
    }

    pub async fn users<F, Fut, E>(&self, fetch: F) -> Result<Arc<Vec<User>>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<User>, E>>,
    {
        self.users.get(fetch).await
    }

    pub async fn refresh_users<F, Fut, E>(&self, fetch: F) -> Result<Arc<Vec<User>>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<User>, E>>,
    {
        self.users.refresh(fetch).await
    }

    pub async fn units<F, Fut, E>(&self, fetch: F) -> Result<Arc<Vec<Units>>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Units>, E>>,
    {
        self.units.get(fetch).await
    }

    pub async fn refresh_units<F, Fut, E>(&self, fetch: F) -> Result<Arc<Vec<Units>>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<Units>, E>>,
    {
        self.units.refresh(fetch).await
    }

    /// Whether a dataset has been loaded since startup.
    pub fn is_populated(&self, dataset: Dataset) -> bool {
        match dataset {
            Dataset::Users => self.users.current().is_some(),
            Dataset::Units => self.units.current().is_some(),
        }
    }
}

impl Default for ServiceCache {
    fn default() -> Self {
        Self::new()
    }
}
