//! Catalog table cache using moka
//!
//! Each catalog table is cached whole under its [`CatalogTable`] key. The
//! cache is an explicit object handed to the service, so callers decide its
//! capacity and TTL and can drop tables on demand.

use crate::error::{CatalogError, CatalogResult};
use edubridge_store::{Country, Course, Pathway, StoreError, StoreResult, University};
use moka::future::Cache;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Cached catalog tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogTable {
    /// `n_countries`
    Countries,
    /// `new_universities`
    Universities,
    /// `new_courses`
    Courses,
    /// `pathways`
    Pathways,
}

impl CatalogTable {
    /// Every cached table
    pub const ALL: [CatalogTable; 4] = [
        Self::Countries,
        Self::Universities,
        Self::Courses,
        Self::Pathways,
    ];

    /// Name of the backing table
    #[must_use]
    pub const fn table_name(&self) -> &'static str {
        match self {
            Self::Countries => "n_countries",
            Self::Universities => "new_universities",
            Self::Courses => "new_courses",
            Self::Pathways => "pathways",
        }
    }
}

/// One cached table snapshot
#[derive(Debug, Clone)]
pub enum CatalogEntry {
    /// Country rows
    Countries(Arc<Vec<Country>>),
    /// University rows
    Universities(Arc<Vec<University>>),
    /// Course rows
    Courses(Arc<Vec<Course>>),
    /// Pathway rows
    Pathways(Arc<Vec<Pathway>>),
}

impl CatalogEntry {
    /// Rows in the snapshot
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Countries(rows) => rows.len(),
            Self::Universities(rows) => rows.len(),
            Self::Courses(rows) => rows.len(),
            Self::Pathways(rows) => rows.len(),
        }
    }

    /// Check if the snapshot has no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Row type stored in the cache under a fixed table key
pub trait CachedRow: Clone + Send + Sync + 'static {
    /// Table key
    const TABLE: CatalogTable;

    /// Wrap rows into a cache entry
    fn wrap(rows: Arc<Vec<Self>>) -> CatalogEntry;

    /// Extract rows if the entry belongs to this table
    fn from_entry(entry: CatalogEntry) -> Option<Arc<Vec<Self>>>;
}

macro_rules! cached_row {
    ($ty:ty, $variant:ident) => {
        impl CachedRow for $ty {
            const TABLE: CatalogTable = CatalogTable::$variant;

            fn wrap(rows: Arc<Vec<Self>>) -> CatalogEntry {
                CatalogEntry::$variant(rows)
            }

            fn from_entry(entry: CatalogEntry) -> Option<Arc<Vec<Self>>> {
                match entry {
                    CatalogEntry::$variant(rows) => Some(rows),
                    _ => None,
                }
            }
        }
    };
}

cached_row!(Country, Countries);
cached_row!(University, Universities);
cached_row!(Course, Courses);
cached_row!(Pathway, Pathways);

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cached tables
    pub entry_count: u64,
    /// Rows held across all cached tables
    pub weighted_size: u64,
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that went to the store
    pub misses: u64,
}

/// Catalog table cache
///
/// Capacity is measured in rows: a table snapshot weighs as many units as it
/// has rows.
#[derive(Debug, Clone)]
pub struct CatalogCache {
    inner: Cache<CatalogTable, CatalogEntry>,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl CatalogCache {
    /// Create cache holding at most `max_rows` rows, without expiry
    #[inline]
    #[must_use]
    pub fn new(max_rows: u64) -> Self {
        Self::build(max_rows, None)
    }

    /// Create cache with time-based expiration
    #[inline]
    #[must_use]
    pub fn with_ttl(max_rows: u64, ttl: Duration) -> Self {
        Self::build(max_rows, Some(ttl))
    }

    fn build(max_rows: u64, ttl: Option<Duration>) -> Self {
        let mut builder = Cache::builder()
            .max_capacity(max_rows)
            .weigher(|_table: &CatalogTable, entry: &CatalogEntry| -> u32 {
                u32::try_from(entry.len()).unwrap_or(u32::MAX)
            });
        if let Some(ttl) = ttl.filter(|t| !t.is_zero()) {
            builder = builder.time_to_live(ttl);
        }
        Self {
            inner: builder.build(),
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Insert a table snapshot
    #[inline]
    pub async fn insert<T: CachedRow>(&self, rows: Arc<Vec<T>>) {
        self.inner.insert(T::TABLE, T::wrap(rows)).await;
    }

    /// Get a cached table snapshot
    #[must_use]
    pub async fn get<T: CachedRow>(&self) -> Option<Arc<Vec<T>>> {
        let rows = self.inner.get(&T::TABLE).await.and_then(T::from_entry);
        let counter = if rows.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        rows
    }

    /// Get a cached table, or load and cache it
    ///
    /// Concurrent misses on the same table share one load. A failed load
    /// leaves the cache untouched and is reported to every waiter.
    pub async fn try_get_or_insert_with<T, F, Fut>(&self, load: F) -> CatalogResult<Arc<Vec<T>>>
    where
        T: CachedRow,
        F: FnOnce() -> Fut,
        Fut: Future<Output = StoreResult<Vec<T>>>,
    {
        if let Some(cached) = self.get::<T>().await {
            return Ok(cached);
        }

        let entry = self
            .inner
            .try_get_with(T::TABLE, async {
                let rows = Arc::new(load().await?);
                tracing::debug!(
                    table = T::TABLE.table_name(),
                    rows = rows.len(),
                    "catalog table loaded"
                );
                Ok::<_, StoreError>(T::wrap(rows))
            })
            .await
            .map_err(CatalogError::Store)?;

        T::from_entry(entry).ok_or_else(|| {
            CatalogError::from(StoreError::Decode(format!(
                "cache slot {} holds another table",
                T::TABLE.table_name()
            )))
        })
    }

    /// Drop one table
    #[inline]
    pub async fn invalidate(&self, table: CatalogTable) {
        self.inner.invalidate(&table).await;
    }

    /// Drop every table
    #[inline]
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    /// Check if a table is cached
    #[must_use]
    pub async fn contains(&self, table: CatalogTable) -> bool {
        self.inner.contains_key(&table)
    }

    /// Apply pending evictions and invalidations so counts are exact
    pub async fn run_pending_tasks(&self) {
        self.inner.run_pending_tasks().await;
    }

    /// Get cache statistics
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.inner.entry_count(),
            weighted_size: self.inner.weighted_size(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl Default for CatalogCache {
    /// Cache of 10,000 rows expiring after five minutes
    fn default() -> Self {
        Self::with_ttl(10_000, Duration::from_secs(300))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn countries() -> Vec<Country> {
        vec![
            Country {
                country_id: 1,
                country_name: "Canada".into(),
                country_code: Some("CA".into()),
            },
            Country {
                country_id: 2,
                country_name: "Germany".into(),
                country_code: Some("DE".into()),
            },
        ]
    }

    #[tokio::test]
    async fn insert_and_get() {
        let cache = CatalogCache::new(100);
        cache.insert(Arc::new(countries())).await;

        let rows = cache.get::<Country>().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(cache.get::<University>().await.is_none());
    }

    #[tokio::test]
    async fn loads_once_then_serves_cached() {
        let cache = CatalogCache::new(100);
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = Arc::clone(&calls);
            let rows = cache
                .try_get_or_insert_with(|| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(countries())
                })
                .await
                .unwrap();
            assert_eq!(rows[0].country_name, "Canada");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 2);
    }

    #[tokio::test]
    async fn failed_load_is_not_cached() {
        let cache = CatalogCache::new(100);
        let err = cache
            .try_get_or_insert_with::<Pathway, _, _>(|| async {
                Err(StoreError::Backend("store down".into()))
            })
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert!(err.to_string().ends_with("store down"));
        assert!(!cache.contains(CatalogTable::Pathways).await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_misses_share_one_load() {
        let cache = CatalogCache::new(100);
        let calls = Arc::new(AtomicUsize::new(0));

        let lookups = (0..8).map(|_| {
            let cache = cache.clone();
            let calls = Arc::clone(&calls);
            tokio::spawn(async move {
                cache
                    .try_get_or_insert_with(|| async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok(countries())
                    })
                    .await
            })
        });

        for rows in futures::future::join_all(lookups).await {
            assert_eq!(rows.unwrap().unwrap().len(), 2);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidate_drops_single_table() {
        let cache = CatalogCache::new(100);
        cache.insert(Arc::new(countries())).await;
        cache.insert(Arc::new(Vec::<Pathway>::new())).await;

        cache.invalidate(CatalogTable::Countries).await;

        assert!(!cache.contains(CatalogTable::Countries).await);
        assert!(cache.contains(CatalogTable::Pathways).await);
    }

    #[tokio::test]
    async fn invalidate_all_clears_everything() {
        let cache = CatalogCache::new(100);
        cache.insert(Arc::new(countries())).await;
        cache.invalidate_all();
        assert!(cache.get::<Country>().await.is_none());
    }

    #[tokio::test]
    async fn stats_weigh_rows() {
        let cache = CatalogCache::new(100);
        cache.insert(Arc::new(countries())).await;
        cache.run_pending_tasks().await;

        let stats = cache.stats();
        assert_eq!(stats.entry_count, 1);
        assert_eq!(stats.weighted_size, 2);
    }

    #[tokio::test]
    async fn expired_tables_reload() {
        let cache = CatalogCache::with_ttl(100, Duration::from_millis(50));
        cache.insert(Arc::new(countries())).await;
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(cache.get::<Country>().await.is_none());
    }
}
