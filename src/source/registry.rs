//! Source Registry for validating source names and caching open sources.
//!
//! The registry provides:
//! - Membership checks against the catalog's current source list
//! - LRU caching of opened sources so each request does not reconnect
//! - Singleflight so concurrent first requests open a source only once
//! - The priority-ordered stack used by stacked tile requests
//!
//! Only source handles are cached here, never tile bytes.
//!
//! # Example
//!
//! ```ignore
//! use tilestack::source::{MbtilesCatalog, SourceRegistry};
//!
//! let catalog = MbtilesCatalog::discover(&paths, 4).await?;
//! let registry = SourceRegistry::new(catalog)
//!     .with_stack_order(vec!["detail".to_string(), "world".to_string()]);
//!
//! let source = registry.get_source("world").await?;
//! let stack = registry.stack().await?;
//! ```

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use tokio::sync::{Mutex, Notify, RwLock};
use tracing::debug;

use crate::error::{StorageError, TileError};
use crate::tile::SourceStack;

use super::SourceCatalog;

/// Default number of open sources kept in the registry.
pub const DEFAULT_SOURCE_CACHE_CAPACITY: usize = 64;

/// Registry of tile sources backed by a [`SourceCatalog`].
pub struct SourceRegistry<C: SourceCatalog> {
    /// The catalog that enumerates and opens sources
    catalog: C,

    /// Explicit priority order for stacked requests (highest first)
    stack_order: Option<Vec<String>>,

    /// Opened sources indexed by name
    cache: RwLock<LruCache<String, Arc<C::Source>>>,

    /// In-flight opens for singleflight pattern
    in_flight: Mutex<HashMap<String, Arc<InFlightState<C::Source>>>>,
}

/// State for an in-flight source open operation.
struct InFlightState<S> {
    notify: Notify,
    result: Mutex<Option<Result<Arc<S>, StorageError>>>,
}

impl<C: SourceCatalog> SourceRegistry<C> {
    /// Create a registry with the default cache capacity.
    pub fn new(catalog: C) -> Self {
        Self::with_capacity(catalog, DEFAULT_SOURCE_CACHE_CAPACITY)
    }

    /// Create a registry keeping at most `capacity` sources open.
    ///
    /// A capacity of zero is treated as one.
    pub fn with_capacity(catalog: C, capacity: usize) -> Self {
        Self {
            catalog,
            stack_order: None,
            cache: RwLock::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Set an explicit stack priority order (highest priority first).
    ///
    /// Without one, the stack holds every source in catalog order.
    pub fn with_stack_order(mut self, order: Vec<String>) -> Self {
        self.stack_order = Some(order);
        self
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Names of the currently valid sources.
    pub async fn source_names(&self) -> Result<Vec<String>, TileError> {
        Ok(self.catalog.source_names().await?)
    }

    /// Names of the stack members in priority order.
    pub async fn stack_names(&self) -> Result<Vec<String>, TileError> {
        match &self.stack_order {
            Some(order) => Ok(order.clone()),
            None => self.source_names().await,
        }
    }

    /// Get a source by name, opening it if not already cached.
    ///
    /// # Errors
    ///
    /// - [`TileError::UnknownSource`] when the name is not in the catalog
    /// - [`TileError::Storage`] when the source cannot be opened
    pub async fn get_source(&self, name: &str) -> Result<Arc<C::Source>, TileError> {
        self.ensure_known(&[name]).await?;
        self.open_known(name).await
    }

    /// Check that every name is a source in the catalog.
    ///
    /// The catalog is listed once however many names are checked; the first
    /// unknown name is reported.
    pub async fn ensure_known<N: AsRef<str>>(&self, names: &[N]) -> Result<(), TileError> {
        let known = self.catalog.source_names().await?;
        match names
            .iter()
            .map(AsRef::as_ref)
            .find(|name| !known.iter().any(|k| k == name))
        {
            Some(name) => Err(TileError::UnknownSource {
                source_name: name.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Open a source already checked with [`ensure_known`](Self::ensure_known).
    pub async fn open_known(&self, name: &str) -> Result<Arc<C::Source>, TileError> {
        Ok(self.open_cached(name).await?)
    }

    /// Build the priority-ordered stack of sources, opening every member.
    ///
    /// Every configured member must be a known source.
    pub async fn stack(&self) -> Result<SourceStack<C::Source>, TileError> {
        let order = self.stack_names().await?;
        self.ensure_known(&order).await?;

        let mut sources = Vec::with_capacity(order.len());
        for name in &order {
            sources.push(self.open_known(name).await?);
        }
        Ok(SourceStack::new(sources))
    }

    /// Open through the cache, with singleflight on misses.
    async fn open_cached(&self, name: &str) -> Result<Arc<C::Source>, StorageError> {
        // Fast path: check cache
        {
            let mut cache = self.cache.write().await;
            if let Some(source) = cache.get(name) {
                return Ok(Arc::clone(source));
            }
        }

        loop {
            let state = {
                let mut in_flight = self.in_flight.lock().await;

                if let Some(state) = in_flight.get(name) {
                    Arc::clone(state)
                } else {
                    let state = Arc::new(InFlightState {
                        notify: Notify::new(),
                        result: Mutex::new(None),
                    });
                    in_flight.insert(name.to_string(), Arc::clone(&state));
                    drop(in_flight);

                    debug!(source = name, "Opening tile source");
                    let result = self.catalog.open_source(name).await.map(Arc::new);

                    *state.result.lock().await = Some(result.clone());

                    if let Ok(ref source) = result {
                        let mut cache = self.cache.write().await;
                        cache.put(name.to_string(), Arc::clone(source));
                    }

                    self.in_flight.lock().await.remove(name);
                    state.notify.notify_waiters();

                    return result;
                }
            };

            // Register interest before re-checking so a completion between
            // the check and the await is not missed
            let notified = state.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(ref result) = *state.result.lock().await {
                return result.clone();
            }

            notified.await;

            if let Some(ref result) = *state.result.lock().await {
                return result.clone();
            };
        }
    }

    /// Drop a cached source handle; the next request reopens it.
    pub async fn invalidate(&self, name: &str) {
        self.cache.write().await.pop(name);
    }

    /// Number of currently open (cached) sources.
    pub async fn cached_count(&self) -> usize {
        self.cache.read().await.len()
    }
}

// =============================================================================
// Tests
// =============================================================================
