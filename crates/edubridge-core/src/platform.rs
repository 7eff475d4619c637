//! Service bundle over one store

use crate::booking::BookingService;
use crate::config::EduBridgeConfig;
use crate::connection::ConnectionService;
use crate::directory::DirectoryService;
use edubridge_catalog::{CatalogCache, CatalogService};
use edubridge_store::{CatalogSource, RecordStore};
use std::sync::Arc;

/// Every EduBridge service wired to the same store
#[derive(Debug)]
pub struct EduBridge<S> {
    /// Connection request lifecycle
    pub connections: ConnectionService<S>,
    /// Session booking
    pub bookings: BookingService<S>,
    /// User and counselor lookup
    pub directory: DirectoryService<S>,
    /// Cached reference data
    pub catalog: CatalogService<S>,
    store: Arc<S>,
}

impl<S> Clone for EduBridge<S> {
    fn clone(&self) -> Self {
        Self {
            connections: self.connections.clone(),
            bookings: self.bookings.clone(),
            directory: self.directory.clone(),
            catalog: self.catalog.clone(),
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: RecordStore + CatalogSource> EduBridge<S> {
    /// Wire services to `store` using `config`
    #[must_use]
    pub fn new(store: Arc<S>, config: &EduBridgeConfig) -> Self {
        let cache = match config.cache.ttl() {
            Some(ttl) => CatalogCache::with_ttl(config.cache.max_capacity, ttl),
            None => CatalogCache::new(config.cache.max_capacity),
        };
        Self {
            connections: ConnectionService::new(Arc::clone(&store)),
            bookings: BookingService::new(Arc::clone(&store), config.booking.clone()),
            directory: DirectoryService::new(Arc::clone(&store)),
            catalog: CatalogService::new(Arc::clone(&store), cache),
            store,
        }
    }

    /// Shared store handle
    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}
