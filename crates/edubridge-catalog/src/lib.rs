//! EduBridge Catalog
//!
//! Read-mostly reference data: countries, universities, courses and
//! pathways.
//!
//! # Core Operations
//!
//! - **Lookup**: whole tables and single rows by id
//! - **Search**: case-insensitive substring search with optional filters
//! - **Statistics**: row counts of every table, loaded concurrently
//!
//! Tables are read through an injectable [`CatalogCache`] with a TTL and
//! explicit invalidation.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod cache;
pub mod error;
pub mod service;

pub use cache::{CacheStats, CatalogCache, CatalogEntry, CatalogTable, CachedRow};
pub use error::{CatalogError, CatalogResult};
pub use service::{CatalogService, CatalogStatistics, CourseFilter, UniversityFilter};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
