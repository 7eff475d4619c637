//! EduBridge Core
//!
//! Business rules of the counseling marketplace, written against the
//! [`edubridge_store::RecordStore`] trait.
//!
//! # Core Concepts
//!
//! - **Connection requests**: a student asks a counselor for guidance; an
//!   admin approves, rejects or reassigns; the student may cancel
//! - **Transition table**: [`lifecycle::validate_transition`] is the single
//!   authority on which events apply to which status
//! - **Actors**: every privileged action re-reads the acting user's role
//! - **Sessions**: booked only over an approved connection
//!
//! # Example
//!
//! ```rust,ignore
//! use edubridge_core::{EduBridge, EduBridgeConfig};
//! use edubridge_store::MemoryStore;
//! use std::sync::Arc;
//!
//! let platform = EduBridge::new(Arc::new(MemoryStore::new()), &EduBridgeConfig::default());
//! let request = platform.connections.submit_request(&student, counselor_id, None).await?;
//! platform.connections.approve(request.id, &admin, None).await?;
//! ```

#![warn(missing_docs)]

pub mod actor;
pub mod booking;
pub mod config;
pub mod connection;
pub mod demo;
pub mod directory;
pub mod error;
pub mod filter;
pub mod lifecycle;
pub mod platform;
pub mod stats;

pub use actor::Actor;
pub use booking::{BookingService, SessionForm, RATING_RANGE};
pub use config::{BookingConfig, CacheConfig, DatabaseConfig, EduBridgeConfig, LoggingConfig};
pub use connection::ConnectionService;
pub use directory::DirectoryService;
pub use error::{ConfigError, CoreError, CoreResult, ValidationError};
pub use filter::{filter_requests, search_users, StatusFilter};
pub use lifecycle::{allowed_events, validate_transition, Event, EventKind, IllegalTransition, Step};
pub use platform::EduBridge;
pub use stats::{CounselorStats, RequestSummary, StudentStats};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
