//! EduBridge Record Store
//!
//! Typed access to the persisted records of the counseling marketplace.
//!
//! # Core Concepts
//!
//! - **Records**: users, counselor profiles, connection requests, sessions,
//!   activity entries and the read-only catalog tables
//! - **RecordStore**: CRUD surface the services are written against
//! - **Conditional writes**: active-request uniqueness and status
//!   compare-and-swap are enforced by the backend, never by read-then-write
//!
//! # Backends
//!
//! - [`MemoryStore`]: single-lock in-process tables for tests and demos
//! - `PgStore` (feature `postgres`): sqlx over Postgres, with a partial
//!   unique index guarding active requests
//!
//! # Example
//!
//! ```rust,ignore
//! use edubridge_store::{MemoryStore, NewCounselorRequest, RecordStore};
//!
//! let store = MemoryStore::new();
//! let request = store
//!     .create_request_if_no_active(NewCounselorRequest::new(student, counselor))
//!     .await?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod memory;
pub mod model;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use model::{
    Activity, ActivityId, ActivityKind, Counselor, CounselorRequest, Country, Course,
    NewCounselorRequest, NewSession, NewUser, Pathway, RequestId, RequestStatus, Role,
    RosterEntry, Session, SessionId, SessionStatus, SessionType, SessionUpdate, StatusPatch,
    University, UnknownVariant, User, UserId,
};
#[cfg(feature = "postgres")]
pub use postgres::PgStore;
pub use store::{CatalogSource, RecordStore};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
