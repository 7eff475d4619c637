//! Record types held by the persisted record store
//!
//! Every entity the marketplace persists is defined here, together with the
//! closed enumerations that replace the free-form status strings of the
//! remote tables:
//! - Identity: [`UserId`], [`User`], [`Role`], [`Counselor`]
//! - Connection lifecycle: [`CounselorRequest`], [`RequestStatus`], [`StatusPatch`]
//! - Booking: [`Session`], [`SessionType`], [`SessionStatus`]
//! - Audit: [`Activity`], [`ActivityKind`]
//! - Catalog: [`Country`], [`University`], [`Course`], [`Pathway`]

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub uuid::Uuid);

        impl $name {
            /// Generate a fresh random identifier
            #[inline]
            #[must_use]
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                uuid::Uuid::parse_str(s).map(Self)
            }
        }
    };
}

pub(crate) use uuid_id;

mod activity;
mod catalog;
mod request;
mod session;
mod user;

pub use activity::{Activity, ActivityId, ActivityKind};
pub use catalog::{Country, Course, Pathway, University};
pub use request::{CounselorRequest, NewCounselorRequest, RequestId, RequestStatus, RosterEntry, StatusPatch};
pub use session::{NewSession, Session, SessionId, SessionStatus, SessionType, SessionUpdate};
pub use user::{Counselor, NewUser, Role, User, UserId};

/// Error returned when a stored enum string does not match any variant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value: '{value}'")]
pub struct UnknownVariant {
    /// Enumeration name
    pub kind: &'static str,
    /// Rejected value
    pub value: String,
}

impl UnknownVariant {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
