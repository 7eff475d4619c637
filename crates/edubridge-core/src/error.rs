//! Error types for EduBridge core
//!
//! Provides error handling for:
//! - Store and catalog failures
//! - Validation of submitted forms
//! - Business-rule violations (illegal transitions, missing approval)
//! - Authorization of privileged actions
//! - Configuration loading

use crate::lifecycle::EventKind;
use edubridge_catalog::CatalogError;
use edubridge_store::{RequestId, RequestStatus, Role, SessionId, SessionStatus, StoreError, UserId};
use std::path::PathBuf;

/// Main core error type
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Event is not allowed from the request's current status
    #[error("cannot {event} request {id} while it is {from}")]
    IllegalTransition {
        /// Request the event targeted
        id: RequestId,
        /// Status the request was in
        from: RequestStatus,
        /// Event that was refused
        event: EventKind,
    },

    /// Actor lacks the role or ownership required for the action
    #[error("{role} {actor} may not {action}")]
    Forbidden {
        /// Acting user
        actor: UserId,
        /// Role read fresh from the store
        role: Role,
        /// What the actor attempted
        action: &'static str,
    },

    /// Submitted data failed validation
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Booking attempted without an approved connection
    #[error("no approved connection between student {student_id} and counselor {counselor_id}")]
    NoApprovedConnection {
        /// Student side of the booking
        student_id: UserId,
        /// Counselor side of the booking
        counselor_id: UserId,
    },

    /// Session is no longer scheduled
    #[error("session {id} is already {status}")]
    SessionClosed {
        /// Session that was targeted
        id: SessionId,
        /// Its terminal status
        status: SessionStatus,
    },

    /// Record store failure or lost conditional write
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Catalog lookup failure
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl CoreError {
    /// Check if the caller can fix the error by changing the input
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        match self {
            Self::IllegalTransition { .. }
            | Self::Forbidden { .. }
            | Self::Validation(_)
            | Self::NoApprovedConnection { .. }
            | Self::SessionClosed { .. } => true,
            Self::Store(e) => e.is_conflict() || e.is_not_found(),
            Self::Catalog(e) => e.is_not_found(),
            Self::Config(_) => false,
        }
    }

    /// Check if retrying the same call may succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store(e) => e.is_retryable(),
            Self::Catalog(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Create forbidden error
    #[inline]
    pub fn forbidden(actor: UserId, role: Role, action: &'static str) -> Self {
        Self::Forbidden {
            actor,
            role,
            action,
        }
    }
}

/// Form validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Required field is empty
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Field is present but unacceptable
    #[error("{field}: {reason}")]
    InvalidField {
        /// Field name
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

impl ValidationError {
    /// Create invalid-field error
    #[inline]
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read or written
    #[error("cannot access {path}: {source}")]
    Io {
        /// File that was accessed
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },

    /// TOML did not parse into the config schema
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config could not be rendered as TOML
    #[error("cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Parsed values are inconsistent
    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Result type alias for core operations
pub type CoreResult<T> = Result<T, CoreError>;
