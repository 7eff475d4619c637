//! Error types for the record store
//!
//! Covers the three ways a store call can fail:
//! - the row is missing
//! - a conditional write lost (active-request uniqueness, stale status)
//! - the backend itself failed or returned undecodable data

use crate::model::{RequestId, RequestStatus, UnknownVariant, UserId};

/// Record store error
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No row with this identifier
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record
        entity: &'static str,
        /// Key that was looked up
        id: String,
    },

    /// Student already holds a pending or approved request
    #[error("student {student_id} already has an active request ({existing})")]
    ActiveRequestExists {
        /// Student who tried to submit
        student_id: UserId,
        /// Their pending or approved request
        existing: RequestId,
    },

    /// Compare-and-swap on request status failed
    #[error("request {id} is {actual}, expected {expected}")]
    StaleStatus {
        /// Request that was written
        id: RequestId,
        /// Status the writer read
        expected: RequestStatus,
        /// Status found at write time
        actual: RequestStatus,
    },

    /// Unique key collision (e.g. email already registered)
    #[error("duplicate record: {0}")]
    Duplicate(String),

    /// Backend failure (connection, query)
    #[error("store backend error: {0}")]
    Backend(String),

    /// Stored value could not be decoded into a record
    #[error("decode error: {0}")]
    Decode(String),
}

impl StoreError {
    /// Not-found error for `entity`
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Check if the failure came from a lost conditional write
    #[inline]
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::ActiveRequestExists { .. } | Self::StaleStatus { .. } | Self::Duplicate(_)
        )
    }

    /// Check if retrying the same call may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Backend(_))
    }

    /// Check if the error is a missing row
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<UnknownVariant> for StoreError {
    fn from(value: UnknownVariant) -> Self {
        Self::Decode(value.to_string())
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for StoreError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::RowNotFound => Self::NotFound {
                entity: "row",
                id: String::new(),
            },
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                Self::Decode(value.to_string())
            }
            other => Self::Backend(other.to_string()),
        }
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
