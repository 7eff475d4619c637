//! Error types for catalog lookups

use edubridge_store::StoreError;
use std::sync::Arc;

/// Catalog error
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// No catalog row with this id
    #[error("{entity} {id} not found in catalog")]
    NotFound {
        /// Catalog table
        entity: &'static str,
        /// Row id that was looked up
        id: i64,
    },

    /// Loading a table from the store failed
    ///
    /// Shared because every caller waiting on the same load sees the error.
    #[error("catalog load failed: {0}")]
    Store(#[from] Arc<StoreError>),
}

impl From<StoreError> for CatalogError {
    fn from(value: StoreError) -> Self {
        Self::Store(Arc::new(value))
    }
}

impl CatalogError {
    /// Check if the error is a missing row
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if retrying the lookup may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::NotFound { .. } => false,
            Self::Store(e) => e.is_retryable(),
        }
    }
}

/// Result type alias for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = CatalogError::NotFound {
            entity: "university",
            id: 42,
        };
        assert_eq!(err.to_string(), "university 42 not found in catalog");
        assert!(err.is_not_found());
        assert!(!err.is_retryable());
    }

    #[test]
    fn store_backend_errors_stay_retryable() {
        let err: CatalogError = StoreError::Backend("timeout".into()).into();
        assert!(err.is_retryable());
    }
}
