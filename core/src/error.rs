//! The gateway's single error type.
//!
//! Every store failure is funnelled through [`store_failure`], which logs the
//! operation, its arguments and the cause before wrapping the cause in
//! [`GatewayError::Store`]. Nothing is retried.

use crate::store::LogStoreError;
use std::fmt;
use thiserror::Error;

/// Result type alias for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors returned by [`Gateway`](crate::Gateway) operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// A store command failed. The original cause is kept as the source.
    #[error("{operation} failed: {source}")]
    Store {
        /// Gateway operation that issued the command
        operation: &'static str,
        /// Failure reported by the store
        #[source]
        source: LogStoreError,
    },

    /// The request asks for something this gateway does not support.
    /// Raised before any store command is sent.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The store answered, but the addressed stream or group was absent.
    #[error("{operation}: {what} not found")]
    NotFound {
        /// Gateway operation that detected the absence
        operation: &'static str,
        /// Description of what was missing
        what: String,
    },

    /// The gateway has been closed.
    #[error("Gateway is closed")]
    Closed,
}

impl GatewayError {
    /// Returns `true` if a stream or group was missing, whether the store or
    /// the gateway noticed it.
    ///
    /// # Examples
    ///
    /// ```
    /// use streamgate_core::{GatewayError, LogStoreError};
    ///
    /// let err = GatewayError::Store {
    ///     operation: "list_groups",
    ///     source: LogStoreError::NotFound("orders".to_string()),
    /// };
    /// assert!(err.is_not_found());
    /// assert!(!GatewayError::Closed.is_not_found());
    /// ```
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::Store {
                    source: LogStoreError::NotFound(_),
                    ..
                }
        )
    }

    /// Returns `true` if the gateway was used after `close`.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// Log a failed store command and wrap it in the gateway error.
///
/// A store that reports [`LogStoreError::Closed`] maps to [`GatewayError::Closed`].
pub(crate) fn store_failure(
    operation: &'static str,
    args: &dyn fmt::Debug,
    source: LogStoreError,
) -> GatewayError {
    tracing::error!(
        operation,
        args = ?args,
        error = %source,
        "Log store command failed"
    );

    match source {
        LogStoreError::Closed => GatewayError::Closed,
        source => GatewayError::Store { operation, source },
    }
}
