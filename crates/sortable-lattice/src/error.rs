//! Error types for the binding layer.

use std::error::Error as StdError;

/// Result type alias for binding operations.
pub type Result<T> = std::result::Result<T, BindingError>;

/// Errors surfaced to callers of the binding layer.
///
/// Recoverable problems (unknown option names, stale reorder events) are not
/// errors; they go to the [`DiagnosticSink`](sortable_lattice_core::DiagnosticSink).
#[derive(Debug, thiserror::Error)]
pub enum BindingError {
    /// The owning component was torn down; the controller no longer exists.
    #[error("Sortable controller has been disposed; cannot {operation}")]
    Disposed { operation: &'static str },

    /// No controller is bound yet because no host element is attached.
    #[error("No host element is bound; cannot {operation}")]
    Unbound { operation: &'static str },

    /// The state bridge is already wired to another live controller.
    #[error("State bridge is already attached to controller generation {generation}")]
    AlreadyAttached { generation: u64 },

    /// The external controller library refused to create a controller.
    #[error("Failed to create sortable controller: {0}")]
    Backend(#[from] BackendError),

    /// The host element kind is not a valid tag name.
    #[error("Invalid element tag '{0}'")]
    InvalidTag(String),

    /// A configuration could not be built from the given input.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl BindingError {
    /// Whether this error signals a contract violation by the caller rather
    /// than an external failure.
    pub fn is_lifecycle_misuse(&self) -> bool {
        matches!(
            self,
            Self::Disposed { .. } | Self::Unbound { .. } | Self::AlreadyAttached { .. }
        )
    }
}

/// Error reported by a [`SortableBackend`](crate::SortableBackend).
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct BackendError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl BackendError {
    /// Create a backend error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create a backend error wrapping an underlying cause.
    pub fn with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_chain() {
        let io = std::io::Error::other("element detached");
        let err: BindingError = BackendError::with_source("create failed", io).into();

        assert_eq!(err.to_string(), "Failed to create sortable controller: create failed");
        let source = err.source().and_then(|s| s.source());
        assert_eq!(source.map(|s| s.to_string()), Some("element detached".to_string()));
        assert!(!err.is_lifecycle_misuse());
    }

    #[test]
    fn test_lifecycle_misuse_classification() {
        let err = BindingError::Disposed {
            operation: "reconcile options",
        };
        assert!(err.is_lifecycle_misuse());
        assert_eq!(
            err.to_string(),
            "Sortable controller has been disposed; cannot reconcile options"
        );
    }
}
