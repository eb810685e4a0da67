//! Error types for the node agent.

use std::path::PathBuf;

/// Result type alias for node agent operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reconciling pods against the runtime.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // =========================================================================
    // Lookup Errors
    // =========================================================================
    /// Pod not present in either cache partition.
    #[error("pod {namespace}/{name} could not be found on the node")]
    PodNotFound { namespace: String, name: String },

    /// No cached record for the given pod UID.
    #[error("pod {0} not found")]
    PodUidNotFound(String),

    /// Container not present in the pod record.
    #[error("container '{container}' not found in pod {namespace}/{pod}")]
    ContainerNotFound {
        namespace: String,
        pod: String,
        container: String,
    },

    // =========================================================================
    // Input Errors
    // =========================================================================
    /// Caller passed something unusable (empty identifier, bad manifest).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    // =========================================================================
    // Runtime Errors
    // =========================================================================
    /// A runtime RPC failed.
    #[error("runtime call {operation} failed: {reason}")]
    Runtime { operation: String, reason: String },

    /// A runtime RPC exceeded its per-call deadline.
    #[error("runtime call {operation} timed out after {duration:?}")]
    Timeout {
        operation: String,
        duration: std::time::Duration,
    },

    /// The engine was shut down while a call was in flight.
    #[error("operation cancelled: {0}")]
    Cancelled(String),

    // =========================================================================
    // Local I/O Errors
    // =========================================================================
    /// Creating or removing a pod directory failed.
    #[error("local I/O failed at {path}: {source}")]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Provider configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Builds a runtime failure for the named RPC.
    pub fn runtime(operation: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Runtime {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns true for any of the not-found variants.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::PodNotFound { .. } | Self::PodUidNotFound(_) | Self::ContainerNotFound { .. }
        )
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
