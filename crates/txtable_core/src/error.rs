//! Error types for TxTable core.

use thiserror::Error;
use txtable_codec::CodecError;
use txtable_store::{StoreError, Version};

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors returned by a transaction-aware table.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A transactional operation was called with no transaction bound.
    #[error("no transaction is bound to this table")]
    NotBound,

    /// A transaction was bound while another one is still active.
    #[error("transaction {write_pointer} is still bound to this table")]
    AlreadyBound {
        /// Write pointer of the transaction that is still bound.
        write_pointer: Version,
    },

    /// The operation cannot be made transactional and the
    /// non-transactional bypass is off.
    #[error("{operation} is not supported inside a transaction")]
    Unsupported {
        /// Name of the rejected operation.
        operation: &'static str,
    },

    /// The mutation is malformed.
    #[error("invalid mutation: {message}")]
    InvalidMutation {
        /// Description of the problem.
        message: String,
    },

    /// The underlying store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The transaction descriptor could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// One or more compensating actions failed during rollback.
    ///
    /// The table has already been cleared and unbound when this is returned.
    #[error("rollback finished with {failed} failed compensating action(s); first: {first}")]
    RollbackPartialFailure {
        /// Number of failed actions, including the final flush.
        failed: usize,
        /// The first failure observed.
        #[source]
        first: Box<CoreError>,
    },
}

impl CoreError {
    /// Create an invalid mutation error.
    pub fn invalid_mutation(message: impl Into<String>) -> Self {
        Self::InvalidMutation {
            message: message.into(),
        }
    }

    /// Returns true if retrying the same call may succeed.
    ///
    /// Only store failures qualify. Binding, bypass and validation errors
    /// are deterministic.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

/// Result type for plugin resolution.
pub type ResolverResult<T> = Result<T, ResolverError>;

/// Errors returned by an [`ArtifactResolver`](crate::ArtifactResolver).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolverError {
    /// The artifact is not in the repository.
    #[error("artifact not found: {artifact}")]
    NotFound {
        /// The missing artifact.
        artifact: String,
    },

    /// No artifact provides the plugin.
    #[error("plugin {plugin_type}:{plugin_name} does not exist")]
    PluginNotExists {
        /// Requested plugin type.
        plugin_type: String,
        /// Requested plugin name.
        plugin_name: String,
    },

    /// A request or catalogue entry is malformed.
    #[error("invalid artifact request: {message}")]
    Invalid {
        /// Description of the problem.
        message: String,
    },
}

impl ResolverError {
    /// Create an invalid request error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}
