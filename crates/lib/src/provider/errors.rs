//! Error types for verb resolution and providers.

use thiserror::Error;

/// Errors raised while resolving a path or executing a verb against a
/// provider, locally or remotely.
///
/// Errors raised locally propagate directly to the caller; errors raised on
/// a remote provider are translated to a metaprotocol message at the server
/// boundary and reconstructed as the same variant on the client side, so
/// callers never need to distinguish the two.
#[derive(Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum ProviderError {
    /// A path segment had no corresponding key or index at resolution time.
    #[error("Resource not found at '{path}'")]
    ResourceNotFound { path: String },

    /// A verb was applied to an incompatible node kind, or the request
    /// itself was malformed.
    #[error("Malformed request: {reason}")]
    MalformedRequest { reason: String },

    /// Any other server-side failure, including application-level errors
    /// raised inside a computed-property callable or an invoked operation.
    #[error("Provider failure: {reason}")]
    Failure { reason: String },
}

impl ProviderError {
    /// A path segment had no corresponding key or index.
    pub fn not_found(path: impl Into<String>) -> Self {
        ProviderError::ResourceNotFound { path: path.into() }
    }

    /// A verb/node kind mismatch or malformed request.
    pub fn malformed(reason: impl Into<String>) -> Self {
        ProviderError::MalformedRequest {
            reason: reason.into(),
        }
    }

    /// A generic server-side failure.
    pub fn failure(reason: impl Into<String>) -> Self {
        ProviderError::Failure {
            reason: reason.into(),
        }
    }

    /// Check if this is a resource-not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::ResourceNotFound { .. })
    }

    /// Check if this is a malformed-request error.
    pub fn is_malformed_request(&self) -> bool {
        matches!(self, ProviderError::MalformedRequest { .. })
    }
}
