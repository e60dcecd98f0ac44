//! Error types for document state and derivation.

use std::path::PathBuf;
use std::sync::Arc;

use crate::version::VersionStamp;

/// Errors surfaced by the derivation core.
///
/// A resolve-cache miss is deliberately not represented here: an unknown or
/// expired token is reported as `None` by [`ResolveCache::resolve`](crate::ResolveCache::resolve).
#[derive(Debug, Clone, thiserror::Error)]
pub enum CoreError {
    /// A constructor received malformed input (bad buffer, mismatched prior state,
    /// invalid configuration). This is a programmer error and is never retried.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Human readable description of what was rejected.
        message: String,
    },

    /// The project engine failed to derive outputs for a document version.
    ///
    /// The failure is delivered to every caller awaiting that computation but is
    /// never cached; the next request for the same state retries.
    #[error(
        "could not produce results for {path} at version {version}: {cause}",
        path = .file_path.display()
    )]
    DerivationFailed {
        /// Path of the document whose derivation failed.
        file_path: PathBuf,
        /// Version of the state that was being derived.
        version: VersionStamp,
        /// Error reported by the engine.
        cause: Arc<anyhow::Error>,
    },
}

impl CoreError {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        CoreError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Returns the engine error if this is a `DerivationFailed` variant.
    pub fn derivation_cause(&self) -> Option<&Arc<anyhow::Error>> {
        match self {
            CoreError::DerivationFailed { cause, .. } => Some(cause),
            _ => None,
        }
    }

    /// Returns `true` if a later attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::DerivationFailed { .. })
    }
}
