//! Error types for Codepad Core
//!
//! Two policy failures and one pass-through:
//! - `Unauthenticated`: no identity on the request
//! - `Unauthorized`: identity present, but the plan does not cover the language
//! - `Storage`: whatever the directory or record store reported, unmodified

/// Errors surfaced by the execution operations
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    /// No identity in the request context
    #[error("not authenticated")]
    Unauthenticated,

    /// Identity resolved but the entitlement gate denied the language
    #[error("pro plan required for using {language}")]
    Unauthorized { language: String },

    /// Caller-supplied fields failed validation
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Directory or store failure, passed through as-is
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ExecutionError {
    /// Create an unauthorized error for a language
    #[inline]
    pub fn unauthorized(language: impl Into<String>) -> Self {
        Self::Unauthorized {
            language: language.into(),
        }
    }

    /// Authentication and entitlement denials are final decisions
    #[inline]
    #[must_use]
    pub fn is_policy_denial(&self) -> bool {
        matches!(self, Self::Unauthenticated | Self::Unauthorized { .. })
    }

    /// Only transient storage faults are worth retrying, and only by the caller
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(e) if e.is_transient())
    }
}

/// Failures reported by a [`UserDirectory`](crate::store::UserDirectory) or
/// [`ExecutionStore`](crate::store::ExecutionStore)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// Backend could not be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Read failed
    #[error("read failed: {0}")]
    ReadFailed(String),

    /// Write rejected or lost
    #[error("write failed: {0}")]
    WriteFailed(String),
}

impl StorageError {
    /// Check if the backend reported a transient fault
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
