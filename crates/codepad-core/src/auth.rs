//! Request authentication context
//!
//! The identity provider is external. Whatever verified the request hands the
//! result to the core as an [`AuthContext`] value; the core never inspects
//! tokens itself.

use crate::error::ExecutionError;
use crate::types::SubjectId;

/// Authenticated principal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Subject issued by the identity provider
    pub subject: SubjectId,
}

impl Identity {
    /// Create identity for a subject
    #[inline]
    #[must_use]
    pub fn new(subject: SubjectId) -> Self {
        Self { subject }
    }
}

/// Per-request authentication state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    identity: Option<Identity>,
}

impl AuthContext {
    /// Context with no identity
    #[inline]
    #[must_use]
    pub fn anonymous() -> Self {
        Self { identity: None }
    }

    /// Context for an authenticated subject
    #[inline]
    #[must_use]
    pub fn authenticated(subject: SubjectId) -> Self {
        Self {
            identity: Some(Identity::new(subject)),
        }
    }

    /// Build from an optional raw subject; an empty subject counts as anonymous.
    /// Non-empty subjects are taken as issued, whitespace included.
    #[must_use]
    pub fn from_subject(subject: Option<&str>) -> Self {
        match subject {
            Some(s) if !s.is_empty() => Self::authenticated(SubjectId::new(s)),
            _ => Self::anonymous(),
        }
    }

    /// Current identity, if any
    #[inline]
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Identity or [`ExecutionError::Unauthenticated`]
    #[inline]
    pub fn require(&self) -> Result<&Identity, ExecutionError> {
        self.identity.as_ref().ok_or(ExecutionError::Unauthenticated)
    }
}
