//! Core types for Codepad
//!
//! Defines:
//! - Identifiers (subjects from the identity provider, execution record ids)
//! - Users as seen by the entitlement gate
//! - Execution records and the caller-supplied input that produces them

use crate::error::ExecutionError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Opaque principal identifier issued by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    /// Wrap a subject string
    #[inline]
    #[must_use]
    pub fn new(subject: impl Into<String>) -> Self {
        Self(subject.into())
    }

    /// Borrow the raw subject
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique execution record identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub Ulid);

impl RecordId {
    /// Generate new record ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Execution language tag
///
/// The set is open; the only constraint is that the tag is not blank.
/// The tag is kept exactly as sent, so `" javascript"` is not `"javascript"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Language(String);

impl Language {
    /// Validate and wrap a language tag
    pub fn new(language: impl Into<String>) -> Result<Self, ExecutionError> {
        let language = language.into();
        if language.trim().is_empty() {
            return Err(ExecutionError::InvalidInput(
                "language must not be empty".to_string(),
            ));
        }
        Ok(Self(language))
    }

    /// Borrow the tag
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Language {
    type Error = ExecutionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Language> for String {
    fn from(value: Language) -> Self {
        value.0
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// User record as held by the directory
///
/// Created by signup and mutated by billing, both outside this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Identity provider subject
    pub subject_id: SubjectId,
    /// Paid plan flag
    #[serde(default)]
    pub is_entitled: bool,
}

impl User {
    /// Create a user on the free plan
    #[inline]
    #[must_use]
    pub fn free(subject_id: SubjectId) -> Self {
        Self {
            subject_id,
            is_entitled: false,
        }
    }

    /// Create a user on the paid plan
    #[inline]
    #[must_use]
    pub fn entitled(subject_id: SubjectId) -> Self {
        Self {
            subject_id,
            is_entitled: true,
        }
    }
}

/// Caller-supplied fields for one execution attempt
///
/// Has no owner field; the owner is always the authenticated subject.
/// Unknown JSON fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveExecutionInput {
    /// Requested language
    pub language: String,
    /// Source code as run
    pub code: String,
    /// Program output, if the run produced any
    #[serde(default)]
    pub output: Option<String>,
    /// Run error, if any
    #[serde(default)]
    pub error: Option<String>,
}

impl SaveExecutionInput {
    /// Create input with no output or error
    #[inline]
    #[must_use]
    pub fn new(language: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            code: code.into(),
            output: None,
            error: None,
        }
    }

    /// With program output
    #[inline]
    #[must_use]
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// With run error
    #[inline]
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// A record that passed the gate and is ready to be inserted
///
/// Only the execution service can build one, so every stored owner is an
/// authenticated subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExecution {
    owner: SubjectId,
    language: Language,
    code: String,
    output: Option<String>,
    error: Option<String>,
}

impl NewExecution {
    pub(crate) fn new(owner: SubjectId, language: Language, input: SaveExecutionInput) -> Self {
        Self {
            owner,
            language,
            code: input.code,
            output: input.output,
            error: input.error,
        }
    }

    /// Owning subject
    #[inline]
    #[must_use]
    pub fn owner(&self) -> &SubjectId {
        &self.owner
    }

    /// Language tag
    #[inline]
    #[must_use]
    pub fn language(&self) -> &Language {
        &self.language
    }

    /// Source code
    #[inline]
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Program output
    #[inline]
    #[must_use]
    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    /// Run error
    #[inline]
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Materialize with the id and timestamp assigned by the store
    #[must_use]
    pub fn into_record(self, id: RecordId, created_at: DateTime<Utc>) -> ExecutionRecord {
        ExecutionRecord {
            id,
            owner: self.owner,
            language: self.language,
            code: self.code,
            output: self.output,
            error: self.error,
            created_at,
        }
    }
}

/// Persisted artifact of one code-run attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// Record identifier
    pub id: RecordId,
    /// Authenticated subject that ran the code
    pub owner: SubjectId,
    /// Language tag
    pub language: Language,
    /// Source code
    pub code: String,
    /// Program output
    pub output: Option<String>,
    /// Run error
    pub error: Option<String>,
    /// Insertion time
    pub created_at: DateTime<Utc>,
}

impl ExecutionRecord {
    /// Whether the record carries the expected shape (not both output and error)
    #[inline]
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        !(self.output.is_some() && self.error.is_some())
    }
}
