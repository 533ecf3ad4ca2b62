//! Storage collaborators
//!
//! [`UserDirectory`] and [`ExecutionStore`] are the seams to whatever database
//! backs the playground. The in-memory implementations here back the server
//! binary and the test suites.

use crate::error::StorageError;
use crate::types::{ExecutionRecord, NewExecution, RecordId, SubjectId, User};
use chrono::Utc;
use dashmap::DashMap;

/// Read-only lookup of users by subject
#[async_trait::async_trait]
pub trait UserDirectory: Send + Sync {
    /// Indexed point lookup; `Ok(None)` when no user exists for the subject
    async fn find_user_by_subject(&self, subject: &SubjectId) -> Result<Option<User>, StorageError>;
}

/// Append-only execution record store
#[async_trait::async_trait]
pub trait ExecutionStore: Send + Sync {
    /// Insert one record and return its id
    async fn insert(&self, execution: NewExecution) -> Result<RecordId, StorageError>;

    /// Records owned by `owner`, newest first, at most `limit`
    async fn list_by_owner(
        &self,
        owner: &SubjectId,
        limit: usize,
    ) -> Result<Vec<ExecutionRecord>, StorageError>;
}

/// Concurrent in-memory user directory
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: DashMap<SubjectId, User>,
}

impl InMemoryUserDirectory {
    /// Create empty directory
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a list of users; later duplicates win
    #[must_use]
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let directory = Self::new();
        for user in users {
            directory.upsert(user);
        }
        directory
    }

    /// Insert or replace a user (signup / billing flows)
    pub fn upsert(&self, user: User) {
        self.users.insert(user.subject_id.clone(), user);
    }

    /// Number of users
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait::async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_user_by_subject(&self, subject: &SubjectId) -> Result<Option<User>, StorageError> {
        Ok(self.users.get(subject).map(|entry| entry.value().clone()))
    }
}

/// Concurrent in-memory execution store
///
/// Records are bucketed per owner in insertion order, which gives each caller
/// read-after-write on its own records.
#[derive(Debug, Default)]
pub struct InMemoryExecutionStore {
    by_owner: DashMap<SubjectId, Vec<ExecutionRecord>>,
}

impl InMemoryExecutionStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total records across all owners
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_owner.iter().map(|entry| entry.value().len()).sum()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every record, grouped by owner
    #[must_use]
    pub fn all_records(&self) -> Vec<ExecutionRecord> {
        self.by_owner
            .iter()
            .flat_map(|entry| entry.value().clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl ExecutionStore for InMemoryExecutionStore {
    async fn insert(&self, execution: NewExecution) -> Result<RecordId, StorageError> {
        let id = RecordId::new();
        let owner = execution.owner().clone();
        let record = execution.into_record(id, Utc::now());
        self.by_owner.entry(owner).or_default().push(record);
        Ok(id)
    }

    async fn list_by_owner(
        &self,
        owner: &SubjectId,
        limit: usize,
    ) -> Result<Vec<ExecutionRecord>, StorageError> {
        Ok(self
            .by_owner
            .get(owner)
            .map(|records| records.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}
