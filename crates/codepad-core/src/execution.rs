//! Execution service
//!
//! The only write path for execution records:
//! - Resolves the caller from the [`AuthContext`]
//! - Looks up the caller's entitlement
//! - Applies the [`EntitlementGate`]
//! - Persists the record with the authenticated subject as owner

use crate::auth::AuthContext;
use crate::entitlement::{AllowBasis, EntitlementGate, FreeTierPolicy};
use crate::error::ExecutionError;
use crate::store::{ExecutionStore, UserDirectory};
use crate::types::{ExecutionRecord, Language, NewExecution, RecordId, SaveExecutionInput};
use std::sync::Arc;

/// Upper bound on records returned by one listing
pub const MAX_LIST_LIMIT: usize = 100;

/// Save and list execution records on behalf of authenticated callers
///
/// Holds no mutable state of its own; concurrent calls only meet inside the
/// collaborators.
#[derive(Clone)]
pub struct ExecutionService {
    directory: Arc<dyn UserDirectory>,
    store: Arc<dyn ExecutionStore>,
    gate: EntitlementGate,
}

impl std::fmt::Debug for ExecutionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionService")
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

impl ExecutionService {
    /// Create service with the default free tier
    #[must_use]
    pub fn new(directory: Arc<dyn UserDirectory>, store: Arc<dyn ExecutionStore>) -> Self {
        Self::with_policy(directory, store, FreeTierPolicy::default())
    }

    /// Create service with an explicit free tier
    #[must_use]
    pub fn with_policy(
        directory: Arc<dyn UserDirectory>,
        store: Arc<dyn ExecutionStore>,
        policy: FreeTierPolicy,
    ) -> Self {
        Self {
            directory,
            store,
            gate: EntitlementGate::new(policy),
        }
    }

    /// Get gate
    #[inline]
    #[must_use]
    pub fn gate(&self) -> &EntitlementGate {
        &self.gate
    }

    /// Persist one execution attempt
    ///
    /// # Errors
    /// - `Unauthenticated` when `auth` has no identity; nothing is read or written
    /// - `InvalidInput` when the language is blank
    /// - `Unauthorized` when the gate denies the language; nothing is written
    /// - `Storage` when the directory or store fails
    pub async fn save_execution(
        &self,
        auth: &AuthContext,
        input: SaveExecutionInput,
    ) -> Result<RecordId, ExecutionError> {
        let identity = auth.require()?;
        let subject = &identity.subject;
        let language = Language::new(input.language.as_str())?;

        let user = self.directory.find_user_by_subject(subject).await?;
        if user.is_none() {
            // Treated as not entitled; free-tier languages still pass.
            tracing::debug!(%subject, "no user record for subject");
        }

        let basis = match self.gate.check(user.as_ref(), &language) {
            Ok(basis) => basis,
            Err(e) => {
                tracing::warn!(%subject, %language, "execution denied by entitlement gate");
                return Err(e);
            }
        };

        let execution = NewExecution::new(subject.clone(), language, input);
        let language = execution.language().clone();
        let id = self.store.insert(execution).await.map_err(|e| {
            tracing::error!(%subject, %language, error = %e, "failed to persist execution");
            ExecutionError::from(e)
        })?;

        tracing::info!(
            %subject,
            %language,
            record_id = %id,
            free_tier = matches!(basis, AllowBasis::FreeTier),
            "execution saved"
        );
        Ok(id)
    }

    /// The caller's own records, newest first
    ///
    /// `limit` is clamped to [`MAX_LIST_LIMIT`].
    pub async fn list_executions(
        &self,
        auth: &AuthContext,
        limit: usize,
    ) -> Result<Vec<ExecutionRecord>, ExecutionError> {
        let identity = auth.require()?;
        let limit = limit.min(MAX_LIST_LIMIT);
        let records = self.store.list_by_owner(&identity.subject, limit).await?;
        tracing::debug!(subject = %identity.subject, count = records.len(), "listed executions");
        Ok(records)
    }
}
