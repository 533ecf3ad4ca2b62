//! Codepad Core - execution records behind an entitlement gate
//!
//! Every code run in the playground is persisted through one operation:
//! - Resolve the caller from an explicit [`AuthContext`]
//! - Look up the caller's plan in the [`UserDirectory`]
//! - Let the [`EntitlementGate`] decide on the requested language
//! - Append the record to the [`ExecutionStore`], owned by the caller
//!
//! # Example
//!
//! ```rust,ignore
//! use codepad_core::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let directory = Arc::new(InMemoryUserDirectory::new());
//! let store = Arc::new(InMemoryExecutionStore::new());
//! let service = ExecutionService::new(directory, store);
//!
//! let auth = AuthContext::authenticated(SubjectId::new("user_123"));
//! let input = SaveExecutionInput::new("javascript", "console.log(1)").with_output("1");
//! let id = service.save_execution(&auth, input).await?;
//!
//! println!("Saved execution {}", id);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod auth;
pub mod entitlement;
pub mod error;
pub mod execution;
pub mod store;
pub mod types;

// Re-exports for convenience
pub use auth::{AuthContext, Identity};
pub use entitlement::{AllowBasis, Decision, EntitlementGate, FreeTierPolicy, DEFAULT_FREE_LANGUAGE};
pub use error::{ExecutionError, StorageError};
pub use execution::{ExecutionService, MAX_LIST_LIMIT};
pub use store::{ExecutionStore, InMemoryExecutionStore, InMemoryUserDirectory, UserDirectory};
pub use types::{
    ExecutionRecord, Language, NewExecution, RecordId, SaveExecutionInput, SubjectId, User,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with Codepad Core
    pub use crate::{
        AuthContext, ExecutionError, ExecutionService, ExecutionStore, FreeTierPolicy,
        InMemoryExecutionStore, InMemoryUserDirectory, RecordId, SaveExecutionInput, SubjectId,
        User, UserDirectory,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
