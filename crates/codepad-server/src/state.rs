//! Shared handler state

use crate::config::ServerConfig;
use codepad_assistant::{AssistantError, ChatProxy};
use codepad_core::{ExecutionService, InMemoryExecutionStore, InMemoryUserDirectory, User};
use std::sync::Arc;

/// Everything a request handler needs; cloned per request via `Arc`
#[derive(Debug, Clone)]
pub struct AppState {
    pub executions: ExecutionService,
    pub assistant: ChatProxy,
    /// Header carrying the verified subject
    pub subject_header: String,
    pub max_body_bytes: u64,
}

impl AppState {
    /// Wire in-memory storage and the HTTP chat proxy from config
    pub fn from_config(config: &ServerConfig, users: Vec<User>) -> Result<Self, AssistantError> {
        let directory = Arc::new(InMemoryUserDirectory::with_users(users));
        let store = Arc::new(InMemoryExecutionStore::new());
        let executions =
            ExecutionService::with_policy(directory, store, config.entitlement.policy());
        let assistant = ChatProxy::new(config.assistant.clone())?;
        Ok(Self::new(executions, assistant, config))
    }

    /// Assemble from already-built services
    #[must_use]
    pub fn new(executions: ExecutionService, assistant: ChatProxy, config: &ServerConfig) -> Self {
        Self {
            executions,
            assistant,
            subject_header: config.server.subject_header.to_ascii_lowercase(),
            max_body_bytes: config.server.max_body_bytes,
        }
    }
}
