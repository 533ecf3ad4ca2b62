//! Testing utilities for Codepad workspace
//!
//! Shared fixtures: users, auth contexts, in-memory services and a scripted
//! LLM transport.

#![allow(missing_docs)]

use async_trait::async_trait;
use codepad_assistant::{
    AssistantConfig, AssistantError, ChatProxy, LlmTransport, ProviderPayload, ProviderResponse,
};
use codepad_core::{
    AuthContext, ExecutionService, FreeTierPolicy, InMemoryExecutionStore, InMemoryUserDirectory,
    SubjectId, User,
};
use parking_lot::Mutex;
use std::sync::Arc;

pub fn free_user(subject: &str) -> User {
    User::free(SubjectId::new(subject))
}

pub fn entitled_user(subject: &str) -> User {
    User::entitled(SubjectId::new(subject))
}

pub fn auth_for(subject: &str) -> AuthContext {
    AuthContext::authenticated(SubjectId::new(subject))
}

/// Service over fresh in-memory storage, plus a handle on the store for assertions
pub fn memory_service(users: Vec<User>) -> (ExecutionService, Arc<InMemoryExecutionStore>) {
    memory_service_with_policy(users, FreeTierPolicy::default())
}

pub fn memory_service_with_policy(
    users: Vec<User>,
    policy: FreeTierPolicy,
) -> (ExecutionService, Arc<InMemoryExecutionStore>) {
    let store = Arc::new(InMemoryExecutionStore::new());
    let directory = Arc::new(InMemoryUserDirectory::with_users(users));
    (ExecutionService::with_policy(directory, store.clone(), policy), store)
}

/// OpenAI-shaped completion body with one assistant message
pub fn completion_body(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": codepad_assistant::DEFAULT_MODEL,
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

/// Transport that answers every request with a fixed response and records payloads
#[derive(Debug)]
pub struct ScriptedTransport {
    status: u16,
    body: String,
    sent: Mutex<Vec<ProviderPayload>>,
}

impl ScriptedTransport {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(content: &str) -> Self {
        Self::new(200, completion_body(content).to_string())
    }

    pub fn sent(&self) -> Vec<ProviderPayload> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl LlmTransport for ScriptedTransport {
    async fn post(
        &self,
        _url: &str,
        _api_key: &str,
        payload: &ProviderPayload,
    ) -> Result<ProviderResponse, AssistantError> {
        self.sent.lock().push(payload.clone());
        Ok(ProviderResponse {
            status: self.status,
            body: self.body.clone(),
        })
    }
}

/// Proxy over a scripted transport
pub fn scripted_proxy(config: AssistantConfig, transport: Arc<ScriptedTransport>) -> ChatProxy {
    ChatProxy::with_transport(config, transport)
}
