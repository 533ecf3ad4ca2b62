//! Chat proxy to the LLM provider
//!
//! The browser never holds the provider key. It posts messages here and the
//! proxy forwards them with the configured key, model and sampling settings.

use crate::config::AssistantConfig;
use crate::error::AssistantError;
use crate::history::ChatHistory;
use crate::prompt::PromptContext;
use crate::types::{reply_content, ChatMessage, ChatRequest, ProviderPayload};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Raw provider reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderResponse {
    pub status: u16,
    pub body: String,
}

/// Sends a payload to the provider
#[async_trait]
pub trait LlmTransport: Send + Sync {
    async fn post(
        &self,
        url: &str,
        api_key: &str,
        payload: &ProviderPayload,
    ) -> Result<ProviderResponse, AssistantError>;
}

/// `reqwest`-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Client with a request timeout
    pub fn new(timeout: Duration) -> Result<Self, AssistantError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    fn headers(api_key: &str) -> Result<HeaderMap, AssistantError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}"))
                .map_err(|e| AssistantError::InvalidRequest(e.to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

#[async_trait]
impl LlmTransport for HttpTransport {
    async fn post(
        &self,
        url: &str,
        api_key: &str,
        payload: &ProviderPayload,
    ) -> Result<ProviderResponse, AssistantError> {
        let response = self
            .client
            .post(url)
            .headers(Self::headers(api_key)?)
            .json(payload)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(ProviderResponse { status, body })
    }
}

/// Forwards chat requests to the provider
#[derive(Clone)]
pub struct ChatProxy {
    config: AssistantConfig,
    transport: Arc<dyn LlmTransport>,
}

impl std::fmt::Debug for ChatProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatProxy")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ChatProxy {
    /// Proxy over HTTP using the configured timeout
    pub fn new(config: AssistantConfig) -> Result<Self, AssistantError> {
        let transport = HttpTransport::new(Duration::from_secs(config.timeout_secs))?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Proxy over a custom transport
    #[must_use]
    pub fn with_transport(config: AssistantConfig, transport: Arc<dyn LlmTransport>) -> Self {
        Self { config, transport }
    }

    /// Get configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    /// Forward a browser request and return the provider's completion verbatim
    pub async fn complete(&self, request: ChatRequest) -> Result<Value, AssistantError> {
        let api_key = self.config.api_key().ok_or_else(|| {
            tracing::error!("assistant API key is not configured");
            AssistantError::MissingApiKey
        })?;
        if request.messages.is_empty() {
            return Err(AssistantError::InvalidRequest("messages must not be empty".to_string()));
        }

        let payload = ProviderPayload {
            model: request
                .model
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| self.config.default_model.clone()),
            messages: request.messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };
        tracing::debug!(model = %payload.model, messages = payload.messages.len(), "forwarding chat request");

        let response = self
            .transport
            .post(&self.config.completions_url(), api_key, &payload)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "chat provider unreachable");
                e
            })?;

        if !(200..300).contains(&response.status) {
            tracing::error!(status = response.status, "chat provider returned an error");
            return Err(AssistantError::from_status(response.status, &response.body));
        }

        serde_json::from_str(&response.body)
            .map_err(|e| AssistantError::MalformedResponse(e.to_string()))
    }

    /// Ask one question with the configured system prompt; returns the reply text
    pub async fn ask(&self, prompt: &str) -> Result<String, AssistantError> {
        let request = ChatRequest {
            messages: vec![
                ChatMessage::system(self.config.system_prompt.clone()),
                ChatMessage::user(prompt),
            ],
            model: None,
        };
        let completion = self.complete(request).await?;
        reply_content(&completion)
            .map(str::to_string)
            .ok_or(AssistantError::EmptyResponse)
    }

    /// Run one chat exchange against `history`
    ///
    /// Blank questions are ignored. Otherwise the question and the reply (or
    /// a user-facing failure message) are appended, and the reply is returned.
    pub async fn converse(&self, history: &mut ChatHistory, context: &PromptContext) -> Option<String> {
        let question = context.question.trim();
        if question.is_empty() {
            return None;
        }
        history.push_user(question);

        let reply = match self.ask(&context.render()).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "assistant request failed");
                e.chat_message()
            }
        };
        history.push_ai(reply.clone());
        Some(reply)
    }
}
