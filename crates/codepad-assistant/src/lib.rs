//! Codepad Assistant - AI help for playground runs
//!
//! Provides:
//! - Prompt assembly from editor code, the last run and the user question
//! - Chat history in the shape the browser session stores
//! - A proxy that forwards chat completions to an OpenAI-compatible provider
//!   so the provider key stays server-side
//!
//! # Example
//!
//! ```rust,ignore
//! use codepad_assistant::{AssistantConfig, ChatHistory, ChatProxy, PromptContext};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let proxy = ChatProxy::new(AssistantConfig::new().with_api_key("gsk_..."))?;
//! let mut history = ChatHistory::new();
//!
//! let context = PromptContext::new("console.log(x)", "why is x undefined?")
//!     .with_run(None, Some("ReferenceError: x is not defined".to_string()));
//! proxy.converse(&mut history, &context).await;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod history;
pub mod prompt;
pub mod proxy;
pub mod types;

pub use config::{AssistantConfig, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_SYSTEM_PROMPT};
pub use error::{AssistantError, QUOTA_EXHAUSTED_MESSAGE};
pub use history::{ChatHistory, ChatTurn, Speaker};
pub use prompt::{PromptContext, NO_OUTPUT};
pub use proxy::{ChatProxy, HttpTransport, LlmTransport, ProviderResponse};
pub use types::{reply_content, ChatMessage, ChatRequest, ChatRole, ProviderPayload};
