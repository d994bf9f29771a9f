//! The LLM client contract consumed by collaborator nodes (spec §6.2).
//!
//! This module defines the *shape* of an LLM integration only — no
//! concrete provider ships in this crate. Nodes that need one take an
//! `Arc<dyn LlmClient>` and call it like any other collaborator; wiring an
//! actual provider (HTTP client, API key, retries at the transport level)
//! is left to the embedding application.

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::message::{Message, ToolCall};
use crate::node::NodeError;

/// A tool an LLM may choose to call, described in the provider-agnostic
/// shape most chat-completion APIs converge on: a name, a human
/// description, and a JSON Schema for its arguments.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: serde_json::Value) -> Self {
        Self { name: name.into(), description: description.into(), parameters }
    }
}

/// Prompt and generation settings for a single [`LlmClient::generate`] or
/// [`LlmClient::generate_streaming`] call.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmRequest {
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl LlmRequest {
    #[must_use]
    pub fn new(messages: Vec<Message>) -> Self {
        Self { messages, ..Self::default() }
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    #[must_use]
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = Some(tools);
        self
    }

    #[must_use]
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }
}

/// Token accounting for a completed generation. Providers that don't
/// distinguish prompt/completion tokens may report only `total`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u32>,
    pub total: u32,
}

impl TokenUsage {
    #[must_use]
    pub fn total(total: u32) -> Self {
        Self { prompt_tokens: None, completion_tokens: None, total }
    }

    #[must_use]
    pub fn split(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens: Some(prompt_tokens),
            completion_tokens: Some(completion_tokens),
            total: prompt_tokens + completion_tokens,
        }
    }
}

/// The result of a completed (non-streaming) generation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmResponse {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub tokens_used: TokenUsage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl LlmResponse {
    #[must_use]
    pub fn new(content: impl Into<String>, tokens_used: TokenUsage) -> Self {
        Self { content: content.into(), model: None, tokens_used, finish_reason: None, tool_calls: None }
    }
}

/// A streamed chunk of generated text, yielded by
/// [`LlmClient::generate_streaming`] in order.
pub type LlmChunk = Result<String, NodeError>;

/// Provider-agnostic chat-completion contract. Collaborator nodes depend
/// on this trait object (`Arc<dyn LlmClient>`), never on a concrete
/// provider, so swapping backends never touches graph or node code.
///
/// No implementation ships in this crate (§1 non-goals): wiring an actual
/// provider — HTTP transport, authentication, provider-specific retries —
/// is left to the embedding application.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Runs `request` to completion and returns the full response.
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, NodeError>;

    /// Runs `request` and returns a stream of text chunks as the provider
    /// emits them. A stream item's `Err` ends the stream; it is not
    /// retried internally.
    async fn generate_streaming(&self, request: LlmRequest) -> Result<BoxStream<'static, LlmChunk>, NodeError>;
}
