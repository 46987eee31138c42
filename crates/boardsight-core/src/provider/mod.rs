//! Model inference boundary
//!
//! The orchestration loop talks to the model through [`ChatModel`]: a
//! role-tagged message sequence in, one text completion out. Tool
//! requests travel inside the completion text as JSON (see
//! `tools::protocol`), not through provider-native tool calling.
//!
//! [`GenAiChat`] is the production implementation over the genai
//! framework, defaulting to a Groq-hosted Llama model.

use futures::StreamExt;
use genai::Client;
use genai::chat::{ChatMessage, ChatOptions, ChatRequest, ChatStreamEvent};
use genai::resolver::{AuthData, AuthResolver};
use tracing::{debug, error};

use crate::error::{Error, Result};
use crate::tools::BoxFuture;

/// Default model for completions
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Answers should be stable run to run
const TEMPERATURE: f64 = 0.1;

/// Output-length cap per completion
const MAX_TOKENS: u32 = 2048;

/// Message role in a model request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role-tagged message in a model request
#[derive(Debug, Clone)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

impl PromptMessage {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Trait for model providers
pub trait ChatModel: Send + Sync {
    /// Run one completion over the full message sequence.
    fn complete(&self, messages: Vec<PromptMessage>) -> BoxFuture<'_, Result<String>>;
}

/// A provider implementation using genai
pub struct GenAiChat {
    client: Client,
    model: String,
}

impl GenAiChat {
    /// Create a provider with an explicit API key.
    ///
    /// No request timeout is set; a turn blocks until the model
    /// answers or the transport gives up.
    pub fn new(api_key: &str, model: Option<&str>) -> Self {
        let api_key = api_key.to_string();
        let auth_resolver = AuthResolver::from_resolver_fn(
            move |_model_iden| -> std::result::Result<Option<AuthData>, genai::resolver::Error> {
                Ok(Some(AuthData::from_single(api_key.clone())))
            },
        );

        let client = Client::builder().with_auth_resolver(auth_resolver).build();

        Self {
            client,
            model: model.unwrap_or(DEFAULT_MODEL).to_string(),
        }
    }

    /// Get the model name
    pub fn model(&self) -> &str {
        &self.model
    }
}

impl ChatModel for GenAiChat {
    fn complete(&self, messages: Vec<PromptMessage>) -> BoxFuture<'_, Result<String>> {
        Box::pin(async move {
            let mut chat_req = ChatRequest::default();
            for msg in messages {
                let converted = match msg.role {
                    Role::System => ChatMessage::system(msg.content),
                    Role::User => ChatMessage::user(msg.content),
                    Role::Assistant => ChatMessage::assistant(msg.content),
                };
                chat_req = chat_req.append_message(converted);
            }

            let options = ChatOptions::default()
                .with_temperature(TEMPERATURE)
                .with_max_tokens(MAX_TOKENS);

            debug!(model = %self.model, "sending completion request");

            let stream_res = self
                .client
                .exec_chat_stream(&self.model, chat_req, Some(&options))
                .await
                .map_err(|e| {
                    error!(error = ?e, model = %self.model, "LLM request failed");
                    Error::Provider(format!("GenAI error: {e:?}"))
                })?;

            // Accumulate the stream into a single completion; nothing
            // downstream consumes partial output
            let mut content = String::new();
            let mut stream = stream_res.stream;

            while let Some(event) = stream.next().await {
                match event {
                    Ok(ChatStreamEvent::Chunk(chunk)) => {
                        content.push_str(&chunk.content);
                    }
                    Ok(ChatStreamEvent::End(_)) => {
                        break;
                    }
                    Ok(_) => {
                        // Start, reasoning, and tool-call events are not
                        // part of the completion text
                    }
                    Err(e) => {
                        error!(error = ?e, model = %self.model, "LLM stream error");
                        return Err(Error::Provider(format!("GenAI stream error: {e:?}")));
                    }
                }
            }

            debug!(model = %self.model, chars = content.len(), "completion received");
            Ok(content.trim().to_string())
        })
    }
}
