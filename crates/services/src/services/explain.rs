//! Streaming LLM client behind the code-explain endpoint.
//!
//! A pass-through proxy: one request in, one stream of text deltas out, a
//! fixed system prompt, no retry and no caching.

use std::time::Duration;

use eventsource_stream::Eventsource;
use futures_util::{StreamExt, stream::BoxStream};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;

const SYSTEM_PROMPT: &str = "You are an expert software developer. Explain the code snippet the \
user sends: what it does, how it works, and anything noteworthy about its approach. Answer in \
markdown.";

#[derive(Debug, Clone, Error)]
pub enum ExplainError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("rate limited")]
    RateLimited,
    #[error("invalid api key")]
    InvalidApiKey,
    #[error("json error: {0}")]
    Serde(String),
    #[error("explain service not configured: ANTHROPIC_API_KEY not set")]
    NotConfigured,
}

/// A message in the conversation
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Request body for the Messages endpoint
#[derive(Debug, Serialize)]
struct MessageRequest {
    model: String,
    max_tokens: u32,
    stream: bool,
    system: String,
    messages: Vec<Message>,
}

/// Server-sent events of the Messages stream. Everything except text deltas
/// (pings, message/content-block boundaries) is skipped.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamEvent {
    ContentBlockDelta { delta: Delta },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Delta {
    TextDelta { text: String },
    #[serde(other)]
    Other,
}

/// Streaming client for AI code explanations
#[derive(Debug, Clone)]
pub struct ExplainService {
    http: Client,
    api_key: String,
    model: String,
}

impl ExplainService {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

    /// Create a new client with the given API key
    pub fn new(api_key: String, model: Option<String>) -> Result<Self, ExplainError> {
        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("snipstash/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ExplainError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }

    /// Stream an explanation for the given code. Each item is one text chunk
    /// in generation order.
    pub async fn explain_stream(
        &self,
        code: String,
    ) -> Result<BoxStream<'static, Result<String, ExplainError>>, ExplainError> {
        let request = MessageRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            stream: true,
            system: SYSTEM_PROMPT.to_string(),
            messages: vec![Message::user(code)],
        };

        let res = self
            .http
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        match res.status() {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED => return Err(ExplainError::InvalidApiKey),
            StatusCode::TOO_MANY_REQUESTS => return Err(ExplainError::RateLimited),
            status => {
                let body = res.text().await.unwrap_or_default();
                return Err(ExplainError::Http {
                    status: status.as_u16(),
                    body,
                });
            }
        }

        let stream = res
            .bytes_stream()
            .eventsource()
            .filter_map(|event| async move {
                let event = match event {
                    Ok(event) => event,
                    Err(e) => return Some(Err(ExplainError::Transport(e.to_string()))),
                };
                match serde_json::from_str::<StreamEvent>(&event.data) {
                    Ok(StreamEvent::ContentBlockDelta {
                        delta: Delta::TextDelta { text },
                    }) => Some(Ok(text)),
                    Ok(_) => None,
                    Err(e) => {
                        debug!(event = %event.event, "unparsable stream event: {e}");
                        None
                    }
                }
            });

        Ok(stream.boxed())
    }
}

fn map_reqwest_error(e: reqwest::Error) -> ExplainError {
    if e.is_timeout() {
        ExplainError::Timeout
    } else {
        ExplainError::Transport(e.to_string())
    }
}
