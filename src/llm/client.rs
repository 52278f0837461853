use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Raw response body delivered incrementally
pub type ByteStream = BoxStream<'static, Result<Bytes, LlmError>>;

/// Failure of a single call to the generative service
#[derive(Debug, Error)]
pub enum LlmError {
    /// Non-success status; body kept for diagnostics
    #[error("upstream error {status}: {body}")]
    Upstream { status: u16, body: String },
    /// Success status but nothing usable in the response
    #[error("upstream returned an empty response")]
    EmptyResponse,
    #[error("upstream call timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
}

impl LlmError {
    /// Every upstream failure is a bad gateway to our caller
    pub fn status_code(&self) -> u16 {
        502
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else if err.is_decode() {
            LlmError::EmptyResponse
        } else {
            LlmError::Transport(err.to_string())
        }
    }
}

/// One call to the generative service
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Name of the caller, for logs only
    pub label: &'static str,
    pub model: String,
    pub temperature: f64,
    pub system_prompt: String,
    pub user_prompt: String,
    /// Constrain the output to a JSON object
    pub structured_output: bool,
}

/// The network boundary for generation
#[async_trait]
pub trait GenerativeService: Send + Sync {
    /// Send a request and return the generated text
    async fn invoke(&self, request: &CompletionRequest) -> Result<String, LlmError>;

    /// Send a request with incremental delivery.
    ///
    /// Returns only once the service has accepted the request; a rejection is
    /// reported here and never as part of the stream.
    async fn open_stream(&self, request: &CompletionRequest) -> Result<ByteStream, LlmError>;
}

/// Configuration for the OpenAI-compatible client
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API key (from ORTO_API_KEY, or OPENAI_API_KEY)
    pub api_key: String,
    /// Base URL up to and including the API version
    pub base_url: String,
    /// Model for drafting and rewriting
    pub primary_model: String,
    /// Cheaper model for the validation pass
    pub validator_model: String,
    /// Per-call timeout for buffered requests
    pub timeout: Duration,
}

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_PRIMARY_MODEL: &str = "gpt-4o";
pub const DEFAULT_VALIDATOR_MODEL: &str = "gpt-4o-mini";

impl OpenAiConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ORTO_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .context("ORTO_API_KEY (or OPENAI_API_KEY) environment variable not set")?;

        let mut config = Self::new(api_key);
        if let Ok(url) = std::env::var("ORTO_BASE_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(model) = std::env::var("ORTO_MODEL") {
            config.primary_model = model;
        }
        if let Ok(model) = std::env::var("ORTO_VALIDATOR_MODEL") {
            config.validator_model = model;
        }
        if let Ok(secs) = std::env::var("ORTO_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .with_context(|| format!("Invalid ORTO_TIMEOUT_SECS: {secs}"))?;
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            primary_model: DEFAULT_PRIMARY_MODEL.to_string(),
            validator_model: DEFAULT_VALIDATOR_MODEL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Chat-completions client
pub struct OpenAiClient {
    client: Client,
    streaming_client: Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;
        // Streams may outlive the buffered timeout; bound the connect phase and
        // the silence between chunks instead.
        let streaming_client = Client::builder()
            .connect_timeout(config.timeout)
            .read_timeout(config.timeout)
            .build()
            .context("Failed to build streaming HTTP client")?;

        Ok(Self {
            client,
            streaming_client,
            config,
        })
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    async fn post(
        &self,
        client: &Client,
        request: &CompletionRequest,
        stream: bool,
    ) -> Result<reqwest::Response, LlmError> {
        let body = ChatRequest::from_completion(request, stream);
        debug!(
            "{}: sending {} system + {} user chars to {}",
            request.label,
            request.system_prompt.len(),
            request.user_prompt.len(),
            request.model
        );

        let response = client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Upstream { status, body });
        }

        Ok(response)
    }
}

#[async_trait]
impl GenerativeService for OpenAiClient {
    async fn invoke(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let response = self.post(&self.client, request, false).await?;
        let response: ChatResponse = response.json().await?;
        response.text().ok_or(LlmError::EmptyResponse)
    }

    async fn open_stream(&self, request: &CompletionRequest) -> Result<ByteStream, LlmError> {
        let response = self.post(&self.streaming_client, request, true).await?;
        Ok(response.bytes_stream().map_err(LlmError::from).boxed())
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f64,
    messages: [Message<'a>; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

impl<'a> ChatRequest<'a> {
    fn from_completion(request: &'a CompletionRequest, stream: bool) -> Self {
        Self {
            model: &request.model,
            temperature: request.temperature,
            messages: [
                Message {
                    role: "system",
                    content: &request.system_prompt,
                },
                Message {
                    role: "user",
                    content: &request.user_prompt,
                },
            ],
            response_format: request.structured_output.then(|| ResponseFormat {
                format_type: "json_object",
            }),
            stream,
        }
    }
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<MessageContent>,
}

/// Message content is either a plain string or a list of text parts
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: Option<String>,
}

impl ChatResponse {
    /// Trimmed text of the first choice, `None` when there is nothing to use
    fn text(self) -> Option<String> {
        let content = self.choices.into_iter().next()?.message?.content?;
        let text = match content {
            MessageContent::Text(text) => text,
            MessageContent::Parts(parts) => parts.into_iter().filter_map(|p| p.text).collect(),
        };
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}
