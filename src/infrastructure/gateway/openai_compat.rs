//! HTTP backend for OpenAI-compatible chat completion APIs

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::gateway::backend::{BackendError, GenerationBackend};
use crate::domain::gateway::request::GenerationRequest;
use crate::domain::gateway::response::{FinishReason, GenerationResponse, GenerationUsage};

/// Backend speaking the `/v1/chat/completions` wire format
#[derive(Debug)]
pub struct OpenAiCompatBackend {
    name: String,
    client: Client,
    base_url: String,
    api_key: String,
    /// Model used when the request carries no hint
    default_model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

impl OpenAiCompatBackend {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            client: Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            default_model: default_model.into(),
        }
    }

    fn build_payload(&self, request: &GenerationRequest) -> ChatRequest {
        let mut messages = Vec::with_capacity(2);

        if let Some(system) = request.system() {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: request.prompt().to_string(),
        });

        ChatRequest {
            model: request
                .model_hint()
                .unwrap_or(&self.default_model)
                .to_string(),
            messages,
            temperature: request.temperature(),
            max_tokens: request.max_tokens(),
            top_p: request.top_p(),
        }
    }

    async fn post_chat(&self, payload: &ChatRequest) -> Result<ChatResponse, BackendError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        debug!(backend = %self.name, model = %payload.model, "Sending chat completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(payload)
            .send()
            .await
            .map_err(|e| classify_transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        response
            .json::<ChatResponse>()
            .await
            .map_err(|e| BackendError::permanent(format!("malformed response body: {e}")))
    }
}

fn classify_transport_error(error: &reqwest::Error) -> BackendError {
    if error.is_timeout() || error.is_connect() {
        BackendError::transient(error.to_string())
    } else {
        BackendError::permanent(error.to_string())
    }
}

fn classify_status(status: StatusCode, body: &str) -> BackendError {
    let message = format!("HTTP {status}: {body}");

    if status == StatusCode::TOO_MANY_REQUESTS {
        BackendError::rate_limited(message)
    } else if status.is_server_error() {
        BackendError::transient(message)
    } else {
        BackendError::permanent(message)
    }
}

fn parse_finish_reason(reason: Option<&str>) -> FinishReason {
    match reason {
        Some("length") => FinishReason::Length,
        Some("stop") | None => FinishReason::Stop,
        Some(_) => FinishReason::Error,
    }
}

#[async_trait]
impl GenerationBackend for OpenAiCompatBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, BackendError> {
        let payload = self.build_payload(request);
        let chat = self.post_chat(&payload).await?;

        let choice = chat
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::permanent("response contained no choices"))?;

        let mut response = GenerationResponse::new(
            self.name.clone(),
            choice.message.content,
            parse_finish_reason(choice.finish_reason.as_deref()),
        );

        if let Some(usage) = chat.usage {
            response =
                response.with_usage(GenerationUsage::new(usage.prompt_tokens, usage.completion_tokens));
        }

        Ok(response)
    }

    async fn probe(&self) -> Result<(), BackendError> {
        let payload = ChatRequest {
            model: self.default_model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: "ping".to_string(),
            }],
            temperature: None,
            max_tokens: Some(1),
            top_p: None,
        };

        self.post_chat(&payload).await.map(|_| ())
    }
}
