//! HTTP client for JSON completions.
//!
//! Supports OpenAI-compatible chat completions and the Ollama generate API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::config::{LlmConfig, LlmProvider};
use super::LlmError;

/// Something that answers a prompt with a JSON document.
#[async_trait]
pub trait JsonCompletion: Send + Sync {
    /// Provider name for logging.
    fn provider(&self) -> &str;

    async fn complete_json(&self, system: &str, prompt: &str) -> Result<String, LlmError>;
}

/// LLM client bound to one provider.
pub struct LlmClient {
    config: LlmConfig,
    provider: LlmProvider,
    client: Client,
}

/// OpenAI chat completions request format.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Ollama API request format.
#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    system: &'a str,
    prompt: &'a str,
    stream: bool,
    format: &'static str,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

/// Ollama API response format.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

impl LlmClient {
    /// Client for the first usable provider, or `None` when none is configured.
    pub fn from_config(config: &LlmConfig) -> Result<Option<Self>, LlmError> {
        match config.select_provider() {
            Some(provider) => Self::new(config.clone(), provider).map(Some),
            None => Ok(None),
        }
    }

    pub fn new(config: LlmConfig, provider: LlmProvider) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        Ok(Self {
            config,
            provider,
            client,
        })
    }

    /// Model name used for the selected provider.
    pub fn model(&self) -> &str {
        match self.provider {
            LlmProvider::OpenAI => &self.config.openai_model,
            LlmProvider::Ollama => &self.config.ollama_model,
        }
    }

    fn chat_request<'a>(&'a self, system: &'a str, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.openai_model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        }
    }

    fn ollama_request<'a>(&'a self, system: &'a str, prompt: &'a str) -> OllamaRequest<'a> {
        OllamaRequest {
            model: &self.config.ollama_model,
            system,
            prompt,
            stream: false,
            format: "json",
            options: OllamaOptions {
                temperature: self.config.temperature,
                num_predict: self.config.max_tokens,
            },
        }
    }

    /// Call an OpenAI-compatible chat completions endpoint.
    async fn call_openai(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(LlmError::Disabled)?;

        let url = format!(
            "{}/v1/chat/completions",
            self.config.openai_endpoint.trim_end_matches('/')
        );
        let resp = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&self.chat_request(system, prompt))
            .send()
            .await
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, body)));
        }

        let chat: ChatResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| LlmError::Parse("Empty completion".to_string()))
    }

    /// Call Ollama API with a prompt.
    async fn call_ollama(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        let url = format!(
            "{}/api/generate",
            self.config.ollama_endpoint.trim_end_matches('/')
        );
        let resp = self
            .client
            .post(&url)
            .json(&self.ollama_request(system, prompt))
            .send()
            .await
            .map_err(|e| LlmError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, body)));
        }

        let ollama_resp: OllamaResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        Ok(ollama_resp.response)
    }
}

#[async_trait]
impl JsonCompletion for LlmClient {
    fn provider(&self) -> &str {
        self.provider.as_str()
    }

    async fn complete_json(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        debug!(
            "Requesting completion from {} ({})",
            self.provider.as_str(),
            self.model()
        );
        match self.provider {
            LlmProvider::OpenAI => self.call_openai(system, prompt).await,
            LlmProvider::Ollama => self.call_ollama(system, prompt).await,
        }
    }
}
