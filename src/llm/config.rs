//! LLM client configuration.

use serde::{Deserialize, Serialize};

use super::prompts::DEFAULT_ANALYSIS_PROMPT;

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// OpenAI-compatible chat completions API
    OpenAI,
    /// Ollama API (local)
    Ollama,
}

impl LlmProvider {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Some(Self::OpenAI),
            "ollama" => Some(Self::Ollama),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Ollama => "ollama",
        }
    }
}

/// Configuration for resume matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Master switch; when false no provider is ever selected
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Providers in order of preference; the first usable one is used
    #[serde(default = "default_provider_order")]
    pub provider_order: Vec<LlmProvider>,
    /// OpenAI-compatible API base URL
    #[serde(default = "default_openai_endpoint")]
    pub openai_endpoint: String,
    /// API key for the OpenAI-compatible provider. Never written back out.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    /// Ollama is only used when explicitly enabled
    #[serde(default)]
    pub ollama_enabled: bool,
    #[serde(default = "default_ollama_endpoint")]
    pub ollama_endpoint: String,
    #[serde(default = "default_ollama_model")]
    pub ollama_model: String,
    /// Maximum tokens in response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Temperature for generation (0.0 - 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum characters of job content to send to the model
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Custom analysis prompt (uses {resume}, {title}, {company} and {content} placeholders)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_prompt: Option<String>,
}

fn default_enabled() -> bool {
    true
}

fn default_provider_order() -> Vec<LlmProvider> {
    vec![LlmProvider::OpenAI, LlmProvider::Ollama]
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o".to_string()
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "llama3.1:8b".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_content_chars() -> usize {
    12000
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            provider_order: default_provider_order(),
            openai_endpoint: default_openai_endpoint(),
            api_key: None,
            openai_model: default_openai_model(),
            ollama_enabled: false,
            ollama_endpoint: default_ollama_endpoint(),
            ollama_model: default_ollama_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            max_content_chars: default_max_content_chars(),
            timeout_secs: default_timeout_secs(),
            analysis_prompt: None,
        }
    }
}

impl LlmConfig {
    /// Apply environment variable overrides.
    ///
    /// Supported env vars:
    /// - `LLM_ENABLED`: "true" or "false"
    /// - `LLM_PROVIDER`: comma-separated preference order, e.g. "ollama,openai"
    /// - `OPENAI_API_KEY` / `LLM_API_KEY`: API key (`LLM_API_KEY` wins)
    /// - `LLM_ENDPOINT`, `LLM_MODEL`: OpenAI-compatible endpoint and model
    /// - `OLLAMA_ENABLED`, `OLLAMA_ENDPOINT`, `OLLAMA_MODEL`
    /// - `LLM_MAX_TOKENS`, `LLM_TEMPERATURE`, `LLM_MAX_CONTENT_CHARS`
    /// - `LLM_ANALYSIS_PROMPT`: custom analysis prompt
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn with_overrides_from(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(val) = var("LLM_ENABLED") {
            self.enabled = parse_flag(&val);
        }
        if let Some(val) = var("LLM_PROVIDER") {
            let order: Vec<LlmProvider> =
                val.split(',').filter_map(LlmProvider::from_str).collect();
            if !order.is_empty() {
                self.provider_order = order;
            }
        }

        if let Some(key) = var("LLM_API_KEY").or_else(|| var("OPENAI_API_KEY")) {
            self.api_key = Some(key);
        }
        if let Some(val) = var("LLM_ENDPOINT") {
            self.openai_endpoint = val;
        }
        if let Some(val) = var("LLM_MODEL") {
            self.openai_model = val;
        }

        if let Some(val) = var("OLLAMA_ENABLED") {
            self.ollama_enabled = parse_flag(&val);
        }
        if let Some(val) = var("OLLAMA_ENDPOINT") {
            self.ollama_endpoint = val;
        }
        if let Some(val) = var("OLLAMA_MODEL") {
            self.ollama_model = val;
        }

        if let Some(n) = var("LLM_MAX_TOKENS").and_then(|v| v.parse().ok()) {
            self.max_tokens = n;
        }
        if let Some(t) = var("LLM_TEMPERATURE").and_then(|v| v.parse().ok()) {
            self.temperature = t;
        }
        if let Some(n) = var("LLM_MAX_CONTENT_CHARS").and_then(|v| v.parse().ok()) {
            self.max_content_chars = n;
        }
        if let Some(val) = var("LLM_ANALYSIS_PROMPT") {
            self.analysis_prompt = Some(val);
        }
        self
    }

    /// Whether `provider` has what it needs to be called.
    pub fn is_usable(&self, provider: LlmProvider) -> bool {
        match provider {
            LlmProvider::OpenAI => self
                .api_key
                .as_deref()
                .is_some_and(|key| !key.trim().is_empty()),
            LlmProvider::Ollama => self.ollama_enabled,
        }
    }

    /// First usable provider in preference order.
    pub fn select_provider(&self) -> Option<LlmProvider> {
        if !self.enabled {
            return None;
        }
        self.provider_order
            .iter()
            .copied()
            .find(|p| self.is_usable(*p))
    }

    /// Get the analysis prompt, using custom or default.
    pub fn get_analysis_prompt(&self) -> &str {
        self.analysis_prompt
            .as_deref()
            .unwrap_or(DEFAULT_ANALYSIS_PROMPT)
    }
}

fn parse_flag(val: &str) -> bool {
    val.eq_ignore_ascii_case("true") || val == "1"
}
