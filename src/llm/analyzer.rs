//! Resume matching for scraped jobs.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::client::{JsonCompletion, LlmClient};
use super::config::LlmConfig;
use super::prompts::{DEFAULT_ANALYSIS_PROMPT, SYSTEM_PROMPT};
use super::LlmError;
use crate::models::JobRecord;

/// Summary stored when no provider is configured.
pub const DISABLED_SUMMARY: &str = "AI processing disabled (no provider configured).";

const MISSING_SUMMARY: &str = "No summary";
const MAX_SCORE: f64 = 10.0;

/// Adds enrichment fields to a job. Never fails.
#[async_trait]
pub trait JobEnricher: Send + Sync {
    async fn enrich(&self, job: JobRecord) -> JobRecord;
}

/// Parsed model reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchAnalysis {
    pub tech_stack: Vec<String>,
    pub match_score: f64,
    pub summary: String,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
}

/// Scores jobs against a resume with an LLM.
pub struct MatchAnalyzer {
    backend: Option<Box<dyn JsonCompletion>>,
    resume: String,
    prompt: String,
    max_content_chars: usize,
}

impl MatchAnalyzer {
    /// Analyzer using the first usable provider in `config`.
    pub fn from_config(config: &LlmConfig, resume: impl Into<String>) -> Result<Self, LlmError> {
        let backend = LlmClient::from_config(config)?
            .map(|client| Box::new(client) as Box<dyn JsonCompletion>);

        match &backend {
            Some(b) => info!("AI matching enabled via {}", b.provider()),
            None => warn!(
                "No LLM provider configured (set OPENAI_API_KEY or enable Ollama); AI features disabled"
            ),
        }

        Ok(Self {
            backend,
            resume: resume.into(),
            prompt: config.get_analysis_prompt().to_string(),
            max_content_chars: config.max_content_chars,
        })
    }

    /// Analyzer over an arbitrary completion backend.
    pub fn with_backend(
        backend: Option<Box<dyn JsonCompletion>>,
        resume: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            resume: resume.into(),
            prompt: DEFAULT_ANALYSIS_PROMPT.to_string(),
            max_content_chars: LlmConfig::default().max_content_chars,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    fn build_prompt(&self, job: &JobRecord) -> String {
        self.prompt
            .replace("{title}", job.title())
            .replace("{company}", job.company())
            .replace("{resume}", &self.resume)
            .replace(
                "{content}",
                truncate_chars(job.raw_content(), self.max_content_chars),
            )
    }

    async fn analyze(
        &self,
        backend: &dyn JsonCompletion,
        job: &JobRecord,
    ) -> Result<MatchAnalysis, LlmError> {
        debug!("Analyzing: {}", job.title());
        let reply = backend
            .complete_json(SYSTEM_PROMPT, &self.build_prompt(job))
            .await?;
        parse_analysis(&reply)
    }
}

#[async_trait]
impl JobEnricher for MatchAnalyzer {
    async fn enrich(&self, mut job: JobRecord) -> JobRecord {
        let Some(backend) = self.backend.as_deref() else {
            job.match_score = Some(0.0);
            job.ai_summary = Some(DISABLED_SUMMARY.to_string());
            return job;
        };

        match self.analyze(backend, &job).await {
            Ok(analysis) => {
                info!(
                    "Scored '{}' at {:.1}/10",
                    job.title(),
                    analysis.match_score
                );
                job.tech_stack = analysis.tech_stack;
                job.match_score = Some(analysis.match_score);
                job.ai_summary = Some(analysis.summary);
                job.pros = analysis.pros;
                job.cons = analysis.cons;
            }
            Err(e) => {
                error!("AI processing failed for {}: {}", job.title(), e);
                job.match_score = Some(0.0);
                job.ai_summary = Some(format!("AI Error: {}", e));
            }
        }
        job
    }
}

/// Parse a model reply into a [`MatchAnalysis`].
///
/// Tolerates Markdown code fences and prose around the object, string-typed
/// scores and comma-separated lists. Scores are clamped into 0.0 - 10.0.
pub fn parse_analysis(reply: &str) -> Result<MatchAnalysis, LlmError> {
    let json = extract_json_object(reply)
        .ok_or_else(|| LlmError::Parse("No JSON object in response".to_string()))?;
    let value: Value = serde_json::from_str(json).map_err(|e| LlmError::Parse(e.to_string()))?;

    if !value.is_object() {
        return Err(LlmError::Parse("Response is not a JSON object".to_string()));
    }

    Ok(MatchAnalysis {
        tech_stack: string_list(value.get("tech_stack")),
        match_score: score(value.get("match_score")),
        summary: value
            .get("summary")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(MISSING_SUMMARY)
            .to_string(),
        pros: string_list(value.get("pros")),
        cons: string_list(value.get("cons")),
    })
}

fn extract_json_object(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (start < end).then(|| &reply[start..=end])
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn score(value: Option<&Value>) -> f64 {
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().split('/').next().and_then(|n| n.trim().parse().ok()),
        _ => None,
    };
    match raw {
        Some(n) if n.is_finite() => n.clamp(0.0, MAX_SCORE),
        _ => 0.0,
    }
}

/// First `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
