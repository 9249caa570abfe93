//! LLM-backed job enrichment.
//!
//! A job's description is compared with the candidate's resume by an
//! OpenAI-compatible or Ollama model, which returns a tech stack, a 0-10
//! match score, a summary and pros/cons.

mod analyzer;
mod client;
mod config;
mod prompts;

use thiserror::Error;

pub use analyzer::{
    parse_analysis, truncate_chars, JobEnricher, MatchAnalysis, MatchAnalyzer, DISABLED_SUMMARY,
};
pub use client::{JsonCompletion, LlmClient};
pub use config::{LlmConfig, LlmProvider};

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Failed to connect to LLM service
    #[error("Connection error: {0}")]
    Connection(String),
    /// API returned an error
    #[error("API error: {0}")]
    Api(String),
    /// Failed to parse response
    #[error("Parse error: {0}")]
    Parse(String),
    /// No usable provider
    #[error("LLM is disabled")]
    Disabled,
}
