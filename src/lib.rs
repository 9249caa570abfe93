//! jobhub - job posting discovery, resume matching and Obsidian note export.
//!
//! Scrapes postings from 104.com.tw with a stealth Chromium session, scores
//! each against a resume with an LLM, and writes one Markdown note per job
//! into an Obsidian vault.

pub mod cli;
pub mod config;
pub mod llm;
pub mod models;
pub mod notes;
pub mod pipeline;
pub mod scrapers;
