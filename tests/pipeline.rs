//! End-to-end pipeline tests
//!
//! Runs scrape, enrichment and vault persistence with an in-memory scraper
//! and LLM backend, writing notes to a temporary directory.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::json;
use tempfile::tempdir;

use jobhub::llm::{JsonCompletion, LlmError, MatchAnalyzer, DISABLED_SUMMARY};
use jobhub::models::{JobRecord, ListingItem};
use jobhub::notes::ObsidianVault;
use jobhub::pipeline::{run_with, RunSummary};
use jobhub::scrapers::{BrowserError, JobScraper, ScrapeError};

/// Returns fixed jobs, honoring the budget like a live scraper.
struct FixedScraper {
    jobs: Vec<JobRecord>,
    calls: AtomicUsize,
}

impl FixedScraper {
    fn new(jobs: Vec<JobRecord>) -> Self {
        Self {
            jobs,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl JobScraper for FixedScraper {
    fn source_tag(&self) -> &str {
        "104"
    }

    async fn scrape(
        &self,
        _keywords: &[String],
        max_jobs: usize,
    ) -> Result<Vec<JobRecord>, ScrapeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.jobs.iter().take(max_jobs).cloned().collect())
    }
}

struct BrokenScraper;

#[async_trait]
impl JobScraper for BrokenScraper {
    fn source_tag(&self) -> &str {
        "104"
    }

    async fn scrape(
        &self,
        _keywords: &[String],
        _max_jobs: usize,
    ) -> Result<Vec<JobRecord>, ScrapeError> {
        Err(BrowserError::Launch("Chrome/Chromium not found".into()).into())
    }
}

struct ScoringBackend;

#[async_trait]
impl JsonCompletion for ScoringBackend {
    fn provider(&self) -> &str {
        "test"
    }

    async fn complete_json(&self, _system: &str, prompt: &str) -> Result<String, LlmError> {
        if prompt.contains("Flaky") {
            return Err(LlmError::Api("HTTP 500: upstream".into()));
        }
        Ok(r#"{"tech_stack": ["Java", "Spring Boot"], "match_score": 8,
               "summary": "很適合", "pros": ["Java"], "cons": []}"#
            .to_string())
    }
}

fn job(id: &str, title: &str, company: &str) -> JobRecord {
    let item = ListingItem::new(json!({
        "jobName": title,
        "custName": company,
        "jobAddrNoDesc": "台北市",
        "salaryLow": 60000,
        "salaryHigh": 90000,
    }));
    JobRecord::from_listing(
        &item,
        format!("https://www.104.com.tw/job/{}", id),
        "Java 17, Spring Boot, PostgreSQL",
        "104",
    )
}

fn keywords() -> Vec<String> {
    vec!["Java".to_string()]
}

fn notes_in(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_run_saves_enriched_notes() {
    let dir = tempdir().unwrap();
    let vault = ObsidianVault::open(dir.path().to_str().unwrap()).unwrap();
    let scraper = FixedScraper::new(vec![
        job("a1", "Java Engineer", "Acme"),
        job("b2", "Backend Engineer", "Beta"),
        job("c3", "Platform Engineer", "Gamma"),
    ]);
    let analyzer = MatchAnalyzer::with_backend(Some(Box::new(ScoringBackend)), "Java dev");

    let summary = run_with(&scraper, &analyzer, &vault, &keywords(), 2)
        .await
        .unwrap();

    assert_eq!(
        summary,
        RunSummary {
            scraped: 2,
            saved: 2,
            skipped: 0,
            failed: 0
        }
    );

    let names = notes_in(dir.path());
    assert_eq!(names.len(), 2);
    assert!(names.iter().any(|n| n.ends_with(" - Acme - Java Engineer.md")));

    let note = std::fs::read_to_string(
        dir.path()
            .join(names.iter().find(|n| n.contains("Acme")).unwrap()),
    )
    .unwrap();
    assert!(note.contains("match_score: 8.0"));
    assert!(note.contains("很適合"));
    assert!(note.contains("- Spring Boot"));
    assert!(note.contains("Java 17, Spring Boot, PostgreSQL"));
}

#[tokio::test]
async fn test_second_run_skips_existing_notes() {
    let dir = tempdir().unwrap();
    let vault = ObsidianVault::open(dir.path().to_str().unwrap()).unwrap();
    let scraper = FixedScraper::new(vec![job("a1", "Java Engineer", "Acme")]);
    let analyzer = MatchAnalyzer::with_backend(None, "Java dev");

    let first = run_with(&scraper, &analyzer, &vault, &keywords(), 5)
        .await
        .unwrap();
    let second = run_with(&scraper, &analyzer, &vault, &keywords(), 5)
        .await
        .unwrap();

    assert_eq!(first.saved, 1);
    assert_eq!(second.saved, 0);
    assert_eq!(second.skipped, 1);
    assert_eq!(scraper.calls.load(Ordering::SeqCst), 2);
    assert_eq!(notes_in(dir.path()).len(), 1);
}

#[tokio::test]
async fn test_llm_failures_do_not_stop_the_run() {
    let dir = tempdir().unwrap();
    let vault = ObsidianVault::open(dir.path().to_str().unwrap()).unwrap();
    let scraper = FixedScraper::new(vec![
        job("f1", "Flaky Role", "Acme"),
        job("ok", "Java Engineer", "Beta"),
    ]);
    let analyzer = MatchAnalyzer::with_backend(Some(Box::new(ScoringBackend)), "Java dev");

    let summary = run_with(&scraper, &analyzer, &vault, &keywords(), 5)
        .await
        .unwrap();
    assert_eq!(summary.saved, 2);

    let flaky = notes_in(dir.path())
        .into_iter()
        .find(|n| n.contains("Flaky"))
        .unwrap();
    let note = std::fs::read_to_string(dir.path().join(flaky)).unwrap();
    assert!(note.contains("AI Error: API error: HTTP 500: upstream"));
    assert!(note.contains("match_score: 0.0"));
}

#[tokio::test]
async fn test_disabled_llm_still_writes_notes() {
    let dir = tempdir().unwrap();
    let vault = ObsidianVault::open(dir.path().to_str().unwrap()).unwrap();
    let scraper = FixedScraper::new(vec![job("a1", "Java Engineer", "Acme")]);
    let analyzer = MatchAnalyzer::with_backend(None, "Java dev");

    run_with(&scraper, &analyzer, &vault, &keywords(), 5)
        .await
        .unwrap();

    let name = notes_in(dir.path()).pop().unwrap();
    let note = std::fs::read_to_string(dir.path().join(name)).unwrap();
    assert!(note.contains(DISABLED_SUMMARY));
}

#[tokio::test]
async fn test_empty_scrape_writes_nothing() {
    let dir = tempdir().unwrap();
    let vault = ObsidianVault::open(dir.path().to_str().unwrap()).unwrap();
    let scraper = FixedScraper::new(Vec::new());
    let analyzer = MatchAnalyzer::with_backend(None, "Java dev");

    let summary = run_with(&scraper, &analyzer, &vault, &keywords(), 5)
        .await
        .unwrap();

    assert_eq!(summary, RunSummary::default());
    assert!(notes_in(dir.path()).is_empty());
}

#[tokio::test]
async fn test_scraper_failure_aborts_run() {
    let dir = tempdir().unwrap();
    let vault = ObsidianVault::open(dir.path().to_str().unwrap()).unwrap();
    let analyzer = MatchAnalyzer::with_backend(None, "Java dev");

    let err = run_with(&BrokenScraper, &analyzer, &vault, &keywords(), 5)
        .await
        .unwrap_err();

    assert!(format!("{:#}", err).contains("Chrome/Chromium not found"));
    assert!(notes_in(dir.path()).is_empty());
}
