//! Scrape, enrich and persist in one run.

use anyhow::Context;
use tracing::{info, warn};

use crate::config::Config;
use crate::llm::{JobEnricher, MatchAnalyzer};
use crate::notes::{ObsidianVault, SaveOutcome};
use crate::scrapers::{JobScraper, ScraperRegistry};

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub scraped: usize,
    pub saved: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Run the whole flow with the scraper registered for `config.source`.
pub async fn run(config: &Config) -> anyhow::Result<RunSummary> {
    let registry = ScraperRegistry::with_defaults(
        &config.site,
        &config.browser,
        &config.sample_data_file(),
    );
    let scraper = registry
        .get(&config.source)
        .with_context(|| format!("available sources: {}", registry.sources().join(", ")))?;

    let resume = config.load_resume().await;
    let analyzer =
        MatchAnalyzer::from_config(&config.llm, resume).context("Failed to set up LLM client")?;
    let vault = ObsidianVault::open(&config.vault_path)?;

    run_with(scraper.as_ref(), &analyzer, &vault, &config.keywords, config.max_jobs).await
}

/// Run with explicit stages.
///
/// Only a scraper failure aborts the run; each job is enriched then saved
/// one at a time.
pub async fn run_with(
    scraper: &dyn JobScraper,
    enricher: &dyn JobEnricher,
    vault: &ObsidianVault,
    keywords: &[String],
    max_jobs: usize,
) -> anyhow::Result<RunSummary> {
    info!("Keywords: {:?}", keywords);
    info!("Vault: {}", vault.root().display());

    info!("Step 1: scraping jobs from {}", scraper.source_tag());
    let jobs = scraper
        .scrape(keywords, max_jobs)
        .await
        .context("Scrape failed")?;
    info!("Scraped {} jobs", jobs.len());

    let mut summary = RunSummary {
        scraped: jobs.len(),
        ..Default::default()
    };

    if jobs.is_empty() {
        warn!("No jobs found, live or offline");
        return Ok(summary);
    }

    info!("Step 2: AI processing and saving to vault");
    for job in jobs {
        info!("Processing: {} @ {}", job.title(), job.company());
        let job = enricher.enrich(job).await;

        match vault.save_job(&job) {
            Some(SaveOutcome::Written(_)) => summary.saved += 1,
            Some(SaveOutcome::Skipped(_)) => summary.skipped += 1,
            None => summary.failed += 1,
        }
    }

    info!(
        "Done: {} saved, {} skipped, {} failed",
        summary.saved, summary.skipped, summary.failed
    );
    Ok(summary)
}
