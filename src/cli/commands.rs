//! CLI commands implementation.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use console::style;

use crate::config::{parse_keywords, Config};
use crate::pipeline::{self, RunSummary};

#[derive(Parser, Debug)]
#[command(name = "jobhub")]
#[command(about = "Job posting discovery, resume matching and Obsidian note export")]
#[command(version)]
pub struct Cli {
    /// Config file (TOML, YAML or JSON); defaults to ./jobhub.toml if present
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scrape jobs, score them against the resume and save notes to the vault
    Scrape(ScrapeArgs),

    /// Print the effective configuration as TOML
    Config,
}

/// Per-run overrides for the `scrape` command.
#[derive(Args, Debug, Default, Clone, PartialEq)]
pub struct ScrapeArgs {
    /// Search keywords, comma-separated
    #[arg(short, long, value_delimiter = ',')]
    pub keywords: Vec<String>,

    /// Maximum number of unique jobs to collect
    #[arg(short = 'n', long, value_parser = clap::value_parser!(u64).range(1..))]
    pub max_jobs: Option<u64>,

    /// Obsidian vault directory
    #[arg(long)]
    pub vault: Option<String>,

    /// Resume text file
    #[arg(long)]
    pub resume: Option<String>,

    /// Sample listings used when the live scrape finds nothing
    #[arg(long)]
    pub sample_data: Option<String>,

    /// Job board to scrape
    #[arg(long)]
    pub source: Option<String>,
}

impl ScrapeArgs {
    /// Apply flags on top of file and environment configuration.
    pub fn apply(&self, config: &mut Config) {
        let keywords: Vec<String> = self
            .keywords
            .iter()
            .flat_map(|k| parse_keywords(k))
            .collect();
        if !keywords.is_empty() {
            config.keywords = keywords;
        }
        if let Some(n) = self.max_jobs {
            config.max_jobs = n as usize;
        }
        if let Some(ref vault) = self.vault {
            config.vault_path = vault.clone();
        }
        if let Some(ref resume) = self.resume {
            config.resume_path = resume.clone();
        }
        if let Some(ref sample) = self.sample_data {
            config.sample_data_path = sample.clone();
        }
        if let Some(ref source) = self.source {
            config.source = source.clone();
        }
    }
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())
        .await
        .context("Failed to load configuration")?;

    match cli.command {
        Commands::Scrape(args) => cmd_scrape(config, &args).await,
        Commands::Config => cmd_config(&config),
    }
}

async fn cmd_scrape(mut config: Config, args: &ScrapeArgs) -> anyhow::Result<()> {
    args.apply(&mut config);

    println!("{}", style("=== Job Intelligence Hub ===").bold());
    println!(
        "  {} Keywords: {}",
        style("→").dim(),
        config.keywords.join(", ")
    );
    println!("  {} Vault: {}", style("→").dim(), config.vault_path);

    let summary = pipeline::run(&config).await?;
    print_summary(&summary, &config.vault_path);
    Ok(())
}

fn print_summary(summary: &RunSummary, vault: &str) {
    if summary.scraped == 0 {
        println!("{} No jobs found", style("!").yellow());
        return;
    }

    println!(
        "{} Scraped {} jobs, saved {} to {}",
        style("✓").green(),
        summary.scraped,
        summary.saved,
        vault
    );
    if summary.skipped > 0 {
        println!(
            "  {} {} already in vault",
            style("→").dim(),
            summary.skipped
        );
    }
    if summary.failed > 0 {
        println!(
            "  {} {} could not be written",
            style("✗").red(),
            summary.failed
        );
    }
}

fn cmd_config(config: &Config) -> anyhow::Result<()> {
    if let Some(ref path) = config.source_path {
        eprintln!("{} Loaded from {}", style("→").dim(), path.display());
    }
    print!("{}", config.to_toml()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scrape_args(argv: &[&str]) -> ScrapeArgs {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Commands::Scrape(args) => args,
            other => panic!("expected scrape, got {:?}", other),
        }
    }

    #[test]
    fn test_scrape_flags() {
        let args = scrape_args(&[
            "jobhub",
            "scrape",
            "--keywords",
            "Java, Kotlin",
            "-n",
            "3",
            "--vault",
            "~/vault",
        ]);
        assert_eq!(args.keywords, vec!["Java", " Kotlin"]);
        assert_eq!(args.max_jobs, Some(3));
        assert_eq!(args.vault.as_deref(), Some("~/vault"));
    }

    #[test]
    fn test_zero_max_jobs_rejected() {
        assert!(Cli::try_parse_from(["jobhub", "scrape", "--max-jobs", "0"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["jobhub", "config", "-v", "--config", "x.toml"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
    }

    #[test]
    fn test_apply_overrides_config() {
        let args = scrape_args(&[
            "jobhub",
            "scrape",
            "-k",
            "Rust,,Go ",
            "--max-jobs",
            "7",
            "--source",
            "104",
        ]);
        let mut config = Config::default();
        args.apply(&mut config);

        assert_eq!(config.keywords, vec!["Rust", "Go"]);
        assert_eq!(config.max_jobs, 7);
        assert_eq!(config.vault_path, "./obsidian_output");
    }

    #[test]
    fn test_apply_without_flags_keeps_config() {
        let mut config = Config::default();
        ScrapeArgs::default().apply(&mut config);
        assert_eq!(config, Config::default());
    }
}
