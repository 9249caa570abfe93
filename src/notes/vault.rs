//! Markdown notes with YAML front matter, one per job.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{Local, NaiveDate};
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::models::JobRecord;

/// Characters that are invalid in file names on at least one platform.
static UNSAFE_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\\/*?:"<>|]"#).expect("static pattern"));

const COMPANY_NAME_CHARS: usize = 20;
const TITLE_NAME_CHARS: usize = 30;
const DEFAULT_STATUS: &str = "待處理";
const PENDING_SUMMARY: &str = "等待 AI 分析...";

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Could not create vault directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result of saving one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Written(PathBuf),
    /// A note with the same name already existed and was left untouched.
    Skipped(PathBuf),
}

#[derive(Serialize)]
struct FrontMatter<'a> {
    job_title: &'a str,
    company: &'a str,
    salary: &'a str,
    location: &'a str,
    link: &'a str,
    source: &'a str,
    posted_date: Option<&'a str>,
    tech_stack: &'a [String],
    match_score: Option<f64>,
    status: &'a str,
    scraped_date: String,
}

/// An Obsidian vault directory.
pub struct ObsidianVault {
    root: PathBuf,
}

impl ObsidianVault {
    /// Open the vault at `path` (`~` expanded), creating the directory if needed.
    pub fn open(path: &str) -> Result<Self, VaultError> {
        let root = PathBuf::from(shellexpand::tilde(path).into_owned());

        if !root.exists() {
            std::fs::create_dir_all(&root).map_err(|source| VaultError::CreateDir {
                path: root.clone(),
                source,
            })?;
            info!("Created vault directory: {}", root.display());
        }

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Save a job dated today. `None` means the write failed.
    pub fn save_job(&self, job: &JobRecord) -> Option<SaveOutcome> {
        self.save_job_on(job, Local::now().date_naive())
    }

    /// Save a job as scraped on `date`.
    ///
    /// An existing note with the same name is never overwritten.
    pub fn save_job_on(&self, job: &JobRecord, date: NaiveDate) -> Option<SaveOutcome> {
        let path = self.root.join(note_file_name(job, date));

        let note = match render_note(job, date) {
            Ok(note) => note,
            Err(e) => {
                error!("Failed to render note for {}: {}", job.title(), e);
                return None;
            }
        };

        let file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                info!("File exists, skipping: {}", path.display());
                return Some(SaveOutcome::Skipped(path));
            }
            Err(e) => {
                error!("Failed to save note {}: {}", path.display(), e);
                return None;
            }
        };

        if let Err(e) = write_or_discard(&path, file, note.as_bytes()) {
            error!("Failed to save note {}: {}", path.display(), e);
            return None;
        }

        info!("Saved to vault: {}", path.display());
        Some(SaveOutcome::Written(path))
    }
}

/// Write `contents` to a freshly created note, removing the note again if the
/// write fails so a later run does not mistake it for a finished one.
fn write_or_discard(path: &Path, mut out: impl Write, contents: &[u8]) -> std::io::Result<()> {
    if let Err(e) = out.write_all(contents).and_then(|()| out.flush()) {
        drop(out);
        if let Err(rm) = std::fs::remove_file(path) {
            warn!("Could not remove partial note {}: {}", path.display(), rm);
        }
        return Err(e);
    }
    Ok(())
}

/// `"{date} - {company} - {title}.md"`, sanitized and length-limited.
pub fn note_file_name(job: &JobRecord, date: NaiveDate) -> String {
    format!(
        "{} - {} - {}.md",
        date.format("%Y-%m-%d"),
        sanitize(job.company(), COMPANY_NAME_CHARS),
        sanitize(job.title(), TITLE_NAME_CHARS)
    )
}

fn sanitize(value: &str, max_chars: usize) -> String {
    UNSAFE_FILENAME_CHARS
        .replace_all(value, "")
        .chars()
        .take(max_chars)
        .collect()
}

/// Full note text: front matter, AI review, then the original description.
pub fn render_note(job: &JobRecord, date: NaiveDate) -> Result<String, serde_yaml::Error> {
    let front_matter = FrontMatter {
        job_title: job.title(),
        company: job.company(),
        salary: job.salary(),
        location: job.location(),
        link: job.link(),
        source: job.source(),
        posted_date: job.posted_date(),
        tech_stack: &job.tech_stack,
        match_score: job.match_score,
        status: DEFAULT_STATUS,
        scraped_date: date.format("%Y-%m-%d").to_string(),
    };
    let yaml = serde_yaml::to_string(&front_matter)?;

    let mut note = format!(
        "---\n{}---\n\n## 🤖 AI 職缺快評\n{}\n",
        yaml,
        job.ai_summary.as_deref().unwrap_or(PENDING_SUMMARY)
    );

    push_list(&mut note, "### 👍 優點", &job.pros);
    push_list(&mut note, "### 👎 缺點", &job.cons);

    note.push_str("\n## 📄 原始職務內容 (JD)\n");
    note.push_str(job.raw_content());
    note.push('\n');

    Ok(note)
}

fn push_list(note: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    note.push('\n');
    note.push_str(heading);
    note.push('\n');
    for item in items {
        note.push_str("- ");
        note.push_str(item);
        note.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ListingItem;
    use serde_json::json;
    use tempfile::tempdir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 14).unwrap()
    }

    fn job(title: &str, company: &str) -> JobRecord {
        let item = ListingItem::new(json!({
            "jobName": title,
            "custName": company,
            "jobAddrNoDesc": "台北市信義區",
            "salaryLow": 50000,
            "salaryHigh": 70000,
            "appearDate": "20251013",
        }));
        JobRecord::from_listing(
            &item,
            "https://www.104.com.tw/job/a1".into(),
            "Spring Boot microservices",
            "104",
        )
    }

    #[test]
    fn test_file_name_strips_unsafe_chars() {
        let name = note_file_name(&job("Java/Kotlin: Backend?", "A*B <Co>"), date());
        assert_eq!(name, "2025-10-14 - AB Co - JavaKotlin Backend.md");
    }

    #[test]
    fn test_file_name_truncates_by_chars() {
        let company = "超級無敵長的公司名稱股份有限公司台灣分公司總部";
        let title = "T".repeat(50);
        let name = note_file_name(&job(&title, company), date());

        let parts: Vec<&str> = name.trim_end_matches(".md").split(" - ").collect();
        assert_eq!(parts[1].chars().count(), 20);
        assert_eq!(parts[2].chars().count(), 30);
    }

    #[test]
    fn test_render_front_matter_and_sections() {
        let mut job = job("Java Engineer", "Acme");
        job.tech_stack = vec!["Java".into(), "Kafka".into()];
        job.match_score = Some(7.5);
        job.ai_summary = Some("適合後端背景".into());
        job.pros = vec!["Java 經驗".into()];

        let note = render_note(&job, date()).unwrap();

        assert!(note.starts_with("---\njob_title: Java Engineer\n"));
        assert!(note.contains("salary: 50000 - 70000\n"));
        assert!(note.contains("match_score: 7.5\n"));
        assert!(note.contains("## 🤖 AI 職缺快評\n適合後端背景\n"));
        assert!(note.contains("### 👍 優點\n- Java 經驗\n"));
        assert!(!note.contains("缺點"));
        assert!(note.ends_with("## 📄 原始職務內容 (JD)\nSpring Boot microservices\n"));

        let yaml = note
            .strip_prefix("---\n")
            .and_then(|rest| rest.split("---\n").next())
            .unwrap();
        let parsed: serde_yaml::Value = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(parsed["tech_stack"][1].as_str(), Some("Kafka"));
        assert_eq!(parsed["source"].as_str(), Some("104"));
        assert_eq!(parsed["status"].as_str(), Some("待處理"));
        assert_eq!(parsed["scraped_date"].as_str(), Some("2025-10-14"));
        assert_eq!(parsed["posted_date"].as_str(), Some("20251013"));
    }

    #[test]
    fn test_render_without_analysis() {
        let note = render_note(&job("Java Engineer", "Acme"), date()).unwrap();
        assert!(note.contains("## 🤖 AI 職缺快評\n等待 AI 分析...\n"));
        assert!(note.contains("match_score: null\n"));
    }

    #[test]
    fn test_save_then_skip_existing() {
        let dir = tempdir().unwrap();
        let vault = ObsidianVault::open(dir.path().to_str().unwrap()).unwrap();
        let first = job("Java Engineer", "Acme");

        let outcome = vault.save_job_on(&first, date()).unwrap();
        let SaveOutcome::Written(path) = &outcome else {
            panic!("expected a new note, got {:?}", outcome);
        };
        let original = std::fs::read_to_string(path).unwrap();

        let mut second = job("Java Engineer", "Acme");
        second.ai_summary = Some("different".into());
        let again = vault.save_job_on(&second, date()).unwrap();

        assert_eq!(again, SaveOutcome::Skipped(path.clone()));
        assert_eq!(std::fs::read_to_string(path).unwrap(), original);
    }

    #[test]
    fn test_open_creates_nested_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("vault/jobs");
        let vault = ObsidianVault::open(nested.to_str().unwrap()).unwrap();

        assert!(nested.is_dir());
        assert_eq!(vault.root(), nested.as_path());
    }

    #[test]
    fn test_open_fails_when_path_is_a_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("not-a-dir");
        std::fs::write(&file, "x").unwrap();

        let nested = file.join("vault");
        assert!(ObsidianVault::open(nested.to_str().unwrap()).is_err());
    }

    struct DiskFull;

    impl Write for DiskFull {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(ErrorKind::Other, "no space left on device"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_failed_write_leaves_no_partial_note() {
        let dir = tempdir().unwrap();
        let vault = ObsidianVault::open(dir.path().to_str().unwrap()).unwrap();
        let job = job("Java Engineer", "Acme");
        let path = dir.path().join(note_file_name(&job, date()));
        std::fs::write(&path, "---\njob_title: Ja").unwrap();

        assert!(write_or_discard(&path, DiskFull, b"note").is_err());
        assert!(!path.exists());

        let outcome = vault.save_job_on(&job, date()).unwrap();
        assert_eq!(outcome, SaveOutcome::Written(path));
    }
}
