//! Markdown summary generation
//!
//! This module generates human-readable markdown summaries of a run,
//! including statistics, records grouped by type, and rejected addresses.

use crate::email::{EmailRecord, EmailType};
use crate::output::traits::{OutputHandler, OutputResult, RunSummary};
use crate::pipeline::RunSnapshot;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Writes the run summary as a markdown file
#[derive(Debug, Clone)]
pub struct MarkdownOutputHandler {
    path: PathBuf,
}

impl MarkdownOutputHandler {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl OutputHandler for MarkdownOutputHandler {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn write(&self, summary: &RunSummary, snapshot: &RunSnapshot) -> OutputResult<()> {
        let markdown = format_markdown_summary(summary, snapshot);

        let mut file = File::create(&self.path)?;
        file.write_all(markdown.as_bytes())?;

        Ok(())
    }
}

fn record_row(record: &EmailRecord) -> String {
    format!(
        "| {} | {} | {} | {} |\n",
        record.email, record.domain, record.source, record.confidence
    )
}

/// Formats a run summary as markdown
///
/// # Arguments
///
/// * `summary` - Run metadata
/// * `snapshot` - Records and statistics of the run
///
/// # Returns
///
/// A formatted markdown string
pub fn format_markdown_summary(summary: &RunSummary, snapshot: &RunSnapshot) -> String {
    let stats = &snapshot.stats;
    let mut md = String::new();

    md.push_str("# Dovepeak Run Summary\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Started**: {}\n", summary.started_at));
    md.push_str(&format!("- **Finished**: {}\n", summary.finished_at));
    let duration = summary.duration_seconds();
    md.push_str(&format!(
        "- **Duration**: {} seconds ({:.2} minutes)\n",
        duration,
        duration as f64 / 60.0
    ));
    md.push_str(&format!("- **Status**: {}\n", summary.status()));
    md.push_str(&format!("- **Config Hash**: {}\n", summary.config_hash));
    if !summary.seeds.is_empty() {
        md.push_str(&format!("- **Seeds**: {}\n", summary.seeds.join(", ")));
    }
    md.push('\n');

    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Domains Scanned**: {}\n", stats.domains_scanned));
    md.push_str(&format!("- **Pages Scanned**: {}\n", stats.pages_scanned));
    md.push_str(&format!("- **Pages Failed**: {}\n", summary.pages_failed));
    md.push_str(&format!("- **Total Found**: {}\n", stats.total_found));
    md.push_str(&format!("- **Valid**: {}\n", stats.valid_emails));
    md.push_str(&format!("- **Invalid**: {}\n", stats.invalid_emails));
    md.push_str(&format!("- **Valid Rate**: {:.2}%\n\n", stats.valid_rate()));

    // Valid records, grouped by type
    for email_type in EmailType::all() {
        let records: Vec<_> = snapshot
            .records_of_type(email_type)
            .into_iter()
            .filter(|r| r.is_valid)
            .collect();
        if records.is_empty() {
            continue;
        }

        md.push_str(&format!("## {} Addresses ({})\n\n", title(email_type.as_str()), records.len()));
        md.push_str("| Email | Domain | Source | Confidence |\n");
        md.push_str("|-------|--------|--------|------------|\n");
        for record in records {
            md.push_str(&record_row(record));
        }
        md.push('\n');
    }

    let mut per_domain: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for record in &snapshot.records {
        let entry = per_domain.entry(record.domain.as_str()).or_default();
        entry.0 += 1;
        if record.is_valid {
            entry.1 += 1;
        }
    }
    if !per_domain.is_empty() {
        md.push_str("## Domains\n\n");
        md.push_str("| Domain | Found | Valid |\n");
        md.push_str("|--------|-------|-------|\n");
        for (domain, (found, valid)) in per_domain {
            md.push_str(&format!("| {} | {} | {} |\n", domain, found, valid));
        }
        md.push('\n');
    }

    let invalid: Vec<_> = snapshot.records.iter().filter(|r| !r.is_valid).collect();
    if !invalid.is_empty() {
        md.push_str("## Invalid Addresses\n\n");
        md.push_str(&format!("Total: {}\n\n", invalid.len()));
        for record in invalid.iter().take(50) {
            md.push_str(&format!("- {} ({})\n", record.email, record.source));
        }
        if invalid.len() > 50 {
            md.push_str(&format!("\n... and {} more\n", invalid.len() - 50));
        }
        md.push('\n');
    }

    md
}

fn title(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
