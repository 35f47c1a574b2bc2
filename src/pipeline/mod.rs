//! Per-candidate processing shared by the crawl and the upload path
//!
//! extract -> classify -> validate -> score -> merge, with stats events
//! emitted for every new or revalidated record.

mod dedup;
mod scorer;

pub use dedup::{Deduplicator, MergeOutcome, Sighting};
pub use scorer::{base_band, score};

use crate::config::{Config, MergePolicy};
use crate::email::{
    normalize_address, split_address, Detection, EmailCandidate, EmailRecord, EmailType,
    SourceCategory,
};
use crate::extract::Classifier;
use crate::output::{SearchStats, StatsAggregator, StatsEvent};
use crate::validate::{ValidationReport, Validator};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Candidate with every annotation the pipeline adds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredCandidate {
    pub candidate: EmailCandidate,
    pub email_type: EmailType,
    pub report: ValidationReport,
    pub confidence: u8,
}

impl ScoredCandidate {
    pub fn to_sighting(&self) -> Sighting {
        Sighting {
            address: self.candidate.address.clone(),
            domain: self.candidate.domain.clone(),
            category: self.candidate.category,
            source_page: self.candidate.source_page.clone(),
            email_type: self.email_type,
            is_valid: self.report.is_valid(),
            confidence: self.confidence,
        }
    }
}

/// Read-only view of a run's results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSnapshot {
    /// Records in first-sighting order
    pub records: Vec<EmailRecord>,
    pub stats: SearchStats,
}

impl RunSnapshot {
    pub fn records_of_type(&self, email_type: EmailType) -> Vec<&EmailRecord> {
        self.records
            .iter()
            .filter(|r| r.email_type == email_type)
            .collect()
    }

    pub fn valid_records(&self) -> Vec<&EmailRecord> {
        self.records.iter().filter(|r| r.is_valid).collect()
    }
}

/// Classifier, validator, result set and statistics of one run
#[derive(Debug)]
pub struct Pipeline {
    classifier: Classifier,
    validator: Validator,
    dedup: Deduplicator,
    stats: StatsAggregator,
    /// One validation per address per run
    reports: DashMap<String, ValidationReport>,
}

impl Pipeline {
    pub fn new(classifier: Classifier, validator: Validator, policy: MergePolicy) -> Self {
        Self {
            classifier,
            validator,
            dedup: Deduplicator::new(policy),
            stats: StatsAggregator::new(),
            reports: DashMap::new(),
        }
    }

    /// Pipeline with the default rules and network-backed validation
    pub fn from_config(config: &Config) -> Self {
        let classifier = Classifier::default();
        let validator = Validator::with_network(&config.validation);
        debug!(
            "Classification rules {:?}, validation tiers {:?}",
            classifier.rule_names(),
            validator.tier_names()
        );
        Self::new(classifier, validator, config.scoring.merge_policy)
    }

    pub fn stats(&self) -> &StatsAggregator {
        &self.stats
    }

    /// Classifies, validates and scores one candidate without touching the result set
    pub async fn annotate(&self, candidate: EmailCandidate) -> ScoredCandidate {
        let email_type = self.classifier.classify(&candidate);
        let report = self.validation_report(&candidate.address).await;
        let confidence = score(
            report.level(),
            candidate.category,
            candidate.detection,
            email_type,
        );

        ScoredCandidate {
            candidate,
            email_type,
            report,
            confidence,
        }
    }

    async fn validation_report(&self, address: &str) -> ValidationReport {
        if let Some(cached) = self.reports.get(address) {
            return cached.value().clone();
        }
        let report = self.validator.validate(address).await;
        self.reports.insert(address.to_string(), report.clone());
        report
    }

    /// Annotates a candidate and merges it into the result set
    pub async fn process_candidate(&self, candidate: EmailCandidate) -> MergeOutcome {
        let scored = self.annotate(candidate).await;
        debug!(
            "{} ({}, {}) scored {} valid={}",
            scored.candidate.address,
            scored.email_type,
            scored.candidate.category,
            scored.confidence,
            scored.report.is_valid()
        );

        let outcome = self.dedup.merge(scored.to_sighting());
        match outcome {
            MergeOutcome::Created { valid } => self.stats.record(StatsEvent::RecordCreated { valid }),
            MergeOutcome::Updated { became_valid: true } => {
                self.stats.record(StatsEvent::RecordRevalidated)
            }
            MergeOutcome::Updated { .. } => {}
        }
        outcome
    }

    /// Runs the candidates of one page through the pipeline
    ///
    /// Returns the number of candidates processed.
    pub async fn process_candidates<I>(&self, candidates: I) -> usize
    where
        I: IntoIterator<Item = EmailCandidate>,
    {
        let mut processed = 0;
        for candidate in candidates {
            self.process_candidate(candidate).await;
            processed += 1;
        }
        processed
    }

    /// Validates an externally supplied list of addresses
    ///
    /// Blank lines are ignored and repeated addresses merged. Entries that
    /// fail the syntax check, or are not addresses at all, still produce
    /// (invalid) records.
    pub async fn validate_list<I, S>(&self, raw_addresses: I) -> RunSnapshot
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for raw in raw_addresses {
            let raw = raw.as_ref();
            let address = normalize_address(raw);
            if address.is_empty() {
                continue;
            }
            let domain = split_address(&address)
                .map(|(_, domain)| domain.to_string())
                .unwrap_or_default();

            self.process_candidate(EmailCandidate {
                raw: raw.trim().to_string(),
                address,
                domain,
                source_page: String::new(),
                category: SourceCategory::UploadedList,
                detection: Detection::PlainText,
            })
            .await;
        }

        self.snapshot()
    }

    pub fn record_event(&self, event: StatsEvent) {
        self.stats.record(event);
    }

    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            records: self.dedup.records(),
            stats: self.stats.snapshot(),
        }
    }
}
