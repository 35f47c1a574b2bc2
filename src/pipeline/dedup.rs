//! Deduplication of sightings into one record per address
//!
//! The map is keyed by normalized address. `DashMap::entry` holds the shard
//! lock for the whole merge, so merges of one address are serialized while
//! other addresses merge concurrently.

use crate::config::MergePolicy;
use crate::email::{normalize_address, EmailRecord, EmailType, SourceCategory};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

/// One validated and scored sighting of an address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sighting {
    pub address: String,
    pub domain: String,
    pub category: SourceCategory,
    pub source_page: String,
    pub email_type: EmailType,
    pub is_valid: bool,
    pub confidence: u8,
}

impl Sighting {
    /// Total order deciding which sighting describes the record
    ///
    /// Higher confidence first, then earlier category, then earlier type,
    /// then page URL, so the winner never depends on arrival order.
    fn rank(&self, other: &Sighting) -> Ordering {
        other
            .confidence
            .cmp(&self.confidence)
            .then(self.category.cmp(&other.category))
            .then(self.email_type.cmp(&other.email_type))
            .then(self.source_page.cmp(&other.source_page))
    }
}

#[derive(Debug, Clone)]
struct MergedEntry {
    id: u64,
    best: Sighting,
    sightings: u64,
    score_sum: u64,
    is_valid: bool,
}

/// What a merge did to the result set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Created { valid: bool },
    Updated { became_valid: bool },
}

/// Result set of one run
#[derive(Debug)]
pub struct Deduplicator {
    entries: DashMap<String, MergedEntry>,
    next_id: AtomicU64,
    policy: MergePolicy,
}

impl Deduplicator {
    pub fn new(policy: MergePolicy) -> Self {
        Self {
            entries: DashMap::new(),
            next_id: AtomicU64::new(1),
            policy,
        }
    }

    /// Creates the record for a new address or merges into the existing one
    pub fn merge(&self, mut sighting: Sighting) -> MergeOutcome {
        sighting.address = normalize_address(&sighting.address);

        match self.entries.entry(sighting.address.clone()) {
            Entry::Vacant(slot) => {
                let valid = sighting.is_valid;
                let id = self.next_id.fetch_add(1, AtomicOrdering::SeqCst);
                slot.insert(MergedEntry {
                    id,
                    sightings: 1,
                    score_sum: u64::from(sighting.confidence),
                    is_valid: valid,
                    best: sighting,
                });
                MergeOutcome::Created { valid }
            }
            Entry::Occupied(mut slot) => {
                let entry = slot.get_mut();
                let was_valid = entry.is_valid;

                entry.sightings += 1;
                entry.score_sum += u64::from(sighting.confidence);
                entry.is_valid = was_valid || sighting.is_valid;
                if sighting.rank(&entry.best) == Ordering::Less {
                    entry.best = sighting;
                }

                MergeOutcome::Updated {
                    became_valid: !was_valid && entry.is_valid,
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, address: &str) -> Option<EmailRecord> {
        self.entries
            .get(&normalize_address(address))
            .map(|entry| self.to_record(entry.value()))
    }

    /// All records in first-sighting order
    pub fn records(&self) -> Vec<EmailRecord> {
        let mut entries: Vec<(u64, EmailRecord)> = self
            .entries
            .iter()
            .map(|entry| (entry.id, self.to_record(entry.value())))
            .collect();
        entries.sort_by_key(|(id, _)| *id);
        entries.into_iter().map(|(_, record)| record).collect()
    }

    fn to_record(&self, entry: &MergedEntry) -> EmailRecord {
        let confidence = match self.policy {
            MergePolicy::Max => entry.best.confidence,
            MergePolicy::Mean => {
                let n = entry.sightings.max(1);
                ((entry.score_sum + n / 2) / n).min(100) as u8
            }
        };

        EmailRecord {
            id: entry.id.to_string(),
            email: entry.best.address.clone(),
            domain: entry.best.domain.clone(),
            is_valid: entry.is_valid,
            source: entry.best.category.label().to_string(),
            confidence,
            email_type: entry.best.email_type,
        }
    }
}
