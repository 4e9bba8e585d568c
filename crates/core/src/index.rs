//! Read-optimised lookup structures over the accepted record set.
//!
//! Indices are derived data: they are recomputed in full on every registry build and never
//! maintained incrementally. Every index maps a key to record ids in ingestion order, and each
//! id appears at most once per key.
//!
//! Free-text keys (tags, categories, shelf exams) are stored as [`FoldedKey`]s, so lookups are
//! insensitive to case and surrounding whitespace.

use crate::source::{IngestedRecord, RecordOrigin};
use content_schema::{RecordStatus, RecordType};
use medref_types::FoldedKey;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Records split by whether they are flagged for USMLE or NBME.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExamPartition {
    pub flagged: Vec<String>,
    pub unflagged: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordIndices {
    /// Record id to its position in the registry's entry list.
    pub by_id: HashMap<String, usize>,
    pub by_type: BTreeMap<RecordType, Vec<String>>,
    pub by_status: BTreeMap<RecordStatus, Vec<String>>,
    pub by_category: BTreeMap<FoldedKey, Vec<String>>,
    /// Flattened `tags.topics` and `tags.keywords`.
    pub by_tag: BTreeMap<FoldedKey, Vec<String>>,
    pub by_shelf: BTreeMap<FoldedKey, Vec<String>>,
    pub by_exam_relevance: ExamPartition,
}

impl RecordIndices {
    pub fn ids_for_tag(&self, tag: &str) -> &[String] {
        lookup_folded(&self.by_tag, tag)
    }

    pub fn ids_for_category(&self, category: &str) -> &[String] {
        lookup_folded(&self.by_category, category)
    }

    pub fn ids_for_shelf(&self, shelf: &str) -> &[String] {
        lookup_folded(&self.by_shelf, shelf)
    }

    pub fn ids_for_type(&self, record_type: RecordType) -> &[String] {
        self.by_type
            .get(&record_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn ids_for_status(&self, status: RecordStatus) -> &[String] {
        self.by_status
            .get(&status)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn lookup_folded<'a>(index: &'a BTreeMap<FoldedKey, Vec<String>>, key: &str) -> &'a [String] {
    FoldedKey::new(key)
        .ok()
        .and_then(|key| index.get(&key))
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Build every index over `records`, which must already be free of duplicate ids.
pub fn build_indices(records: &[IngestedRecord]) -> RecordIndices {
    let mut indices = RecordIndices::default();

    for (position, entry) in records.iter().enumerate() {
        let record = &entry.record;
        let id = record.id.clone();

        indices.by_id.insert(id.clone(), position);
        indices
            .by_type
            .entry(record.record_type)
            .or_default()
            .push(id.clone());
        indices
            .by_status
            .entry(record.status)
            .or_default()
            .push(id.clone());

        match FoldedKey::new(&entry.category) {
            Ok(category) => indices.by_category.entry(category).or_default().push(id.clone()),
            Err(_) => tracing::warn!(id = %id, "record has no category, not indexed by category"),
        }

        insert_folded(&mut indices.by_tag, record.tag_terms(), &id);
        if let Some(exam) = &record.tags.exam_relevance {
            insert_folded(
                &mut indices.by_shelf,
                exam.shelf.iter().map(String::as_str),
                &id,
            );
        }

        if record.is_exam_flagged() {
            indices.by_exam_relevance.flagged.push(id);
        } else {
            indices.by_exam_relevance.unflagged.push(id);
        }
    }

    indices
}

fn insert_folded<'a>(
    index: &mut BTreeMap<FoldedKey, Vec<String>>,
    terms: impl Iterator<Item = &'a str>,
    id: &str,
) {
    let mut seen = HashSet::new();
    for term in terms {
        let Ok(key) = FoldedKey::new(term) else {
            continue;
        };
        if seen.insert(key.clone()) {
            index.entry(key).or_default().push(id.to_string());
        }
    }
}

/// Two ingested records sharing one id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DuplicateRecord {
    pub id: String,
    pub first: RecordOrigin,
    pub second: RecordOrigin,
}

/// Find every repeated id across all ingested records, accepted or not.
///
/// Each later copy is paired with the first record that declared the id, in ingestion order.
pub fn find_duplicate_ids(records: &[IngestedRecord]) -> Vec<DuplicateRecord> {
    let mut first_seen: HashMap<&str, &RecordOrigin> = HashMap::new();
    let mut duplicates = Vec::new();

    for entry in records {
        match first_seen.get(entry.id()) {
            Some(first) => duplicates.push(DuplicateRecord {
                id: entry.id().to_string(),
                first: (*first).clone(),
                second: entry.origin.clone(),
            }),
            None => {
                first_seen.insert(entry.id(), &entry.origin);
            }
        }
    }

    duplicates
}
