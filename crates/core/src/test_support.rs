//! In-memory record builders shared by the unit tests.

use content_schema::{
    ContentRecord, CrossReference, KeyTerm, LevelContent, RecordStatus, RecordType, Taxonomy,
};
use std::collections::BTreeMap;

pub(crate) fn level(n: u8) -> LevelContent {
    let mut content = LevelContent::new(
        n,
        format!("Level {n} summary."),
        format!("Level {n} explanation."),
    );
    content
        .key_terms
        .push(KeyTerm::new("Cortisol", "A glucocorticoid made by the adrenal cortex."));
    content
}

fn record(id: &str, record_type: RecordType) -> ContentRecord {
    ContentRecord {
        id: id.to_string(),
        record_type,
        name: id.replace('-', " "),
        alternate_names: Vec::new(),
        levels: BTreeMap::from([(1, level(1))]),
        citations: Vec::new(),
        cross_references: Vec::new(),
        tags: Taxonomy::default(),
        created_at: "2026-02-05".to_string(),
        updated_at: "2026-02-05".to_string(),
        version: 1,
        status: RecordStatus::Published,
        contributors: Vec::new(),
    }
}

pub(crate) fn condition(id: &str) -> ContentRecord {
    record(id, RecordType::Condition)
}

pub(crate) fn topic(id: &str) -> ContentRecord {
    record(id, RecordType::Topic)
}

pub(crate) fn reference(target_id: &str, target_type: RecordType) -> CrossReference {
    CrossReference {
        target_id: target_id.to_string(),
        target_type,
        relationship: "related".to_string(),
        label: String::new(),
    }
}

pub(crate) fn with_references(
    mut record: ContentRecord,
    references: impl IntoIterator<Item = CrossReference>,
) -> ContentRecord {
    record.cross_references.extend(references);
    record
}

pub(crate) fn with_tags(mut record: ContentRecord, tags: &[&str]) -> ContentRecord {
    record.tags.keywords = tags.iter().map(|t| t.to_string()).collect();
    record
}
