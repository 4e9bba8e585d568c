//! Schema validation for a single content record.
//!
//! [`validate_record`] checks one parsed record against the structural contract and its
//! internal consistency rules. It is a pure function: it never fails and never stops at the
//! first problem, so a single pass returns the complete defect list for the record.
//!
//! Every issue is tagged with the path of the offending field, written in the same camelCase
//! form authors see in the YAML (for example `levels.2.keyTerms[1].term`).
//!
//! Issues have a [`Severity`]. Errors reject the record from the registry; warnings are
//! advisory and only appear in the corpus report.

use chrono::{DateTime, NaiveDate, Utc};
use content_schema::{ContentRecord, LevelContent, MIN_LEVEL};
use medref_types::{FoldedKey, IdError, RecordId};
use regex::Regex;
use serde::ser::SerializeStruct;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:todo|fixme|placeholder)\b").ok());

static ICD11_CODE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Z]\d{1,2}\.?\d{0,3}$").ok());

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// A single schema defect found in a record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("record id is empty")]
    EmptyId,
    #[error("{reason}")]
    MalformedId { reason: String },
    #[error("record name is empty")]
    EmptyName,
    #[error("level 1 is missing")]
    MissingLevelOne,
    #[error("non-contiguous levels, missing {}", join_levels(.missing))]
    NonContiguousLevels { missing: Vec<u8> },
    #[error("level {level} is outside the supported range 1-5")]
    LevelOutOfRange { level: u8 },
    #[error("level content declares level {declared} but is stored under level {key}")]
    LevelKeyMismatch { key: u8, declared: u8 },
    #[error("level {field} is empty")]
    EmptyLevelText { field: &'static str },
    #[error("level has no key terms")]
    NoKeyTerms,
    #[error("key term is empty")]
    EmptyKeyTerm,
    #[error("key term '{term}' has an empty definition")]
    EmptyKeyTermDefinition { term: String },
    #[error("duplicate key term '{term}' within level")]
    DuplicateKeyTerm { term: String },
    #[error("citation id is empty")]
    EmptyCitationId,
    #[error("duplicate citation id '{id}'")]
    DuplicateCitationId { id: String },
    #[error("invalid clinical relevance '{value}' (expected low, moderate, high or critical)")]
    InvalidClinicalRelevance { value: String },
    #[error("shelf exam entry is empty")]
    EmptyShelfExam,
    #[error("cross-reference target id is empty")]
    EmptyReferenceTarget,
    #[error(
        "unknown relationship '{value}' (expected parent, child, sibling, related or see-also)"
    )]
    UnknownRelationship { value: String },
    #[error("cross-reference points at the record itself")]
    SelfReference,
    #[error("{field} '{value}' is not an RFC 3339 timestamp or YYYY-MM-DD date")]
    InvalidTimestamp { field: &'static str, value: String },
    #[error("updatedAt is earlier than createdAt")]
    UpdatedBeforeCreated,
    #[error("version must be at least 1, got {version}")]
    InvalidVersion { version: u32 },
    #[error("{field} contains placeholder text")]
    PlaceholderText { field: &'static str },
    #[error("'{code}' does not look like an ICD-11 code")]
    InvalidIcd11Code { code: String },
}

fn join_levels(levels: &[u8]) -> String {
    levels
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl SchemaError {
    pub fn severity(&self) -> Severity {
        match self {
            SchemaError::NoKeyTerms
            | SchemaError::SelfReference
            | SchemaError::UpdatedBeforeCreated
            | SchemaError::InvalidIcd11Code { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Stable machine-readable name of the defect.
    pub fn code(&self) -> &'static str {
        match self {
            SchemaError::EmptyId => "empty_id",
            SchemaError::MalformedId { .. } => "malformed_id",
            SchemaError::EmptyName => "empty_name",
            SchemaError::MissingLevelOne => "missing_level_one",
            SchemaError::NonContiguousLevels { .. } => "non_contiguous_levels",
            SchemaError::LevelOutOfRange { .. } => "level_out_of_range",
            SchemaError::LevelKeyMismatch { .. } => "level_key_mismatch",
            SchemaError::EmptyLevelText { .. } => "empty_level_text",
            SchemaError::NoKeyTerms => "no_key_terms",
            SchemaError::EmptyKeyTerm => "empty_key_term",
            SchemaError::EmptyKeyTermDefinition { .. } => "empty_key_term_definition",
            SchemaError::DuplicateKeyTerm { .. } => "duplicate_key_term",
            SchemaError::EmptyCitationId => "empty_citation_id",
            SchemaError::DuplicateCitationId { .. } => "duplicate_citation_id",
            SchemaError::InvalidClinicalRelevance { .. } => "invalid_clinical_relevance",
            SchemaError::EmptyShelfExam => "empty_shelf_exam",
            SchemaError::EmptyReferenceTarget => "empty_reference_target",
            SchemaError::UnknownRelationship { .. } => "unknown_relationship",
            SchemaError::SelfReference => "self_reference",
            SchemaError::InvalidTimestamp { .. } => "invalid_timestamp",
            SchemaError::UpdatedBeforeCreated => "updated_before_created",
            SchemaError::InvalidVersion { .. } => "invalid_version",
            SchemaError::PlaceholderText { .. } => "placeholder_text",
            SchemaError::InvalidIcd11Code { .. } => "invalid_icd11_code",
        }
    }
}

/// A [`SchemaError`] tagged with the path of the field it concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub path: String,
    pub kind: SchemaError,
}

impl ValidationError {
    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.kind)
    }
}

impl Serialize for ValidationError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("ValidationError", 4)?;
        state.serialize_field("path", &self.path)?;
        state.serialize_field("severity", &self.severity())?;
        state.serialize_field("code", self.kind.code())?;
        state.serialize_field("message", &self.kind.to_string())?;
        state.end()
    }
}

/// Outcome of validating one record: every issue found, in field order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub record_id: String,
    pub issues: Vec<ValidationError>,
}

impl ValidationResult {
    /// True when the record has no error-severity issues. Warnings do not affect validity.
    pub fn is_valid(&self) -> bool {
        self.errors().next().is_none()
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationError> {
        self.issues
            .iter()
            .filter(|issue| issue.severity() == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationError> {
        self.issues
            .iter()
            .filter(|issue| issue.severity() == Severity::Warning)
    }
}

/// Validate one record against the schema contract.
pub fn validate_record(record: &ContentRecord) -> ValidationResult {
    let mut issues = Issues::default();

    check_identity(record, &mut issues);
    check_levels(record, &mut issues);
    check_citations(record, &mut issues);
    check_cross_references(record, &mut issues);
    check_tags(record, &mut issues);
    check_lifecycle(record, &mut issues);

    ValidationResult {
        record_id: record.id.clone(),
        issues: issues.0,
    }
}

#[derive(Default)]
struct Issues(Vec<ValidationError>);

impl Issues {
    fn push(&mut self, path: impl Into<String>, kind: SchemaError) {
        self.0.push(ValidationError {
            path: path.into(),
            kind,
        });
    }
}

fn check_identity(record: &ContentRecord, issues: &mut Issues) {
    match RecordId::parse(&record.id) {
        Ok(_) => {}
        Err(IdError::Empty) => issues.push("id", SchemaError::EmptyId),
        Err(err) => issues.push(
            "id",
            SchemaError::MalformedId {
                reason: err.to_string(),
            },
        ),
    }

    if record.name.trim().is_empty() {
        issues.push("name", SchemaError::EmptyName);
    }
    check_placeholder("name", "name", &record.name, issues);
}

fn check_placeholder(
    path: impl Into<String>,
    field: &'static str,
    text: &str,
    issues: &mut Issues,
) {
    if PLACEHOLDER.as_ref().is_some_and(|pattern| pattern.is_match(text)) {
        issues.push(path, SchemaError::PlaceholderText { field });
    }
}

fn check_levels(record: &ContentRecord, issues: &mut Issues) {
    let present: BTreeSet<u8> = record
        .levels
        .keys()
        .copied()
        .filter(|level| LevelContent::is_valid_level(*level))
        .collect();

    if !present.contains(&MIN_LEVEL) {
        issues.push("levels", SchemaError::MissingLevelOne);
    }

    if let Some(&highest) = present.iter().next_back() {
        let missing: Vec<u8> = (MIN_LEVEL + 1..=highest)
            .filter(|level| !present.contains(level))
            .collect();
        if !missing.is_empty() {
            issues.push("levels", SchemaError::NonContiguousLevels { missing });
        }
    }

    for (&key, content) in &record.levels {
        let base = format!("levels.{key}");

        if !LevelContent::is_valid_level(key) {
            issues.push(&base, SchemaError::LevelOutOfRange { level: key });
        }
        if content.level != key {
            issues.push(
                format!("{base}.level"),
                SchemaError::LevelKeyMismatch {
                    key,
                    declared: content.level,
                },
            );
        }
        if content.summary.trim().is_empty() {
            issues.push(
                format!("{base}.summary"),
                SchemaError::EmptyLevelText { field: "summary" },
            );
        }
        if content.explanation.trim().is_empty() {
            issues.push(
                format!("{base}.explanation"),
                SchemaError::EmptyLevelText {
                    field: "explanation",
                },
            );
        }

        check_placeholder(format!("{base}.summary"), "summary", &content.summary, issues);
        check_placeholder(
            format!("{base}.explanation"),
            "explanation",
            &content.explanation,
            issues,
        );
        if let Some(notes) = &content.clinical_notes {
            check_placeholder(format!("{base}.clinicalNotes"), "clinicalNotes", notes, issues);
        }

        check_key_terms(&base, content, issues);
    }
}

fn check_key_terms(base: &str, content: &LevelContent, issues: &mut Issues) {
    if content.key_terms.is_empty() {
        issues.push(format!("{base}.keyTerms"), SchemaError::NoKeyTerms);
        return;
    }

    let mut seen: HashSet<FoldedKey> = HashSet::new();
    for (i, key_term) in content.key_terms.iter().enumerate() {
        let path = format!("{base}.keyTerms[{i}]");

        match FoldedKey::new(&key_term.term) {
            Ok(folded) => {
                if !seen.insert(folded) {
                    issues.push(
                        format!("{path}.term"),
                        SchemaError::DuplicateKeyTerm {
                            term: key_term.term.clone(),
                        },
                    );
                }
            }
            Err(_) => issues.push(format!("{path}.term"), SchemaError::EmptyKeyTerm),
        }

        if key_term.definition.trim().is_empty() {
            issues.push(
                format!("{path}.definition"),
                SchemaError::EmptyKeyTermDefinition {
                    term: key_term.term.clone(),
                },
            );
        }

        check_placeholder(format!("{path}.term"), "term", &key_term.term, issues);
        check_placeholder(
            format!("{path}.definition"),
            "definition",
            &key_term.definition,
            issues,
        );
    }
}

fn check_citations(record: &ContentRecord, issues: &mut Issues) {
    let mut seen: HashSet<&str> = HashSet::new();
    for (i, citation) in record.citations.iter().enumerate() {
        let path = format!("citations[{i}].id");
        if citation.id.trim().is_empty() {
            issues.push(path, SchemaError::EmptyCitationId);
        } else if !seen.insert(citation.id.as_str()) {
            issues.push(
                path,
                SchemaError::DuplicateCitationId {
                    id: citation.id.clone(),
                },
            );
        }
    }
}

fn check_cross_references(record: &ContentRecord, issues: &mut Issues) {
    for (i, reference) in record.cross_references.iter().enumerate() {
        let base = format!("crossReferences[{i}]");

        if reference.target_id.trim().is_empty() {
            issues.push(
                format!("{base}.targetId"),
                SchemaError::EmptyReferenceTarget,
            );
        } else if reference.target_id == record.id {
            issues.push(format!("{base}.targetId"), SchemaError::SelfReference);
        }

        if reference.relationship_kind().is_err() {
            issues.push(
                format!("{base}.relationship"),
                SchemaError::UnknownRelationship {
                    value: reference.relationship.clone(),
                },
            );
        }
    }
}

fn check_tags(record: &ContentRecord, issues: &mut Issues) {
    // Only entries written as ICD-11 codes are checked; plain system names pass.
    for (i, system) in record.tags.systems.iter().enumerate() {
        let system = system.trim();
        if !(system.starts_with("ICD-11") || system.starts_with(|c: char| c.is_ascii_digit())) {
            continue;
        }
        let code = system.replacen("ICD-11:", "", 1).trim().to_string();
        if !ICD11_CODE.as_ref().is_some_and(|pattern| pattern.is_match(&code)) {
            issues.push(
                format!("tags.systems[{i}]"),
                SchemaError::InvalidIcd11Code { code },
            );
        }
    }

    if let Some(Err(_)) = record.tags.relevance() {
        issues.push(
            "tags.clinicalRelevance",
            SchemaError::InvalidClinicalRelevance {
                value: record.tags.clinical_relevance.clone().unwrap_or_default(),
            },
        );
    }

    if let Some(exam) = &record.tags.exam_relevance {
        for (i, shelf) in exam.shelf.iter().enumerate() {
            if shelf.trim().is_empty() {
                issues.push(
                    format!("tags.examRelevance.shelf[{i}]"),
                    SchemaError::EmptyShelfExam,
                );
            }
        }
    }
}

fn check_lifecycle(record: &ContentRecord, issues: &mut Issues) {
    let created = parse_timestamp(&record.created_at);
    let updated = parse_timestamp(&record.updated_at);

    if created.is_none() {
        issues.push(
            "createdAt",
            SchemaError::InvalidTimestamp {
                field: "createdAt",
                value: record.created_at.clone(),
            },
        );
    }
    if updated.is_none() {
        issues.push(
            "updatedAt",
            SchemaError::InvalidTimestamp {
                field: "updatedAt",
                value: record.updated_at.clone(),
            },
        );
    }
    if let (Some(created), Some(updated)) = (created, updated) {
        if updated < created {
            issues.push("updatedAt", SchemaError::UpdatedBeforeCreated);
        }
    }

    if record.version < 1 {
        issues.push(
            "version",
            SchemaError::InvalidVersion {
                version: record.version,
            },
        );
    }
}

/// Parses an authored timestamp: RFC 3339, or a bare `YYYY-MM-DD` date taken as midnight UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
