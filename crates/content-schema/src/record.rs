//! Content record wire model.
//!
//! Responsibilities:
//! - Define the strict on-disk shape of a [`ContentRecord`] and the value objects it owns.
//! - Provide closed vocabularies ([`RecordType`], [`RecordStatus`], [`ClinicalRelevance`],
//!   [`Relationship`]) together with their string forms.
//!
//! Notes:
//! - `type`, `targetType` and `status` are closed unions and are enforced at parse time.
//! - `clinicalRelevance` and `relationship` are kept as authored strings. The registry validator
//!   parses them so an unknown value is reported alongside every other defect in the record,
//!   instead of aborting the parse of the whole file.

use crate::level::LevelContent;
use crate::{ContentError, ContentResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Record
// ============================================================================

/// One educational unit: a condition or topic explained at several levels.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ContentRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternate_names: Vec<String>,
    pub levels: BTreeMap<u8, LevelContent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<Citation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cross_references: Vec<CrossReference>,
    #[serde(default, skip_serializing_if = "Taxonomy::is_empty")]
    pub tags: Taxonomy,
    pub created_at: String,
    pub updated_at: String,
    pub version: u32,
    pub status: RecordStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contributors: Vec<String>,
}

impl ContentRecord {
    /// Returns the content for `level`, if the record defines it.
    pub fn level(&self, level: u8) -> Option<&LevelContent> {
        self.levels.get(&level)
    }

    /// Returns the highest level this record defines.
    pub fn max_level(&self) -> Option<u8> {
        self.levels.keys().next_back().copied()
    }

    /// Iterates the record's topic and keyword tags, in declaration order, topics first.
    pub fn tag_terms(&self) -> impl Iterator<Item = &str> {
        self.tags
            .topics
            .iter()
            .chain(self.tags.keywords.iter())
            .map(String::as_str)
    }

    /// Returns true if the record is flagged for USMLE or NBME exams.
    pub fn is_exam_flagged(&self) -> bool {
        self.tags
            .exam_relevance
            .as_ref()
            .is_some_and(ExamRelevance::is_flagged)
    }
}

/// The kind of educational unit a record describes.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    Condition,
    Topic,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Condition => "condition",
            RecordType::Topic => "topic",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = ContentError;

    fn from_str(s: &str) -> ContentResult<Self> {
        match s {
            "condition" => Ok(RecordType::Condition),
            "topic" => Ok(RecordType::Topic),
            other => Err(ContentError::UnknownValue {
                field: "type",
                value: other.to_owned(),
            }),
        }
    }
}

/// Publication lifecycle of a record.
///
/// Records are retired by status change, never by deletion, so that references to them keep
/// resolving.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Draft,
    Published,
    Retired,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Draft => "draft",
            RecordStatus::Published => "published",
            RecordStatus::Retired => "retired",
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Citations and cross-references
// ============================================================================

/// A bibliographic source backing the record's content.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Citation {
    pub id: String,
    #[serde(rename = "type")]
    pub citation_type: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A directed, non-owning link from one record to another.
///
/// The edge names its target by id and declares the type it expects the target to have. Whether
/// the target exists, and has that type, is decided when the whole corpus is resolved.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CrossReference {
    pub target_id: String,
    pub target_type: RecordType,
    pub relationship: String,
    #[serde(default)]
    pub label: String,
}

impl CrossReference {
    /// Parses the authored relationship string.
    pub fn relationship_kind(&self) -> ContentResult<Relationship> {
        self.relationship.parse()
    }
}

/// How a cross-reference target relates to its source.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum Relationship {
    Parent,
    Child,
    Sibling,
    Related,
    SeeAlso,
}

impl Relationship {
    pub const ALL: [Relationship; 5] = [
        Relationship::Parent,
        Relationship::Child,
        Relationship::Sibling,
        Relationship::Related,
        Relationship::SeeAlso,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Relationship::Parent => "parent",
            Relationship::Child => "child",
            Relationship::Sibling => "sibling",
            Relationship::Related => "related",
            Relationship::SeeAlso => "see-also",
        }
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Relationship {
    type Err = ContentError;

    fn from_str(s: &str) -> ContentResult<Self> {
        Relationship::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| ContentError::UnknownValue {
                field: "relationship",
                value: s.to_owned(),
            })
    }
}

// ============================================================================
// Taxonomy
// ============================================================================

/// Classification of a record: body systems, topics, free keywords and relevance markers.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Taxonomy {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub systems: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub topics: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinical_relevance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam_relevance: Option<ExamRelevance>,
}

impl Taxonomy {
    pub fn is_empty(&self) -> bool {
        self == &Taxonomy::default()
    }

    /// Parses the authored clinical relevance, if one is present.
    pub fn relevance(&self) -> Option<ContentResult<ClinicalRelevance>> {
        self.clinical_relevance.as_deref().map(str::parse)
    }
}

/// Exam relevance markers.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ExamRelevance {
    #[serde(default)]
    pub usmle: bool,
    #[serde(default)]
    pub nbme: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shelf: Vec<String>,
}

impl ExamRelevance {
    pub fn is_flagged(&self) -> bool {
        self.usmle || self.nbme
    }
}

/// Ordinal clinical relevance, `Low < Moderate < High < Critical`.
///
/// Stored as free text on the record and parsed with [`FromStr`] during validation.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ClinicalRelevance {
    Low,
    Moderate,
    High,
    Critical,
}

impl ClinicalRelevance {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClinicalRelevance::Low => "low",
            ClinicalRelevance::Moderate => "moderate",
            ClinicalRelevance::High => "high",
            ClinicalRelevance::Critical => "critical",
        }
    }
}

impl fmt::Display for ClinicalRelevance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClinicalRelevance {
    type Err = ContentError;

    /// Parses a relevance value. `medium` is accepted as a legacy spelling of `moderate`.
    fn from_str(s: &str) -> ContentResult<Self> {
        match s {
            "low" => Ok(ClinicalRelevance::Low),
            "moderate" | "medium" => Ok(ClinicalRelevance::Moderate),
            "high" => Ok(ClinicalRelevance::High),
            "critical" => Ok(ClinicalRelevance::Critical),
            other => Err(ContentError::UnknownValue {
                field: "clinicalRelevance",
                value: other.to_owned(),
            }),
        }
    }
}
