//! Progressive-disclosure level wire model.
//!
//! A record explains its subject at up to five levels, from lay reader (1) to specialist (5).
//! Higher levels are expected to be more complex than lower ones, but that is an authoring
//! guideline and is not checked here.

use serde::{Deserialize, Serialize};

/// Lowest disclosure level. Every record must define it.
pub const MIN_LEVEL: u8 = 1;

/// Highest disclosure level.
pub const MAX_LEVEL: u8 = 5;

/// One disclosure tier of a record.
///
/// `level` repeats the key this entry is stored under in `ContentRecord::levels`. The two must
/// agree; the registry validator reports a mismatch.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct LevelContent {
    pub level: u8,
    pub summary: String,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_terms: Vec<KeyTerm>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub analogies: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinical_notes: Option<String>,
}

/// A glossary entry introduced at a given level.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct KeyTerm {
    pub term: String,
    pub definition: String,
}

impl KeyTerm {
    pub fn new(term: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            definition: definition.into(),
        }
    }
}

impl LevelContent {
    /// Creates a level with the given summary and explanation and no optional parts.
    pub fn new(level: u8, summary: impl Into<String>, explanation: impl Into<String>) -> Self {
        Self {
            level,
            summary: summary.into(),
            explanation: explanation.into(),
            key_terms: Vec::new(),
            analogies: Vec::new(),
            examples: Vec::new(),
            clinical_notes: None,
        }
    }

    /// Returns true if `level` lies within [`MIN_LEVEL`]..=[`MAX_LEVEL`].
    pub fn is_valid_level(level: u8) -> bool {
        (MIN_LEVEL..=MAX_LEVEL).contains(&level)
    }
}
