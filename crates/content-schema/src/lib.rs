//! Content record wire/boundary support.
//!
//! This crate defines the on-disk YAML shape of an educational content record (a condition or
//! topic with up to five progressive-disclosure levels) and the helpers to read and write it.
//!
//! The wire model is strict about *shape* (unknown keys and wrong types are rejected with the
//! failing field path) but lenient about *values* that the registry's schema validator is
//! responsible for judging, such as identifier format or relevance vocabulary. Those stay as raw
//! strings here so that one validation pass can report every defect in a record.
//!
//! Consistency rules across records (unique ids, resolvable cross-references) live in
//! `medref-core`. This crate handles file formats only.

pub mod file;
pub mod level;
pub mod record;

// Re-export facades
pub use file::ContentFile;

// Re-export public wire types
pub use level::{KeyTerm, LevelContent, MAX_LEVEL, MIN_LEVEL};
pub use record::{
    Citation, ClinicalRelevance, ContentRecord, CrossReference, ExamRelevance, RecordStatus,
    RecordType, Relationship, Taxonomy,
};

/// Errors returned by the `content-schema` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("invalid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    #[error("unknown {field} value '{value}'")]
    UnknownValue { field: &'static str, value: String },

    #[error("translation error: {0}")]
    Translation(String),
}

/// Type alias for Results that can fail with a [`ContentError`].
pub type ContentResult<T> = Result<T, ContentError>;
