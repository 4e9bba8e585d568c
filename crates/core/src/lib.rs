//! # medref core
//!
//! Registry engine for the medical education content corpus.
//!
//! Records are hand-written YAML data. This crate aggregates them, checks them, links them and
//! answers queries over them:
//! - [`validation`]: per-record schema checks, returned as data
//! - [`resolver`]: corpus-wide cross-reference resolution with dangling edge detection
//! - [`index`]: lookup structures by id, type, status, category, tag, shelf and exam flag
//! - [`Registry`]: the immutable query façade over all of the above
//! - [`SharedRegistry`]: atomic hot swapping of rebuilt registries
//! - [`loader`]: reading a corpus directory into [`IngestedRecord`]s
//!
//! **No API concerns**: HTTP and CLI surfaces live in the binaries.

pub mod config;
pub mod constants;
pub mod error;
pub mod index;
pub mod loader;
pub mod registry;
pub mod report;
pub mod resolver;
pub mod shared;
pub mod source;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use config::{
    fail_on_warnings_from_env_value, resolve_corpus_dir, validate_corpus_dir_safe_to_load,
    CoreConfig,
};
pub use error::{ParseFailure, RegistryError, RegistryResult};
pub use index::{DuplicateRecord, ExamPartition, RecordIndices};
pub use loader::load_corpus;
pub use registry::{Registry, RegistryStats};
pub use report::{validate_corpus, CorpusReport, RecordReport};
pub use resolver::{DanglingEdge, DanglingReason, ReferenceGraph, ResolvedEdge};
pub use shared::SharedRegistry;
pub use source::{IngestedRecord, RecordOrigin};
pub use validation::{validate_record, SchemaError, Severity, ValidationError, ValidationResult};
