//! Record ingestion boundary.
//!
//! The registry does not care how records were authored or stored. It consumes
//! [`IngestedRecord`]s: a parsed record together with the category label the aggregation step
//! assigned to it and where it came from. The corpus loader produces these from a directory of
//! YAML files; tests and embedding applications can build them in memory.

use content_schema::ContentRecord;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Where an ingested record came from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RecordOrigin {
    /// Source file, or `None` for records assembled in memory.
    pub path: Option<PathBuf>,
    /// Zero-based position of the record within its file or batch.
    pub position: usize,
}

impl RecordOrigin {
    pub fn file(path: impl Into<PathBuf>, position: usize) -> Self {
        Self {
            path: Some(path.into()),
            position,
        }
    }

    pub fn memory(position: usize) -> Self {
        Self {
            path: None,
            position,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl fmt::Display for RecordOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}#{}", path.display(), self.position),
            None => write!(f, "<memory>#{}", self.position),
        }
    }
}

/// A record as handed to the registry by the aggregation step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IngestedRecord {
    pub record: ContentRecord,
    /// Logical grouping such as `adrenal` or `thyroid`. Supplied by the caller, never inferred
    /// from record content.
    pub category: String,
    pub origin: RecordOrigin,
}

impl IngestedRecord {
    pub fn new(record: ContentRecord, category: impl Into<String>, origin: RecordOrigin) -> Self {
        Self {
            record,
            category: category.into(),
            origin,
        }
    }

    /// Wraps in-memory records that all share one category, numbering their origins in order.
    pub fn batch(
        records: impl IntoIterator<Item = ContentRecord>,
        category: &str,
    ) -> Vec<IngestedRecord> {
        records
            .into_iter()
            .enumerate()
            .map(|(position, record)| {
                IngestedRecord::new(record, category, RecordOrigin::memory(position))
            })
            .collect()
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }
}
