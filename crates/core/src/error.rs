use crate::source::RecordOrigin;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("failed to read corpus: {0}")]
    FileRead(std::io::Error),
    #[error(
        "failed to parse {count} content file(s):{list}",
        count = .failures.len(),
        list = ParseFailure::list(.failures)
    )]
    CorpusParse { failures: Vec<ParseFailure> },
    #[error("duplicate record id '{id}' declared by {first} and {second}")]
    DuplicateId {
        id: String,
        first: RecordOrigin,
        second: RecordOrigin,
    },
    #[error("corpus report has {warnings} warning(s) and fail-on-warnings is set")]
    WarningsNotAllowed { warnings: usize },
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("failed to serialize report: {0}")]
    Serialization(serde_json::Error),
}

pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

/// One content file that did not parse, relative to the corpus root.
#[derive(Debug)]
pub struct ParseFailure {
    pub path: PathBuf,
    pub source: content_schema::ContentError,
}

impl ParseFailure {
    fn list(failures: &[ParseFailure]) -> String {
        failures
            .iter()
            .map(|failure| format!("\n  {failure}"))
            .collect()
    }
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.source)
    }
}
