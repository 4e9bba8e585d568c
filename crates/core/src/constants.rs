//! Constants used throughout the medref core crate.
//!
//! Corpus layout and loader limits live here so the loader, the configuration checks and the
//! tests agree on them.

/// Default corpus directory name, searched relative to the working directory and then upwards
/// from the crate manifest.
pub const DEFAULT_CORPUS_DIR: &str = "corpus";

/// File extensions the loader treats as content files.
pub const CONTENT_FILE_EXTENSIONS: &[&str] = &["yaml", "yml"];

/// Maximum number of content files in one corpus.
pub const MAX_CORPUS_FILES: usize = 5_000;

/// Maximum combined size of all content files in one corpus.
pub const MAX_CORPUS_BYTES: u64 = 64 * 1024 * 1024; // 64 MiB

/// Maximum directory nesting below the corpus root.
pub const MAX_CORPUS_DEPTH: usize = 8;
