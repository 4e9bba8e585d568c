//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the registry and the
//! services built on it. Nothing in this crate reads environment variables itself; binaries read
//! them and hand the raw values to the helpers below.

use crate::constants::DEFAULT_CORPUS_DIR;
use crate::error::{RegistryError, RegistryResult};
use crate::loader::collect_content_files;
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    corpus_dir: PathBuf,
    fail_on_warnings: bool,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidInput`] if `corpus_dir` is not a directory.
    pub fn new(corpus_dir: PathBuf, fail_on_warnings: bool) -> RegistryResult<Self> {
        if !corpus_dir.is_dir() {
            return Err(RegistryError::InvalidInput(format!(
                "corpus directory {} does not exist or is not a directory",
                corpus_dir.display()
            )));
        }

        Ok(Self {
            corpus_dir,
            fail_on_warnings,
        })
    }

    pub fn corpus_dir(&self) -> &Path {
        &self.corpus_dir
    }

    /// Whether report warnings should fail a validation gate.
    pub fn fail_on_warnings(&self) -> bool {
        self.fail_on_warnings
    }
}

/// Resolve the corpus directory without reading environment variables.
///
/// If `override_dir` is provided it must be a directory. Otherwise this searches for `corpus/`
/// relative to the current working directory and then walks up from `CARGO_MANIFEST_DIR`.
pub fn resolve_corpus_dir(override_dir: Option<PathBuf>) -> RegistryResult<PathBuf> {
    if let Some(corpus_dir) = override_dir {
        if corpus_dir.is_dir() {
            return Ok(corpus_dir);
        }
        return Err(RegistryError::InvalidInput(format!(
            "MEDREF_CORPUS_DIR override {} is not a directory",
            corpus_dir.display()
        )));
    }

    let cwd_relative = PathBuf::from(DEFAULT_CORPUS_DIR);
    if cwd_relative.is_dir() {
        return Ok(cwd_relative);
    }

    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    for ancestor in manifest_dir.ancestors() {
        let candidate = ancestor.join(DEFAULT_CORPUS_DIR);
        if candidate.is_dir() {
            return Ok(candidate);
        }
    }

    Err(RegistryError::InvalidInput(
        "could not locate corpus/ directory".into(),
    ))
}

/// Validate that the corpus directory is safe to load.
///
/// Runs the loader's directory scan without parsing anything, so a misconfigured override
/// (for example `/`) is caught at startup.
pub fn validate_corpus_dir_safe_to_load(corpus_dir: &Path) -> RegistryResult<()> {
    collect_content_files(corpus_dir).map(|_| ())
}

/// Parse the fail-on-warnings flag from an optional string value.
///
/// `None` or an empty value means `false`.
pub fn fail_on_warnings_from_env_value(value: Option<String>) -> RegistryResult<bool> {
    let value = value
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty());

    match value.as_deref() {
        None | Some("0" | "false" | "no") => Ok(false),
        Some("1" | "true" | "yes") => Ok(true),
        Some(other) => Err(RegistryError::InvalidInput(format!(
            "MEDREF_FAIL_ON_WARNINGS must be true or false, got '{other}'"
        ))),
    }
}
