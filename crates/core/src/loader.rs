//! Corpus loader.
//!
//! Walks a corpus directory and turns every content file into [`IngestedRecord`]s. This is one
//! possible aggregation step in front of the registry; callers that assemble records some other
//! way build `IngestedRecord`s themselves and skip this module.
//!
//! Layout conventions:
//! - content files end in `.yaml` or `.yml`; other files are ignored, as are hidden entries,
//! - a record's category is the name of its file's parent directory (`adrenal/addisons.yaml`
//!   is in `adrenal`); files directly in the corpus root use their file stem,
//! - files are read in sorted path order, so ingestion order does not depend on the filesystem.

use crate::constants::{
    CONTENT_FILE_EXTENSIONS, MAX_CORPUS_BYTES, MAX_CORPUS_DEPTH, MAX_CORPUS_FILES,
};
use crate::error::{ParseFailure, RegistryError, RegistryResult};
use crate::source::{IngestedRecord, RecordOrigin};
use content_schema::ContentFile;
use std::path::{Path, PathBuf};

/// Load every record under `corpus_dir`.
///
/// # Errors
///
/// Returns an error if the directory fails the guardrail scan or a file cannot be read. Files
/// that do not parse as content YAML are all collected first and returned together as
/// [`RegistryError::CorpusParse`], each naming its file.
pub fn load_corpus(corpus_dir: &Path) -> RegistryResult<Vec<IngestedRecord>> {
    let files = collect_content_files(corpus_dir)?;
    let mut records = Vec::new();
    let mut failures = Vec::new();

    for path in &files {
        let relative = path
            .strip_prefix(corpus_dir)
            .unwrap_or(path.as_path())
            .to_path_buf();
        let text = std::fs::read_to_string(path).map_err(RegistryError::FileRead)?;
        let parsed = match ContentFile::parse(&text) {
            Ok(parsed) => parsed,
            Err(source) => {
                tracing::warn!(
                    file = %relative.display(),
                    error = %source,
                    "content file does not parse"
                );
                failures.push(ParseFailure {
                    path: relative,
                    source,
                });
                continue;
            }
        };
        let category = category_for(corpus_dir, path);

        tracing::debug!(
            file = %relative.display(),
            category = %category,
            records = parsed.len(),
            "loaded content file"
        );

        records.extend(parsed.into_iter().enumerate().map(|(position, record)| {
            IngestedRecord::new(
                record,
                category.clone(),
                RecordOrigin::file(relative.clone(), position),
            )
        }));
    }

    if !failures.is_empty() {
        return Err(RegistryError::CorpusParse { failures });
    }

    tracing::info!(
        corpus = %corpus_dir.display(),
        files = files.len(),
        records = records.len(),
        "corpus loaded"
    );

    Ok(records)
}

fn category_for(corpus_dir: &Path, path: &Path) -> String {
    let parent = path.parent().filter(|parent| *parent != corpus_dir);
    let name = match parent {
        Some(parent) => parent.file_name(),
        None => path.file_stem(),
    };
    name.map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Scan `corpus_dir` and return its content files in sorted order.
///
/// Guardrails: symlinks and special files (devices, fifos, sockets) are rejected, nesting is
/// limited to [`MAX_CORPUS_DEPTH`], and the content files are limited to [`MAX_CORPUS_FILES`]
/// and [`MAX_CORPUS_BYTES`] in total.
pub(crate) fn collect_content_files(corpus_dir: &Path) -> RegistryResult<Vec<PathBuf>> {
    fn scan_dir(
        path: &Path,
        depth: usize,
        files: &mut Vec<PathBuf>,
        bytes: &mut u64,
    ) -> RegistryResult<()> {
        if depth > MAX_CORPUS_DEPTH {
            return Err(RegistryError::InvalidInput(format!(
                "corpus directory exceeds maximum nesting depth of {MAX_CORPUS_DEPTH}"
            )));
        }

        for entry in std::fs::read_dir(path).map_err(RegistryError::FileRead)? {
            let entry = entry.map_err(RegistryError::FileRead)?;
            let entry_path = entry.path();
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }

            let metadata =
                std::fs::symlink_metadata(&entry_path).map_err(RegistryError::FileRead)?;
            let file_type = metadata.file_type();

            if file_type.is_symlink() {
                return Err(RegistryError::InvalidInput(format!(
                    "corpus directory must not contain symlinks (found at: {})",
                    entry_path.display()
                )));
            }

            if file_type.is_file() {
                if !is_content_file(&entry_path) {
                    continue;
                }
                *bytes = bytes.saturating_add(metadata.len());
                files.push(entry_path);

                if files.len() > MAX_CORPUS_FILES || *bytes > MAX_CORPUS_BYTES {
                    return Err(RegistryError::InvalidInput(
                        "corpus directory exceeds maximum file count or total size".into(),
                    ));
                }
            } else if file_type.is_dir() {
                scan_dir(&entry_path, depth + 1, files, bytes)?;
            } else {
                return Err(RegistryError::InvalidInput(format!(
                    "corpus directory contains unsupported file type at {}",
                    entry_path.display()
                )));
            }
        }

        Ok(())
    }

    if !corpus_dir.is_dir() {
        return Err(RegistryError::InvalidInput(format!(
            "corpus directory {} is not a directory",
            corpus_dir.display()
        )));
    }

    let mut files = Vec::new();
    let mut bytes = 0u64;
    scan_dir(corpus_dir, 0, &mut files, &mut bytes)?;
    files.sort();
    Ok(files)
}

fn is_content_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| CONTENT_FILE_EXTENSIONS.contains(&ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use tempfile::TempDir;

    fn record_yaml(id: &str, target: Option<&str>) -> String {
        let references = target
            .map(|t| {
                format!(
                    "crossReferences:\n  - targetId: {t}\n    targetType: condition\n    relationship: related\n"
                )
            })
            .unwrap_or_default();
        format!(
            "id: {id}\ntype: condition\nname: {id}\nlevels:\n  1:\n    level: 1\n    summary: Short.\n    explanation: Longer.\n    keyTerms:\n      - term: Cortisol\n        definition: A hormone.\n{references}createdAt: 2026-02-05\nupdatedAt: 2026-02-05\nversion: 1\nstatus: published\n"
        )
    }

    fn sequence_yaml(records: &[String]) -> String {
        records
            .iter()
            .flat_map(|record| {
                record.lines().enumerate().map(|(i, line)| {
                    let marker = if i == 0 { "- " } else { "  " };
                    format!("{marker}{line}\n")
                })
            })
            .collect()
    }

    fn write(dir: &Path, relative: &str, contents: &str) {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create dirs");
        }
        std::fs::write(path, contents).expect("write file");
    }

    #[test]
    fn loads_files_in_sorted_order_with_categories() {
        let temp = TempDir::new().expect("tempdir");
        let root = temp.path();
        write(
            root,
            "thyroid/graves.yaml",
            &record_yaml("thyroid-graves-disease", None),
        );
        write(
            root,
            "adrenal/addisons.yml",
            &sequence_yaml(&[
                record_yaml("endocrine-addisons-disease", Some("endocrine-adrenal-crisis")),
                record_yaml("endocrine-adrenal-crisis", None),
            ]),
        );
        write(root, "misc.yaml", &record_yaml("misc-overview", None));
        write(root, "README.md", "# not content");
        write(root, ".hidden/ignored.yaml", "not: [valid");

        let records = load_corpus(root).expect("load corpus");
        let loaded: Vec<_> = records
            .iter()
            .map(|r| (r.id(), r.category.as_str(), r.origin.position))
            .collect();
        assert_eq!(
            loaded,
            vec![
                ("endocrine-addisons-disease", "adrenal", 0),
                ("endocrine-adrenal-crisis", "adrenal", 1),
                ("misc-overview", "misc", 0),
                ("thyroid-graves-disease", "thyroid", 0),
            ]
        );
        assert_eq!(
            records[1].origin.path(),
            Some(Path::new("adrenal/addisons.yml"))
        );

        let registry = Registry::build(records).expect("build");
        assert_eq!(
            registry
                .list_cross_references("endocrine-addisons-disease")
                .len(),
            1
        );
    }

    #[test]
    fn parse_failure_names_the_file() {
        let temp = TempDir::new().expect("tempdir");
        write(
            temp.path(),
            "adrenal/broken.yaml",
            &record_yaml("endocrine-broken", None).replace("version: 1", "version: one"),
        );

        let err = load_corpus(temp.path()).expect_err("parse failure");
        match err {
            RegistryError::CorpusParse { failures } => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].path, Path::new("adrenal/broken.yaml"));
                assert!(
                    failures[0].source.to_string().contains("version"),
                    "{}",
                    failures[0].source
                );
            }
            other => panic!("expected CorpusParse, got {other:?}"),
        }
    }

    #[test]
    fn every_unparsable_file_is_reported_together() {
        let temp = TempDir::new().expect("tempdir");
        let root = temp.path();
        write(
            root,
            "thyroid/a.yaml",
            &record_yaml("thyroid-a", None).replace("status: published", "status: review"),
        );
        write(
            root,
            "thyroid/b.yaml",
            &record_yaml("thyroid-b", None).replace("version: 1", "version: -1"),
        );
        write(
            root,
            "thyroid/c.yaml",
            &record_yaml("thyroid-c", None).replace("levels:", "levl:"),
        );
        write(root, "thyroid/d.yaml", &record_yaml("thyroid-d", None));

        let err = load_corpus(root).expect_err("parse failures");
        let message = err.to_string();
        let RegistryError::CorpusParse { failures } = err else {
            panic!("expected CorpusParse, got {message}");
        };
        let paths: Vec<_> = failures.iter().map(|f| f.path.as_path()).collect();
        assert_eq!(
            paths,
            vec![
                Path::new("thyroid/a.yaml"),
                Path::new("thyroid/b.yaml"),
                Path::new("thyroid/c.yaml"),
            ]
        );
        assert!(message.starts_with("failed to parse 3 content file(s)"), "{message}");
        for name in ["a.yaml", "b.yaml", "c.yaml"] {
            assert!(message.contains(name), "{message}");
        }
        assert!(!message.contains("d.yaml"), "{message}");
    }

    #[test]
    fn rejects_excessive_nesting() {
        let temp = TempDir::new().expect("tempdir");
        let deep = (0..=MAX_CORPUS_DEPTH + 1)
            .map(|i| format!("d{i}"))
            .collect::<Vec<_>>()
            .join("/");
        write(temp.path(), &format!("{deep}/x.yaml"), &record_yaml("x", None));

        let err = load_corpus(temp.path()).expect_err("too deep");
        assert!(matches!(err, RegistryError::InvalidInput(msg) if msg.contains("depth")));
    }

    #[cfg(unix)]
    #[test]
    fn rejects_symlinks() {
        let temp = TempDir::new().expect("tempdir");
        write(temp.path(), "adrenal/a.yaml", &record_yaml("a", None));
        std::os::unix::fs::symlink(
            temp.path().join("adrenal/a.yaml"),
            temp.path().join("adrenal/b.yaml"),
        )
        .expect("symlink");

        let err = load_corpus(temp.path()).expect_err("symlink");
        assert!(matches!(err, RegistryError::InvalidInput(msg) if msg.contains("symlinks")));
    }

    #[test]
    fn missing_directory_is_invalid_input() {
        let temp = TempDir::new().expect("tempdir");
        let err = load_corpus(&temp.path().join("absent")).expect_err("missing");
        assert!(matches!(err, RegistryError::InvalidInput(_)));
    }

    #[test]
    fn bundled_corpus_builds_cleanly() {
        let corpus = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../corpus");
        let records = load_corpus(&corpus).expect("load bundled corpus");
        assert!(!records.is_empty());

        let registry = Registry::build(records).expect("bundled corpus has unique ids");
        let report = registry.validate_corpus();
        assert!(!report.has_errors(), "{report}");
        assert!(!report.has_warnings(), "{report}");
        assert!(registry.get_by_id("endocrine-addisons-disease").is_ok());
    }
}
