//! Content file parsing and rendering.
//!
//! A content file is YAML holding either a single record mapping or a sequence of record
//! mappings. Grouped files are how authors keep closely related conditions together (for
//! example every disorder of the middle ear in one file).

use crate::record::ContentRecord;
use crate::{ContentError, ContentResult};

/// Content file operations.
///
/// This is a zero-sized type used for namespacing file-level operations.
pub struct ContentFile;

impl ContentFile {
    /// Parse every record in a content file from YAML text.
    ///
    /// This uses `serde_path_to_error` to surface a best-effort "path" (for example
    /// `[1].levels.2.keyTerms`) to the failing field when the YAML does not match the wire
    /// schema.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError`] if:
    /// - the text is not valid YAML,
    /// - the document is empty, or is neither a mapping nor a sequence,
    /// - any record has a missing field, a field of the wrong type, or an unknown key.
    pub fn parse(yaml_text: &str) -> ContentResult<Vec<ContentRecord>> {
        if yaml_text.trim().is_empty() {
            return Err(ContentError::Translation(
                "content file is empty".to_string(),
            ));
        }

        let value: serde_yaml::Value = serde_yaml::from_str(yaml_text)?;

        match value {
            serde_yaml::Value::Sequence(_) => deserialize_with_path::<Vec<ContentRecord>>(value),
            serde_yaml::Value::Mapping(_) => {
                deserialize_with_path::<ContentRecord>(value).map(|record| vec![record])
            }
            serde_yaml::Value::Null => Err(ContentError::Translation(
                "content file is empty".to_string(),
            )),
            _ => Err(ContentError::Translation(
                "content file must be a record mapping or a sequence of records".to_string(),
            )),
        }
    }

    /// Render records as YAML text.
    ///
    /// A single record renders as a mapping; several render as a sequence, so that
    /// [`ContentFile::parse`] reads the output back unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError`] if serialisation fails.
    pub fn render(records: &[ContentRecord]) -> ContentResult<String> {
        let rendered = match records {
            [single] => serde_yaml::to_string(single),
            many => serde_yaml::to_string(many),
        };
        rendered.map_err(|e| {
            ContentError::Translation(format!("Failed to serialize content file: {e}"))
        })
    }
}

fn deserialize_with_path<T>(value: serde_yaml::Value) -> ContentResult<T>
where
    T: serde::de::DeserializeOwned,
{
    serde_path_to_error::deserialize::<_, T>(value).map_err(|err| {
        let path = err.path().to_string();
        let source = err.into_inner();
        let path = if path.is_empty() || path == "." {
            "<root>"
        } else {
            path.as_str()
        };
        ContentError::Translation(format!("Content record schema mismatch at {path}: {source}"))
    })
}
