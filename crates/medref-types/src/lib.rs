//! Validated value types shared across the medref crates.
//!
//! Content records reference each other by identifier and are looked up by free-text tags and
//! category labels. Both need a single canonical form so that every index agrees on what counts
//! as "the same" key:
//!
//! - [`RecordId`]: a record identifier in canonical form (lowercase ASCII, hyphen separated).
//! - [`FoldedKey`]: a trimmed, case-folded lookup key for tags and categories.

use std::fmt;

/// Maximum accepted length of a record identifier, in bytes.
pub const MAX_RECORD_ID_LEN: usize = 128;

/// Errors that can occur when parsing a [`RecordId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The identifier was empty or whitespace only
    #[error("record id cannot be empty")]
    Empty,

    /// The identifier exceeded [`MAX_RECORD_ID_LEN`]
    #[error("record id exceeds maximum length of {MAX_RECORD_ID_LEN} characters")]
    TooLong,

    /// The identifier was not lowercase and hyphenated
    #[error("record id '{0}' must be lowercase alphanumeric segments separated by single hyphens")]
    NotCanonical(String),
}

/// Errors that can occur when creating validated text types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// A record identifier in the corpus naming convention.
///
/// Canonical form:
/// - one or more segments of `a-z` and `0-9`
/// - segments joined by a single `-`
/// - no leading, trailing or repeated hyphens
///
/// Example: `endocrine-addisons-disease`
///
/// Unlike [`FoldedKey`], parsing does **not** normalise the input. An identifier written as
/// `Endocrine-Addisons` is rejected rather than lowercased, because ids are stable references
/// and silently rewriting one would hide an authoring mistake.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(String);

impl RecordId {
    /// Validates and wraps an identifier that must already be canonical.
    ///
    /// # Errors
    ///
    /// Returns [`IdError`] describing the first way in which `input` is not canonical.
    pub fn parse(input: &str) -> Result<Self, IdError> {
        if input.trim().is_empty() {
            return Err(IdError::Empty);
        }
        if input.len() > MAX_RECORD_ID_LEN {
            return Err(IdError::TooLong);
        }
        if !Self::is_canonical(input) {
            return Err(IdError::NotCanonical(input.to_owned()));
        }
        Ok(Self(input.to_owned()))
    }

    /// Returns true if `input` is a canonical record identifier.
    ///
    /// This is a purely syntactic check and does not enforce the length limit.
    pub fn is_canonical(input: &str) -> bool {
        !input.is_empty()
            && input.split('-').all(|segment| {
                !segment.is_empty()
                    && segment
                        .bytes()
                        .all(|b| matches!(b, b'a'..=b'z' | b'0'..=b'9'))
            })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A lookup key that is trimmed and case-folded on construction.
///
/// Tags such as `Dialysis`, `dialysis ` and `DIALYSIS` all fold to the same key, which is what
/// the tag and category indices are keyed by. Non-ASCII text is folded with Unicode lowercase
/// rules, so `Diálisis` becomes `diálisis`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FoldedKey(String);

impl FoldedKey {
    /// Creates a new `FoldedKey` from the given input.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_lowercase()))
    }

    /// Returns the folded key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FoldedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FoldedKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_id_accepts_canonical_ids() {
        assert!(RecordId::parse("endocrine-acromegaly").is_ok());
        assert!(RecordId::parse("condition-ckd-stage-5").is_ok());
        assert!(RecordId::parse("a").is_ok());
    }

    #[test]
    fn record_id_rejects_empty() {
        assert_eq!(RecordId::parse("").expect_err("empty"), IdError::Empty);
        assert_eq!(RecordId::parse("   ").expect_err("blank"), IdError::Empty);
    }

    #[test]
    fn record_id_rejects_non_canonical_forms() {
        for bad in [
            "Endocrine-Acromegaly",
            "endocrine_acromegaly",
            "endocrine--acromegaly",
            "-endocrine",
            "endocrine-",
            "endocrine acromegaly",
            "diálisis",
        ] {
            let err = RecordId::parse(bad).expect_err("should reject non-canonical id");
            assert!(matches!(err, IdError::NotCanonical(ref id) if id == bad), "{bad}");
        }
    }

    #[test]
    fn record_id_rejects_too_long() {
        let long = "a".repeat(MAX_RECORD_ID_LEN + 1);
        assert_eq!(RecordId::parse(&long).expect_err("too long"), IdError::TooLong);
    }

    #[test]
    fn folded_key_trims_and_lowercases() {
        let key = FoldedKey::new("  Dialysis ").expect("non-empty");
        assert_eq!(key.as_str(), "dialysis");
        assert_eq!(key, FoldedKey::new("DIALYSIS").expect("non-empty"));
    }

    #[test]
    fn folded_key_folds_non_ascii() {
        let key = FoldedKey::new("Diálisis Peritoneal").expect("non-empty");
        assert_eq!(key.as_str(), "diálisis peritoneal");
    }

    #[test]
    fn folded_key_rejects_blank() {
        assert_eq!(FoldedKey::new(" \t ").expect_err("blank"), TextError::Empty);
    }
}
