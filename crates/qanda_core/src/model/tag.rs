//! Tag model and submission-time tag parsing.
//!
//! # Responsibility
//! - Normalize tag names (trimmed, lowercase).
//! - Parse the comma-separated tag field of the ask-question form.
//!
//! # Invariants
//! - A question is submitted with between 2 and 4 distinct tags, inclusive.
//! - Tag names are non-blank and at most 40 characters.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const MIN_TAGS: usize = 2;
pub const MAX_TAGS: usize = 4;
pub const MAX_TAG_NAME_CHARS: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// Errors raised while validating tag input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagValidationError {
    /// One comma-separated entry is empty after trimming.
    BlankTag,
    TagTooLong { tag: String, max: usize },
    TooFewTags { count: usize, min: usize },
    TooManyTags { count: usize, max: usize },
}

impl Display for TagValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTag => write!(f, "tags must not be blank"),
            Self::TagTooLong { tag, max } => {
                write!(f, "tag `{tag}` is longer than {max} characters")
            }
            Self::TooFewTags { count, min } => {
                write!(f, "you must add at least {min} tags, got {count}")
            }
            Self::TooManyTags { count, max } => {
                write!(f, "you cannot add more than {max} tags, got {count}")
            }
        }
    }
}

impl Error for TagValidationError {}

/// Normalizes one tag value; `None` for blank input.
pub fn normalize_tag(tag: &str) -> Option<String> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Normalizes, validates and deduplicates a list of tag names.
///
/// Output is sorted and unique. Count limits are not applied here.
pub fn normalize_tags<S: AsRef<str>>(tags: &[S]) -> Result<Vec<String>, TagValidationError> {
    let mut unique = BTreeSet::new();
    for tag in tags {
        let name = normalize_tag(tag.as_ref()).ok_or(TagValidationError::BlankTag)?;
        if name.chars().count() > MAX_TAG_NAME_CHARS {
            return Err(TagValidationError::TagTooLong {
                tag: name,
                max: MAX_TAG_NAME_CHARS,
            });
        }
        unique.insert(name);
    }
    Ok(unique.into_iter().collect())
}

/// Parses the raw comma-separated tag field submitted with a question.
///
/// Duplicates (case-insensitive) count once.
pub fn parse_custom_tags(input: &str) -> Result<Vec<String>, TagValidationError> {
    let pieces: Vec<&str> = input.split(',').collect();
    let tags = normalize_tags(&pieces)?;
    if tags.len() < MIN_TAGS {
        return Err(TagValidationError::TooFewTags {
            count: tags.len(),
            min: MIN_TAGS,
        });
    }
    if tags.len() > MAX_TAGS {
        return Err(TagValidationError::TooManyTags {
            count: tags.len(),
            max: MAX_TAGS,
        });
    }
    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::{parse_custom_tags, TagValidationError, MAX_TAGS, MIN_TAGS};

    #[test]
    fn accepts_two_to_four_tags() {
        assert_eq!(parse_custom_tags("a,b").unwrap(), vec!["a", "b"]);
        assert_eq!(
            parse_custom_tags(" Rust , SQL,async , Web ").unwrap(),
            vec!["async", "rust", "sql", "web"]
        );
    }

    #[test]
    fn rejects_single_tag() {
        assert_eq!(
            parse_custom_tags("a").unwrap_err(),
            TagValidationError::TooFewTags {
                count: 1,
                min: MIN_TAGS
            }
        );
    }

    #[test]
    fn rejects_five_tags() {
        assert_eq!(
            parse_custom_tags("a,b,c,d,e").unwrap_err(),
            TagValidationError::TooManyTags {
                count: 5,
                max: MAX_TAGS
            }
        );
    }

    #[test]
    fn duplicates_count_once() {
        assert!(matches!(
            parse_custom_tags("rust,RUST").unwrap_err(),
            TagValidationError::TooFewTags { count: 1, .. }
        ));
    }

    #[test]
    fn blank_and_oversized_entries_are_rejected() {
        assert_eq!(
            parse_custom_tags("a,,b").unwrap_err(),
            TagValidationError::BlankTag
        );
        let long = "x".repeat(41);
        assert!(matches!(
            parse_custom_tags(&format!("a,{long}")).unwrap_err(),
            TagValidationError::TagTooLong { .. }
        ));
    }
}
