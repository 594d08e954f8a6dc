//! Question domain model.
//!
//! # Responsibility
//! - Define the persisted shape of a question.
//! - Validate title/body before any storage write.
//!
//! # Invariants
//! - `title` is non-blank and at most 250 characters.
//! - `body` is non-blank.
//! - Only the owner may accept answers for a question.

use crate::model::user::UserId;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type QuestionId = Uuid;

pub const MAX_TITLE_CHARS: usize = 250;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Validation errors for question writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionValidationError {
    EmptyTitle,
    TitleTooLong { max: usize, actual: usize },
    EmptyBody,
}

impl Display for QuestionValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "question title must not be blank"),
            Self::TitleTooLong { max, actual } => {
                write!(f, "question title has {actual} characters; max is {max}")
            }
            Self::EmptyBody => write!(f, "question body must not be blank"),
        }
    }
}

impl Error for QuestionValidationError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub uuid: QuestionId,
    pub owner: UserId,
    pub title: String,
    /// Markdown source.
    pub body: String,
}

impl Question {
    /// Creates a validated question with a generated id.
    pub fn new(
        owner: UserId,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<Self, QuestionValidationError> {
        let question = Self {
            uuid: Uuid::new_v4(),
            owner,
            title: title.into().trim().to_string(),
            body: body.into(),
        };
        question.validate()?;
        Ok(question)
    }

    pub fn validate(&self) -> Result<(), QuestionValidationError> {
        if self.title.trim().is_empty() {
            return Err(QuestionValidationError::EmptyTitle);
        }
        let chars = self.title.chars().count();
        if chars > MAX_TITLE_CHARS {
            return Err(QuestionValidationError::TitleTooLong {
                max: MAX_TITLE_CHARS,
                actual: chars,
            });
        }
        if self.body.trim().is_empty() {
            return Err(QuestionValidationError::EmptyBody);
        }
        Ok(())
    }

    /// Only the author decides which answer is accepted.
    pub fn can_accept_answers(&self, user: UserId) -> bool {
        self.owner == user
    }

    /// URL-friendly title with whitespace runs replaced by `-`.
    pub fn title_as_hyphen(&self) -> String {
        title_as_hyphen(&self.title)
    }
}

pub fn title_as_hyphen(title: &str) -> String {
    WHITESPACE_RE.replace_all(title.trim(), "-").into_owned()
}
