//! Answer domain model.
//!
//! # Invariants
//! - `body` is non-blank.
//! - At most one answer per question is `accepted`; enforced on save by the
//!   answer repository, not by this type.

use crate::model::question::QuestionId;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type AnswerId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerValidationError {
    EmptyBody,
}

impl Display for AnswerValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyBody => write!(f, "answer body must not be blank"),
        }
    }
}

impl Error for AnswerValidationError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub uuid: AnswerId,
    pub question: QuestionId,
    pub owner: UserId,
    pub body: String,
    pub accepted: bool,
}

impl Answer {
    /// Creates a validated, not-yet-accepted answer.
    pub fn new(
        question: QuestionId,
        owner: UserId,
        body: impl Into<String>,
    ) -> Result<Self, AnswerValidationError> {
        let answer = Self {
            uuid: Uuid::new_v4(),
            question,
            owner,
            body: body.into(),
            accepted: false,
        };
        answer.validate()?;
        Ok(answer)
    }

    pub fn validate(&self) -> Result<(), AnswerValidationError> {
        if self.body.trim().is_empty() {
            return Err(AnswerValidationError::EmptyBody);
        }
        Ok(())
    }
}
