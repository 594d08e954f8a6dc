//! Comment domain model.
//!
//! Comments hang off answers and are never voted on.

use crate::model::answer::AnswerId;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type CommentId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentValidationError {
    EmptyBody,
}

impl Display for CommentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyBody => write!(f, "comment body must not be blank"),
        }
    }
}

impl Error for CommentValidationError {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub uuid: CommentId,
    pub answer: AnswerId,
    pub owner: UserId,
    pub body: String,
}

impl Comment {
    pub fn new(
        answer: AnswerId,
        owner: UserId,
        body: impl Into<String>,
    ) -> Result<Self, CommentValidationError> {
        let comment = Self {
            uuid: Uuid::new_v4(),
            answer,
            owner,
            body: body.into(),
        };
        comment.validate()?;
        Ok(comment)
    }

    pub fn validate(&self) -> Result<(), CommentValidationError> {
        if self.body.trim().is_empty() {
            return Err(CommentValidationError::EmptyBody);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Comment, CommentValidationError};
    use uuid::Uuid;

    #[test]
    fn blank_body_is_rejected() {
        let err = Comment::new(Uuid::new_v4(), Uuid::new_v4(), " \n ").unwrap_err();
        assert_eq!(err, CommentValidationError::EmptyBody);
    }
}
