//! Comment use-case service.

use crate::model::answer::AnswerId;
use crate::model::comment::{Comment, CommentValidationError};
use crate::model::user::UserId;
use crate::repo::comment_repo::{CommentRecord, CommentRepository};
use crate::repo::{RepoError, RepoResult};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum CommentServiceError {
    InvalidComment(CommentValidationError),
    AnswerNotFound(AnswerId),
    Repo(RepoError),
    InconsistentState(&'static str),
}

impl Display for CommentServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidComment(err) => write!(f, "{err}"),
            Self::AnswerNotFound(id) => write!(f, "answer not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent comment state: {details}"),
        }
    }
}

impl Error for CommentServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidComment(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for CommentServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: "answer",
                id,
            } => Self::AnswerNotFound(id),
            RepoError::CommentValidation(err) => Self::InvalidComment(err),
            other => Self::Repo(other),
        }
    }
}

impl From<CommentValidationError> for CommentServiceError {
    fn from(value: CommentValidationError) -> Self {
        Self::InvalidComment(value)
    }
}

pub struct CommentService<R: CommentRepository> {
    repo: R,
}

impl<R: CommentRepository> CommentService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Adds a comment under an existing answer.
    pub fn add_comment(
        &self,
        owner: UserId,
        answer: AnswerId,
        body: impl Into<String>,
    ) -> Result<CommentRecord, CommentServiceError> {
        let comment = Comment::new(answer, owner, body)?;
        let id = self.repo.create_comment(&comment)?;
        info!("event=comment_add module=service status=ok");
        self.repo
            .get_comment(id)?
            .ok_or(CommentServiceError::InconsistentState(
                "created comment not found in read-back",
            ))
    }

    /// Comments of an answer, oldest first.
    pub fn comments_for_answer(&self, answer: AnswerId) -> RepoResult<Vec<CommentRecord>> {
        self.repo.list_comments(answer)
    }
}
