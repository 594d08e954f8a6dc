//! Answer use-case service.
//!
//! # Responsibility
//! - Post answers to existing questions.
//! - Accept / un-accept answers on behalf of the question owner.
//!
//! # Invariants
//! - Only the question owner may change acceptance.
//! - Single-accepted-answer enforcement stays in the repository write path;
//!   this layer never flips other answers itself.

use crate::model::answer::{Answer, AnswerId, AnswerValidationError};
use crate::model::question::QuestionId;
use crate::model::user::UserId;
use crate::repo::answer_repo::{AnswerListQuery, AnswerOrder, AnswerRecord, AnswerRepository};
use crate::repo::{RepoError, RepoResult};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum AnswerServiceError {
    InvalidAnswer(AnswerValidationError),
    QuestionNotFound(QuestionId),
    AnswerNotFound(AnswerId),
    /// Only the question owner can accept answers.
    PermissionDenied {
        user: UserId,
        answer: AnswerId,
    },
    Repo(RepoError),
    InconsistentState(&'static str),
}

impl Display for AnswerServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidAnswer(err) => write!(f, "{err}"),
            Self::QuestionNotFound(id) => write!(f, "question not found: {id}"),
            Self::AnswerNotFound(id) => write!(f, "answer not found: {id}"),
            Self::PermissionDenied { user, answer } => {
                write!(f, "user {user} cannot change acceptance of answer {answer}")
            }
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent answer state: {details}"),
        }
    }
}

impl Error for AnswerServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidAnswer(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for AnswerServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: "question",
                id,
            } => Self::QuestionNotFound(id),
            RepoError::NotFound {
                entity: "answer",
                id,
            } => Self::AnswerNotFound(id),
            RepoError::AnswerValidation(err) => Self::InvalidAnswer(err),
            other => Self::Repo(other),
        }
    }
}

impl From<AnswerValidationError> for AnswerServiceError {
    fn from(value: AnswerValidationError) -> Self {
        Self::InvalidAnswer(value)
    }
}

/// Answer service facade over repository implementations.
pub struct AnswerService<R: AnswerRepository> {
    repo: R,
}

impl<R: AnswerRepository> AnswerService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Posts a new, not accepted answer.
    pub fn post_answer(
        &mut self,
        owner: UserId,
        question: QuestionId,
        body: impl Into<String>,
    ) -> Result<AnswerRecord, AnswerServiceError> {
        let answer = Answer::new(question, owner, body)?;
        let id = self.repo.create_answer(&answer)?;
        info!("event=answer_post module=service status=ok");
        self.repo
            .get_answer(id)?
            .ok_or(AnswerServiceError::InconsistentState(
                "created answer not found in read-back",
            ))
    }

    /// Sets the accepted flag of an answer.
    ///
    /// Accepting un-accepts whichever answer of the same question was
    /// accepted before. Un-accepting leaves the question without one.
    pub fn set_acceptance(
        &mut self,
        acting_user: UserId,
        answer_id: AnswerId,
        accepted: bool,
    ) -> Result<AnswerRecord, AnswerServiceError> {
        let current = self
            .repo
            .get_answer(answer_id)?
            .ok_or(AnswerServiceError::AnswerNotFound(answer_id))?;
        let owner = self
            .repo
            .question_owner(current.question)?
            .ok_or(AnswerServiceError::QuestionNotFound(current.question))?;
        if owner != acting_user {
            return Err(AnswerServiceError::PermissionDenied {
                user: acting_user,
                answer: answer_id,
            });
        }

        let mut answer = current.to_answer();
        answer.accepted = accepted;
        self.repo.save_answer(&answer)?;
        info!("event=answer_acceptance module=service status=ok accepted={accepted}");

        self.repo
            .get_answer(answer_id)?
            .ok_or(AnswerServiceError::InconsistentState(
                "answer missing after acceptance change",
            ))
    }

    /// Replaces the body of an answer; only its author may edit.
    pub fn edit_answer(
        &mut self,
        acting_user: UserId,
        answer_id: AnswerId,
        body: impl Into<String>,
    ) -> Result<AnswerRecord, AnswerServiceError> {
        let current = self
            .repo
            .get_answer(answer_id)?
            .ok_or(AnswerServiceError::AnswerNotFound(answer_id))?;
        if current.owner != acting_user {
            return Err(AnswerServiceError::PermissionDenied {
                user: acting_user,
                answer: answer_id,
            });
        }

        let mut answer = current.to_answer();
        answer.body = body.into();
        self.repo.save_answer(&answer)?;
        self.repo
            .get_answer(answer_id)?
            .ok_or(AnswerServiceError::InconsistentState(
                "answer missing after edit",
            ))
    }

    pub fn get_answer(&self, id: AnswerId) -> RepoResult<Option<AnswerRecord>> {
        self.repo.get_answer(id)
    }

    /// Answers of a question, accepted first.
    pub fn answers_for_question(&self, question: QuestionId) -> RepoResult<Vec<AnswerRecord>> {
        self.repo.list_answers(&AnswerListQuery {
            question: Some(question),
            order: AnswerOrder::AcceptedFirst,
            ..AnswerListQuery::default()
        })
    }

    /// A user's answers, highest score first. `None` returns all of them.
    pub fn user_answers(&self, owner: UserId, limit: Option<u32>) -> RepoResult<Vec<AnswerRecord>> {
        self.repo.list_answers(&AnswerListQuery {
            owner: Some(owner),
            order: AnswerOrder::TopScore,
            limit,
            ..AnswerListQuery::default()
        })
    }

    /// Most recently posted answers across all questions.
    pub fn latest_answers(&self, limit: u32) -> RepoResult<Vec<AnswerRecord>> {
        self.repo.list_answers(&AnswerListQuery {
            order: AnswerOrder::Newest,
            limit: Some(limit),
            ..AnswerListQuery::default()
        })
    }

    pub fn accepted_answer(&self, question: QuestionId) -> RepoResult<Option<AnswerId>> {
        self.repo.accepted_answer(question)
    }

    pub fn answer_score(&self, id: AnswerId) -> RepoResult<i64> {
        self.repo.answer_score(id)
    }
}
