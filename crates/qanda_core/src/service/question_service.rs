//! Question use-case service.
//!
//! # Responsibility
//! - Validate ask-question submissions (title, body, 2..=4 tags).
//! - Serve the home feed with its sort modes and paging.
//! - Gate edits to the question owner.
//!
//! # Invariants
//! - Nothing is persisted when any field of a submission is invalid.
//! - Feed pages default to 10 rows and never exceed 50.

use crate::model::question::{Question, QuestionId, QuestionValidationError};
use crate::model::tag::{parse_custom_tags, Tag, TagValidationError};
use crate::model::user::UserId;
use crate::repo::question_repo::{
    QuestionListQuery, QuestionRecord, QuestionRepository, QuestionSort,
};
use crate::repo::{normalize_page_limit, RepoError, RepoResult};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Raw ask-question form input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskQuestionForm {
    pub title: String,
    pub body: String,
    /// Comma-separated tag names, e.g. `"rust, sqlite"`.
    pub custom_tags: String,
}

/// Validated but unsaved question, as shown by the preview action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionPreview {
    pub question: Question,
    pub tags: Vec<String>,
}

/// One page of the question feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionFeedPage {
    pub items: Vec<QuestionRecord>,
    pub sort: QuestionSort,
    /// 1-based page number actually served.
    pub page: u32,
    pub applied_limit: u32,
}

#[derive(Debug)]
pub enum QuestionServiceError {
    InvalidQuestion(QuestionValidationError),
    InvalidTags(TagValidationError),
    QuestionNotFound(QuestionId),
    /// Only the owner may edit a question.
    PermissionDenied {
        user: UserId,
        question: QuestionId,
    },
    Repo(RepoError),
    InconsistentState(&'static str),
}

impl Display for QuestionServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidQuestion(err) => write!(f, "{err}"),
            Self::InvalidTags(err) => write!(f, "{err}"),
            Self::QuestionNotFound(id) => write!(f, "question not found: {id}"),
            Self::PermissionDenied { user, question } => {
                write!(f, "user {user} cannot change question {question}")
            }
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => {
                write!(f, "inconsistent question state: {details}")
            }
        }
    }
}

impl Error for QuestionServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidQuestion(err) => Some(err),
            Self::InvalidTags(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for QuestionServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: "question",
                id,
            } => Self::QuestionNotFound(id),
            RepoError::QuestionValidation(err) => Self::InvalidQuestion(err),
            RepoError::TagValidation(err) => Self::InvalidTags(err),
            other => Self::Repo(other),
        }
    }
}

impl From<QuestionValidationError> for QuestionServiceError {
    fn from(value: QuestionValidationError) -> Self {
        Self::InvalidQuestion(value)
    }
}

impl From<TagValidationError> for QuestionServiceError {
    fn from(value: TagValidationError) -> Self {
        Self::InvalidTags(value)
    }
}

/// Question service facade over repository implementations.
pub struct QuestionService<R: QuestionRepository> {
    repo: R,
}

impl<R: QuestionRepository> QuestionService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Validates a submission without persisting it.
    pub fn preview_question(
        &self,
        owner: UserId,
        form: &AskQuestionForm,
    ) -> Result<QuestionPreview, QuestionServiceError> {
        let question = Question::new(owner, form.title.as_str(), form.body.as_str())?;
        let tags = parse_custom_tags(&form.custom_tags)?;
        Ok(QuestionPreview { question, tags })
    }

    /// Validates and stores a new question with its tags.
    pub fn ask_question(
        &mut self,
        owner: UserId,
        form: &AskQuestionForm,
    ) -> Result<QuestionRecord, QuestionServiceError> {
        let preview = self.preview_question(owner, form)?;
        let id = self
            .repo
            .create_question(&preview.question, &preview.tags)?;
        info!(
            "event=question_ask module=service status=ok tag_count={}",
            preview.tags.len()
        );
        self.repo
            .get_question(id)?
            .ok_or(QuestionServiceError::InconsistentState(
                "created question not found in read-back",
            ))
    }

    /// Replaces title and body; only the owner may edit.
    pub fn edit_question(
        &self,
        acting_user: UserId,
        id: QuestionId,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<QuestionRecord, QuestionServiceError> {
        let current = self.owned_question(acting_user, id)?;
        let mut question = current.to_question();
        question.title = title.into().trim().to_string();
        question.body = body.into();
        self.repo.update_question(&question)?;
        self.repo
            .get_question(id)?
            .ok_or(QuestionServiceError::InconsistentState(
                "updated question not found in read-back",
            ))
    }

    /// Replaces the tag set from raw comma-separated input; owner only.
    pub fn retag_question(
        &mut self,
        acting_user: UserId,
        id: QuestionId,
        custom_tags: &str,
    ) -> Result<QuestionRecord, QuestionServiceError> {
        self.owned_question(acting_user, id)?;
        let tags = parse_custom_tags(custom_tags)?;
        self.repo.set_question_tags(id, &tags)?;
        self.repo
            .get_question(id)?
            .ok_or(QuestionServiceError::InconsistentState(
                "question missing after tag replacement",
            ))
    }

    /// Gets one question with scores, without counting a view.
    pub fn get_question(&self, id: QuestionId) -> RepoResult<Option<QuestionRecord>> {
        self.repo.get_question(id)
    }

    /// Counts a view and returns the question with scores.
    pub fn view_question(&self, id: QuestionId) -> Result<QuestionRecord, QuestionServiceError> {
        self.repo.increment_viewed(id)?;
        self.repo
            .get_question(id)?
            .ok_or(QuestionServiceError::QuestionNotFound(id))
    }

    /// Serves one feed page; `sort` is the raw `sort` query value.
    pub fn home_feed(
        &self,
        sort: Option<&str>,
        page: u32,
        page_size: Option<u32>,
    ) -> Result<QuestionFeedPage, QuestionServiceError> {
        let sort = QuestionSort::from_query(sort);
        let page = page.max(1);
        let applied_limit = normalize_page_limit(page_size);
        let items = self.repo.list_questions(&QuestionListQuery {
            sort,
            owner: None,
            tag: None,
            limit: Some(applied_limit),
            offset: (page - 1).saturating_mul(applied_limit),
        })?;
        Ok(QuestionFeedPage {
            items,
            sort,
            page,
            applied_limit,
        })
    }

    /// Questions carrying `tag`, newest first.
    pub fn questions_tagged(
        &self,
        tag: &str,
        page_size: Option<u32>,
    ) -> Result<Vec<QuestionRecord>, QuestionServiceError> {
        Ok(self.repo.list_questions(&QuestionListQuery {
            sort: QuestionSort::Newest,
            tag: Some(tag.trim().to_lowercase()),
            limit: Some(normalize_page_limit(page_size)),
            ..QuestionListQuery::default()
        })?)
    }

    /// A user's questions, highest score first. `None` returns all of them.
    pub fn user_questions(
        &self,
        owner: UserId,
        limit: Option<u32>,
    ) -> Result<Vec<QuestionRecord>, QuestionServiceError> {
        Ok(self.repo.list_questions(&QuestionListQuery {
            sort: QuestionSort::Top,
            owner: Some(owner),
            limit,
            ..QuestionListQuery::default()
        })?)
    }

    pub fn list_tags(&self) -> RepoResult<Vec<Tag>> {
        self.repo.list_tags()
    }

    pub fn question_score(&self, id: QuestionId) -> RepoResult<i64> {
        self.repo.question_score(id)
    }

    pub fn answer_aggregate_score(&self, id: QuestionId) -> RepoResult<i64> {
        self.repo.answer_aggregate_score(id)
    }

    fn owned_question(
        &self,
        acting_user: UserId,
        id: QuestionId,
    ) -> Result<QuestionRecord, QuestionServiceError> {
        let record = self
            .repo
            .get_question(id)?
            .ok_or(QuestionServiceError::QuestionNotFound(id))?;
        if record.owner != acting_user {
            return Err(QuestionServiceError::PermissionDenied {
                user: acting_user,
                question: id,
            });
        }
        Ok(record)
    }
}
