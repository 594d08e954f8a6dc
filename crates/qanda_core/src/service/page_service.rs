//! Page assembly and form handlers over one connection.
//!
//! # Responsibility
//! - Compose question, answer, comment, vote, profile and subscription
//!   services into the data each page needs (home, question detail, user
//!   detail).
//! - Post answers and resolve the subscribers to notify about them.
//!
//! # Invariants
//! - Opening a question detail counts exactly one view.
//! - Viewer votes are resolved per target: stored vote or unsaved blank.
//! - Repositories are borrowed one at a time from the caller's connection.
//! - New-answer recipients never include the answer author.

use crate::model::question::QuestionId;
use crate::model::user::{User, UserId};
use crate::model::vote::{Vote, VoteTarget};
use crate::repo::answer_repo::{AnswerRecord, SqliteAnswerRepository};
use crate::repo::comment_repo::{CommentRecord, SqliteCommentRepository};
use crate::repo::question_repo::{QuestionRecord, SqliteQuestionRepository};
use crate::repo::subscription_repo::SqliteSubscriptionRepository;
use crate::repo::user_repo::{ProfileRecord, SqliteUserRepository};
use crate::repo::vote_repo::{SqliteVoteRepository, VoteRepository};
use crate::repo::RepoError;
use crate::service::answer_service::{AnswerService, AnswerServiceError};
use crate::service::comment_service::CommentService;
use crate::service::profile_service::{ProfileService, ProfileServiceError};
use crate::service::question_service::{QuestionFeedPage, QuestionService, QuestionServiceError};
use crate::service::subscription_service::SubscriptionService;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Rows shown in the home page side panels.
pub const HOME_PANEL_LIMIT: u32 = 5;
/// Rows per list on the user detail overview tab.
pub const USER_DETAIL_PREVIEW_LIMIT: u32 = 5;

#[derive(Debug)]
pub enum PageError {
    QuestionNotFound(QuestionId),
    UserNotFound(String),
    Question(QuestionServiceError),
    Answer(AnswerServiceError),
    Repo(RepoError),
}

impl Display for PageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::QuestionNotFound(id) => write!(f, "question not found: {id}"),
            Self::UserNotFound(name) => write!(f, "user not found: `{name}`"),
            Self::Question(err) => write!(f, "{err}"),
            Self::Answer(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Question(err) => Some(err),
            Self::Answer(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for PageError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<QuestionServiceError> for PageError {
    fn from(value: QuestionServiceError) -> Self {
        match value {
            QuestionServiceError::QuestionNotFound(id) => Self::QuestionNotFound(id),
            other => Self::Question(other),
        }
    }
}

impl From<AnswerServiceError> for PageError {
    fn from(value: AnswerServiceError) -> Self {
        match value {
            AnswerServiceError::QuestionNotFound(id) => Self::QuestionNotFound(id),
            other => Self::Answer(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomePage {
    pub feed: QuestionFeedPage,
    pub last_answers: Vec<AnswerRecord>,
    pub top_users: Vec<ProfileRecord>,
}

/// Answer with its comments and the viewer's vote state on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerView {
    pub answer: AnswerRecord,
    /// Oldest first.
    pub comments: Vec<CommentRecord>,
    /// `None` for anonymous viewers.
    pub viewer_vote: Option<Vote>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDetail {
    pub question: QuestionRecord,
    /// Hyphenated title for building the question URL.
    pub slug: String,
    /// Accepted answer first.
    pub answers: Vec<AnswerView>,
    /// `None` for anonymous viewers.
    pub viewer_vote: Option<Vote>,
    pub can_accept_answers: bool,
    pub viewer_subscribed: bool,
}

/// Tab selector of the user detail page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserDetailTab {
    /// Top 5 questions and top 5 answers.
    Overview,
    Questions,
    Answers,
}

impl UserDetailTab {
    /// Maps the `tab` query value; missing or unknown values mean `Overview`.
    pub fn from_query(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("questions") => Self::Questions,
            Some("answers") => Self::Answers,
            _ => Self::Overview,
        }
    }

    fn list_limit(self) -> Option<u32> {
        match self {
            Self::Overview => Some(USER_DETAIL_PREVIEW_LIMIT),
            Self::Questions | Self::Answers => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDetail {
    pub user: User,
    pub profile: ProfileRecord,
    pub tab: UserDetailTab,
    /// Highest score first.
    pub questions: Vec<QuestionRecord>,
    /// Highest score first.
    pub answers: Vec<AnswerRecord>,
}

/// Assembles the home page: feed page, latest answers and top users.
pub fn home_page(
    conn: &mut Connection,
    sort: Option<&str>,
    page: u32,
    page_size: Option<u32>,
) -> Result<HomePage, PageError> {
    let feed = {
        let service = QuestionService::new(SqliteQuestionRepository::try_new(conn)?);
        service.home_feed(sort, page, page_size)?
    };
    let last_answers = {
        let service = AnswerService::new(SqliteAnswerRepository::try_new(conn)?);
        service.latest_answers(HOME_PANEL_LIMIT)?
    };
    let top_users = {
        let service = ProfileService::new(SqliteUserRepository::try_new(conn)?);
        service.top_users(HOME_PANEL_LIMIT)?
    };

    Ok(HomePage {
        feed,
        last_answers,
        top_users,
    })
}

/// Assembles a question detail page and counts one view.
pub fn question_detail(
    conn: &mut Connection,
    id: QuestionId,
    viewer: Option<UserId>,
) -> Result<QuestionDetail, PageError> {
    let question = {
        let service = QuestionService::new(SqliteQuestionRepository::try_new(conn)?);
        service.view_question(id)?
    };
    let answers = {
        let service = AnswerService::new(SqliteAnswerRepository::try_new(conn)?);
        service.answers_for_question(id)?
    };
    let slug = question.to_question().title_as_hyphen();

    let comments = CommentService::new(SqliteCommentRepository::try_new(conn)?);
    let mut answer_views = Vec::with_capacity(answers.len());
    for answer in answers {
        answer_views.push(AnswerView {
            comments: comments.comments_for_answer(answer.uuid)?,
            answer,
            viewer_vote: None,
        });
    }

    let Some(viewer) = viewer else {
        return Ok(QuestionDetail {
            question,
            slug,
            answers: answer_views,
            viewer_vote: None,
            can_accept_answers: false,
            viewer_subscribed: false,
        });
    };

    let votes = SqliteVoteRepository::try_new(conn)?;
    let viewer_vote = votes.get_vote_or_unsaved_blank_vote(viewer, VoteTarget::Question(id))?;
    for view in &mut answer_views {
        let target = VoteTarget::Answer(view.answer.uuid);
        view.viewer_vote = Some(votes.get_vote_or_unsaved_blank_vote(viewer, target)?);
    }

    let viewer_subscribed = {
        let service = SubscriptionService::new(SqliteSubscriptionRepository::try_new(conn)?);
        service.is_subscribed(viewer, id)?
    };

    Ok(QuestionDetail {
        can_accept_answers: question.to_question().can_accept_answers(viewer),
        question,
        slug,
        answers: answer_views,
        viewer_vote: Some(viewer_vote),
        viewer_subscribed,
    })
}

/// Newly posted answer plus the users to notify about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedAnswer {
    pub answer: AnswerRecord,
    /// Question subscribers other than the answer author.
    pub recipients: Vec<UserId>,
}

/// Posts an answer and resolves the new-answer notification recipients.
///
/// Delivery of the notifications is left to the caller.
pub fn submit_answer(
    conn: &mut Connection,
    owner: UserId,
    question: QuestionId,
    body: impl Into<String>,
) -> Result<PostedAnswer, PageError> {
    let answer = {
        let mut service = AnswerService::new(SqliteAnswerRepository::try_new(conn)?);
        service.post_answer(owner, question, body)?
    };
    let recipients = {
        let service = SubscriptionService::new(SqliteSubscriptionRepository::try_new(conn)?);
        service.new_answer_recipients(question, owner)?
    };

    Ok(PostedAnswer { answer, recipients })
}

/// Assembles a user detail page; `tab` is the raw `tab` query value.
pub fn user_detail(
    conn: &mut Connection,
    username: &str,
    tab: Option<&str>,
) -> Result<UserDetail, PageError> {
    let tab = UserDetailTab::from_query(tab);
    let (user, profile) = {
        let service = ProfileService::new(SqliteUserRepository::try_new(conn)?);
        let user = service
            .find_by_username(username)?
            .ok_or_else(|| PageError::UserNotFound(username.to_string()))?;
        let profile = service.profile(user.uuid).map_err(|err| match err {
            ProfileServiceError::Repo(err) => PageError::Repo(err),
            _ => PageError::UserNotFound(username.to_string()),
        })?;
        (user, profile)
    };
    let questions = {
        let service = QuestionService::new(SqliteQuestionRepository::try_new(conn)?);
        service.user_questions(user.uuid, tab.list_limit())?
    };
    let answers = {
        let service = AnswerService::new(SqliteAnswerRepository::try_new(conn)?);
        service.user_answers(user.uuid, tab.list_limit())?
    };

    Ok(UserDetail {
        user,
        profile,
        tab,
        questions,
        answers,
    })
}
