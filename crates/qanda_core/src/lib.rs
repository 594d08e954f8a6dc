//! Core domain logic for the Q&A board.
//! This crate is the single source of truth for scoring, voting and
//! answer-acceptance invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::answer::{Answer, AnswerId, AnswerValidationError};
pub use model::comment::{Comment, CommentId, CommentValidationError};
pub use model::question::{Question, QuestionId, QuestionValidationError};
pub use model::tag::{parse_custom_tags, Tag, TagValidationError};
pub use model::user::{User, UserId, UserValidationError};
pub use model::vote::{Vote, VoteId, VoteTarget, VoteValue};
pub use model::Publishable;
pub use repo::answer_repo::{AnswerRecord, AnswerRepository, SqliteAnswerRepository};
pub use repo::comment_repo::{CommentRecord, CommentRepository, SqliteCommentRepository};
pub use repo::question_repo::{
    QuestionListQuery, QuestionRecord, QuestionRepository, QuestionSort, SqliteQuestionRepository,
};
pub use repo::subscription_repo::{SqliteSubscriptionRepository, SubscriptionRepository};
pub use repo::user_repo::{ProfileRecord, SqliteUserRepository, UserRepository};
pub use repo::vote_repo::{SqliteVoteRepository, VoteRepository};
pub use repo::{RepoError, RepoResult};
pub use service::answer_service::{AnswerService, AnswerServiceError};
pub use service::comment_service::{CommentService, CommentServiceError};
pub use service::page_service::{
    home_page, question_detail, submit_answer, user_detail, HomePage, PageError, PostedAnswer,
    QuestionDetail, UserDetail, UserDetailTab,
};
pub use service::profile_service::{ProfileService, ProfileServiceError};
pub use service::question_service::{
    AskQuestionForm, QuestionFeedPage, QuestionService, QuestionServiceError,
};
pub use service::subscription_service::SubscriptionService;
pub use service::vote_service::{VoteService, VoteServiceError};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
