//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Keep SQL (including score aggregation) inside the persistence boundary.
//!
//! # Invariants
//! - Write paths validate models before SQL mutations.
//! - Scores are computed with `COALESCE(SUM(value), 0)` in SQL; vote rows are
//!   never loaded to be summed in Rust.
//! - Repository APIs return semantic errors (`NotFound`, `DuplicateVote`) in
//!   addition to DB transport errors.

pub mod answer_repo;
pub mod comment_repo;
pub mod question_repo;
pub mod subscription_repo;
pub mod user_repo;
pub mod vote_repo;

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::answer::AnswerValidationError;
use crate::model::comment::CommentValidationError;
use crate::model::question::QuestionValidationError;
use crate::model::tag::TagValidationError;
use crate::model::user::{UserId, UserValidationError};
use crate::model::vote::VoteTarget;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Default page size for list queries.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;
/// Upper bound applied to caller-provided page sizes.
pub const PAGE_LIMIT_MAX: u32 = 50;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by all SQLite repositories.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    QuestionValidation(QuestionValidationError),
    AnswerValidation(AnswerValidationError),
    CommentValidation(CommentValidationError),
    UserValidation(UserValidationError),
    TagValidation(TagValidationError),
    NotFound {
        entity: &'static str,
        id: Uuid,
    },
    /// `(user, target)` already has a vote; update it instead.
    DuplicateVote {
        user: UserId,
        target: VoteTarget,
    },
    DuplicateUsername(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    /// Persisted row cannot be converted into a valid read model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::QuestionValidation(err) => write!(f, "{err}"),
            Self::AnswerValidation(err) => write!(f, "{err}"),
            Self::CommentValidation(err) => write!(f, "{err}"),
            Self::UserValidation(err) => write!(f, "{err}"),
            Self::TagValidation(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::DuplicateVote { user, target } => {
                write!(f, "user {user} already voted on {target}")
            }
            Self::DuplicateUsername(name) => write!(f, "username already taken: `{name}`"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::QuestionValidation(err) => Some(err),
            Self::AnswerValidation(err) => Some(err),
            Self::CommentValidation(err) => Some(err),
            Self::UserValidation(err) => Some(err),
            Self::TagValidation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<QuestionValidationError> for RepoError {
    fn from(value: QuestionValidationError) -> Self {
        Self::QuestionValidation(value)
    }
}

impl From<AnswerValidationError> for RepoError {
    fn from(value: AnswerValidationError) -> Self {
        Self::AnswerValidation(value)
    }
}

impl From<CommentValidationError> for RepoError {
    fn from(value: CommentValidationError) -> Self {
        Self::CommentValidation(value)
    }
}

impl From<UserValidationError> for RepoError {
    fn from(value: UserValidationError) -> Self {
        Self::UserValidation(value)
    }
}

impl From<TagValidationError> for RepoError {
    fn from(value: TagValidationError) -> Self {
        Self::TagValidation(value)
    }
}

/// Normalizes an optional page size: default 10, capped at 50.
pub fn normalize_page_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) | None => DEFAULT_PAGE_LIMIT,
        Some(value) if value > PAGE_LIMIT_MAX => PAGE_LIMIT_MAX,
        Some(value) => value,
    }
}

/// Verifies the connection is migrated and carries the given tables.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    tables: &[&'static str],
) -> RepoResult<()> {
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let expected_version = latest_version();
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in tables {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [*table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable(*table));
        }
    }

    Ok(())
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

pub(crate) fn parse_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

/// Wraps a read-side validation failure of a stored row as `InvalidData`.
pub(crate) fn invalid_row(err: impl Display, table: &str) -> RepoError {
    RepoError::InvalidData(format!("{err} in {table} row"))
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

/// Maps a `UNIQUE` violation to a semantic error, passing other errors through.
pub(crate) fn map_unique_violation(
    err: rusqlite::Error,
    on_unique: impl FnOnce() -> RepoError,
) -> RepoError {
    let err = DbError::Sqlite(err);
    if err.is_unique_violation() {
        on_unique()
    } else {
        RepoError::Db(err)
    }
}
