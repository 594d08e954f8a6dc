//! Comment repository contracts and SQLite implementation.
//!
//! # Invariants
//! - A comment always belongs to an existing answer.
//! - Comments of an answer are listed oldest first.

use crate::model::answer::AnswerId;
use crate::model::comment::{Comment, CommentId};
use crate::model::user::UserId;
use crate::model::Publishable;
use crate::repo::{ensure_connection_ready, invalid_row, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use serde::Serialize;

const COMMENT_SELECT_SQL: &str = "SELECT
    uuid,
    answer_uuid,
    user_uuid,
    body,
    created_at,
    modified_at
FROM comments";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentRecord {
    pub uuid: CommentId,
    pub answer: AnswerId,
    pub owner: UserId,
    pub body: String,
    pub created_at: i64,
    pub modified_at: i64,
}

impl CommentRecord {
    pub fn to_comment(&self) -> Comment {
        Comment {
            uuid: self.uuid,
            answer: self.answer,
            owner: self.owner,
            body: self.body.clone(),
        }
    }
}

impl Publishable for CommentRecord {
    fn owner(&self) -> UserId {
        self.owner
    }

    fn body(&self) -> &str {
        &self.body
    }

    fn created_at(&self) -> i64 {
        self.created_at
    }

    fn modified_at(&self) -> i64 {
        self.modified_at
    }
}

pub trait CommentRepository {
    /// Inserts a comment; fails with `NotFound` when the answer is missing.
    fn create_comment(&self, comment: &Comment) -> RepoResult<CommentId>;
    fn get_comment(&self, id: CommentId) -> RepoResult<Option<CommentRecord>>;
    fn list_comments(&self, answer: AnswerId) -> RepoResult<Vec<CommentRecord>>;
}

pub struct SqliteCommentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCommentRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["answers", "comments"])?;
        Ok(Self { conn })
    }
}

impl CommentRepository for SqliteCommentRepository<'_> {
    fn create_comment(&self, comment: &Comment) -> RepoResult<CommentId> {
        comment.validate()?;
        let answer_uuid = comment.answer.to_string();

        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM answers WHERE uuid = ?1);",
            [answer_uuid.as_str()],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::NotFound {
                entity: "answer",
                id: comment.answer,
            });
        }

        self.conn.execute(
            "INSERT INTO comments (uuid, answer_uuid, user_uuid, body)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                comment.uuid.to_string(),
                answer_uuid.as_str(),
                comment.owner.to_string(),
                comment.body.as_str(),
            ],
        )?;
        Ok(comment.uuid)
    }

    fn get_comment(&self, id: CommentId) -> RepoResult<Option<CommentRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{COMMENT_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_comment_row(row)?));
        }
        Ok(None)
    }

    fn list_comments(&self, answer: AnswerId) -> RepoResult<Vec<CommentRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COMMENT_SELECT_SQL}
             WHERE answer_uuid = ?1
             ORDER BY created_at ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([answer.to_string()])?;
        let mut comments = Vec::new();
        while let Some(row) = rows.next()? {
            comments.push(parse_comment_row(row)?);
        }
        Ok(comments)
    }
}

fn parse_comment_row(row: &Row<'_>) -> RepoResult<CommentRecord> {
    let uuid_text: String = row.get("uuid")?;
    let answer_text: String = row.get("answer_uuid")?;
    let owner_text: String = row.get("user_uuid")?;
    let record = CommentRecord {
        uuid: parse_uuid(&uuid_text, "comments.uuid")?,
        answer: parse_uuid(&answer_text, "comments.answer_uuid")?,
        owner: parse_uuid(&owner_text, "comments.user_uuid")?,
        body: row.get("body")?,
        created_at: row.get("created_at")?,
        modified_at: row.get("modified_at")?,
    };
    record
        .to_comment()
        .validate()
        .map_err(|err| invalid_row(err, "comments"))?;
    Ok(record)
}
