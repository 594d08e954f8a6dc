//! Question subscription repository.
//!
//! Subscriptions only record who follows a question; delivering notifications
//! happens outside the core.

use crate::model::question::QuestionId;
use crate::model::user::UserId;
use crate::repo::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection};

/// Repository interface for `(user, question)` subscriptions.
pub trait SubscriptionRepository {
    /// Returns `true` when a new subscription was stored, `false` when it
    /// already existed.
    fn subscribe(&self, user: UserId, question: QuestionId) -> RepoResult<bool>;
    /// Returns `true` when a subscription was removed.
    fn unsubscribe(&self, user: UserId, question: QuestionId) -> RepoResult<bool>;
    fn is_subscribed(&self, user: UserId, question: QuestionId) -> RepoResult<bool>;
    /// Subscribers ordered by subscription time.
    fn list_subscribers(&self, question: QuestionId) -> RepoResult<Vec<UserId>>;
}

pub struct SqliteSubscriptionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSubscriptionRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["question_subscriptions", "questions"])?;
        Ok(Self { conn })
    }

    fn ensure_question_exists(&self, question: QuestionId) -> RepoResult<()> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM questions WHERE uuid = ?1);",
            [question.to_string()],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::NotFound {
                entity: "question",
                id: question,
            });
        }
        Ok(())
    }
}

impl SubscriptionRepository for SqliteSubscriptionRepository<'_> {
    fn subscribe(&self, user: UserId, question: QuestionId) -> RepoResult<bool> {
        self.ensure_question_exists(question)?;
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO question_subscriptions (user_uuid, question_uuid)
             VALUES (?1, ?2);",
            params![user.to_string(), question.to_string()],
        )?;
        Ok(inserted == 1)
    }

    fn unsubscribe(&self, user: UserId, question: QuestionId) -> RepoResult<bool> {
        let removed = self.conn.execute(
            "DELETE FROM question_subscriptions
             WHERE user_uuid = ?1 AND question_uuid = ?2;",
            params![user.to_string(), question.to_string()],
        )?;
        Ok(removed == 1)
    }

    fn is_subscribed(&self, user: UserId, question: QuestionId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM question_subscriptions
                WHERE user_uuid = ?1 AND question_uuid = ?2
            );",
            params![user.to_string(), question.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn list_subscribers(&self, question: QuestionId) -> RepoResult<Vec<UserId>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_uuid
             FROM question_subscriptions
             WHERE question_uuid = ?1
             ORDER BY created_at ASC, user_uuid ASC;",
        )?;
        let mut rows = stmt.query([question.to_string()])?;
        let mut subscribers = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            subscribers.push(parse_uuid(&value, "question_subscriptions.user_uuid")?);
        }
        Ok(subscribers)
    }
}
