//! Vote repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Resolve the vote of a user on a target, or hand out an unsaved blank.
//! - Insert and update votes; aggregate target scores in SQL.
//!
//! # Invariants
//! - `(user, target)` is unique; a second insert fails with `DuplicateVote`.
//! - Stored values are `+1`/`-1`; anything else read back is `InvalidData`.
//! - `voted_on` is refreshed by the store on every write.

use crate::model::user::UserId;
use crate::model::vote::{Vote, VoteId, VoteTarget, VoteValue};
use crate::repo::{
    ensure_connection_ready, map_unique_violation, parse_uuid, RepoError, RepoResult,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

/// Repository interface for question and answer votes.
pub trait VoteRepository {
    fn get_vote(&self, user: UserId, target: VoteTarget) -> RepoResult<Option<Vote>>;
    fn get_vote_by_id(&self, id: VoteId) -> RepoResult<Option<Vote>>;
    /// Inserts a new vote; fails with `DuplicateVote` when one already exists.
    fn insert_vote(&self, user: UserId, target: VoteTarget, value: VoteValue) -> RepoResult<Vote>;
    /// Changes the value of an existing vote.
    fn update_vote_value(&self, id: VoteId, value: VoteValue) -> RepoResult<Vote>;
    /// Sum of vote values on the target (0 when none).
    fn score(&self, target: VoteTarget) -> RepoResult<i64>;
    fn target_exists(&self, target: VoteTarget) -> RepoResult<bool>;

    /// Returns the stored vote, or an unsaved vote pre-filled with user and
    /// target whose value is left for the caller to choose.
    fn get_vote_or_unsaved_blank_vote(
        &self,
        user: UserId,
        target: VoteTarget,
    ) -> RepoResult<Vote> {
        Ok(self
            .get_vote(user, target)?
            .unwrap_or_else(|| Vote::blank(user, target)))
    }
}

/// SQLite-backed vote repository.
pub struct SqliteVoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteVoteRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["question_votes", "answer_votes"])?;
        Ok(Self { conn })
    }
}

/// Vote table, target column and target table for one target kind.
struct VoteTable {
    table: &'static str,
    target_column: &'static str,
    target_table: &'static str,
}

fn vote_table(target: VoteTarget) -> VoteTable {
    match target {
        VoteTarget::Question(_) => VoteTable {
            table: "question_votes",
            target_column: "question_uuid",
            target_table: "questions",
        },
        VoteTarget::Answer(_) => VoteTable {
            table: "answer_votes",
            target_column: "answer_uuid",
            target_table: "answers",
        },
    }
}

impl VoteRepository for SqliteVoteRepository<'_> {
    fn get_vote(&self, user: UserId, target: VoteTarget) -> RepoResult<Option<Vote>> {
        let layout = vote_table(target);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT uuid, user_uuid, value, voted_on
             FROM {table}
             WHERE user_uuid = ?1 AND {column} = ?2;",
            table = layout.table,
            column = layout.target_column,
        ))?;
        let mut rows = stmt.query(params![user.to_string(), target.id().to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_vote_row(row, target)?));
        }
        Ok(None)
    }

    fn get_vote_by_id(&self, id: VoteId) -> RepoResult<Option<Vote>> {
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT 'question', question_uuid FROM question_votes WHERE uuid = ?1
                 UNION ALL
                 SELECT 'answer', answer_uuid FROM answer_votes WHERE uuid = ?1;",
                [id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((kind, target_text)) = row else {
            return Ok(None);
        };

        let target = match kind.as_str() {
            "question" => VoteTarget::Question(parse_uuid(
                &target_text,
                "question_votes.question_uuid",
            )?),
            _ => VoteTarget::Answer(parse_uuid(&target_text, "answer_votes.answer_uuid")?),
        };
        let layout = vote_table(target);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT uuid, user_uuid, value, voted_on FROM {table} WHERE uuid = ?1;",
            table = layout.table,
        ))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_vote_row(row, target)?)),
            None => Ok(None),
        }
    }

    fn insert_vote(&self, user: UserId, target: VoteTarget, value: VoteValue) -> RepoResult<Vote> {
        let layout = vote_table(target);
        let id = Uuid::new_v4();
        self.conn
            .execute(
                &format!(
                    "INSERT INTO {table} (uuid, user_uuid, {column}, value)
                     VALUES (?1, ?2, ?3, ?4);",
                    table = layout.table,
                    column = layout.target_column,
                ),
                params![
                    id.to_string(),
                    user.to_string(),
                    target.id().to_string(),
                    value.as_i64(),
                ],
            )
            .map_err(|err| {
                map_unique_violation(err, || RepoError::DuplicateVote { user, target })
            })?;

        self.get_vote(user, target)?
            .ok_or(RepoError::NotFound { entity: "vote", id })
    }

    fn update_vote_value(&self, id: VoteId, value: VoteValue) -> RepoResult<Vote> {
        let vote = self
            .get_vote_by_id(id)?
            .ok_or(RepoError::NotFound { entity: "vote", id })?;
        let layout = vote_table(vote.target);
        self.conn.execute(
            &format!(
                "UPDATE {table}
                 SET
                    value = ?2,
                    voted_on = (strftime('%s', 'now') * 1000)
                 WHERE uuid = ?1;",
                table = layout.table,
            ),
            params![id.to_string(), value.as_i64()],
        )?;

        self.get_vote_by_id(id)?
            .ok_or(RepoError::NotFound { entity: "vote", id })
    }

    fn score(&self, target: VoteTarget) -> RepoResult<i64> {
        let layout = vote_table(target);
        let score = self.conn.query_row(
            &format!(
                "SELECT COALESCE(SUM(value), 0) FROM {table} WHERE {column} = ?1;",
                table = layout.table,
                column = layout.target_column,
            ),
            [target.id().to_string()],
            |row| row.get(0),
        )?;
        Ok(score)
    }

    fn target_exists(&self, target: VoteTarget) -> RepoResult<bool> {
        let layout = vote_table(target);
        let exists: i64 = self.conn.query_row(
            &format!(
                "SELECT EXISTS(SELECT 1 FROM {table} WHERE uuid = ?1);",
                table = layout.target_table,
            ),
            [target.id().to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

fn parse_vote_row(row: &Row<'_>, target: VoteTarget) -> RepoResult<Vote> {
    let uuid_text: String = row.get("uuid")?;
    let user_text: String = row.get("user_uuid")?;
    let raw_value: i64 = row.get("value")?;
    let value = VoteValue::try_from(raw_value)
        .map_err(|err| RepoError::InvalidData(format!("{err} in {} vote", target.kind())))?;

    Ok(Vote {
        id: Some(parse_uuid(&uuid_text, "votes.uuid")?),
        user: parse_uuid(&user_text, "votes.user_uuid")?,
        target,
        value: Some(value),
        voted_on: Some(row.get("voted_on")?),
    })
}
