//! Answer repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist answers and aggregate their vote scores in SQL.
//! - Enforce the single-accepted-answer rule on every write.
//!
//! # Invariants
//! - Saving an accepted answer first un-accepts any other accepted answer of
//!   the same question; both writes share one immediate transaction.
//! - Answer lists are ordered accepted first, then oldest first.
//! - `score` is `SUM(answer_votes.value)`, 0 when there are no votes.

use crate::model::answer::{Answer, AnswerId};
use crate::model::question::QuestionId;
use crate::model::user::UserId;
use crate::model::Publishable;
use crate::repo::{
    bool_to_int, ensure_connection_ready, invalid_row, parse_bool, parse_uuid, RepoError,
    RepoResult,
};
use log::info;
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, Transaction,
    TransactionBehavior,
};
use serde::Serialize;

const ANSWER_SELECT_SQL: &str = "SELECT
    a.uuid AS uuid,
    a.question_uuid AS question_uuid,
    a.user_uuid AS user_uuid,
    a.body AS body,
    a.accepted AS accepted,
    a.created_at AS created_at,
    a.modified_at AS modified_at,
    COALESCE((
        SELECT SUM(av.value)
        FROM answer_votes av
        WHERE av.answer_uuid = a.uuid
    ), 0) AS score
FROM answers a";

/// Answer read model annotated with its aggregated score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerRecord {
    pub uuid: AnswerId,
    pub question: QuestionId,
    pub owner: UserId,
    pub body: String,
    pub accepted: bool,
    pub created_at: i64,
    pub modified_at: i64,
    pub score: i64,
}

impl AnswerRecord {
    pub fn to_answer(&self) -> Answer {
        Answer {
            uuid: self.uuid,
            question: self.question,
            owner: self.owner,
            body: self.body.clone(),
            accepted: self.accepted,
        }
    }
}

impl Publishable for AnswerRecord {
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

/// Ordering for answer lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AnswerOrder {
    /// Accepted answer first, then oldest first.
    #[default]
    AcceptedFirst,
    /// Highest score first.
    TopScore,
    /// Most recently created first.
    Newest,
}

impl AnswerOrder {
    fn order_by_sql(self) -> &'static str {
        match self {
            Self::AcceptedFirst => " ORDER BY a.accepted DESC, a.created_at ASC, a.uuid ASC",
            Self::TopScore => " ORDER BY score DESC, a.created_at DESC, a.uuid ASC",
            Self::Newest => " ORDER BY a.created_at DESC, a.uuid ASC",
        }
    }
}

/// Query options for listing answers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerListQuery {
    pub question: Option<QuestionId>,
    pub owner: Option<UserId>,
    pub order: AnswerOrder,
    /// `None` returns every matching row.
    pub limit: Option<u32>,
}

/// Repository interface for answers.
pub trait AnswerRepository {
    /// Inserts a new answer; runs the accepted-answer enforcer when needed.
    fn create_answer(&mut self, answer: &Answer) -> RepoResult<AnswerId>;
    /// Persists body/accepted changes of an existing answer.
    ///
    /// When `answer.accepted` is set, any other accepted answer of the same
    /// question is flipped to not accepted and persisted first.
    fn save_answer(&mut self, answer: &Answer) -> RepoResult<()>;
    fn get_answer(&self, id: AnswerId) -> RepoResult<Option<AnswerRecord>>;
    fn list_answers(&self, query: &AnswerListQuery) -> RepoResult<Vec<AnswerRecord>>;
    /// Currently accepted answer of a question, if any.
    fn accepted_answer(&self, question: QuestionId) -> RepoResult<Option<AnswerId>>;
    /// Sum of votes on one answer (0 when none).
    fn answer_score(&self, id: AnswerId) -> RepoResult<i64>;
    /// Owner of a question; used for acceptance permission checks.
    fn question_owner(&self, question: QuestionId) -> RepoResult<Option<UserId>>;
}

/// SQLite-backed answer repository.
pub struct SqliteAnswerRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteAnswerRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["questions", "answers", "answer_votes"])?;
        Ok(Self { conn })
    }
}

impl AnswerRepository for SqliteAnswerRepository<'_> {
    fn create_answer(&mut self, answer: &Answer) -> RepoResult<AnswerId> {
        answer.validate()?;
        let answer_uuid = answer.uuid.to_string();
        let question_uuid = answer.question.to_string();

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let exists: i64 = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM questions WHERE uuid = ?1);",
            [question_uuid.as_str()],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::NotFound {
                entity: "question",
                id: answer.question,
            });
        }

        if answer.accepted {
            unaccept_others_in_tx(&tx, &question_uuid, &answer_uuid)?;
        }
        tx.execute(
            "INSERT INTO answers (uuid, question_uuid, user_uuid, body, accepted)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                answer_uuid.as_str(),
                question_uuid.as_str(),
                answer.owner.to_string(),
                answer.body.as_str(),
                bool_to_int(answer.accepted),
            ],
        )?;
        tx.commit()?;
        Ok(answer.uuid)
    }

    fn save_answer(&mut self, answer: &Answer) -> RepoResult<()> {
        answer.validate()?;
        let answer_uuid = answer.uuid.to_string();

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        // The stored question wins; an answer never moves between questions.
        let question_uuid: String = tx
            .query_row(
                "SELECT question_uuid FROM answers WHERE uuid = ?1;",
                [answer_uuid.as_str()],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(RepoError::NotFound {
                entity: "answer",
                id: answer.uuid,
            })?;

        if answer.accepted {
            unaccept_others_in_tx(&tx, &question_uuid, &answer_uuid)?;
        }
        tx.execute(
            "UPDATE answers
             SET
                body = ?2,
                accepted = ?3,
                modified_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![
                answer_uuid.as_str(),
                answer.body.as_str(),
                bool_to_int(answer.accepted),
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn get_answer(&self, id: AnswerId) -> RepoResult<Option<AnswerRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ANSWER_SELECT_SQL} WHERE a.uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_answer_row(row)?));
        }
        Ok(None)
    }

    fn list_answers(&self, query: &AnswerListQuery) -> RepoResult<Vec<AnswerRecord>> {
        let mut sql = format!("{ANSWER_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(question) = query.question {
            sql.push_str(" AND a.question_uuid = ?");
            bind_values.push(Value::Text(question.to_string()));
        }
        if let Some(owner) = query.owner {
            sql.push_str(" AND a.user_uuid = ?");
            bind_values.push(Value::Text(owner.to_string()));
        }

        sql.push_str(query.order.order_by_sql());
        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut answers = Vec::new();
        while let Some(row) = rows.next()? {
            answers.push(parse_answer_row(row)?);
        }
        Ok(answers)
    }

    fn accepted_answer(&self, question: QuestionId) -> RepoResult<Option<AnswerId>> {
        let uuid: Option<String> = self
            .conn
            .query_row(
                "SELECT uuid FROM answers WHERE question_uuid = ?1 AND accepted = 1;",
                [question.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        uuid.map(|value| parse_uuid(&value, "answers.uuid"))
            .transpose()
    }

    fn answer_score(&self, id: AnswerId) -> RepoResult<i64> {
        let score = self.conn.query_row(
            "SELECT COALESCE(SUM(value), 0)
             FROM answer_votes
             WHERE answer_uuid = ?1;",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(score)
    }

    fn question_owner(&self, question: QuestionId) -> RepoResult<Option<UserId>> {
        let owner: Option<String> = self
            .conn
            .query_row(
                "SELECT user_uuid FROM questions WHERE uuid = ?1;",
                [question.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        owner
            .map(|value| parse_uuid(&value, "questions.user_uuid"))
            .transpose()
    }
}

/// Flips a previously accepted answer of the question to not accepted.
///
/// No-op when there is none, or when the accepted one is `answer_uuid` itself.
fn unaccept_others_in_tx(
    tx: &Transaction<'_>,
    question_uuid: &str,
    answer_uuid: &str,
) -> RepoResult<()> {
    let previous: Option<String> = tx
        .query_row(
            "SELECT uuid FROM answers WHERE question_uuid = ?1 AND accepted = 1;",
            [question_uuid],
            |row| row.get(0),
        )
        .optional()?;

    let Some(previous) = previous else {
        return Ok(());
    };
    if previous == answer_uuid {
        return Ok(());
    }

    tx.execute(
        "UPDATE answers
         SET
            accepted = 0,
            modified_at = (strftime('%s', 'now') * 1000)
         WHERE uuid = ?1;",
        [previous.as_str()],
    )?;
    info!("event=answer_unaccept module=repo status=ok reason=replaced_by_new_accept");
    Ok(())
}

fn parse_answer_row(row: &Row<'_>) -> RepoResult<AnswerRecord> {
    let uuid_text: String = row.get("uuid")?;
    let question_text: String = row.get("question_uuid")?;
    let owner_text: String = row.get("user_uuid")?;
    let record = AnswerRecord {
        uuid: parse_uuid(&uuid_text, "answers.uuid")?,
        question: parse_uuid(&question_text, "answers.question_uuid")?,
        owner: parse_uuid(&owner_text, "answers.user_uuid")?,
        body: row.get("body")?,
        accepted: parse_bool(row.get("accepted")?, "answers.accepted")?,
        created_at: row.get("created_at")?,
        modified_at: row.get("modified_at")?,
        score: row.get("score")?,
    };
    record
        .to_answer()
        .validate()
        .map_err(|err| invalid_row(err, "answers"))?;
    Ok(record)
}
