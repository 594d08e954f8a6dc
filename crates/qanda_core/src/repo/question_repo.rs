//! Question/tag repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist questions and their tag links.
//! - Aggregate question score and answer-aggregate score in SQL.
//! - Serve the home feed sort modes.
//!
//! # Invariants
//! - `score` is `SUM(question_votes.value)`, 0 when there are no votes.
//! - `answer_score` is the sum of all vote values on the question's answers.
//! - Tag links are replaced as a whole inside one transaction.
//! - Tag names are stored lowercase and are unique.

use crate::model::question::{Question, QuestionId};
use crate::model::tag::{normalize_tags, Tag};
use crate::model::user::UserId;
use crate::model::Publishable;
use crate::repo::{ensure_connection_ready, invalid_row, parse_uuid, RepoError, RepoResult};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, Transaction,
    TransactionBehavior,
};
use serde::Serialize;

const QUESTION_SELECT_SQL: &str = "SELECT
    q.uuid AS uuid,
    q.user_uuid AS user_uuid,
    q.title AS title,
    q.body AS body,
    q.viewed AS viewed,
    q.created_at AS created_at,
    q.modified_at AS modified_at,
    COALESCE((
        SELECT SUM(qv.value)
        FROM question_votes qv
        WHERE qv.question_uuid = q.uuid
    ), 0) AS score,
    COALESCE((
        SELECT SUM(av.value)
        FROM answer_votes av
        INNER JOIN answers a ON a.uuid = av.answer_uuid
        WHERE a.question_uuid = q.uuid
    ), 0) AS answer_score
FROM questions q";

/// Question read model annotated with aggregated scores and tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionRecord {
    pub uuid: QuestionId,
    pub owner: UserId,
    pub title: String,
    pub body: String,
    pub viewed: u32,
    pub created_at: i64,
    pub modified_at: i64,
    /// Sum of votes on the question itself.
    pub score: i64,
    /// Sum of votes on all answers of the question.
    pub answer_score: i64,
    /// Sorted lowercase tag names.
    pub tags: Vec<String>,
}

impl QuestionRecord {
    /// Projects the writable part of the record back into a model.
    pub fn to_question(&self) -> Question {
        Question {
            uuid: self.uuid,
            owner: self.owner,
            title: self.title.clone(),
            body: self.body.clone(),
        }
    }
}

impl Publishable for QuestionRecord {
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

/// Feed ordering modes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionSort {
    /// Highest question score first.
    #[default]
    Top,
    /// Highest answer-aggregate score first.
    Answered,
    /// Most recently created first.
    Newest,
}

impl QuestionSort {
    /// Maps the `sort` query value of the home feed; unknown values mean `Top`.
    pub fn from_query(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("answered") => Self::Answered,
            Some("newest") => Self::Newest,
            _ => Self::Top,
        }
    }

    fn order_by_sql(self) -> &'static str {
        match self {
            Self::Top => " ORDER BY score DESC, q.created_at DESC, q.uuid ASC",
            Self::Answered => " ORDER BY answer_score DESC, q.created_at DESC, q.uuid ASC",
            Self::Newest => " ORDER BY q.created_at DESC, q.uuid ASC",
        }
    }
}

/// Query options for listing questions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionListQuery {
    pub sort: QuestionSort,
    /// Restrict to questions authored by this user.
    pub owner: Option<UserId>,
    /// Single-tag exact match filter (case-insensitive).
    pub tag: Option<String>,
    /// `None` returns every matching row.
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for questions and tags.
pub trait QuestionRepository {
    /// Inserts a question and links `tags` (get-or-create) atomically.
    fn create_question(&mut self, question: &Question, tags: &[String]) -> RepoResult<QuestionId>;
    /// Replaces title/body and refreshes `modified_at`.
    fn update_question(&self, question: &Question) -> RepoResult<()>;
    fn get_question(&self, id: QuestionId) -> RepoResult<Option<QuestionRecord>>;
    fn list_questions(&self, query: &QuestionListQuery) -> RepoResult<Vec<QuestionRecord>>;
    /// Bumps the view counter and returns the new value.
    fn increment_viewed(&self, id: QuestionId) -> RepoResult<u32>;
    /// Replaces the whole tag set of a question in one transaction.
    fn set_question_tags(&mut self, id: QuestionId, tags: &[String]) -> RepoResult<()>;
    /// Returns all known tags sorted by name.
    fn list_tags(&self) -> RepoResult<Vec<Tag>>;
    /// Sum of votes on the question (0 when none).
    fn question_score(&self, id: QuestionId) -> RepoResult<i64>;
    /// Sum of votes on the question's answers (0 when none).
    fn answer_aggregate_score(&self, id: QuestionId) -> RepoResult<i64>;
}

/// SQLite-backed question repository.
pub struct SqliteQuestionRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteQuestionRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["questions", "tags", "question_tags"])?;
        Ok(Self { conn })
    }
}

impl QuestionRepository for SqliteQuestionRepository<'_> {
    fn create_question(&mut self, question: &Question, tags: &[String]) -> RepoResult<QuestionId> {
        question.validate()?;
        let tags = normalize_tags(tags)?;
        let question_uuid = question.uuid.to_string();

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO questions (uuid, user_uuid, title, body)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                question_uuid.as_str(),
                question.owner.to_string(),
                question.title.as_str(),
                question.body.as_str(),
            ],
        )?;
        link_tags_in_tx(&tx, question_uuid.as_str(), &tags)?;
        tx.commit()?;

        debug!(
            "event=question_create module=repo status=ok tag_count={}",
            tags.len()
        );
        Ok(question.uuid)
    }

    fn update_question(&self, question: &Question) -> RepoResult<()> {
        question.validate()?;

        let changed = self.conn.execute(
            "UPDATE questions
             SET
                title = ?2,
                body = ?3,
                modified_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![
                question.uuid.to_string(),
                question.title.as_str(),
                question.body.as_str(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "question",
                id: question.uuid,
            });
        }
        Ok(())
    }

    fn get_question(&self, id: QuestionId) -> RepoResult<Option<QuestionRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{QUESTION_SELECT_SQL} WHERE q.uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_question_row(self.conn, row)?));
        }
        Ok(None)
    }

    fn list_questions(&self, query: &QuestionListQuery) -> RepoResult<Vec<QuestionRecord>> {
        let mut sql = format!("{QUESTION_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(owner) = query.owner {
            sql.push_str(" AND q.user_uuid = ?");
            bind_values.push(Value::Text(owner.to_string()));
        }

        if let Some(tag) = query.tag.as_ref() {
            sql.push_str(
                " AND EXISTS (
                    SELECT 1
                    FROM question_tags qt
                    INNER JOIN tags t ON t.id = qt.tag_id
                    WHERE qt.question_uuid = q.uuid
                      AND t.name = ? COLLATE NOCASE
                )",
            );
            bind_values.push(Value::Text(tag.trim().to_string()));
        }

        sql.push_str(query.sort.order_by_sql());

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut questions = Vec::new();
        while let Some(row) = rows.next()? {
            questions.push(parse_question_row(self.conn, row)?);
        }
        Ok(questions)
    }

    fn increment_viewed(&self, id: QuestionId) -> RepoResult<u32> {
        self.conn
            .query_row(
                "UPDATE questions
                 SET viewed = viewed + 1
                 WHERE uuid = ?1
                 RETURNING viewed;",
                [id.to_string()],
                |row| row.get::<_, u32>(0),
            )
            .optional()?
            .ok_or(RepoError::NotFound {
                entity: "question",
                id,
            })
    }

    fn set_question_tags(&mut self, id: QuestionId, tags: &[String]) -> RepoResult<()> {
        let tags = normalize_tags(tags)?;
        let question_uuid = id.to_string();

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
                id,
            });
        }

        tx.execute(
            "DELETE FROM question_tags WHERE question_uuid = ?1;",
            [question_uuid.as_str()],
        )?;
        link_tags_in_tx(&tx, question_uuid.as_str(), &tags)?;
        tx.execute(
            "UPDATE questions
             SET modified_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            [question_uuid.as_str()],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn list_tags(&self) -> RepoResult<Vec<Tag>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM tags ORDER BY name COLLATE NOCASE ASC;")?;
        let mut rows = stmt.query([])?;
        let mut tags = Vec::new();
        while let Some(row) = rows.next()? {
            let name: String = row.get("name")?;
            tags.push(Tag {
                id: row.get("id")?,
                name: name.to_lowercase(),
            });
        }
        Ok(tags)
    }

    fn question_score(&self, id: QuestionId) -> RepoResult<i64> {
        let score = self.conn.query_row(
            "SELECT COALESCE(SUM(value), 0)
             FROM question_votes
             WHERE question_uuid = ?1;",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(score)
    }

    fn answer_aggregate_score(&self, id: QuestionId) -> RepoResult<i64> {
        let score = self.conn.query_row(
            "SELECT COALESCE(SUM(av.value), 0)
             FROM answer_votes av
             INNER JOIN answers a ON a.uuid = av.answer_uuid
             WHERE a.question_uuid = ?1;",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(score)
    }
}

fn link_tags_in_tx(tx: &Transaction<'_>, question_uuid: &str, tags: &[String]) -> RepoResult<()> {
    for tag in tags {
        tx.execute(
            "INSERT OR IGNORE INTO tags (name) VALUES (?1);",
            [tag.as_str()],
        )?;
        tx.execute(
            "INSERT OR IGNORE INTO question_tags (question_uuid, tag_id)
             SELECT ?1, id
             FROM tags
             WHERE name = ?2 COLLATE NOCASE;",
            params![question_uuid, tag.as_str()],
        )?;
    }
    Ok(())
}

fn load_tags_for_question(conn: &Connection, question_uuid: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT t.name
         FROM question_tags qt
         INNER JOIN tags t ON t.id = qt.tag_id
         WHERE qt.question_uuid = ?1
         ORDER BY t.name COLLATE NOCASE ASC;",
    )?;
    let mut rows = stmt.query([question_uuid])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        tags.push(value.to_lowercase());
    }
    Ok(tags)
}

fn parse_question_row(conn: &Connection, row: &Row<'_>) -> RepoResult<QuestionRecord> {
    let uuid_text: String = row.get("uuid")?;
    let owner_text: String = row.get("user_uuid")?;
    let record = QuestionRecord {
        uuid: parse_uuid(&uuid_text, "questions.uuid")?,
        owner: parse_uuid(&owner_text, "questions.user_uuid")?,
        title: row.get("title")?,
        body: row.get("body")?,
        viewed: row.get("viewed")?,
        created_at: row.get("created_at")?,
        modified_at: row.get("modified_at")?,
        score: row.get("score")?,
        answer_score: row.get("answer_score")?,
        tags: load_tags_for_question(conn, &uuid_text)?,
    };
    record
        .to_question()
        .validate()
        .map_err(|err| invalid_row(err, "questions"))?;
    Ok(record)
}
