//! User/profile repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist users; profiles are created by the store on user insert.
//! - Aggregate profile score from votes on the user's answers.
//!
//! # Invariants
//! - Every user has exactly one profile row.
//! - Profile score counts answer votes only; question votes never count.

use crate::model::user::{User, UserId};
use crate::repo::{
    bool_to_int, ensure_connection_ready, invalid_row, map_unique_violation, parse_bool, parse_uuid,
    RepoError, RepoResult,
};
use rusqlite::{params, Connection, Row};
use serde::Serialize;

const USER_SELECT_SQL: &str = "SELECT uuid, username, email, is_active FROM users";

const PROFILE_SELECT_SQL: &str = "SELECT
    p.user_uuid AS user_uuid,
    u.username AS username,
    p.email_confirmed AS email_confirmed,
    COALESCE((
        SELECT SUM(av.value)
        FROM answer_votes av
        INNER JOIN answers a ON a.uuid = av.answer_uuid
        WHERE a.user_uuid = p.user_uuid
    ), 0) AS score
FROM profiles p
INNER JOIN users u ON u.uuid = p.user_uuid";

/// Profile read model annotated with the user's answer score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileRecord {
    pub user: UserId,
    pub username: String,
    pub email_confirmed: bool,
    pub score: i64,
}

/// Repository interface for users and profiles.
pub trait UserRepository {
    /// Inserts a user; fails with `DuplicateUsername` on a taken name.
    fn create_user(&self, user: &User) -> RepoResult<UserId>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    /// Case-insensitive lookup.
    fn get_user_by_username(&self, username: &str) -> RepoResult<Option<User>>;
    /// Marks the user active and the profile email as confirmed.
    fn activate_user(&self, id: UserId) -> RepoResult<()>;
    fn get_profile(&self, id: UserId) -> RepoResult<Option<ProfileRecord>>;
    /// Profiles ordered by score descending, then username.
    fn top_profiles(&self, limit: u32) -> RepoResult<Vec<ProfileRecord>>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["users", "profiles"])?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &User) -> RepoResult<UserId> {
        user.validate()?;

        self.conn
            .execute(
                "INSERT INTO users (uuid, username, email, is_active)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    user.uuid.to_string(),
                    user.username.as_str(),
                    user.email.as_str(),
                    bool_to_int(user.is_active),
                ],
            )
            .map_err(|err| {
                map_unique_violation(err, || RepoError::DuplicateUsername(user.username.clone()))
            })?;
        Ok(user.uuid)
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }

    fn get_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let mut stmt = self.conn.prepare(&format!(
            "{USER_SELECT_SQL} WHERE username = ?1 COLLATE NOCASE;"
        ))?;
        let mut rows = stmt.query([username.trim()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }

    fn activate_user(&self, id: UserId) -> RepoResult<()> {
        let user_uuid = id.to_string();
        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE users SET is_active = 1 WHERE uuid = ?1;",
            [user_uuid.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "user", id });
        }
        tx.execute(
            "UPDATE profiles SET email_confirmed = 1 WHERE user_uuid = ?1;",
            [user_uuid.as_str()],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn get_profile(&self, id: UserId) -> RepoResult<Option<ProfileRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PROFILE_SELECT_SQL} WHERE p.user_uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_profile_row(row)?));
        }
        Ok(None)
    }

    fn top_profiles(&self, limit: u32) -> RepoResult<Vec<ProfileRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PROFILE_SELECT_SQL}
             ORDER BY score DESC, u.username COLLATE NOCASE ASC
             LIMIT ?1;"
        ))?;
        let mut rows = stmt.query([i64::from(limit)])?;
        let mut profiles = Vec::new();
        while let Some(row) = rows.next()? {
            profiles.push(parse_profile_row(row)?);
        }
        Ok(profiles)
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let uuid_text: String = row.get("uuid")?;
    let user = User {
        uuid: parse_uuid(&uuid_text, "users.uuid")?,
        username: row.get("username")?,
        email: row.get("email")?,
        is_active: parse_bool(row.get("is_active")?, "users.is_active")?,
    };
    user.validate().map_err(|err| invalid_row(err, "users"))?;
    Ok(user)
}

fn parse_profile_row(row: &Row<'_>) -> RepoResult<ProfileRecord> {
    let user_text: String = row.get("user_uuid")?;
    Ok(ProfileRecord {
        user: parse_uuid(&user_text, "profiles.user_uuid")?,
        username: row.get("username")?,
        email_confirmed: parse_bool(row.get("email_confirmed")?, "profiles.email_confirmed")?,
        score: row.get("score")?,
    })
}
