//! Domain model for questions, answers, comments, tags, votes and users.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Own field-level validation that does not need storage access.
//!
//! # Invariants
//! - Every domain object is identified by a stable UUID.
//! - Vote values are restricted to `+1` / `-1` by construction.
//! - Derived scores are never stored on models; they are aggregated by the
//!   repository layer on read.

pub mod answer;
pub mod comment;
pub mod question;
pub mod tag;
pub mod user;
pub mod vote;

use self::user::UserId;

/// Shared shape of user-authored content (questions, answers, comments).
///
/// Timestamps are Unix epoch milliseconds assigned by the store: `created_at`
/// once on insert, `modified_at` on every update.
pub trait Publishable {
    /// Author of the content.
    fn owner(&self) -> UserId;
    /// Markdown body as submitted.
    fn body(&self) -> &str;
    fn created_at(&self) -> i64;
    fn modified_at(&self) -> i64;
}
