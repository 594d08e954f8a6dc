//! Vote domain model.
//!
//! # Responsibility
//! - Represent up/down votes on votable entities (questions, answers).
//! - Model the "unsaved blank vote" handed to callers before the user picks a
//!   value.
//!
//! # Invariants
//! - Stored values are exactly `+1` or `-1`.
//! - A `Vote` with `id == None` has never been persisted.
//! - At most one vote exists per `(user, target)`.

use crate::model::answer::AnswerId;
use crate::model::question::QuestionId;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type VoteId = Uuid;

/// Signed vote value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteValue {
    Up,
    Down,
}

impl VoteValue {
    pub fn as_i64(self) -> i64 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }
}

/// Raised when a raw integer is not a valid vote value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidVoteValue(pub i64);

impl Display for InvalidVoteValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid vote value {}; expected 1 or -1", self.0)
    }
}

impl Error for InvalidVoteValue {}

impl TryFrom<i64> for VoteValue {
    type Error = InvalidVoteValue;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Up),
            -1 => Ok(Self::Down),
            other => Err(InvalidVoteValue(other)),
        }
    }
}

/// Entity a vote is cast on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum VoteTarget {
    Question(QuestionId),
    Answer(AnswerId),
}

impl VoteTarget {
    pub fn id(self) -> Uuid {
        match self {
            Self::Question(id) | Self::Answer(id) => id,
        }
    }

    pub fn kind(self) -> &'static str {
        match self {
            Self::Question(_) => "question",
            Self::Answer(_) => "answer",
        }
    }
}

impl Display for VoteTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind(), self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    /// `None` until the vote is persisted.
    pub id: Option<VoteId>,
    pub user: UserId,
    pub target: VoteTarget,
    /// `None` only on an unsaved blank vote.
    pub value: Option<VoteValue>,
    /// Epoch milliseconds of the last save.
    pub voted_on: Option<i64>,
}

impl Vote {
    /// Builds an unsaved vote pre-populated with user and target.
    pub fn blank(user: UserId, target: VoteTarget) -> Self {
        Self {
            id: None,
            user,
            target,
            value: None,
            voted_on: None,
        }
    }

    pub fn is_saved(&self) -> bool {
        self.id.is_some()
    }
}
