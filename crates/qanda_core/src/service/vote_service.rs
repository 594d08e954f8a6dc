//! Vote use-case service.
//!
//! # Responsibility
//! - Resolve the vote form state for a `(user, target)` pair.
//! - Persist a chosen value as a new vote or as a change to an existing one.
//!
//! # Invariants
//! - Users may only create or change their own votes.
//! - A duplicate insert is surfaced as `DuplicateVote`, never silently merged.

use crate::model::user::UserId;
use crate::model::vote::{Vote, VoteId, VoteTarget, VoteValue};
use crate::repo::vote_repo::VoteRepository;
use crate::repo::{RepoError, RepoResult};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum VoteServiceError {
    TargetNotFound(VoteTarget),
    VoteNotFound(VoteId),
    /// Attempt to create or change another user's vote.
    PermissionDenied {
        user: UserId,
        target: VoteTarget,
    },
    /// The user already voted on the target; update that vote instead.
    DuplicateVote {
        user: UserId,
        target: VoteTarget,
    },
    Repo(RepoError),
}

impl Display for VoteServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TargetNotFound(target) => write!(f, "vote target not found: {target}"),
            Self::VoteNotFound(id) => write!(f, "vote not found: {id}"),
            Self::PermissionDenied { user, target } => {
                write!(f, "user {user} cannot change another user's vote on {target}")
            }
            Self::DuplicateVote { user, target } => {
                write!(f, "user {user} already voted on {target}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for VoteServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for VoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::DuplicateVote { user, target } => Self::DuplicateVote { user, target },
            RepoError::NotFound { entity: "vote", id } => Self::VoteNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Vote service facade over repository implementations.
pub struct VoteService<R: VoteRepository> {
    repo: R,
}

impl<R: VoteRepository> VoteService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns the user's stored vote on `target`, or an unsaved blank vote.
    pub fn resolve_vote(&self, user: UserId, target: VoteTarget) -> Result<Vote, VoteServiceError> {
        self.ensure_target_exists(target)?;
        Ok(self.repo.get_vote_or_unsaved_blank_vote(user, target)?)
    }

    /// Persists `value` for a vote previously handed out by `resolve_vote`.
    ///
    /// Unsaved votes are inserted; saved votes are updated in place.
    pub fn submit_vote(
        &self,
        acting_user: UserId,
        vote: &Vote,
        value: VoteValue,
    ) -> Result<Vote, VoteServiceError> {
        if vote.user != acting_user {
            return Err(VoteServiceError::PermissionDenied {
                user: acting_user,
                target: vote.target,
            });
        }

        match vote.id {
            Some(id) => self.update_vote(acting_user, id, value),
            None => {
                self.ensure_target_exists(vote.target)?;
                let saved = self.repo.insert_vote(acting_user, vote.target, value)?;
                info!(
                    "event=vote_create module=service status=ok target={} value={}",
                    vote.target.kind(),
                    value.as_i64()
                );
                Ok(saved)
            }
        }
    }

    /// Creates or changes the user's vote on `target` in one call.
    pub fn cast_vote(
        &self,
        user: UserId,
        target: VoteTarget,
        value: VoteValue,
    ) -> Result<Vote, VoteServiceError> {
        let vote = self.resolve_vote(user, target)?;
        self.submit_vote(user, &vote, value)
    }

    /// Changes the value of an existing vote owned by `acting_user`.
    pub fn update_vote(
        &self,
        acting_user: UserId,
        vote_id: VoteId,
        value: VoteValue,
    ) -> Result<Vote, VoteServiceError> {
        let current = self
            .repo
            .get_vote_by_id(vote_id)?
            .ok_or(VoteServiceError::VoteNotFound(vote_id))?;
        if current.user != acting_user {
            return Err(VoteServiceError::PermissionDenied {
                user: acting_user,
                target: current.target,
            });
        }

        let updated = self.repo.update_vote_value(vote_id, value)?;
        info!(
            "event=vote_update module=service status=ok target={} value={}",
            current.target.kind(),
            value.as_i64()
        );
        Ok(updated)
    }

    /// Aggregated score of a question or answer.
    pub fn score(&self, target: VoteTarget) -> RepoResult<i64> {
        self.repo.score(target)
    }

    fn ensure_target_exists(&self, target: VoteTarget) -> Result<(), VoteServiceError> {
        if self.repo.target_exists(target)? {
            Ok(())
        } else {
            Err(VoteServiceError::TargetNotFound(target))
        }
    }
}
