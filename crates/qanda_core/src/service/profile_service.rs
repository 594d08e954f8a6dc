//! User/profile use-case service.
//!
//! Registration, activation and the score-based user ranking. Credentials and
//! activation tokens are handled outside the core.

use crate::model::user::{User, UserId, UserValidationError};
use crate::repo::user_repo::{ProfileRecord, UserRepository};
use crate::repo::{RepoError, RepoResult};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum ProfileServiceError {
    InvalidUser(UserValidationError),
    UsernameTaken(String),
    UserNotFound(UserId),
    Repo(RepoError),
}

impl Display for ProfileServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidUser(err) => write!(f, "{err}"),
            Self::UsernameTaken(name) => write!(f, "username already taken: `{name}`"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ProfileServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidUser(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ProfileServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::UserValidation(err) => Self::InvalidUser(err),
            RepoError::DuplicateUsername(name) => Self::UsernameTaken(name),
            RepoError::NotFound { entity: "user", id } => Self::UserNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<UserValidationError> for ProfileServiceError {
    fn from(value: UserValidationError) -> Self {
        Self::InvalidUser(value)
    }
}

pub struct ProfileService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> ProfileService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Stores a new inactive user; its profile is created alongside.
    pub fn register_user(
        &self,
        username: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<User, ProfileServiceError> {
        let user = User::new(username, email)?;
        self.repo.create_user(&user)?;
        info!("event=user_register module=service status=ok");
        Ok(user)
    }

    /// Activates the account once its email address is confirmed.
    pub fn activate_user(&self, id: UserId) -> Result<ProfileRecord, ProfileServiceError> {
        self.repo.activate_user(id)?;
        self.repo
            .get_profile(id)?
            .ok_or(ProfileServiceError::UserNotFound(id))
    }

    pub fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        self.repo.get_user(id)
    }

    pub fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        self.repo.get_user_by_username(username)
    }

    /// Profile with its score (sum of votes on the user's answers).
    pub fn profile(&self, id: UserId) -> Result<ProfileRecord, ProfileServiceError> {
        self.repo
            .get_profile(id)?
            .ok_or(ProfileServiceError::UserNotFound(id))
    }

    /// Highest scoring users first.
    pub fn top_users(&self, limit: u32) -> RepoResult<Vec<ProfileRecord>> {
        self.repo.top_profiles(limit)
    }
}
