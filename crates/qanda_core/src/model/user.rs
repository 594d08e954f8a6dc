//! User identity model.
//!
//! Authentication lives outside the core; this module only keeps the identity
//! fields the scoring core links against.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type UserId = Uuid;

const MAX_USERNAME_CHARS: usize = 150;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyUsername,
    UsernameTooLong { max: usize, actual: usize },
    InvalidEmail(String),
}

impl Display for UserValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUsername => write!(f, "username must not be blank"),
            Self::UsernameTooLong { max, actual } => {
                write!(f, "username has {actual} characters; max is {max}")
            }
            Self::InvalidEmail(value) => write!(f, "invalid email address `{value}`"),
        }
    }
}

impl Error for UserValidationError {}

/// Registered account. New accounts start inactive until activated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub uuid: UserId,
    pub username: String,
    pub email: String,
    pub is_active: bool,
}

impl User {
    /// Builds a new inactive user with a generated id.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<Self, UserValidationError> {
        let user = Self {
            uuid: Uuid::new_v4(),
            username: username.into().trim().to_string(),
            email: email.into().trim().to_string(),
            is_active: false,
        };
        user.validate()?;
        Ok(user)
    }

    pub fn validate(&self) -> Result<(), UserValidationError> {
        if self.username.trim().is_empty() {
            return Err(UserValidationError::EmptyUsername);
        }
        let chars = self.username.chars().count();
        if chars > MAX_USERNAME_CHARS {
            return Err(UserValidationError::UsernameTooLong {
                max: MAX_USERNAME_CHARS,
                actual: chars,
            });
        }
        match self.email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
            _ => Err(UserValidationError::InvalidEmail(self.email.clone())),
        }
    }
}
