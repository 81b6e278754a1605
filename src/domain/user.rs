//! Authentication principal.

use super::{TimeMs, ValidationError};

pub const MIN_USERNAME_LEN: usize = 3;
pub const MAX_USERNAME_LEN: usize = 50;
pub const MAX_EMAIL_LEN: usize = 100;
pub const MIN_PASSWORD_LEN: usize = 8;

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    pub created_at: TimeMs,
    pub updated_at: TimeMs,
}

/// Registration input after validation. The password is still plain text;
/// hashing happens in `auth`.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl NewUser {
    /// Validate raw registration fields, checked in form order so the first
    /// problem is the one reported.
    pub fn parse(username: &str, email: &str, password: &str) -> Result<Self, ValidationError> {
        let username = username.trim();
        let len = username.chars().count();
        if len < MIN_USERNAME_LEN {
            return Err(ValidationError::new(
                "Username must be at least 3 characters",
            ));
        }
        if len > MAX_USERNAME_LEN {
            return Err(ValidationError::new(
                "Username must be at most 50 characters",
            ));
        }

        let email = email.trim();
        if email.is_empty() || !email.contains('@') || email.chars().count() > MAX_EMAIL_LEN {
            return Err(ValidationError::new("Invalid email address"));
        }

        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::new(
                "Password must be at least 8 characters",
            ));
        }

        Ok(NewUser {
            username: username.to_string(),
            email: email.to_lowercase(),
            password: password.to_string(),
        })
    }
}
