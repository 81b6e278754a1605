//! Authentication: password hashing, login sessions and request extractors.

pub mod extract;
pub mod session;

pub use extract::{removal_cookie, session_cookie, session_token, CurrentUser, MaybeUser, SESSION_COOKIE};
pub use session::{MemorySessionStore, SessionError, SessionStore, SqliteSessionStore};

use crate::db::Repository;
use crate::domain::User;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use std::sync::OnceLock;
use tracing::debug;

/// Hash a plain text password into an argon2 PHC string with a fresh salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Check a password against a stored hash. An unparsable hash never verifies.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Hash checked when the username does not exist, so a miss costs the same
/// as a wrong password.
fn dummy_hash() -> &'static str {
    static DUMMY: OnceLock<String> = OnceLock::new();
    DUMMY.get_or_init(|| hash_password("not-a-real-password").unwrap_or_default())
}

/// Look up a user by username and check the password.
pub async fn authenticate_user(
    repo: &Repository,
    username: &str,
    password: &str,
) -> Result<Option<User>, sqlx::Error> {
    let Some(user) = repo.get_user_by_username(username.trim()).await? else {
        verify_password(password, dummy_hash());
        debug!(username, "Login attempt for unknown user");
        return Ok(None);
    };

    if !verify_password(password, &user.password_hash) {
        debug!(user_id = user.id, "Login attempt with wrong password");
        return Ok(None);
    }

    Ok(Some(user))
}
