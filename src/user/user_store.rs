use anyhow::Result;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
}

/// Outcome of a user creation attempt. A taken username is an expected,
/// recoverable condition the caller can act on, not an error.
#[derive(Debug, PartialEq, Eq)]
pub enum CreateUserOutcome {
    Created(i64),
    UsernameTaken,
}

pub trait UserStore: Send + Sync {
    /// Creates a new user with a uniqueness-checked username.
    /// Returns Err only on a database error.
    fn create_user(&self, username: &str, password: &str) -> Result<CreateUserOutcome>;

    /// Returns the user for the given id.
    /// Returns Ok(None) if the user does not exist.
    /// Returns Err if there is a database error.
    fn get_user(&self, user_id: i64) -> Result<Option<User>>;

    /// Returns the user with the given username.
    /// Returns Ok(None) if the user does not exist.
    fn find_by_username(&self, username: &str) -> Result<Option<User>>;
}
