use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use tracing::info;

use crate::sqlite_persistence::VersionedSchema;

use super::user_store::{CreateUserOutcome, User, UserStore};

const SCHEMA: VersionedSchema = VersionedSchema {
    version: 1,
    create_statements: &[
        "CREATE TABLE user (
            id INTEGER PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            password TEXT NOT NULL,
            created INTEGER NOT NULL DEFAULT (cast(strftime('%s','now') as int))
        )",
        "CREATE INDEX idx_user_username ON user (username)",
    ],
    migrations: &[],
};

pub struct SqliteUserStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteUserStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let connection = Connection::open(&db_path)
            .with_context(|| format!("opening user db at {:?}", db_path.as_ref()))?;
        SCHEMA.initialize(&connection)?;
        info!("User store ready at {:?}", db_path.as_ref());
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }
}

impl UserStore for SqliteUserStore {
    fn create_user(&self, username: &str, password: &str) -> Result<CreateUserOutcome> {
        let conn = self.connection.lock().unwrap();
        let inserted = conn.execute(
            "INSERT INTO user (username, password) VALUES (?1, ?2)",
            params![username, password],
        );
        match inserted {
            Ok(_) => Ok(CreateUserOutcome::Created(conn.last_insert_rowid())),
            Err(rusqlite::Error::SqliteFailure(error, _))
                if error.code == ErrorCode::ConstraintViolation =>
            {
                Ok(CreateUserOutcome::UsernameTaken)
            }
            Err(other) => Err(other).context("inserting user"),
        }
    }

    fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        let conn = self.connection.lock().unwrap();
        let user = conn
            .query_row(
                "SELECT id, username FROM user WHERE id = ?1",
                params![user_id],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        username: row.get(1)?,
                    })
                },
            )
            .optional()
            .context("loading user by id")?;
        Ok(user)
    }

    fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.connection.lock().unwrap();
        let user = conn
            .query_row(
                "SELECT id, username FROM user WHERE username = ?1",
                params![username],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        username: row.get(1)?,
                    })
                },
            )
            .optional()
            .context("loading user by username")?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_tmp_store() -> (SqliteUserStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = SqliteUserStore::new(dir.path().join("users.db")).unwrap();
        (store, dir)
    }

    #[test]
    fn creates_and_looks_up_users() {
        let (store, _dir) = create_tmp_store();
        let outcome = store.create_user("ada", "placeholder").unwrap();
        let id = match outcome {
            CreateUserOutcome::Created(id) => id,
            other => panic!("unexpected outcome: {:?}", other),
        };

        let by_id = store.get_user(id).unwrap().unwrap();
        assert_eq!(by_id.username, "ada");
        let by_name = store.find_by_username("ada").unwrap().unwrap();
        assert_eq!(by_name.id, id);
    }

    #[test]
    fn duplicate_usernames_are_a_distinguishable_outcome() {
        let (store, _dir) = create_tmp_store();
        store.create_user("ada", "x").unwrap();
        let outcome = store.create_user("ada", "y").unwrap();
        assert_eq!(outcome, CreateUserOutcome::UsernameTaken);
    }

    #[test]
    fn missing_users_are_none() {
        let (store, _dir) = create_tmp_store();
        assert!(store.get_user(42).unwrap().is_none());
        assert!(store.find_by_username("nobody").unwrap().is_none());
    }
}
