//! Shared SQLite schema versioning
//!
//! Each store declares its current schema as plain CREATE statements plus an
//! ordered migration list. The database's `PRAGMA user_version` records
//! which schema it carries: fresh files get the current schema directly,
//! older files replay the migrations that follow their version.

use anyhow::{bail, Context, Result};
use rusqlite::Connection;

/// One migration step: the statements that bring a database from
/// `from_version` to `from_version + 1`.
pub struct Migration {
    pub from_version: u32,
    pub statements: &'static [&'static str],
}

pub struct VersionedSchema {
    pub version: u32,
    /// CREATE statements for a fresh database at the current version.
    pub create_statements: &'static [&'static str],
    /// Ordered steps covering every older version up to the current one.
    pub migrations: &'static [Migration],
}

impl VersionedSchema {
    pub fn initialize(&self, conn: &Connection) -> Result<()> {
        let found: u32 = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .context("reading user_version")?;

        if found == self.version {
            return Ok(());
        }
        if found > self.version {
            bail!(
                "database schema version {} is newer than supported version {}",
                found,
                self.version
            );
        }

        if found == 0 {
            for statement in self.create_statements {
                conn.execute(statement, [])
                    .with_context(|| format!("creating schema: {}", statement))?;
            }
        } else {
            for migration in self
                .migrations
                .iter()
                .filter(|m| m.from_version >= found)
            {
                for statement in migration.statements {
                    conn.execute(statement, []).with_context(|| {
                        format!(
                            "migrating from version {}: {}",
                            migration.from_version, statement
                        )
                    })?;
                }
            }
        }

        conn.pragma_update(None, "user_version", self.version)
            .context("updating user_version")?;
        Ok(())
    }
}
