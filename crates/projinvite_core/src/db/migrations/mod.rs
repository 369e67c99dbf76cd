//! Invitation schema migrations and schema check.
//!
//! # Invariants
//! - Steps are applied in ascending version order inside one transaction.
//! - `PRAGMA user_version` always equals the last applied step.
//! - After migrating, every table and index the invitation workflow relies
//!   on must exist; a database claiming the latest version without them is
//!   rejected rather than silently used.

use crate::db::{DbError, DbResult};
use rusqlite::{Connection, OptionalExtension};

/// One forward-only schema step.
struct SchemaStep {
    version: u32,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[
    SchemaStep {
        version: 1,
        sql: include_str!("0001_init.sql"),
    },
    SchemaStep {
        version: 2,
        sql: include_str!("0002_assignment_uniqueness.sql"),
    },
];

/// Objects the storage accessor reads and the uniqueness rules depend on.
pub const REQUIRED_SCHEMA_OBJECTS: &[(&str, &str)] = &[
    ("table", "projects"),
    ("table", "assignments"),
    ("index", "idx_assignments_project"),
    ("index", "idx_assignments_email_assigned"),
];

/// Returns the latest schema version known by this binary.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |step| step.version)
}

/// Brings the invitation schema up to date and verifies it.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    let latest = latest_version();
    if current > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: latest,
        });
    }

    let pending: Vec<&SchemaStep> = SCHEMA_STEPS
        .iter()
        .filter(|step| step.version > current)
        .collect();
    if !pending.is_empty() {
        let tx = conn.transaction()?;
        for step in pending {
            tx.execute_batch(step.sql)?;
            tx.pragma_update(None, "user_version", step.version)?;
        }
        tx.commit()?;
    }

    verify_schema(conn)
}

/// Fails with `MissingSchemaObject` for the first required object not found.
pub fn verify_schema(conn: &Connection) -> DbResult<()> {
    let mut stmt =
        conn.prepare("SELECT 1 FROM sqlite_master WHERE type = ?1 AND name = ?2;")?;
    for &(kind, name) in REQUIRED_SCHEMA_OBJECTS {
        let found = stmt
            .query_row([kind, name], |row| row.get::<_, i64>(0))
            .optional()?;
        if found.is_none() {
            return Err(DbError::MissingSchemaObject { kind, name });
        }
    }
    Ok(())
}
