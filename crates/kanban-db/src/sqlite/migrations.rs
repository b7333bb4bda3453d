use rusqlite::{params, Connection};

use super::SqliteResultExt;
use crate::DbError;

const SCHEMA_V1: &str = "
    CREATE TABLE IF NOT EXISTS tasks (
        id                  INTEGER PRIMARY KEY AUTOINCREMENT,
        title               TEXT NOT NULL
                                CHECK(length(trim(title)) > 0 AND length(title) <= 255),
        description         TEXT
                                CHECK(description IS NULL OR length(description) <= 1000),
        status              TEXT NOT NULL DEFAULT 'todo'
                                CHECK(status IN ('todo', 'doing', 'done')),
        created_at          TEXT NOT NULL,
        ai_advice           TEXT,
        ai_advice_timestamp TEXT,
        CHECK((ai_advice IS NULL) = (ai_advice_timestamp IS NULL))
    );
    CREATE INDEX IF NOT EXISTS idx_tasks_created ON tasks(created_at DESC);
    CREATE INDEX IF NOT EXISTS idx_tasks_status  ON tasks(status);
";

pub fn run(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        );",
    )
    .to_db()?;

    let current: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
        .to_db()?;

    if current < 1 {
        conn.execute_batch(SCHEMA_V1).to_db()?;
        conn.execute(
            "INSERT INTO schema_version (version, applied_at) VALUES (?1, datetime('now'))",
            params![1],
        )
        .to_db()?;
        tracing::debug!("applied sqlite schema version 1");
    }

    Ok(())
}
