//! SQLite schema for the network store.
//!
//! ```text
//! categories          lines                    stops
//! ┌───────────┐       ┌───────────────┐        ┌───────────┐
//! │ id (PK)   │◄──────│ category_id   │        │ id (PK)   │
//! │ name (UQ) │       │ id (PK)       │        │ name (UQ) │
//! └───────────┘       └───────▲───────┘        └─────▲─────┘
//!                             │   line_stops         │
//!                             │  ┌──────────────┐    │
//!                             └──│ line_id      │    │
//!                                │ stop_id ─────┼────┘
//!                                │ stop_order   │
//!                                └──────────────┘
//! ```
//!
//! `stops.name` is unique so concurrent attaches of the same new stop name
//! resolve to one row. `line_stops` is keyed by `(line_id, stop_id)` and also
//! unique on `(line_id, stop_order)`, so a broken order sequence can never be
//! committed.

use rusqlite::{Connection, OptionalExtension};
use tracing::{info, warn};

use crate::models::types::{NetworkError, Result};

/// Current schema version. Databases written by another version are refused.
const SCHEMA_VERSION: i32 = 1;

const CREATE_METADATA: &str = r#"
CREATE TABLE IF NOT EXISTS tissea_metadata (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
"#;

const CREATE_CATEGORIES: &str = r#"
CREATE TABLE IF NOT EXISTS categories (
    id   INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
)
"#;

/// Times are stored as `HH:MM:SS` text; `created_at` as RFC 3339.
const CREATE_LINES: &str = r#"
CREATE TABLE IF NOT EXISTS lines (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    category_id INTEGER NOT NULL REFERENCES categories(id),
    name        TEXT NOT NULL,
    number      TEXT NOT NULL,
    color       TEXT,
    start_time  TEXT,
    end_time    TEXT,
    line_type   TEXT,
    description TEXT,
    created_at  TEXT NOT NULL
)
"#;

const CREATE_STOPS: &str = r#"
CREATE TABLE IF NOT EXISTS stops (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    name      TEXT NOT NULL UNIQUE,
    latitude  REAL NOT NULL,
    longitude REAL NOT NULL
)
"#;

const CREATE_LINE_STOPS: &str = r#"
CREATE TABLE IF NOT EXISTS line_stops (
    line_id    INTEGER NOT NULL REFERENCES lines(id) ON DELETE CASCADE,
    stop_id    INTEGER NOT NULL REFERENCES stops(id) ON DELETE CASCADE,
    stop_order INTEGER NOT NULL,
    PRIMARY KEY (line_id, stop_id),
    UNIQUE (line_id, stop_order)
)
"#;

const CREATE_LINES_CATEGORY_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS lines_category ON lines(category_id)
"#;

/// Create all tables and check the schema version.
///
/// Safe to call on every open: every statement is `IF NOT EXISTS`.
pub(crate) fn initialize(conn: &Connection) -> Result<()> {
    // WAL is persistent: set once here, every later connection inherits it.
    let mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    if !mode.eq_ignore_ascii_case("wal") {
        warn!(%mode, "database did not switch to WAL");
    }

    conn.execute_batch(CREATE_METADATA)?;
    conn.execute_batch(CREATE_CATEGORIES)?;
    conn.execute_batch(CREATE_LINES)?;
    conn.execute_batch(CREATE_STOPS)?;
    conn.execute_batch(CREATE_LINE_STOPS)?;
    conn.execute_batch(CREATE_LINES_CATEGORY_INDEX)?;

    verify_or_set_version(conn)
}

fn verify_or_set_version(conn: &Connection) -> Result<()> {
    let existing: Option<String> = conn
        .query_row(
            "SELECT value FROM tissea_metadata WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()?;

    match existing {
        None => {
            conn.execute(
                "INSERT INTO tissea_metadata (key, value) VALUES ('schema_version', ?1)",
                [SCHEMA_VERSION.to_string()],
            )?;
            info!(version = SCHEMA_VERSION, "initialized network schema");
            Ok(())
        }
        Some(found) if found == SCHEMA_VERSION.to_string() => Ok(()),
        Some(found) => Err(NetworkError::storage(format!(
            "schema version mismatch: database has {found}, expected {SCHEMA_VERSION}"
        ))),
    }
}
