//! SQLite-backed network store.
//!
//! Every unit of work runs on its own connection inside one SQLite
//! transaction. Write units start with `BEGIN IMMEDIATE`, which takes the
//! database write lock up front, so two order-mutating units can never
//! interleave even across processes. Read units start with `BEGIN DEFERRED`
//! and, under WAL, see one consistent committed snapshot.

mod schema;

use std::sync::Arc;

use chrono::Utc;
use geo::Point;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::identifiers::*;
use crate::models::types::*;
use crate::store::{NetworkStore, StoreUnit};

impl From<rusqlite::Error> for NetworkError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => {
                NetworkError::Conflict(format!("database is locked: {err}"))
            }
            _ => NetworkError::StorageUnavailable {
                message: err.to_string(),
                source: Some(Box::new(err)),
            },
        }
    }
}

/// Network store persisted in a SQLite database file.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    config: Arc<StoreConfig>,
}

impl SqliteStore {
    /// Opens the database, creating and initializing it if necessary.
    pub fn open(config: StoreConfig) -> Result<Self> {
        let store = Self {
            config: Arc::new(config),
        };
        let conn = store.connect()?;
        schema::initialize(&conn)?;
        Ok(store)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.config.path)?;
        conn.busy_timeout(self.config.busy_timeout)?;
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA synchronous = NORMAL;",
        )?;
        Ok(conn)
    }

    fn begin(&self, statement: &str, writable: bool) -> Result<SqliteUnit> {
        let conn = self.connect()?;
        conn.execute_batch(statement)?;
        Ok(SqliteUnit {
            conn,
            writable,
            open: true,
        })
    }
}

impl NetworkStore for SqliteStore {
    type Unit = SqliteUnit;

    fn begin_read(&self) -> Result<SqliteUnit> {
        self.begin("BEGIN DEFERRED", false)
    }

    fn begin_write(&self) -> Result<SqliteUnit> {
        self.begin("BEGIN IMMEDIATE", true)
    }
}

/// One SQLite transaction on a dedicated connection.
///
/// Rolled back on drop unless committed.
pub struct SqliteUnit {
    conn: Connection,
    writable: bool,
    open: bool,
}

impl SqliteUnit {
    fn ensure_writable(&self) -> Result<()> {
        if self.writable {
            Ok(())
        } else {
            Err(NetworkError::storage("write attempted through a read unit"))
        }
    }
}

impl Drop for SqliteUnit {
    fn drop(&mut self) {
        if self.open {
            if let Err(err) = self.conn.execute_batch("ROLLBACK") {
                warn!(error = %err, "rollback failed");
            }
        }
    }
}

const LINE_COLUMNS: &str = "l.id, l.category_id, l.name, l.number, l.color, l.start_time, \
                            l.end_time, l.line_type, l.description, l.created_at";

fn line_from_row(row: &Row<'_>) -> rusqlite::Result<Line> {
    let text = |idx: usize| -> rusqlite::Result<Option<Arc<str>>> {
        Ok(row.get::<_, Option<String>>(idx)?.map(Into::into))
    };

    Ok(Line {
        id: LineId::new(row.get(0)?),
        category_id: CategoryId::new(row.get(1)?),
        name: row.get::<_, String>(2)?.into(),
        number: row.get::<_, String>(3)?.into(),
        color: text(4)?,
        start_time: row.get(5)?,
        end_time: row.get(6)?,
        line_type: text(7)?,
        description: text(8)?,
        created_at: row.get(9)?,
    })
}

/// Reads `id, name, latitude, longitude` starting at column `first`.
fn stop_from_row(row: &Row<'_>, first: usize) -> rusqlite::Result<Stop> {
    let latitude: f64 = row.get(first + 2)?;
    let longitude: f64 = row.get(first + 3)?;
    Ok(Stop {
        id: StopId::new(row.get(first)?),
        name: row.get::<_, String>(first + 1)?.into(),
        location: Point::new(longitude, latitude),
    })
}

impl StoreUnit for SqliteUnit {
    fn find_line(&self, id: LineId) -> Result<Option<Line>> {
        let sql = format!("SELECT {LINE_COLUMNS} FROM lines l WHERE l.id = ?1");
        Ok(self
            .conn
            .query_row(&sql, [id.get()], line_from_row)
            .optional()?)
    }

    fn find_stop(&self, id: StopId) -> Result<Option<Stop>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, latitude, longitude FROM stops WHERE id = ?1",
                [id.get()],
                |row| stop_from_row(row, 0),
            )
            .optional()?)
    }

    fn find_category(&self, id: CategoryId) -> Result<Option<Category>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name FROM categories WHERE id = ?1",
                [id.get()],
                |row| {
                    Ok(Category {
                        id: CategoryId::new(row.get(0)?),
                        name: row.get::<_, String>(1)?.into(),
                    })
                },
            )
            .optional()?)
    }

    fn list_line_stops_ordered(&self, line_id: LineId) -> Result<Vec<OrderedStop>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT s.id, s.name, s.latitude, s.longitude, ls.stop_order
             FROM line_stops ls
             JOIN stops s ON s.id = ls.stop_id
             WHERE ls.line_id = ?1
             ORDER BY ls.stop_order ASC",
        )?;
        let stops = stmt
            .query_map([line_id.get()], |row| {
                Ok(OrderedStop {
                    stop: stop_from_row(row, 0)?,
                    order: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(stops)
    }

    fn max_order(&self, line_id: LineId) -> Result<Option<u32>> {
        Ok(self.conn.query_row(
            "SELECT MAX(stop_order) FROM line_stops WHERE line_id = ?1",
            [line_id.get()],
            |row| row.get(0),
        )?)
    }

    fn list_lines(&self) -> Result<Vec<LineSummary>> {
        let sql = format!(
            "SELECT {LINE_COLUMNS}, c.name,
                    (SELECT COUNT(*) FROM line_stops ls WHERE ls.line_id = l.id)
             FROM lines l
             JOIN categories c ON c.id = l.category_id
             ORDER BY c.name ASC, l.number ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let lines = stmt
            .query_map([], |row| {
                Ok(LineSummary {
                    line: line_from_row(row)?,
                    category: row.get::<_, String>(10)?.into(),
                    stops_count: row.get::<_, i64>(11)? as usize,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(lines)
    }

    fn lines_in_category(&self, id: CategoryId) -> Result<Vec<Line>> {
        let sql = format!(
            "SELECT {LINE_COLUMNS} FROM lines l WHERE l.category_id = ?1 ORDER BY l.number ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let lines = stmt
            .query_map([id.get()], line_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(lines)
    }

    fn list_stops(&self) -> Result<Vec<Stop>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, latitude, longitude FROM stops ORDER BY name ASC")?;
        let stops = stmt
            .query_map([], |row| stop_from_row(row, 0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(stops)
    }

    fn counts(&self) -> Result<NetworkStats> {
        Ok(self.conn.query_row(
            "SELECT (SELECT COUNT(*) FROM categories),
                    (SELECT COUNT(*) FROM lines),
                    (SELECT COUNT(*) FROM stops),
                    (SELECT COUNT(*) FROM line_stops)",
            [],
            |row| {
                Ok(NetworkStats {
                    categories: row.get::<_, i64>(0)? as u64,
                    lines: row.get::<_, i64>(1)? as u64,
                    stops: row.get::<_, i64>(2)? as u64,
                    relations: row.get::<_, i64>(3)? as u64,
                })
            },
        )?)
    }

    fn find_or_create_stop_by_name(&mut self, name: &str, location: Point) -> Result<Stop> {
        self.ensure_writable()?;

        // First writer wins; later callers fall through to the select.
        let inserted = self.conn.execute(
            "INSERT INTO stops (name, latitude, longitude) VALUES (?1, ?2, ?3)
             ON CONFLICT(name) DO NOTHING",
            params![name, location.y(), location.x()],
        )?;
        if inserted == 1 {
            debug!(name, "created stop");
        }

        Ok(self.conn.query_row(
            "SELECT id, name, latitude, longitude FROM stops WHERE name = ?1",
            [name],
            |row| stop_from_row(row, 0),
        )?)
    }

    fn insert_line_stop(&mut self, link: LineStop) -> Result<()> {
        self.ensure_writable()?;

        let linked: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM line_stops WHERE line_id = ?1 AND stop_id = ?2",
                [link.line_id.get(), link.stop_id.get()],
                |row| row.get(0),
            )
            .optional()?;
        if linked.is_some() {
            return Err(NetworkError::StopAlreadyOnLine {
                line_id: link.line_id,
                stop_id: link.stop_id,
            });
        }

        self.conn.execute(
            "INSERT INTO line_stops (line_id, stop_id, stop_order) VALUES (?1, ?2, ?3)",
            params![link.line_id.get(), link.stop_id.get(), link.order],
        )?;
        Ok(())
    }

    fn delete_line_stop(&mut self, line_id: LineId, stop_id: StopId) -> Result<bool> {
        self.ensure_writable()?;
        let deleted = self.conn.execute(
            "DELETE FROM line_stops WHERE line_id = ?1 AND stop_id = ?2",
            [line_id.get(), stop_id.get()],
        )?;
        Ok(deleted > 0)
    }

    fn compact_line(&mut self, line_id: LineId) -> Result<()> {
        self.ensure_writable()?;

        // Rank survivors once, park them on negative keys, then flip the sign.
        // Going through negatives keeps every intermediate row state unique
        // on (line_id, stop_order) whatever order SQLite visits rows in.
        self.conn.execute(
            "WITH ranked AS MATERIALIZED (
                 SELECT stop_id, ROW_NUMBER() OVER (ORDER BY stop_order) AS new_order
                 FROM line_stops
                 WHERE line_id = ?1
             )
             UPDATE line_stops
             SET stop_order = -ranked.new_order
             FROM ranked
             WHERE line_stops.line_id = ?1 AND line_stops.stop_id = ranked.stop_id",
            [line_id.get()],
        )?;
        self.conn.execute(
            "UPDATE line_stops SET stop_order = -stop_order WHERE line_id = ?1 AND stop_order < 0",
            [line_id.get()],
        )?;
        Ok(())
    }

    fn insert_category(&mut self, name: &str) -> Result<Category> {
        self.ensure_writable()?;
        self.conn.execute(
            "INSERT INTO categories (name) VALUES (?1) ON CONFLICT(name) DO NOTHING",
            [name],
        )?;
        Ok(self.conn.query_row(
            "SELECT id, name FROM categories WHERE name = ?1",
            [name],
            |row| {
                Ok(Category {
                    id: CategoryId::new(row.get(0)?),
                    name: row.get::<_, String>(1)?.into(),
                })
            },
        )?)
    }

    fn insert_line(&mut self, new_line: &NewLine) -> Result<Line> {
        self.ensure_writable()?;
        if self.find_category(new_line.category_id)?.is_none() {
            return Err(NetworkError::CategoryNotFound(new_line.category_id));
        }

        self.conn.execute(
            "INSERT INTO lines
                 (category_id, name, number, color, start_time, end_time, line_type, description, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                new_line.category_id.get(),
                new_line.name,
                new_line.number,
                new_line.color,
                new_line.start_time,
                new_line.end_time,
                new_line.line_type,
                new_line.description,
                Utc::now(),
            ],
        )?;

        let id = LineId::new(self.conn.last_insert_rowid());
        self.find_line(id)?
            .ok_or_else(|| NetworkError::storage(format!("line {id} vanished after insert")))
    }

    fn commit(mut self) -> Result<()> {
        self.conn.execute_batch("COMMIT")?;
        self.open = false;
        Ok(())
    }
}
