//! Storage port for the network topology.
//!
//! A [`NetworkStore`] hands out units of work. Everything done through one
//! [`StoreUnit`] becomes visible atomically on [`StoreUnit::commit`]; a unit
//! dropped without committing leaves the store exactly as it found it.
//! Implementations can be in-memory or database-backed.

pub mod memory;
pub mod sqlite;

use geo::Point;

use crate::identifiers::*;
use crate::models::types::*;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Provider of atomic units of work against persisted network state.
pub trait NetworkStore: Send + Sync {
    type Unit: StoreUnit;

    /// Open a unit that observes committed state only and never writes.
    fn begin_read(&self) -> Result<Self::Unit>;

    /// Open a unit that may write. At most one write unit is open at a time;
    /// waiting for that slot is bounded and times out as `Conflict`.
    fn begin_write(&self) -> Result<Self::Unit>;
}

/// One atomic unit of work.
pub trait StoreUnit {
    // ---- Lookups ----
    fn find_line(&self, id: LineId) -> Result<Option<Line>>;
    fn find_stop(&self, id: StopId) -> Result<Option<Stop>>;
    fn find_category(&self, id: CategoryId) -> Result<Option<Category>>;

    /// Stops of a line in ascending order. Empty for unknown lines.
    fn list_line_stops_ordered(&self, line_id: LineId) -> Result<Vec<OrderedStop>>;

    /// Highest order key on a line, `None` when the line has no stops.
    fn max_order(&self, line_id: LineId) -> Result<Option<u32>>;

    // ---- Collections ----

    /// All lines, sorted by category name then line number.
    fn list_lines(&self) -> Result<Vec<LineSummary>>;

    /// Lines of one category, sorted by number.
    fn lines_in_category(&self, id: CategoryId) -> Result<Vec<Line>>;

    /// All stops, sorted by name.
    fn list_stops(&self) -> Result<Vec<Stop>>;

    fn counts(&self) -> Result<NetworkStats>;

    // ---- Mutations ----

    /// Return the stop called `name`, creating it at `location` if none exists.
    fn find_or_create_stop_by_name(&mut self, name: &str, location: Point) -> Result<Stop>;

    /// Fails with `StopAlreadyOnLine` if the pair is already linked.
    fn insert_line_stop(&mut self, link: LineStop) -> Result<()>;

    /// Returns `false` when the pair was not linked.
    fn delete_line_stop(&mut self, line_id: LineId, stop_id: StopId) -> Result<bool>;

    /// Renumber the line's order keys to `1..=N`, keeping relative order.
    fn compact_line(&mut self, line_id: LineId) -> Result<()>;

    /// Return the category called `name`, creating it if none exists.
    fn insert_category(&mut self, name: &str) -> Result<Category>;

    fn insert_line(&mut self, line: &NewLine) -> Result<Line>;

    fn commit(self) -> Result<()>;
}
