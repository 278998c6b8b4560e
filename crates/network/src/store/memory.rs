//! In-memory network store.
//!
//! Committed state lives behind an `Arc` and is swapped whole on commit, so
//! readers grab a snapshot without waiting on writers. A write unit holds the
//! single writer slot and edits a private copy of the state.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use geo::Point;
use parking_lot::{Mutex, RawMutex};
use parking_lot::lock_api::ArcMutexGuard;

use crate::identifiers::*;
use crate::models::types::*;
use crate::store::{NetworkStore, StoreUnit};

const DEFAULT_WRITER_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Default)]
struct NetworkState {
    categories: BTreeMap<CategoryId, Category>,
    lines: BTreeMap<LineId, Line>,
    stops: BTreeMap<StopId, Stop>,

    // Lookup maps
    category_names: HashMap<Arc<str>, CategoryId>,
    stop_names: HashMap<Arc<str>, StopId>,

    // Per-line route, kept sorted by order
    routes: HashMap<LineId, Vec<LineStop>>,

    last_id: i64,
}

impl NetworkState {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn route(&self, line_id: LineId) -> &[LineStop] {
        self.routes.get(&line_id).map(Vec::as_slice).unwrap_or(&[])
    }

    fn category_name(&self, id: CategoryId) -> Arc<str> {
        self.categories
            .get(&id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| "".into())
    }
}

/// Store keeping the whole network in process memory.
///
/// This type is cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct MemoryStore {
    committed: Arc<Mutex<Arc<NetworkState>>>,
    writer: Arc<Mutex<()>>,
    writer_timeout: Duration,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            committed: Arc::new(Mutex::new(Arc::new(NetworkState::default()))),
            writer: Arc::new(Mutex::new(())),
            writer_timeout: DEFAULT_WRITER_TIMEOUT,
        }
    }

    /// Bound how long `begin_write` waits for the writer slot.
    pub fn with_writer_timeout(mut self, timeout: Duration) -> Self {
        self.writer_timeout = timeout;
        self
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkStore for MemoryStore {
    type Unit = MemoryUnit;

    fn begin_read(&self) -> Result<MemoryUnit> {
        Ok(MemoryUnit {
            committed: self.committed.clone(),
            writer: None,
            working: self.committed.lock().clone(),
        })
    }

    fn begin_write(&self) -> Result<MemoryUnit> {
        let writer = self
            .writer
            .try_lock_arc_for(self.writer_timeout)
            .ok_or_else(|| {
                NetworkError::Conflict(format!(
                    "writer slot still busy after {:?}",
                    self.writer_timeout
                ))
            })?;

        // Snapshot only after holding the writer slot, so no commit can land
        // between the copy and our own commit.
        let working = self.committed.lock().clone();

        Ok(MemoryUnit {
            committed: self.committed.clone(),
            writer: Some(writer),
            working,
        })
    }
}

/// Unit of work over a [`MemoryStore`].
///
/// Edits go to a copy-on-write snapshot that replaces the committed state on
/// commit; dropping the unit discards them.
pub struct MemoryUnit {
    committed: Arc<Mutex<Arc<NetworkState>>>,
    writer: Option<ArcMutexGuard<RawMutex, ()>>,
    working: Arc<NetworkState>,
}

impl MemoryUnit {
    fn state(&self) -> &NetworkState {
        &self.working
    }

    fn state_mut(&mut self) -> Result<&mut NetworkState> {
        if self.writer.is_none() {
            return Err(NetworkError::storage("write attempted through a read unit"));
        }
        Ok(Arc::make_mut(&mut self.working))
    }
}

impl StoreUnit for MemoryUnit {
    fn find_line(&self, id: LineId) -> Result<Option<Line>> {
        Ok(self.state().lines.get(&id).cloned())
    }

    fn find_stop(&self, id: StopId) -> Result<Option<Stop>> {
        Ok(self.state().stops.get(&id).cloned())
    }

    fn find_category(&self, id: CategoryId) -> Result<Option<Category>> {
        Ok(self.state().categories.get(&id).cloned())
    }

    fn list_line_stops_ordered(&self, line_id: LineId) -> Result<Vec<OrderedStop>> {
        let state = self.state();
        state
            .route(line_id)
            .iter()
            .map(|link| {
                let stop = state.stops.get(&link.stop_id).cloned().ok_or_else(|| {
                    NetworkError::storage(format!("dangling stop {} on line {}", link.stop_id, line_id))
                })?;
                Ok(OrderedStop {
                    stop,
                    order: link.order,
                })
            })
            .collect()
    }

    fn max_order(&self, line_id: LineId) -> Result<Option<u32>> {
        Ok(self.state().route(line_id).iter().map(|link| link.order).max())
    }

    fn list_lines(&self) -> Result<Vec<LineSummary>> {
        let state = self.state();
        let mut lines: Vec<LineSummary> = state
            .lines
            .values()
            .map(|line| LineSummary {
                line: line.clone(),
                category: state.category_name(line.category_id),
                stops_count: state.route(line.id).len(),
            })
            .collect();

        lines.sort_by(|a, b| {
            a.category
                .cmp(&b.category)
                .then_with(|| a.line.number.cmp(&b.line.number))
        });
        Ok(lines)
    }

    fn lines_in_category(&self, id: CategoryId) -> Result<Vec<Line>> {
        let mut lines: Vec<Line> = self
            .state()
            .lines
            .values()
            .filter(|line| line.category_id == id)
            .cloned()
            .collect();

        lines.sort_by(|a, b| a.number.cmp(&b.number));
        Ok(lines)
    }

    fn list_stops(&self) -> Result<Vec<Stop>> {
        let mut stops: Vec<Stop> = self.state().stops.values().cloned().collect();
        stops.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(stops)
    }

    fn counts(&self) -> Result<NetworkStats> {
        let state = self.state();
        Ok(NetworkStats {
            categories: state.categories.len() as u64,
            lines: state.lines.len() as u64,
            stops: state.stops.len() as u64,
            relations: state.routes.values().map(|r| r.len() as u64).sum(),
        })
    }

    fn find_or_create_stop_by_name(&mut self, name: &str, location: Point) -> Result<Stop> {
        let state = self.state_mut()?;
        if let Some(id) = state.stop_names.get(name) {
            if let Some(stop) = state.stops.get(id) {
                return Ok(stop.clone());
            }
        }

        let stop = Stop {
            id: StopId::new(state.next_id()),
            name: name.into(),
            location,
        };
        state.stop_names.insert(stop.name.clone(), stop.id);
        state.stops.insert(stop.id, stop.clone());
        Ok(stop)
    }

    fn insert_line_stop(&mut self, link: LineStop) -> Result<()> {
        let state = self.state_mut()?;
        if !state.lines.contains_key(&link.line_id) {
            return Err(NetworkError::LineNotFound(link.line_id));
        }
        if !state.stops.contains_key(&link.stop_id) {
            return Err(NetworkError::StopNotFound(link.stop_id));
        }

        let route = state.routes.entry(link.line_id).or_default();
        if route.iter().any(|existing| existing.stop_id == link.stop_id) {
            return Err(NetworkError::StopAlreadyOnLine {
                line_id: link.line_id,
                stop_id: link.stop_id,
            });
        }
        if route.iter().any(|existing| existing.order == link.order) {
            return Err(NetworkError::storage(format!(
                "order {} already taken on line {}",
                link.order, link.line_id
            )));
        }

        let at = route.partition_point(|existing| existing.order < link.order);
        route.insert(at, link);
        Ok(())
    }

    fn delete_line_stop(&mut self, line_id: LineId, stop_id: StopId) -> Result<bool> {
        let state = self.state_mut()?;
        let Some(route) = state.routes.get_mut(&line_id) else {
            return Ok(false);
        };

        let before = route.len();
        route.retain(|link| link.stop_id != stop_id);
        Ok(route.len() != before)
    }

    fn compact_line(&mut self, line_id: LineId) -> Result<()> {
        let state = self.state_mut()?;
        if let Some(route) = state.routes.get_mut(&line_id) {
            route.sort_by_key(|link| link.order);
            for (rank, link) in route.iter_mut().enumerate() {
                link.order = rank as u32 + 1;
            }
        }
        Ok(())
    }

    fn insert_category(&mut self, name: &str) -> Result<Category> {
        let state = self.state_mut()?;
        if let Some(id) = state.category_names.get(name) {
            if let Some(category) = state.categories.get(id) {
                return Ok(category.clone());
            }
        }

        let category = Category {
            id: CategoryId::new(state.next_id()),
            name: name.into(),
        };
        state.category_names.insert(category.name.clone(), category.id);
        state.categories.insert(category.id, category.clone());
        Ok(category)
    }

    fn insert_line(&mut self, new_line: &NewLine) -> Result<Line> {
        let state = self.state_mut()?;
        if !state.categories.contains_key(&new_line.category_id) {
            return Err(NetworkError::CategoryNotFound(new_line.category_id));
        }

        let line = Line {
            id: LineId::new(state.next_id()),
            category_id: new_line.category_id,
            name: new_line.name.as_str().into(),
            number: new_line.number.as_str().into(),
            color: new_line.color.as_deref().map(Into::into),
            start_time: new_line.start_time,
            end_time: new_line.end_time,
            line_type: new_line.line_type.as_deref().map(Into::into),
            description: new_line.description.as_deref().map(Into::into),
            created_at: Utc::now(),
        };
        state.lines.insert(line.id, line.clone());
        Ok(line)
    }

    fn commit(self) -> Result<()> {
        if self.writer.is_some() {
            *self.committed.lock() = self.working;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> (MemoryStore, LineId) {
        let store = MemoryStore::new();
        let mut unit = store.begin_write().unwrap();
        let category = unit.insert_category("Métro").unwrap();
        let line = unit
            .insert_line(&NewLine::new(category.id, "Métro A", "A"))
            .unwrap();
        unit.commit().unwrap();
        (store, line.id)
    }

    #[test]
    fn test_empty_store() {
        let store = MemoryStore::new();
        let unit = store.begin_read().unwrap();
        assert_eq!(unit.list_stops().unwrap().len(), 0);
        assert_eq!(unit.list_lines().unwrap().len(), 0);
        assert_eq!(unit.counts().unwrap(), NetworkStats::default());
    }

    #[test]
    fn test_uncommitted_unit_is_discarded() {
        let (store, line_id) = seeded();

        {
            let mut unit = store.begin_write().unwrap();
            let stop = unit
                .find_or_create_stop_by_name("Capitole", Point::new(1.4442, 43.6045))
                .unwrap();
            unit.insert_line_stop(LineStop { line_id, stop_id: stop.id, order: 1 })
                .unwrap();
            // dropped without commit
        }

        let unit = store.begin_read().unwrap();
        assert!(unit.list_line_stops_ordered(line_id).unwrap().is_empty());
        assert!(unit.list_stops().unwrap().is_empty());
    }

    #[test]
    fn test_reader_keeps_its_snapshot() {
        let (store, line_id) = seeded();
        let reader = store.begin_read().unwrap();

        let mut unit = store.begin_write().unwrap();
        let stop = unit
            .find_or_create_stop_by_name("Capitole", Point::new(1.4442, 43.6045))
            .unwrap();
        unit.insert_line_stop(LineStop { line_id, stop_id: stop.id, order: 1 })
            .unwrap();
        unit.commit().unwrap();

        assert!(reader.list_line_stops_ordered(line_id).unwrap().is_empty());
        let fresh = store.begin_read().unwrap();
        assert_eq!(fresh.list_line_stops_ordered(line_id).unwrap().len(), 1);
    }

    #[test]
    fn test_read_unit_rejects_writes() {
        let store = MemoryStore::new();
        let mut unit = store.begin_read().unwrap();
        let err = unit.insert_category("Bus").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StorageUnavailable);
    }

    #[test]
    fn test_second_writer_times_out() {
        let store = MemoryStore::new().with_writer_timeout(Duration::from_millis(20));
        let _first = store.begin_write().unwrap();

        let err = store.begin_write().err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_stop_reused_by_name() {
        let (store, _) = seeded();
        let mut unit = store.begin_write().unwrap();
        let first = unit
            .find_or_create_stop_by_name("Jean Jaurès", Point::new(1.4483, 43.6068))
            .unwrap();
        let second = unit
            .find_or_create_stop_by_name("Jean Jaurès", Point::new(0.0, 0.0))
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.location, Point::new(1.4483, 43.6068));
    }

    #[test]
    fn test_compact_line() {
        let (store, line_id) = seeded();
        let mut unit = store.begin_write().unwrap();
        for (i, name) in ["A", "B", "C", "D"].iter().enumerate() {
            let stop = unit
                .find_or_create_stop_by_name(name, Point::new(0.0, i as f64))
                .unwrap();
            unit.insert_line_stop(LineStop {
                line_id,
                stop_id: stop.id,
                order: (i as u32 + 1) * 10,
            })
            .unwrap();
        }

        unit.compact_line(line_id).unwrap();
        let orders: Vec<(String, u32)> = unit
            .list_line_stops_ordered(line_id)
            .unwrap()
            .into_iter()
            .map(|s| (s.stop.name.to_string(), s.order))
            .collect();

        assert_eq!(
            orders,
            vec![
                ("A".to_string(), 1),
                ("B".to_string(), 2),
                ("C".to_string(), 3),
                ("D".to_string(), 4),
            ]
        );
    }
}
