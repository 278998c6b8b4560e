#![allow(dead_code)]

use std::time::Duration;

use tempfile::TempDir;
use tissea_network::prelude::*;

pub fn memory_service() -> NetworkService<MemoryStore> {
    NetworkService::new(MemoryStore::new())
}

/// SQLite-backed service on a fresh database file. Keep the `TempDir` alive
/// for as long as the service is used.
pub fn sqlite_service() -> (TempDir, NetworkService<SqliteStore>) {
    let dir = TempDir::new().expect("create temp dir");
    let store = SqliteStore::open(StoreConfig::new(dir.path().join("network.db")))
        .expect("initialize database");
    (dir, NetworkService::new(store))
}

pub fn sqlite_service_with_policy(policy: TransactionPolicy) -> (TempDir, NetworkService<SqliteStore>) {
    let dir = TempDir::new().expect("create temp dir");
    let store = SqliteStore::open(
        StoreConfig::new(dir.path().join("network.db")).with_busy_timeout(Duration::from_secs(10)),
    )
    .expect("initialize database");
    (dir, NetworkService::with_policy(store, policy))
}

pub fn create_line<S: NetworkStore>(service: &NetworkService<S>, number: &str) -> LineId {
    let category = service.create_category("Métro").expect("create category");
    service
        .create_line(&NewLine::new(category.id, format!("Métro {number}"), number))
        .expect("create line")
        .id
}

pub fn attach_all<S: NetworkStore>(
    service: &NetworkService<S>,
    line_id: LineId,
    stops: &[(&str, f64, f64)],
) {
    for (name, lat, lon) in stops {
        service
            .attach_stop(line_id, &NewStop::new(*name, *lat, *lon))
            .expect("attach stop");
    }
}

pub fn route<S: NetworkStore>(service: &NetworkService<S>, line_id: LineId) -> Vec<(String, u32)> {
    service
        .line_stops(line_id)
        .expect("list stops")
        .into_iter()
        .map(|s| (s.stop.name.to_string(), s.order))
        .collect()
}

/// Order keys are exactly 1..=N in listing order.
pub fn assert_gap_free(stops: &[OrderedStop]) {
    let orders: Vec<u32> = stops.iter().map(|s| s.order).collect();
    let expected: Vec<u32> = (1..=stops.len() as u32).collect();
    assert_eq!(orders, expected, "order keys must be 1..=N");
}

pub const ARENES: (&str, f64, f64) = ("Arènes", 43.6097, 1.3887);
pub const BASSO_CAMBO: (&str, f64, f64) = ("Basso Cambo", 43.5835, 1.4089);
pub const CAPITOLE: (&str, f64, f64) = ("Capitole", 43.6045, 1.4442);
