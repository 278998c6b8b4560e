//! # tissea-network
//!
//! Transit network topology: lines made of ordered, geo-located stops.
//!
//! ## Features
//!
//! - **Gap-free ordering**: every line's stops carry order keys exactly `1..=N`
//! - **Atomic mutations**: attach and detach commit fully or not at all
//! - **Line-scoped locking**: one order-mutating transaction per line at a time
//! - **Pluggable storage**: SQLite on disk, or an in-memory store
//! - **Route lengths**: haversine kilometers over a line's stop sequence
//!
//! ## Example
//!
//! ```
//! use tissea_network::prelude::*;
//!
//! let service = NetworkService::new(MemoryStore::new());
//!
//! let metro = service.create_category("Métro").unwrap();
//! let line = service.create_line(&NewLine::new(metro.id, "Métro A", "A")).unwrap();
//!
//! service.attach_stop(line.id, &NewStop::new("Arènes", 43.6097, 1.3887)).unwrap();
//! let last = service.attach_stop(line.id, &NewStop::new("Basso Cambo", 43.5835, 1.4089)).unwrap();
//! assert_eq!(last.order, 2);
//!
//! assert_eq!(service.line_distance_km(line.id).unwrap(), 3.34);
//! ```

pub mod config;
pub mod distance;
pub mod identifiers;
pub mod models;
pub mod order;
pub mod service;
pub mod spatial;
pub mod store;
pub mod transaction;

// Re-exports for convenience
pub mod prelude {
    pub use crate::config::{StoreConfig, TransactionPolicy};
    pub use crate::distance::LineDistanceCalculator;
    pub use crate::identifiers::*;
    pub use crate::models::types::*;
    pub use crate::order::StopOrderStore;
    pub use crate::service::NetworkService;
    pub use crate::store::{MemoryStore, NetworkStore, SqliteStore, StoreUnit};
    pub use crate::transaction::ConsistencyTransaction;
}

pub use prelude::*;
