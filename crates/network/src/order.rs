//! Ordered line/stop relation.
//!
//! For every line the attached stops carry order keys exactly `1..=N`.
//! Attaching appends at `N + 1`; detaching removes one stop and renumbers the
//! survivors so no gap is left behind. Both run inside a
//! [`ConsistencyTransaction`] scoped to the line.

use std::sync::Arc;

use tracing::debug;

use crate::config::TransactionPolicy;
use crate::identifiers::*;
use crate::models::types::*;
use crate::store::{NetworkStore, StoreUnit};
use crate::transaction::ConsistencyTransaction;

pub struct StopOrderStore<S> {
    tx: ConsistencyTransaction<S>,
}

impl<S: NetworkStore> StopOrderStore<S> {
    pub fn new(store: Arc<S>, policy: TransactionPolicy) -> Self {
        Self {
            tx: ConsistencyTransaction::new(store, policy),
        }
    }

    pub fn transactions(&self) -> &ConsistencyTransaction<S> {
        &self.tx
    }

    /// Append a stop to the end of a line.
    ///
    /// The stop is looked up by name and created with the given coordinates
    /// only if no stop with that name exists yet.
    pub fn attach(&self, line_id: LineId, new_stop: &NewStop) -> Result<OrderedStop> {
        let (name, location) = new_stop.validate()?;

        let attached = self.tx.run_on_line(line_id, |unit| {
            if unit.find_line(line_id)?.is_none() {
                return Err(NetworkError::LineNotFound(line_id));
            }

            let stop = unit.find_or_create_stop_by_name(name, location)?;
            let order = unit.max_order(line_id)?.unwrap_or(0) + 1;
            unit.insert_line_stop(LineStop {
                line_id,
                stop_id: stop.id,
                order,
            })?;

            Ok(OrderedStop { stop, order })
        })?;

        debug!(
            line = line_id.get(),
            stop = attached.stop.id.get(),
            order = attached.order,
            "attached stop"
        );
        Ok(attached)
    }

    /// Remove a stop from a line and close the gap it leaves.
    pub fn detach(&self, line_id: LineId, stop_id: StopId) -> Result<()> {
        self.tx.run_on_line(line_id, |unit| {
            if unit.find_line(line_id)?.is_none() {
                return Err(NetworkError::LineNotFound(line_id));
            }
            if !unit.delete_line_stop(line_id, stop_id)? {
                return Err(NetworkError::StopNotOnLine { line_id, stop_id });
            }
            unit.compact_line(line_id)
        })?;

        debug!(line = line_id.get(), stop = stop_id.get(), "detached stop");
        Ok(())
    }

    /// Stops of a line in ascending order.
    ///
    /// `LineNotFound` for an unknown line; an empty list for a line without
    /// stops.
    pub fn list_ordered(&self, line_id: LineId) -> Result<Vec<OrderedStop>> {
        self.tx.read(|unit| {
            let stops = unit.list_line_stops_ordered(line_id)?;
            if stops.is_empty() && unit.find_line(line_id)?.is_none() {
                return Err(NetworkError::LineNotFound(line_id));
            }
            Ok(stops)
        })
    }
}
