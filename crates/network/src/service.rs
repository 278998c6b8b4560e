//! Entry point used by the HTTP layer and tools.
//!
//! [`NetworkService`] owns one storage handle and exposes every operation on
//! the network: the ordered stop relation, distances, and the catalog reads
//! and inserts around them.

use std::sync::Arc;

use crate::config::TransactionPolicy;
use crate::distance::LineDistanceCalculator;
use crate::identifiers::*;
use crate::models::types::*;
use crate::order::StopOrderStore;
use crate::store::{NetworkStore, StoreUnit};

pub struct NetworkService<S> {
    orders: StopOrderStore<S>,
}

impl<S: NetworkStore> NetworkService<S> {
    pub fn new(store: S) -> Self {
        Self::with_policy(store, TransactionPolicy::default())
    }

    pub fn with_policy(store: S, policy: TransactionPolicy) -> Self {
        Self {
            orders: StopOrderStore::new(Arc::new(store), policy),
        }
    }

    pub fn store(&self) -> &S {
        self.orders.transactions().store()
    }

    pub fn orders(&self) -> &StopOrderStore<S> {
        &self.orders
    }

    fn distances(&self) -> LineDistanceCalculator<'_, S> {
        LineDistanceCalculator::new(&self.orders)
    }

    // ---- Ordered relation ----

    pub fn attach_stop(&self, line_id: LineId, stop: &NewStop) -> Result<OrderedStop> {
        self.orders.attach(line_id, stop)
    }

    pub fn detach_stop(&self, line_id: LineId, stop_id: StopId) -> Result<()> {
        self.orders.detach(line_id, stop_id)
    }

    pub fn line_stops(&self, line_id: LineId) -> Result<Vec<OrderedStop>> {
        self.orders.list_ordered(line_id)
    }

    // ---- Distances ----

    pub fn line_distance_km(&self, line_id: LineId) -> Result<f64> {
        self.distances().total_distance_km(line_id)
    }

    pub fn stop_distance(&self, from: StopId, to: StopId) -> Result<StopPairDistance> {
        self.distances().stop_distance(from, to)
    }

    // ---- Catalog ----

    pub fn lines(&self) -> Result<Vec<LineSummary>> {
        self.orders.transactions().read(|unit| unit.list_lines())
    }

    pub fn line(&self, line_id: LineId) -> Result<LineDetail> {
        self.orders.transactions().read(|unit| {
            let line = unit
                .find_line(line_id)?
                .ok_or(NetworkError::LineNotFound(line_id))?;
            let category = unit
                .find_category(line.category_id)?
                .map(|c| c.name)
                .unwrap_or_else(|| "".into());
            let stops = unit.list_line_stops_ordered(line_id)?;

            Ok(LineDetail {
                line,
                category,
                stops,
            })
        })
    }

    pub fn stops(&self) -> Result<Vec<Stop>> {
        self.orders.transactions().read(|unit| unit.list_stops())
    }

    pub fn category_lines(&self, category_id: CategoryId) -> Result<(Category, Vec<Line>)> {
        self.orders.transactions().read(|unit| {
            let category = unit
                .find_category(category_id)?
                .ok_or(NetworkError::CategoryNotFound(category_id))?;
            let lines = unit.lines_in_category(category_id)?;
            Ok((category, lines))
        })
    }

    pub fn stats(&self) -> Result<NetworkStats> {
        self.orders.transactions().read(|unit| unit.counts())
    }

    pub fn create_category(&self, name: &str) -> Result<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(NetworkError::InvalidArgument(
                "category name must not be blank".into(),
            ));
        }
        self.orders
            .transactions()
            .run(|unit| unit.insert_category(name))
    }

    pub fn create_line(&self, line: &NewLine) -> Result<Line> {
        line.validate()?;
        self.orders.transactions().run(|unit| unit.insert_line(line))
    }
}
