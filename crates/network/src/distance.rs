//! Route lengths over ordered stop sequences.
//!
//! Distances are great-circle kilometers rounded to two decimals.

use crate::identifiers::*;
use crate::models::types::*;
use crate::order::StopOrderStore;
use crate::spatial::{haversine_km, path_length_km, round_km};
use crate::store::{NetworkStore, StoreUnit};

pub struct LineDistanceCalculator<'a, S> {
    orders: &'a StopOrderStore<S>,
}

impl<'a, S: NetworkStore> LineDistanceCalculator<'a, S> {
    pub fn new(orders: &'a StopOrderStore<S>) -> Self {
        Self { orders }
    }

    /// Total length of a line, following its stops in order.
    ///
    /// Zero for a line with fewer than two stops.
    pub fn total_distance_km(&self, line_id: LineId) -> Result<f64> {
        let stops = self.orders.list_ordered(line_id)?;
        let length = path_length_km(stops.iter().map(|s| s.stop.location));
        Ok(round_km(length))
    }

    /// Direct distance between two stops, whatever lines they belong to.
    pub fn stop_distance(&self, from: StopId, to: StopId) -> Result<StopPairDistance> {
        self.orders.transactions().read(|unit| {
            let from = unit
                .find_stop(from)?
                .ok_or(NetworkError::StopNotFound(from))?;
            let to = unit.find_stop(to)?.ok_or(NetworkError::StopNotFound(to))?;

            let distance_km = round_km(haversine_km(from.location, to.location));
            Ok(StopPairDistance {
                from,
                to,
                distance_km,
            })
        })
    }
}
