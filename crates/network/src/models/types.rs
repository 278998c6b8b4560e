//! Core data types and errors for network topology.

use std::sync::Arc;

use chrono::{DateTime, NaiveTime, Utc};
use geo::Point;

use crate::identifiers::*;

// ============================================================================
// Data Structures
// ============================================================================

/// A geo-located point of service, possibly shared by several lines.
///
/// `location` follows the `geo` convention: `x` is longitude, `y` is latitude.
#[derive(Clone, Debug, PartialEq)]
pub struct Stop {
    pub id: StopId,
    pub name: Arc<str>,
    pub location: Point,
}

impl Stop {
    pub fn latitude(&self) -> f64 {
        self.location.y()
    }

    pub fn longitude(&self) -> f64 {
        self.location.x()
    }
}

/// Input for attaching a stop to a line.
///
/// The coordinates are only used when no stop with `name` exists yet.
#[derive(Clone, Debug, PartialEq)]
pub struct NewStop {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl NewStop {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }

    /// Trimmed name and validated location, or `InvalidArgument`.
    pub fn validate(&self) -> Result<(&str, Point)> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(NetworkError::InvalidArgument(
                "stop name must not be blank".into(),
            ));
        }

        let location = crate::spatial::checked_point(self.latitude, self.longitude)?;
        Ok((name, location))
    }
}

/// One position of one stop within one line's route.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineStop {
    pub line_id: LineId,
    pub stop_id: StopId,
    pub order: u32,
}

/// A stop together with its 1-based position on a line.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderedStop {
    pub stop: Stop,
    pub order: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Category {
    pub id: CategoryId,
    pub name: Arc<str>,
}

/// A transit line (e.g., "Métro A", "Linéo 13")
#[derive(Clone, Debug, PartialEq)]
pub struct Line {
    pub id: LineId,
    pub category_id: CategoryId,
    pub name: Arc<str>,
    /// Short public number (e.g., "A", "L13", "14")
    pub number: Arc<str>,
    /// Display color (hex RGB, e.g., "#E2001A")
    pub color: Option<Arc<str>>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub line_type: Option<Arc<str>>,
    pub description: Option<Arc<str>>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a line.
#[derive(Clone, Debug, PartialEq)]
pub struct NewLine {
    pub category_id: CategoryId,
    pub name: String,
    pub number: String,
    pub color: Option<String>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub line_type: Option<String>,
    pub description: Option<String>,
}

impl NewLine {
    pub fn new(category_id: CategoryId, name: impl Into<String>, number: impl Into<String>) -> Self {
        Self {
            category_id,
            name: name.into(),
            number: number.into(),
            color: None,
            start_time: None,
            end_time: None,
            line_type: None,
            description: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() || self.number.trim().is_empty() {
            return Err(NetworkError::InvalidArgument(
                "line name and number must not be blank".into(),
            ));
        }
        Ok(())
    }
}

/// A line with its category name and the number of attached stops.
#[derive(Clone, Debug, PartialEq)]
pub struct LineSummary {
    pub line: Line,
    pub category: Arc<str>,
    pub stops_count: usize,
}

/// A line with its category name and full ordered route.
#[derive(Clone, Debug, PartialEq)]
pub struct LineDetail {
    pub line: Line,
    pub category: Arc<str>,
    pub stops: Vec<OrderedStop>,
}

/// Row counts across the whole network.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NetworkStats {
    pub categories: u64,
    pub lines: u64,
    pub stops: u64,
    pub relations: u64,
}

/// Great-circle distance between two stops, in kilometers.
#[derive(Clone, Debug, PartialEq)]
pub struct StopPairDistance {
    pub from: Stop,
    pub to: Stop,
    pub distance_km: f64,
}

// ============================================================================
// Errors
// ============================================================================

/// Coarse failure classes a caller can act on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    InvalidArgument,
    Conflict,
    StorageUnavailable,
}

#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("Line not found: {0}")]
    LineNotFound(LineId),

    #[error("Stop not found: {0}")]
    StopNotFound(StopId),

    #[error("Category not found: {0}")]
    CategoryNotFound(CategoryId),

    #[error("Stop {stop_id} is not on line {line_id}")]
    StopNotOnLine { line_id: LineId, stop_id: StopId },

    #[error("Stop {stop_id} is already on line {line_id}")]
    StopAlreadyOnLine { line_id: LineId, stop_id: StopId },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage unavailable: {message}")]
    StorageUnavailable {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl NetworkError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::LineNotFound(_)
            | Self::StopNotFound(_)
            | Self::CategoryNotFound(_)
            | Self::StopNotOnLine { .. } => ErrorKind::NotFound,
            Self::StopAlreadyOnLine { .. } | Self::InvalidArgument(_) => {
                ErrorKind::InvalidArgument
            }
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::StorageUnavailable { .. } => ErrorKind::StorageUnavailable,
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageUnavailable {
            message: message.into(),
            source: None,
        }
    }
}

pub type Result<T> = std::result::Result<T, NetworkError>;
