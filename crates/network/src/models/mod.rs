//! Network data models, types, and errors.

pub mod types;

// Re-exports for convenience
pub use types::{
    Category, ErrorKind, Line, LineDetail, LineStop, LineSummary, NetworkError, NetworkStats,
    NewLine, NewStop, OrderedStop, Result, Stop, StopPairDistance,
};
