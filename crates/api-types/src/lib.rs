//! JSON bodies exchanged over the `/api` HTTP surface.
//!
//! Field names are camelCase on the wire.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Unit tag attached to every distance response.
pub const DISTANCE_UNIT: &str = "km";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopResponse {
    pub id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// A stop as it sits on a line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineStopResponse {
    pub id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachStopRequest {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineDistanceResponse {
    pub line_id: i64,
    pub distance: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopDistanceResponse {
    pub stop1: StopResponse,
    pub stop2: StopResponse,
    pub distance: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineResponse {
    pub id: i64,
    pub category_id: i64,
    pub category: String,
    pub name: String,
    pub number: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub start_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub end_time: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub line_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineSummaryResponse {
    #[serde(flatten)]
    pub line: LineResponse,
    pub stops_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineDetailResponse {
    #[serde(flatten)]
    pub line: LineResponse,
    pub stops: Vec<LineStopResponse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryLinesResponse {
    pub category: CategoryResponse,
    pub lines: Vec<LineResponse>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub categories: u64,
    pub lines: u64,
    pub stops: u64,
    pub relations: u64,
}

/// Error category reported alongside every failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKindResponse {
    NotFound,
    InvalidArgument,
    Conflict,
    StorageUnavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    pub kind: ErrorKindResponse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_distance_body_shape() {
        let body = LineDistanceResponse {
            line_id: 1,
            distance: 3.34,
            unit: DISTANCE_UNIT.to_string(),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({ "lineId": 1, "distance": 3.34, "unit": "km" })
        );
    }

    #[test]
    fn test_line_summary_is_flat() {
        let summary = LineSummaryResponse {
            line: LineResponse {
                id: 2,
                category_id: 1,
                category: "Métro".into(),
                name: "Métro A".into(),
                number: "A".into(),
                color: Some("#E3007A".into()),
                start_time: NaiveTime::from_hms_opt(5, 15, 0),
                end_time: None,
                line_type: None,
                description: None,
            },
            stops_count: 18,
        };

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["categoryId"], 1);
        assert_eq!(value["startTime"], "05:15:00");
        assert_eq!(value["stopsCount"], 18);
        assert!(value.get("endTime").is_none());
        assert!(value.get("line").is_none());
    }

    #[test]
    fn test_error_kind_wire_names() {
        let body = ErrorResponse {
            error: "line 4 not found".into(),
            kind: ErrorKindResponse::StorageUnavailable,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({ "error": "line 4 not found", "kind": "storageUnavailable" })
        );
    }

    #[test]
    fn test_attach_request_parses() {
        let request: AttachStopRequest = serde_json::from_value(json!({
            "name": "Capitole",
            "latitude": 43.6045,
            "longitude": 1.4442
        }))
        .unwrap();
        assert_eq!(request.name, "Capitole");
    }
}
