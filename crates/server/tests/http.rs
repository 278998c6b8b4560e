//! Round trips through a live server bound to an ephemeral port.

use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde_json::{Value, json};
use tempfile::TempDir;
use tissea_api_types::*;
use tissea_network::{NetworkService, NewLine, SqliteStore, StoreConfig};
use tissea_server::ApiServer;

struct Fixture {
    server: ApiServer,
    client: Client,
    line_id: i64,
    _dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::open(StoreConfig::new(dir.path().join("network.db"))).unwrap();
        let service = NetworkService::new(store);

        let metro = service.create_category("Métro").unwrap();
        let line = service
            .create_line(&NewLine::new(metro.id, "Métro A", "A"))
            .unwrap();

        let server = ApiServer::start(Arc::new(service), "127.0.0.1:0".parse().unwrap()).unwrap();
        Self {
            server,
            client: Client::new(),
            line_id: line.id.get(),
            _dir: dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}/api{path}", self.server.addr())
    }

    fn attach(&self, name: &str, latitude: f64, longitude: f64) -> LineStopResponse {
        let response = self
            .client
            .post(self.url(&format!("/lines/{}/stops", self.line_id)))
            .json(&AttachStopRequest {
                name: name.to_string(),
                latitude,
                longitude,
            })
            .send()
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        response.json().unwrap()
    }
}

#[test]
fn test_attach_list_and_measure() {
    let fx = Fixture::new();

    let first = fx.attach("Arènes", 43.6097, 1.3887);
    let second = fx.attach("Basso Cambo", 43.5835, 1.4089);
    assert_eq!((first.order, second.order), (1, 2));

    let stops: Vec<LineStopResponse> = fx
        .client
        .get(fx.url(&format!("/lines/{}/stops", fx.line_id)))
        .send()
        .unwrap()
        .json()
        .unwrap();
    assert_eq!(stops, vec![first.clone(), second.clone()]);

    let distance: Value = fx
        .client
        .get(fx.url(&format!("/stats/distance/lines/{}", fx.line_id)))
        .send()
        .unwrap()
        .json()
        .unwrap();
    assert_eq!(
        distance,
        json!({ "lineId": fx.line_id, "distance": 3.34, "unit": "km" })
    );

    let pair: StopDistanceResponse = fx
        .client
        .get(fx.url(&format!("/stats/distance/stops/{}/{}", second.id, first.id)))
        .send()
        .unwrap()
        .json()
        .unwrap();
    assert_eq!(pair.stop1.name, "Basso Cambo");
    assert_eq!(pair.distance, 3.34);
}

#[test]
fn test_detach_renumbers() {
    let fx = Fixture::new();
    let a = fx.attach("A", 43.60, 1.40);
    fx.attach("B", 43.61, 1.41);
    fx.attach("C", 43.62, 1.42);

    let response = fx
        .client
        .delete(fx.url(&format!("/lines/{}/stops/{}", fx.line_id, a.id)))
        .send()
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: MessageResponse = response.json().unwrap();
    assert!(!body.message.is_empty());

    let detail: LineDetailResponse = fx
        .client
        .get(fx.url(&format!("/lines/{}", fx.line_id)))
        .send()
        .unwrap()
        .json()
        .unwrap();
    let route: Vec<(String, u32)> = detail.stops.into_iter().map(|s| (s.name, s.order)).collect();
    assert_eq!(route, vec![("B".to_string(), 1), ("C".to_string(), 2)]);

    let again = fx
        .client
        .delete(fx.url(&format!("/lines/{}/stops/{}", fx.line_id, a.id)))
        .send()
        .unwrap();
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
}

#[test]
fn test_error_statuses() {
    let fx = Fixture::new();

    let missing = fx.client.get(fx.url("/lines/999/stops")).send().unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let body: ErrorResponse = missing.json().unwrap();
    assert_eq!(body.kind, ErrorKindResponse::NotFound);

    let bad_id = fx.client.get(fx.url("/lines/abc/stops")).send().unwrap();
    assert_eq!(bad_id.status(), StatusCode::BAD_REQUEST);

    let bad_latitude = fx
        .client
        .post(fx.url(&format!("/lines/{}/stops", fx.line_id)))
        .json(&json!({ "name": "Pole", "latitude": 91.0, "longitude": 0.0 }))
        .send()
        .unwrap();
    assert_eq!(bad_latitude.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = bad_latitude.json().unwrap();
    assert_eq!(body.kind, ErrorKindResponse::InvalidArgument);

    let missing_field = fx
        .client
        .post(fx.url(&format!("/lines/{}/stops", fx.line_id)))
        .json(&json!({ "name": "Capitole" }))
        .send()
        .unwrap();
    assert_eq!(missing_field.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn test_catalog_endpoints() {
    let fx = Fixture::new();
    fx.attach("Capitole", 43.6045, 1.4442);

    let health: HealthResponse = fx.client.get(fx.url("/health")).send().unwrap().json().unwrap();
    assert_eq!(health.status, "ok");

    let lines: Vec<LineSummaryResponse> =
        fx.client.get(fx.url("/lines")).send().unwrap().json().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].stops_count, 1);
    assert_eq!(lines[0].line.category, "Métro");

    let stats: StatsResponse = fx.client.get(fx.url("/stats")).send().unwrap().json().unwrap();
    assert_eq!(
        stats,
        StatsResponse {
            categories: 1,
            lines: 1,
            stops: 1,
            relations: 1,
        }
    );

    let category: CategoryLinesResponse = fx
        .client
        .get(fx.url(&format!("/categories/{}/lines", lines[0].line.category_id)))
        .send()
        .unwrap()
        .json()
        .unwrap();
    assert_eq!(category.category.name, "Métro");
    assert_eq!(category.lines[0].number, "A");

    let stops: Vec<StopResponse> = fx.client.get(fx.url("/stops")).send().unwrap().json().unwrap();
    assert_eq!(stops[0].name, "Capitole");
}
