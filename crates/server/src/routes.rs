use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tissea_api_types::*;
use tissea_network::{CategoryId, LineId, NetworkService, NetworkStore, NewStop, StopId};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::convert;
use crate::error::ApiError;

type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn create_router<S: NetworkStore + 'static>(service: Arc<NetworkService<S>>) -> Router {
    let api = Router::new()
        .route("/lines", get(lines::<S>))
        .route("/lines/{id}", get(line::<S>))
        .route("/lines/{id}/stops", get(line_stops::<S>).post(attach_stop::<S>))
        .route("/lines/{id}/stops/{stop_id}", axum::routing::delete(detach_stop::<S>))
        .route("/stops", get(stops::<S>))
        .route("/categories/{id}/lines", get(category_lines::<S>))
        .route("/stats", get(stats::<S>))
        .route("/stats/distance/lines/{id}", get(line_distance::<S>))
        .route("/stats/distance/stops/{from}/{to}", get(stop_distance::<S>))
        .route("/health", get(health));

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(service)
}

/// Run a core call on the blocking pool; the core is synchronous.
async fn blocking<S, T>(
    service: &Arc<NetworkService<S>>,
    call: impl FnOnce(&NetworkService<S>) -> tissea_network::Result<T> + Send + 'static,
) -> Result<T, ApiError>
where
    S: NetworkStore + 'static,
    T: Send + 'static,
{
    let service = Arc::clone(service);
    let value = tokio::task::spawn_blocking(move || call(&service)).await??;
    Ok(value)
}

async fn lines<S: NetworkStore + 'static>(
    State(service): State<Arc<NetworkService<S>>>,
) -> ApiResult<Vec<LineSummaryResponse>> {
    let lines = blocking(&service, |s| s.lines()).await?;
    Ok(Json(lines.iter().map(convert::line_summary).collect()))
}

async fn line<S: NetworkStore + 'static>(
    State(service): State<Arc<NetworkService<S>>>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<LineDetailResponse> {
    let Path(id) = path?;
    let detail = blocking(&service, move |s| s.line(LineId::new(id))).await?;
    Ok(Json(convert::line_detail(&detail)))
}

async fn line_stops<S: NetworkStore + 'static>(
    State(service): State<Arc<NetworkService<S>>>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Vec<LineStopResponse>> {
    let Path(id) = path?;
    let stops = blocking(&service, move |s| s.line_stops(LineId::new(id))).await?;
    Ok(Json(stops.iter().map(convert::line_stop).collect()))
}

async fn attach_stop<S: NetworkStore + 'static>(
    State(service): State<Arc<NetworkService<S>>>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<AttachStopRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LineStopResponse>), ApiError> {
    let Path(id) = path?;
    let Json(request) = body?;
    let stop = NewStop::new(request.name, request.latitude, request.longitude);

    let attached = blocking(&service, move |s| s.attach_stop(LineId::new(id), &stop)).await?;
    Ok((StatusCode::CREATED, Json(convert::line_stop(&attached))))
}

async fn detach_stop<S: NetworkStore + 'static>(
    State(service): State<Arc<NetworkService<S>>>,
    path: Result<Path<(i64, i64)>, PathRejection>,
) -> ApiResult<MessageResponse> {
    let Path((line_id, stop_id)) = path?;
    blocking(&service, move |s| {
        s.detach_stop(LineId::new(line_id), StopId::new(stop_id))
    })
    .await?;

    Ok(Json(MessageResponse {
        message: "stop removed and line renumbered".to_string(),
    }))
}

async fn stops<S: NetworkStore + 'static>(
    State(service): State<Arc<NetworkService<S>>>,
) -> ApiResult<Vec<StopResponse>> {
    let stops = blocking(&service, |s| s.stops()).await?;
    Ok(Json(stops.iter().map(convert::stop).collect()))
}

async fn category_lines<S: NetworkStore + 'static>(
    State(service): State<Arc<NetworkService<S>>>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<CategoryLinesResponse> {
    let Path(id) = path?;
    let (category, lines) = blocking(&service, move |s| s.category_lines(CategoryId::new(id))).await?;
    Ok(Json(convert::category_lines(&category, &lines)))
}

async fn stats<S: NetworkStore + 'static>(
    State(service): State<Arc<NetworkService<S>>>,
) -> ApiResult<StatsResponse> {
    let stats = blocking(&service, |s| s.stats()).await?;
    Ok(Json(convert::stats(stats)))
}

async fn line_distance<S: NetworkStore + 'static>(
    State(service): State<Arc<NetworkService<S>>>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<LineDistanceResponse> {
    let Path(id) = path?;
    let distance = blocking(&service, move |s| s.line_distance_km(LineId::new(id))).await?;
    Ok(Json(LineDistanceResponse {
        line_id: id,
        distance,
        unit: DISTANCE_UNIT.to_string(),
    }))
}

async fn stop_distance<S: NetworkStore + 'static>(
    State(service): State<Arc<NetworkService<S>>>,
    path: Result<Path<(i64, i64)>, PathRejection>,
) -> ApiResult<StopDistanceResponse> {
    let Path((from, to)) = path?;
    let pair = blocking(&service, move |s| {
        s.stop_distance(StopId::new(from), StopId::new(to))
    })
    .await?;

    Ok(Json(StopDistanceResponse {
        stop1: convert::stop(&pair.from),
        stop2: convert::stop(&pair.to),
        distance: pair.distance_km,
        unit: DISTANCE_UNIT.to_string(),
    }))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
