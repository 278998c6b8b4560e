use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tissea_api_types::{ErrorKindResponse, ErrorResponse};
use tissea_network::{ErrorKind, NetworkError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error("{0}")]
    BadRequest(String),
    #[error("worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKindResponse {
        match self {
            ApiError::Network(err) => match err.kind() {
                ErrorKind::NotFound => ErrorKindResponse::NotFound,
                ErrorKind::InvalidArgument => ErrorKindResponse::InvalidArgument,
                ErrorKind::Conflict => ErrorKindResponse::Conflict,
                ErrorKind::StorageUnavailable => ErrorKindResponse::StorageUnavailable,
            },
            ApiError::BadRequest(_) => ErrorKindResponse::InvalidArgument,
            ApiError::Worker(_) => ErrorKindResponse::StorageUnavailable,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.kind() {
            ErrorKindResponse::NotFound => StatusCode::NOT_FOUND,
            ErrorKindResponse::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorKindResponse::Conflict => StatusCode::CONFLICT,
            ErrorKindResponse::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }

        let body = ErrorResponse {
            error: self.to_string(),
            kind: self.kind(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tissea_network::{LineId, StopId};

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::from(NetworkError::LineNotFound(LineId::new(1))), StatusCode::NOT_FOUND),
            (
                ApiError::from(NetworkError::StopNotOnLine {
                    line_id: LineId::new(1),
                    stop_id: StopId::new(2),
                }),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::from(NetworkError::InvalidArgument("latitude".into())),
                StatusCode::BAD_REQUEST,
            ),
            (ApiError::BadRequest("not a number".into()), StatusCode::BAD_REQUEST),
            (
                ApiError::from(NetworkError::Conflict("line 1 locked".into())),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::from(NetworkError::storage("disk I/O error")),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(error.status(), status, "{error}");
        }
    }

    #[test]
    fn test_error_body() {
        let response = ApiError::from(NetworkError::LineNotFound(LineId::new(4))).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
