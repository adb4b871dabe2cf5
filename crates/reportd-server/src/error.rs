//! Coded JSON error envelope shared by all handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use reportd_store::StoreError;

/// An error response: `{"error": <message>, "code": <CODE>}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn query_failed(e: StoreError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "LOG_001",
            message: format!("failed to load logs: {e}"),
        }
    }

    pub fn stats_failed(e: StoreError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "LOG_002",
            message: format!("failed to load log stats: {e}"),
        }
    }

    pub fn clear_failed(e: StoreError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "LOG_003",
            message: format!("failed to clear logs: {e}"),
        }
    }

    pub fn ip_restricted() -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            code: "AUTHZ_003",
            message: "admin endpoints are restricted to the local machine".into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "code": self.code,
        }));
        (self.status, body).into_response()
    }
}
