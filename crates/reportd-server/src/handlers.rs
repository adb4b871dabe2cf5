//! HTTP handlers for the log endpoints.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use reportd_store::{ClearOutcome, LogQuery, LogStats};

use crate::error::ApiError;
use crate::server::AppState;

/// Record cap when the caller leaves `limit` unset at the HTTP surface.
pub const HTTP_QUERY_LIMIT: usize = 500;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsParams {
    pub level: Option<String>,
    pub search: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub limit: Option<usize>,
}

/// `GET /logs` — filtered query, newest first.
pub async fn logs_query(
    State(state): State<AppState>,
    Query(params): Query<LogsParams>,
) -> Result<Json<Value>, ApiError> {
    let query = LogQuery {
        level: params.level,
        search: params.search,
        start_date: params.start_date,
        end_date: params.end_date,
        limit: Some(params.limit.unwrap_or(HTTP_QUERY_LIMIT)),
    };

    let out = state.store.query(&query).map_err(ApiError::query_failed)?;

    let mut meta = Map::new();
    meta.insert("total".into(), json!(out.total));
    meta.insert("returned".into(), json!(out.returned));
    state.writer.info("Logs fetched", meta);

    Ok(Json(json!({
        "logs": out.records,
        "total": out.total,
        "returned": out.returned,
    })))
}

/// `GET /logs/stats` — aggregate counts over the whole file.
pub async fn logs_stats(State(state): State<AppState>) -> Result<Json<LogStats>, ApiError> {
    let stats = state.store.stats().map_err(ApiError::stats_failed)?;
    Ok(Json(stats))
}

/// `DELETE /logs/clear` — snapshot to a backup file, then truncate.
pub async fn logs_clear(State(state): State<AppState>) -> Result<Json<ClearOutcome>, ApiError> {
    let out = state.store.clear().map_err(ApiError::clear_failed)?;

    let mut meta = Map::new();
    if let Some(backup) = &out.backup {
        meta.insert("backup".into(), json!(backup.display().to_string()));
    }
    state.writer.warn("Logs cleared", meta);

    Ok(Json(out))
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}
