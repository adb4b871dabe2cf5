//! Request logging through the application log file (distinct from the
//! `tracing` diagnostics channel): one `info` entry on the way in, one on the
//! way out with status and duration.

use std::time::Instant;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use serde_json::{json, Map};

use crate::server::AppState;

pub async fn request_logger(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let mut meta = Map::new();
    meta.insert("method".into(), json!(method.as_str()));
    meta.insert("path".into(), json!(path.clone()));
    state.writer.info("Incoming request", meta);

    let response = next.run(req).await;

    let mut meta = Map::new();
    meta.insert("method".into(), json!(method.as_str()));
    meta.insert("path".into(), json!(path));
    meta.insert("statusCode".into(), json!(response.status().as_u16()));
    meta.insert(
        "duration".into(),
        json!(format!("{}ms", started.elapsed().as_millis())),
    );
    state.writer.info("Outgoing response", meta);

    response
}
