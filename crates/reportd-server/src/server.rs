use std::net::SocketAddr;
use std::path::PathBuf;

use axum::middleware;
use axum::routing::{delete, get};
use axum::Router;
use serde_json::{json, Map};
use tower_http::cors::CorsLayer;

use reportd_store::{LogStore, LogWriter};

use crate::{gate, handlers, request_log};

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    /// The application log file; parent directory is created on first use.
    pub log_file: PathBuf,
    /// Skip the loopback check on the admin routes.
    pub allow_remote_admin: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            log_file: PathBuf::from("logs/app.log"),
            allow_remote_admin: false,
        }
    }
}

/// Shared application state passed to Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: LogStore,
    pub writer: LogWriter,
    pub allow_remote_admin: bool,
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/logs", get(handlers::logs_query))
        .route("/logs/stats", get(handlers::logs_stats))
        .route("/logs/clear", delete(handlers::logs_clear))
        .layer(middleware::from_fn_with_state(state.clone(), gate::admin_only));

    Router::new()
        .merge(admin)
        .route("/health", get(handlers::health))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            request_log::request_logger,
        ))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// Create and start the server. Returns a handle to it.
pub async fn start(config: ServerConfig) -> Result<ServerHandle, std::io::Error> {
    let writer = LogWriter::new(&config.log_file);
    let store = LogStore::new(&config.log_file);

    let state = AppState {
        store: store.clone(),
        writer: writer.clone(),
        allow_remote_admin: config.allow_remote_admin,
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(port = local_addr.port(), "reportd server started");

    let mut meta = Map::new();
    meta.insert("host".into(), json!("0.0.0.0"));
    meta.insert("port".into(), json!(local_addr.port()));
    writer.info("Server started successfully", meta);

    let server_handle = tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .ok();
    });

    Ok(ServerHandle {
        port: local_addr.port(),
        store,
        writer,
        _server: server_handle,
    })
}

/// Handle returned by `start()` — keeps the server task alive and exposes
/// the log channels for shutdown flushing and direct writes.
pub struct ServerHandle {
    pub port: u16,
    pub store: LogStore,
    pub writer: LogWriter,
    _server: tokio::task::JoinHandle<()>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use reportd_store::LogQuery;

    fn test_config() -> ServerConfig {
        let dir =
            std::env::temp_dir().join(format!("reportd-test-server-{}", uuid::Uuid::now_v7()));
        ServerConfig {
            port: 0, // random port
            log_file: dir.join("app.log"),
            allow_remote_admin: false,
        }
    }

    #[tokio::test]
    async fn server_starts_and_serves_health() {
        let handle = start(test_config()).await.unwrap();
        assert!(handle.port > 0);

        let url = format!("http://127.0.0.1:{}/health", handle.port);
        let resp = reqwest::get(&url).await.unwrap();
        assert_eq!(resp.status(), 200);

        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn logs_endpoint_returns_written_records() {
        let handle = start(test_config()).await.unwrap();

        handle.writer.error("DB failed", serde_json::Map::new());
        handle.writer.flush().await;

        let url = format!("http://127.0.0.1:{}/logs?level=error", handle.port);
        let body: serde_json::Value = reqwest::get(&url).await.unwrap().json().await.unwrap();

        assert_eq!(body["total"], 1);
        assert_eq!(body["returned"], 1);
        assert_eq!(body["logs"][0]["message"], "DB failed");
        assert_eq!(body["logs"][0]["level"], "error");
        assert_eq!(body["logs"][0]["meta"], serde_json::json!({}));
    }

    #[tokio::test]
    async fn logs_endpoint_accepts_search_and_camel_case_dates() {
        let handle = start(test_config()).await.unwrap();

        let mut meta = serde_json::Map::new();
        meta.insert("template".into(), serde_json::json!("quarterly"));
        handle.writer.warn("Render slow", meta);
        handle.writer.flush().await;

        let url = format!(
            "http://127.0.0.1:{}/logs?search=quarterly&startDate=2020-01-01&endDate=2099-01-01",
            handle.port
        );
        let body: serde_json::Value = reqwest::get(&url).await.unwrap().json().await.unwrap();

        assert_eq!(body["total"], 1);
        assert_eq!(body["logs"][0]["message"], "Render slow");
    }

    #[tokio::test]
    async fn stats_endpoint_counts_by_level() {
        let handle = start(test_config()).await.unwrap();

        handle.writer.error("boom", serde_json::Map::new());
        handle.writer.flush().await;

        let url = format!("http://127.0.0.1:{}/logs/stats", handle.port);
        let body: serde_json::Value = reqwest::get(&url).await.unwrap().json().await.unwrap();

        assert_eq!(body["byLevel"]["error"], 1);
        // startup + request logging also land in the file
        assert!(body["total"].as_u64().unwrap() >= 1);
        assert!(body["fileSize"].as_u64().unwrap() > 0);
    }

    #[tokio::test]
    async fn clear_endpoint_backs_up_and_truncates() {
        let handle = start(test_config()).await.unwrap();

        handle.writer.info("about to vanish", serde_json::Map::new());
        handle.writer.flush().await;

        let client = reqwest::Client::new();
        let url = format!("http://127.0.0.1:{}/logs/clear", handle.port);
        let body: serde_json::Value = client
            .delete(&url)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["success"], true);
        let backup = body["backup"].as_str().expect("backup path in response");
        let backup_content = std::fs::read_to_string(backup).unwrap();
        assert!(backup_content.contains("about to vanish"));

        // pre-clear entries are gone from the primary file
        handle.writer.flush().await;
        let out = handle
            .store
            .query(&LogQuery {
                search: Some("about to vanish".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(out.total, 0);
    }

    #[test]
    fn default_config_points_at_the_standard_log_file() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_file, PathBuf::from("logs/app.log"));
        assert!(!config.allow_remote_admin);
    }
}
