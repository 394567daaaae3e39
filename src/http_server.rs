use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use serde_json::{Value, json};
use std::{
    net::SocketAddr,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::{
    config::ValidatorConfig,
    dns::{enums::DNSResourceType, name::Name},
    metrics::ValidatorMetrics,
    session::validate_once,
    statlog::StatLog,
};

/// HTTP server for health, statistics and on-demand validation
pub struct HttpServer {
    state: AppState,
    bind_addr: SocketAddr,
}

impl HttpServer {
    pub fn new(
        config: Arc<ValidatorConfig>,
        metrics: Arc<ValidatorMetrics>,
        statlog: Option<Arc<StatLog>>,
        bind_addr: SocketAddr,
    ) -> Self {
        Self {
            state: AppState {
                config,
                metrics,
                statlog,
            },
            bind_addr,
        }
    }

    /// Start the HTTP server and run until ctrl-c
    pub async fn start(self) -> Result<(), Box<dyn std::error::Error>> {
        let app = router(self.state);

        info!("Starting HTTP server on {}", self.bind_addr);

        let listener = tokio::net::TcpListener::bind(self.bind_addr).await?;

        let shutdown_signal = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for ctrl-c: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Shutting down HTTP server");
        };

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await?;

        Ok(())
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ValidatorConfig>,
    pub metrics: Arc<ValidatorMetrics>,
    pub statlog: Option<Arc<StatLog>>,
}

/// Body of a completed `/validate` request
#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub name: String,
    #[serde(rename = "type")]
    pub rtype: String,
    pub state: &'static str,
    pub reason: Option<String>,
    pub records: Vec<String>,
}

/// Routes of the status server, without binding a socket
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/stats", get(server_stats))
        .route("/metrics", get(prometheus_metrics))
        .route("/validate/{name}/{rtype}", get(validate_name))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// Basic health check endpoint
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "healthy"})))
}

/// Flat JSON counters plus the current time
async fn server_stats(State(state): State<AppState>) -> impl IntoResponse {
    let mut counters = state.metrics.json_counters();
    let epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    counters.insert("epoch".to_string(), Value::from(epoch));
    Json(Value::Object(counters))
}

/// Prometheus metrics endpoint
async fn prometheus_metrics(State(state): State<AppState>) -> Response {
    match state.metrics.prometheus_text() {
        Ok(metrics) => (
            StatusCode::OK,
            [("Content-Type", "text/plain; charset=utf-8")],
            metrics,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to export metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to export metrics".to_string(),
            )
                .into_response()
        }
    }
}

/// Run one walk and report its verdict
async fn validate_name(
    State(state): State<AppState>,
    Path((name, rtype)): Path<(String, String)>,
) -> Response {
    let (qname, qtype) = match (name.parse::<Name>(), rtype.parse::<DNSResourceType>()) {
        (Ok(qname), Ok(qtype)) => (qname, qtype),
        (Err(e), _) | (_, Err(e)) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"status": "error", "message": e.to_string()})),
            )
                .into_response();
        }
    };

    match validate_once(
        &state.config,
        &state.metrics,
        state.statlog.as_ref(),
        &qname,
        qtype,
    )
    .await
    {
        Ok(validation) => {
            let records = validation
                .rrset
                .as_ref()
                .map(|set| set.presentation())
                .unwrap_or_default();
            let report = ValidationReport {
                name: qname.to_string(),
                rtype: qtype.to_string(),
                state: validation.state.as_str(),
                reason: validation.reason.map(|r| r.to_string()),
                records,
            };
            (StatusCode::OK, Json(report)).into_response()
        }
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({
                "name": qname.to_string(),
                "type": qtype.to_string(),
                "state": "Indeterminate",
                "status": "error",
                "message": e.to_string(),
            })),
        )
            .into_response(),
    }
}
