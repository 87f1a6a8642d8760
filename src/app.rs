use std::{any::Any, net::SocketAddr};

use anyhow::Context;
use axum::{
    extract::{DefaultBodyLimit, OriginalUri},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::AppConfig,
    error::{AppError, ErrorBody},
    state::AppState,
    users::{self, base_path, validation::ApiVersion},
};

pub const SERVICE_NAME: &str = "User API Server";

pub fn build_app(state: AppState) -> Router {
    let body_limit = state.config.max_body_bytes;
    let router = Router::new()
        .route("/", get(index).fallback(route_not_found))
        .merge(users::router())
        .fallback(route_not_found)
        .with_state(state);
    with_middleware(router, body_limit)
}

fn with_middleware(router: Router, body_limit: usize) -> Router {
    router
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, ?latency, "response");
                        } else {
                            tracing::info!(%status, ?latency, "response");
                        }
                    },
                ),
        )
}

/// Every route the service answers, as `METHOD path`.
pub fn available_routes() -> Vec<String> {
    let mut routes = vec!["GET /".to_string(), "GET /health".to_string()];
    for version in ApiVersion::ALL {
        let base = base_path(version);
        let label = version.id_label();
        routes.extend([
            format!("POST {base}"),
            format!("GET {base}"),
            format!("GET {base}/:{label}"),
            format!("DELETE {base}/:{label}"),
        ]);
    }
    routes
}

async fn index() -> Json<Value> {
    let endpoints: serde_json::Map<String, Value> = ApiVersion::ALL
        .into_iter()
        .map(|version| {
            (
                version.as_str().to_string(),
                json!({
                    "base": base_path(version),
                    "description": version.description(),
                    "methods": ["GET", "POST", "DELETE"],
                }),
            )
        })
        .chain(std::iter::once(("health".to_string(), json!("/health"))))
        .collect();

    Json(json!({
        "success": true,
        "message": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": endpoints,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RouteNotFound {
    #[serde(flatten)]
    body: ErrorBody,
    available_routes: Vec<String>,
}

pub(crate) async fn route_not_found(
    method: Method,
    OriginalUri(uri): OriginalUri,
) -> impl IntoResponse {
    tracing::warn!(%method, %uri, "route not found");
    (
        StatusCode::NOT_FOUND,
        Json(RouteNotFound {
            body: ErrorBody::new("Route not found", format!("Cannot {method} {uri}")),
            available_routes: available_routes(),
        }),
    )
}

/// Panics are the only source of 500s; the cause is logged, never returned.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    AppError::Internal(anyhow::anyhow!("handler panicked: {detail}")).into_response()
}

pub async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("bind {}", config.bind_addr()))?;
    let addr: SocketAddr = listener.local_addr()?;
    tracing::info!("listening on {}", addr);
    for route in available_routes() {
        tracing::info!(route = %route, "endpoint");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("SIGINT received, shutting down"),
        _ = terminate => tracing::info!("SIGTERM received, shutting down"),
    }
}
