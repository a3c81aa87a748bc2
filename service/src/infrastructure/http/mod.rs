use anyhow::Context;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum_prometheus::PrometheusMetricLayer;
use tokio::net;

use crate::domain::AppState;
use crate::infrastructure::http::handlers::documents::{
    create_document, delete_document, document_stats, find_document, list_documents_handler,
    remove_attachment, replace_attachment, report_document, update_document,
};
use crate::infrastructure::http::handlers::health_check;
use crate::infrastructure::http::handlers::uploads::serve_upload;
use crate::infrastructure::http::handlers::users::{
    create_user, current_profile, delete_user, list_handlers, list_users, update_profile,
    update_user,
};

mod api;
mod auth;
mod handlers;
mod querystring;

/// Configuration for the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpServerConfig<'a> {
    pub port: &'a str,
    /// Request body limit, uploads included
    pub max_body_bytes: usize,
}

/// The application's HTTP server. The underlying HTTP package is opaque to module consumers.
pub struct HttpServer {
    router: axum::Router,
    listener: net::TcpListener,
}

impl HttpServer {
    /// Returns a new HTTP server bound to the port specified in `config`.
    pub async fn new(state: impl AppState, config: HttpServerConfig<'_>) -> anyhow::Result<Self> {
        // see: https://github.com/metrics-rs/metrics
        // see: https://github.com/Ptrskay3/axum-prometheus
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

        let router = router(state, config.max_body_bytes)
            .route("/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);

        let listener = net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
            .await
            .with_context(|| format!("failed to listen on {}", config.port))?;

        Ok(Self { router, listener })
    }

    /// Runs the HTTP server.
    pub async fn run(self) -> anyhow::Result<()> {
        tracing::info!("listening on {:?}", self.listener.local_addr());
        axum::serve(self.listener, self.router)
            .await
            .context("received error from running server")?;
        Ok(())
    }
}

/// All routes except `/metrics`, which needs the process-wide recorder
pub fn router<S: AppState>(state: S, max_body_bytes: usize) -> Router {
    let trace_layer = tower_http::trace::TraceLayer::new_for_http().make_span_with(
        |request: &axum::extract::Request<_>| {
            let uri = request.uri().to_string();
            tracing::info_span!("http_request", method = ?request.method(), uri)
        },
    );

    Router::new()
        .route("/health", get(health_check))
        .route("/uploads/{name}", get(serve_upload::<S>))
        .nest("/api", api_routes())
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(trace_layer)
        .with_state(state)
}

fn api_routes<S: AppState>() -> Router<S> {
    Router::new()
        .route(
            "/documents",
            get(list_documents_handler::<S>).post(create_document::<S>),
        )
        .route("/documents/stats", get(document_stats::<S>))
        .route(
            "/documents/{id}",
            get(find_document::<S>)
                .put(update_document::<S>)
                .delete(delete_document::<S>),
        )
        .route("/documents/{id}/report", post(report_document::<S>))
        .route(
            "/documents/{id}/files/{kind}",
            put(replace_attachment::<S>).delete(remove_attachment::<S>),
        )
        .route("/handlers", get(list_handlers::<S>))
        .route("/me", get(current_profile).put(update_profile::<S>))
        .route("/users", get(list_users::<S>).post(create_user::<S>))
        .route(
            "/users/{id}",
            put(update_user::<S>).delete(delete_user::<S>),
        )
}

#[cfg(test)]
mod tests;
