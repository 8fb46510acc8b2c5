//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router around a `RouterFunction`
//! - Wire up middleware (tracing, timeout)
//! - Serve the route documentation endpoint
//! - Dispatch requests through `RouterFunction::lookup`

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::observability::metrics;
use crate::routing::{RouteDocs, RouterFunction};

/// HTTP server for a functional route table.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
}

impl HttpServer {
    /// Create a server dispatching to `routes`.
    pub fn new(routes: RouterFunction, config: AppConfig) -> Self {
        let router = Self::build_router(&config, Arc::new(routes));
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, routes: Arc<RouterFunction>) -> Router {
        let mut router = Router::<Arc<RouterFunction>>::new();

        if config.docs.enabled {
            let docs = RouteDocs::collect(&routes);
            tracing::debug!(
                path = %config.docs.path,
                routes = docs.routes.len(),
                "Route documentation enabled"
            );
            router = router.route(
                &config.docs.path,
                get(move || {
                    let docs = docs.clone();
                    async move { Json(docs) }
                }),
            );
        }

        router
            .fallback(dispatch)
            .with_state(routes)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.server.request_timeout_secs,
            )))
            .layer(TraceLayer::new_for_http())
    }

    /// The assembled Axum router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run until Ctrl+C.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        self.run_until(listener, shutdown_signal()).await
    }

    /// Run until `shutdown` completes.
    pub async fn run_until<F>(
        self,
        listener: TcpListener,
        shutdown: F,
    ) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Route a request through the route table.
async fn dispatch(
    State(routes): State<Arc<RouterFunction>>,
    mut request: Request<Body>,
) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let Some(found) = routes.lookup(&request) else {
        tracing::debug!(method = %method, path = %path, "No route matched");
        metrics::record_server_request(&method, StatusCode::NOT_FOUND.as_u16(), start);
        return (StatusCode::NOT_FOUND, "No matching route found").into_response();
    };

    tracing::debug!(
        method = %method,
        path = %path,
        variables = found.variables.len(),
        "Route matched"
    );
    request.extensions_mut().insert(found.variables);

    let response = found.handler.handle(request).await;
    metrics::record_server_request(&method, response.status().as_u16(), start);
    response
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{handler_fn, route, OperationRouteBuilder, PathVariables};
    use tower::ServiceExt;

    fn server(docs_enabled: bool) -> HttpServer {
        let routes = OperationRouteBuilder::route()
            .get(
                "/items/{id}",
                handler_fn(|req: Request<Body>| async move {
                    let id = req
                        .extensions()
                        .get::<PathVariables>()
                        .and_then(|vars| vars.get("id"))
                        .unwrap_or("none")
                        .to_string();
                    format!("item {}", id)
                }),
                |ops| {
                    ops.parameter("id", "Item id").response(200, "Found");
                },
            )
            .build();

        let mut config = AppConfig::default();
        config.docs.enabled = docs_enabled;
        HttpServer::new(route().add(routes).build(), config)
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_dispatch_with_path_variables() {
        let response = server(true)
            .router()
            .oneshot(Request::get("/items/42").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "item 42");
    }

    #[tokio::test]
    async fn test_unmatched_is_404() {
        let response = server(true)
            .router()
            .oneshot(Request::post("/items/42").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_docs_endpoint() {
        let response = server(true)
            .router()
            .oneshot(Request::get("/_docs").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["routes"][0]["path"], "/items/{id}");
        assert_eq!(json["routes"][0]["operation"]["parameters"]["id"], "Item id");
    }

    #[tokio::test]
    async fn test_docs_disabled() {
        let response = server(false)
            .router()
            .oneshot(Request::get("/_docs").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
