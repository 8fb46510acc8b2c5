//! Shared utilities for integration tests.

use std::collections::BTreeMap;
use std::net::SocketAddr;

use axum::body::Body;
use axum::http::Request;
use tokio::net::TcpListener;

use webfn::config::AppConfig;
use webfn::http::HttpServer;
use webfn::routing::{handler_fn, HandlerFunction, RouterFunction};

/// Serve `routes` on an ephemeral local port until the test runtime stops.
pub async fn start_server(routes: RouterFunction) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let server = HttpServer::new(routes, AppConfig::default());
        let _ = server.run_until(listener, std::future::pending()).await;
    });

    addr
}

/// Handler that answers with a JSON description of the request it received.
#[allow(dead_code)]
pub fn echo_handler() -> HandlerFunction {
    handler_fn(|req: Request<Body>| async move {
        let (parts, body) = req.into_parts();

        let mut headers: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, value) in &parts.headers {
            headers
                .entry(name.as_str().to_string())
                .or_default()
                .push(value.to_str().unwrap_or_default().to_string());
        }

        let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        axum::Json(serde_json::json!({
            "method": parts.method.as_str(),
            "path": parts.uri.path(),
            "headers": headers,
            "body": String::from_utf8_lossy(&bytes),
        }))
    })
}
