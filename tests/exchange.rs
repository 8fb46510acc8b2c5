//! End-to-end tests: `ClientRequest` through `ExchangeFunction` to a live server.

mod common;

use axum::body::Body;
use axum::http::{Method, StatusCode};
use futures_util::stream;
use serde_json::{json, Value};

use webfn::config::ClientConfig;
use webfn::http::{ClientRequest, ExchangeFunction};
use webfn::routing::{route, RequestPredicate};

async fn read_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn echo_routes() -> webfn::routing::RouterFunction {
    route()
        .route(
            RequestPredicate::path("/echo/{*rest}"),
            common::echo_handler(),
        )
        .build()
}

#[tokio::test]
async fn test_headers_cookies_and_json_body_arrive() {
    let addr = common::start_server(echo_routes()).await;
    let exchange = ExchangeFunction::new(&ClientConfig::default()).unwrap();

    let request = ClientRequest::post(&format!("http://{}/echo/items", addr))
        .unwrap()
        .header("X-Trace", ["a", "b"])
        .cookie("session", "abc")
        .cookie("theme", "dark")
        .body_value(json!({"name": "widget"}))
        .build();

    let response = exchange.exchange(&request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let echoed = read_json(response.into_body()).await;
    assert_eq!(echoed["method"], "POST");
    assert_eq!(echoed["path"], "/echo/items");
    assert_eq!(echoed["headers"]["x-trace"], json!(["a", "b"]));
    assert_eq!(echoed["headers"]["cookie"], json!(["session=abc; theme=dark"]));
    assert_eq!(echoed["headers"]["content-type"], json!(["application/json"]));
    assert_eq!(
        echoed["headers"]["user-agent"],
        json!([format!("webfn/{}", env!("CARGO_PKG_VERSION"))])
    );

    let body: Value = serde_json::from_str(echoed["body"].as_str().unwrap()).unwrap();
    assert_eq!(body, json!({"name": "widget"}));
}

#[tokio::test]
async fn test_stream_body_is_sent_as_json_array() {
    let addr = common::start_server(echo_routes()).await;
    let exchange = ExchangeFunction::new(&ClientConfig::default()).unwrap();

    let request = ClientRequest::put(&format!("http://{}/echo/batch", addr))
        .unwrap()
        .body(stream::iter(vec![1, 2, 3]))
        .build();

    let response = exchange.exchange(&request).await.unwrap();
    let echoed = read_json(response.into_body()).await;

    assert_eq!(echoed["method"], "PUT");
    let body: Value = serde_json::from_str(echoed["body"].as_str().unwrap()).unwrap();
    assert_eq!(body, json!([1, 2, 3]));
}

#[tokio::test]
async fn test_built_request_is_reusable() {
    let addr = common::start_server(echo_routes()).await;
    let exchange = ExchangeFunction::new(&ClientConfig::default()).unwrap();

    let request = ClientRequest::create(Method::GET, &format!("http://{}/echo/again", addr))
        .unwrap()
        .build();

    for _ in 0..2 {
        let response = exchange.exchange(&request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let echoed = read_json(response.into_body()).await;
        assert_eq!(echoed["body"], "");
    }
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let exchange = ExchangeFunction::new(&ClientConfig::default()).unwrap();
    let request = ClientRequest::get(&format!("http://{}/", addr)).unwrap().build();

    let err = exchange.exchange(&request).await.unwrap_err();
    assert!(matches!(err, webfn::http::ClientError::Transport(_)));
}
