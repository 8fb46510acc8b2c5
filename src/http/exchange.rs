//! Sending client requests over the hyper client.
//!
//! # Data Flow
//! ```text
//! ClientRequest
//!     → ClientHttpRequest (method, uri, default headers)
//!     → ClientRequest::write_to (headers, cookies, body)
//!     → into_hyper → hyper_util legacy client
//!     → Response<Body>
//! ```
//!
//! # Design Decisions
//! - Default headers are set on the transport request first, so they win
//! - One deadline covers body insertion and the response head
//! - Plain HTTP only; the connector does not negotiate TLS

use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Response, Uri};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::ClientConfig;
use crate::http::body::ExchangeStrategies;
use crate::http::client::ClientRequest;
use crate::http::error::ClientError;
use crate::http::transport::ClientHttpRequest;
use crate::observability::metrics;

/// Sends [`ClientRequest`]s and returns the response.
#[derive(Clone)]
pub struct ExchangeFunction {
    client: Client<HttpConnector, Body>,
    strategies: ExchangeStrategies,
    default_headers: HeaderMap,
    timeout: Duration,
}

impl ExchangeFunction {
    /// Build an exchange function from configuration with the default writers.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let mut default_headers = HeaderMap::new();
        for (name, value) in &config.default_headers {
            let invalid = |reason: String| ClientError::InvalidHeader {
                name: name.clone(),
                reason,
            };
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
            let header_value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
            default_headers.append(header_name, header_value);
        }

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Ok(Self {
            client,
            strategies: ExchangeStrategies::with_defaults(),
            default_headers,
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    /// Replace the writer registry.
    pub fn with_strategies(mut self, strategies: ExchangeStrategies) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn strategies(&self) -> &ExchangeStrategies {
        &self.strategies
    }

    /// Write `request` into a transport request and send it.
    pub async fn exchange(&self, request: &ClientRequest) -> Result<Response<Body>, ClientError> {
        let start = Instant::now();
        let method = request.method().as_str().to_string();

        let result = tokio::time::timeout(self.timeout, self.send(request)).await;
        let result = match result {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout(self.timeout)),
        };

        match &result {
            Ok(response) => {
                tracing::debug!(
                    method = %method,
                    url = %request.url(),
                    status = %response.status(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Exchange completed"
                );
                metrics::record_client_request(&method, response.status().as_u16(), start);
            }
            Err(e) => {
                tracing::warn!(
                    method = %method,
                    url = %request.url(),
                    error = %e,
                    "Exchange failed"
                );
                metrics::record_client_error(&method);
            }
        }
        result
    }

    async fn send(&self, request: &ClientRequest) -> Result<Response<Body>, ClientError> {
        let uri: Uri = request
            .url()
            .as_str()
            .parse()
            .map_err(|e: axum::http::uri::InvalidUri| ClientError::InvalidUrl {
                url: request.url().to_string(),
                reason: e.to_string(),
            })?;

        let mut transport = ClientHttpRequest::new(request.method().clone(), uri);
        transport
            .headers_mut()
            .extend(self.default_headers.clone());

        request.write_to(&mut transport, &self.strategies).await?;

        let response = self.client.request(transport.into_hyper()?).await?;
        Ok(into_body_response(response))
    }
}

impl std::fmt::Debug for ExchangeFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeFunction")
            .field("strategies", &self.strategies)
            .field("default_headers", &self.default_headers)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn into_body_response(response: Response<hyper::body::Incoming>) -> Response<Body> {
    let (parts, body) = response.into_parts();
    Response::from_parts(parts, Body::new(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_default_headers_parsed() {
        let mut config = ClientConfig::default();
        config
            .default_headers
            .insert("x-api-key".into(), "secret".into());

        let exchange = ExchangeFunction::new(&config).unwrap();
        assert_eq!(exchange.default_headers["x-api-key"], "secret");
        assert!(exchange.default_headers.contains_key("user-agent"));
        assert_eq!(exchange.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_default_header() {
        let config = ClientConfig {
            timeout_secs: 1,
            default_headers: BTreeMap::from([("bad name".to_string(), "v".to_string())]),
        };

        let err = ExchangeFunction::new(&config).unwrap_err();
        assert!(matches!(err, ClientError::InvalidHeader { name, .. } if name == "bad name"));
    }
}
