//! Immutable client requests and their builder.
//!
//! # Responsibilities
//! - Accumulate method, URL, headers, cookies and body inserter
//! - Snapshot that state into an immutable `ClientRequest`
//! - Write a `ClientRequest` into a transport request
//!
//! # Design Decisions
//! - `build()` borrows the builder and clones its state; snapshots never alias
//! - Header names are stored lowercase (HTTP names are case-insensitive)
//! - Header values are ISO-8859-1 text, so obs-text bytes survive unchanged
//! - Headers already on the transport request win over ours
//! - Cookies are always appended, never deduplicated

use std::collections::HashMap;

use axum::http::{HeaderMap, HeaderName, HeaderValue, Method};
use futures_util::stream::Stream;
use serde::Serialize;
use url::Url;

use crate::http::body::{BodyInserter, ExchangeStrategies, InsertContext};
use crate::http::error::ClientError;
use crate::http::multimap::MultiValueMap;
use crate::http::transport::{ClientHttpRequest, HttpCookie};

/// An outgoing request, frozen at `build()` time.
#[derive(Debug, Clone)]
pub struct ClientRequest {
    method: Method,
    url: Url,
    headers: MultiValueMap<String>,
    cookies: MultiValueMap<String>,
    inserter: BodyInserter,
}

impl ClientRequest {
    /// Start a builder for `method` and an already parsed URL.
    pub fn builder(method: Method, url: Url) -> ClientRequestBuilder {
        ClientRequestBuilder::new(method, url)
    }

    /// Start a builder, parsing `url`.
    pub fn create(method: Method, url: &str) -> Result<ClientRequestBuilder, ClientError> {
        let parsed = Url::parse(url).map_err(|e| ClientError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::builder(method, parsed))
    }

    pub fn get(url: &str) -> Result<ClientRequestBuilder, ClientError> {
        Self::create(Method::GET, url)
    }

    pub fn post(url: &str) -> Result<ClientRequestBuilder, ClientError> {
        Self::create(Method::POST, url)
    }

    pub fn put(url: &str) -> Result<ClientRequestBuilder, ClientError> {
        Self::create(Method::PUT, url)
    }

    pub fn delete(url: &str) -> Result<ClientRequestBuilder, ClientError> {
        Self::create(Method::DELETE, url)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &MultiValueMap<String> {
        &self.headers
    }

    pub fn cookies(&self) -> &MultiValueMap<String> {
        &self.cookies
    }

    pub fn inserter(&self) -> &BodyInserter {
        &self.inserter
    }

    /// Copy headers, cookies and body into `target`.
    ///
    /// Headers already present on `target` are left alone. Header copy completes
    /// before the body inserter runs; an inserter failure is returned as-is.
    pub async fn write_to(
        &self,
        target: &mut ClientHttpRequest,
        strategies: &ExchangeStrategies,
    ) -> Result<(), ClientError> {
        let mut missing = Vec::new();
        for (name, values) in self.headers.iter() {
            let header_name =
                HeaderName::from_bytes(name.as_bytes()).map_err(|e| ClientError::InvalidHeader {
                    name: name.to_string(),
                    reason: e.to_string(),
                })?;
            if target.headers().contains_key(&header_name) {
                continue;
            }
            for value in values {
                missing.push((header_name.clone(), encode_header_value(name, value)?));
            }
        }
        for (name, value) in missing {
            target.headers_mut().append(name, value);
        }

        for (name, values) in self.cookies.iter() {
            for value in values {
                target
                    .cookies_mut()
                    .add(name, HttpCookie::new(name, value.as_str()));
            }
        }

        let context = InsertContext::new(strategies.writers().to_vec(), HashMap::new());
        self.inserter.insert(target, &context).await
    }
}

/// Fluent builder for [`ClientRequest`].
#[derive(Debug, Clone)]
pub struct ClientRequestBuilder {
    method: Method,
    url: Url,
    headers: MultiValueMap<String>,
    cookies: MultiValueMap<String>,
    inserter: BodyInserter,
}

impl ClientRequestBuilder {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: MultiValueMap::new(),
            cookies: MultiValueMap::new(),
            inserter: BodyInserter::empty(),
        }
    }

    /// Append one or more values to the header `name`.
    pub fn header<I, V>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.headers
            .add_all(name.to_ascii_lowercase(), values.into_iter().map(Into::into));
        self
    }

    /// Merge `headers` into the current set. `None` is a no-op.
    pub fn headers(mut self, headers: Option<&HeaderMap>) -> Self {
        if let Some(headers) = headers {
            for (name, value) in headers {
                self.headers.add(name.as_str(), decode_header_value(value));
            }
        }
        self
    }

    /// Merge a name → values map into the current headers. `None` is a no-op.
    pub fn header_map(mut self, headers: Option<&MultiValueMap<String>>) -> Self {
        if let Some(headers) = headers {
            for (name, values) in headers.iter() {
                self.headers
                    .add_all(name.to_ascii_lowercase(), values.iter().cloned());
            }
        }
        self
    }

    /// Append a cookie.
    pub fn cookie(mut self, name: &str, value: impl Into<String>) -> Self {
        self.cookies.add(name, value.into());
        self
    }

    /// Merge `cookies` into the current set. `None` is a no-op.
    pub fn cookies(mut self, cookies: Option<&MultiValueMap<String>>) -> Self {
        if let Some(cookies) = cookies {
            self.cookies.merge(cookies);
        }
        self
    }

    /// Use every element of `stream` as the body.
    pub fn body<S, T>(mut self, stream: S) -> Self
    where
        S: Stream<Item = T> + Send + 'static,
        T: Serialize + 'static,
    {
        self.inserter = BodyInserter::from_stream(stream);
        self
    }

    /// Use a single serialized value as the body.
    pub fn body_value<T>(mut self, value: T) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        self.inserter = BodyInserter::from_value(value);
        self
    }

    /// Replace the body inserter. `None` resets to an empty body.
    pub fn body_inserter(mut self, inserter: Option<BodyInserter>) -> Self {
        self.inserter = inserter.unwrap_or_default();
        self
    }

    /// Snapshot the current state.
    pub fn build(&self) -> ClientRequest {
        ClientRequest {
            method: self.method.clone(),
            url: self.url.clone(),
            headers: self.headers.clone(),
            cookies: self.cookies.clone(),
            inserter: self.inserter.clone(),
        }
    }
}

/// Header bytes as ISO-8859-1 text: one char per byte.
fn decode_header_value(value: &HeaderValue) -> String {
    value.as_bytes().iter().map(|&b| char::from(b)).collect()
}

/// Inverse of [`decode_header_value`].
fn encode_header_value(name: &str, value: &str) -> Result<HeaderValue, ClientError> {
    let invalid = |reason: String| ClientError::InvalidHeader {
        name: name.to_string(),
        reason,
    };
    let bytes = value
        .chars()
        .map(|c| u8::try_from(c).ok())
        .collect::<Option<Vec<u8>>>()
        .ok_or_else(|| invalid("value is not ISO-8859-1 text".to_string()))?;
    HeaderValue::from_bytes(&bytes).map_err(|e| invalid(e.to_string()))
}
