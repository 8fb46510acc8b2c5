//! Transport-level outgoing request.
//!
//! # Responsibilities
//! - Hold the mutable headers and cookies a `ClientRequest` writes into
//! - Carry the body produced by the body inserter
//! - Convert into a `Request<Body>` for the hyper client
//!
//! # Design Decisions
//! - Cookies stay structured until `into_hyper`, then render as one `cookie` header
//! - Cookies rendered after any `cookie` header already present, into a single header
//! - Names must be tokens and values cookie-octets, so no pair can smuggle in another

use std::fmt;

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Method, Request, Uri};

use crate::http::error::ClientError;
use crate::http::multimap::MultiValueMap;

/// A single `name=value` cookie pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpCookie {
    name: String,
    value: String,
}

impl HttpCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Check the pair against RFC 6265 `cookie-pair` syntax.
    pub fn validate(&self) -> Result<(), ClientError> {
        let invalid = |reason: &str| ClientError::InvalidCookie {
            name: self.name.clone(),
            reason: reason.to_string(),
        };
        if self.name.is_empty() || !self.name.bytes().all(is_token_byte) {
            return Err(invalid("name is not a token"));
        }
        let value = self
            .value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(&self.value);
        if !value.bytes().all(is_cookie_octet) {
            return Err(invalid("value contains characters not allowed in a cookie"));
        }
        Ok(())
    }
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&b)
}

fn is_cookie_octet(b: u8) -> bool {
    b.is_ascii_graphic() && !matches!(b, b'"' | b',' | b';' | b'\\')
}

impl fmt::Display for HttpCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

/// Outgoing request as seen by the transport.
#[derive(Debug)]
pub struct ClientHttpRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    cookies: MultiValueMap<HttpCookie>,
    body: Body,
}

impl ClientHttpRequest {
    /// Create a request with no headers, no cookies and an empty body.
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            headers: HeaderMap::new(),
            cookies: MultiValueMap::new(),
            body: Body::empty(),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn cookies(&self) -> &MultiValueMap<HttpCookie> {
        &self.cookies
    }

    pub fn cookies_mut(&mut self) -> &mut MultiValueMap<HttpCookie> {
        &mut self.cookies
    }

    /// Replace the request body.
    pub fn set_body(&mut self, body: Body) {
        self.body = body;
    }

    /// Take the body, leaving an empty one in its place.
    pub fn take_body(&mut self) -> Body {
        std::mem::replace(&mut self.body, Body::empty())
    }

    /// Render cookies and assemble the wire request.
    pub fn into_hyper(self) -> Result<Request<Body>, ClientError> {
        let Self {
            method,
            uri,
            mut headers,
            cookies,
            body,
        } = self;

        if !cookies.is_empty() {
            let mut pairs = Vec::new();
            for existing in headers.get_all(header::COOKIE) {
                pairs.push(existing.to_str().map_err(|e| ClientError::InvalidHeader {
                    name: header::COOKIE.to_string(),
                    reason: e.to_string(),
                })?);
            }
            let mut rendered = pairs.join("; ");
            for cookie in cookies.iter().flat_map(|(_, values)| values.iter()) {
                cookie.validate()?;
                if !rendered.is_empty() {
                    rendered.push_str("; ");
                }
                rendered.push_str(&cookie.to_string());
            }
            let value = HeaderValue::from_str(&rendered).map_err(|e| ClientError::InvalidHeader {
                name: header::COOKIE.to_string(),
                reason: e.to_string(),
            })?;
            headers.insert(header::COOKIE, value);
        }

        let mut request = Request::builder().method(method).uri(uri).body(body)?;
        *request.headers_mut() = headers;
        Ok(request)
    }
}
