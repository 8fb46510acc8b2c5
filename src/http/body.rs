//! Body insertion for outgoing requests.
//!
//! # Data Flow
//! ```text
//! ClientRequest::write_to
//!     → BodyInserter::insert(target, InsertContext)
//!     → serialize payload to serde_json::Value(s)
//!     → select MessageWriter (target content-type, else first registered)
//!     → writer encodes bytes → target body
//! ```
//!
//! # Design Decisions
//! - Inserters are cheap `Clone` handles so a built request can share them
//! - A stream is drained once, on first insertion; every clone then reuses
//!   the collected elements
//! - Custom strategies plug in through the `InsertBody` trait

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue};
use futures_util::future::BoxFuture;
use futures_util::stream::{BoxStream, Stream, StreamExt};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::http::error::ClientError;
use crate::http::transport::ClientHttpRequest;

/// Serialized payload handed to a writer.
#[derive(Debug, Clone, Copy)]
pub enum Payload<'a> {
    Single(&'a Value),
    Elements(&'a [Value]),
}

/// Encodes a payload into request body bytes for one media type.
pub trait MessageWriter: Send + Sync + fmt::Debug {
    /// Media type written, also used as `content-type` when the request has none.
    fn media_type(&self) -> &'static str;

    /// Whether this writer produces `content_type`. `None` means "anything".
    fn can_write(&self, content_type: Option<&str>) -> bool {
        match content_type {
            Some(ct) => essence(ct).eq_ignore_ascii_case(self.media_type()),
            None => true,
        }
    }

    fn write(&self, payload: Payload<'_>) -> Result<Bytes, ClientError>;
}

fn essence(content_type: &str) -> &str {
    content_type.split(';').next().unwrap_or("").trim()
}

/// `application/json`: a single value as-is, elements as a JSON array.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonWriter;

impl MessageWriter for JsonWriter {
    fn media_type(&self) -> &'static str {
        "application/json"
    }

    fn write(&self, payload: Payload<'_>) -> Result<Bytes, ClientError> {
        let bytes = match payload {
            Payload::Single(value) => serde_json::to_vec(value)?,
            Payload::Elements(values) => serde_json::to_vec(values)?,
        };
        Ok(Bytes::from(bytes))
    }
}

/// `application/x-ndjson`: one JSON document per line.
#[derive(Debug, Default, Clone, Copy)]
pub struct NdjsonWriter;

impl MessageWriter for NdjsonWriter {
    fn media_type(&self) -> &'static str {
        "application/x-ndjson"
    }

    fn write(&self, payload: Payload<'_>) -> Result<Bytes, ClientError> {
        let values = match payload {
            Payload::Single(value) => std::slice::from_ref(value),
            Payload::Elements(values) => values,
        };
        let mut out = Vec::new();
        for value in values {
            serde_json::to_writer(&mut out, value)?;
            out.push(b'\n');
        }
        Ok(Bytes::from(out))
    }
}

/// `text/plain`: strings only; elements are concatenated.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextWriter;

impl MessageWriter for TextWriter {
    fn media_type(&self) -> &'static str {
        "text/plain"
    }

    fn write(&self, payload: Payload<'_>) -> Result<Bytes, ClientError> {
        let values = match payload {
            Payload::Single(value) => std::slice::from_ref(value),
            Payload::Elements(values) => values,
        };
        let mut out = String::new();
        for value in values {
            match value {
                Value::String(s) => out.push_str(s),
                other => {
                    return Err(ClientError::UnsupportedPayload {
                        media_type: self.media_type(),
                        reason: format!("expected a string, got {}", other),
                    })
                }
            }
        }
        Ok(Bytes::from(out))
    }
}

/// Registry of message writers available to an exchange.
#[derive(Debug, Clone)]
pub struct ExchangeStrategies {
    writers: Vec<Arc<dyn MessageWriter>>,
}

impl ExchangeStrategies {
    /// Strategies with no writers; only empty bodies can be inserted.
    pub fn empty() -> Self {
        Self {
            writers: Vec::new(),
        }
    }

    /// JSON, NDJSON and plain text, in that order.
    pub fn with_defaults() -> Self {
        Self::empty()
            .writer(JsonWriter)
            .writer(NdjsonWriter)
            .writer(TextWriter)
    }

    /// Register an additional writer after the existing ones.
    pub fn writer(mut self, writer: impl MessageWriter + 'static) -> Self {
        self.writers.push(Arc::new(writer));
        self
    }

    pub fn writers(&self) -> &[Arc<dyn MessageWriter>] {
        &self.writers
    }
}

impl Default for ExchangeStrategies {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// What an inserter can see while writing: the writers and free-form hints.
#[derive(Debug, Clone)]
pub struct InsertContext {
    writers: Vec<Arc<dyn MessageWriter>>,
    hints: HashMap<String, Value>,
}

impl InsertContext {
    pub fn new(writers: Vec<Arc<dyn MessageWriter>>, hints: HashMap<String, Value>) -> Self {
        Self { writers, hints }
    }

    pub fn writers(&self) -> &[Arc<dyn MessageWriter>] {
        &self.writers
    }

    pub fn hints(&self) -> &HashMap<String, Value> {
        &self.hints
    }

    /// Pick the writer for `target` and make sure its content type is set.
    fn select_writer(
        &self,
        target: &mut ClientHttpRequest,
    ) -> Result<Arc<dyn MessageWriter>, ClientError> {
        let content_type = target
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let writer = self
            .writers
            .iter()
            .find(|w| w.can_write(content_type.as_deref()))
            .cloned()
            .ok_or_else(|| ClientError::NoWriter {
                content_type: content_type.clone().unwrap_or_else(|| "*/*".to_string()),
            })?;

        if content_type.is_none() {
            target.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static(writer.media_type()),
            );
        }
        Ok(writer)
    }
}

/// User-supplied body insertion strategy.
pub trait InsertBody: Send + Sync {
    fn insert<'a>(
        &'a self,
        target: &'a mut ClientHttpRequest,
        context: &'a InsertContext,
    ) -> BoxFuture<'a, Result<(), ClientError>>;
}

type ValueFn = dyn Fn() -> Result<Value, serde_json::Error> + Send + Sync;
type ElementStream = BoxStream<'static, Result<Value, serde_json::Error>>;

enum StreamState {
    Pending(ElementStream),
    Collected(Arc<[Value]>),
    Failed(String),
}

enum Inserter {
    Empty,
    Value {
        element_type: &'static str,
        serialize: Box<ValueFn>,
    },
    Stream {
        element_type: &'static str,
        elements: Mutex<StreamState>,
    },
    Custom(Box<dyn InsertBody>),
}

/// Strategy that writes a payload into an outgoing request.
#[derive(Clone)]
pub struct BodyInserter {
    inner: Arc<Inserter>,
}

impl BodyInserter {
    /// Leaves the target body empty.
    pub fn empty() -> Self {
        Self {
            inner: Arc::new(Inserter::Empty),
        }
    }

    /// Serializes a single value.
    pub fn from_value<T>(value: T) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Inserter::Value {
                element_type: std::any::type_name::<T>(),
                serialize: Box::new(move || serde_json::to_value(&value)),
            }),
        }
    }

    /// Serializes every element of `stream`.
    ///
    /// The stream is drained by the first insertion through any clone of this
    /// inserter; later insertions write the same collected elements.
    pub fn from_stream<S, T>(stream: S) -> Self
    where
        S: Stream<Item = T> + Send + 'static,
        T: Serialize + 'static,
    {
        let elements = stream.map(|element| serde_json::to_value(&element)).boxed();
        Self {
            inner: Arc::new(Inserter::Stream {
                element_type: std::any::type_name::<T>(),
                elements: Mutex::new(StreamState::Pending(elements)),
            }),
        }
    }

    /// Wraps a custom strategy.
    pub fn custom(strategy: impl InsertBody + 'static) -> Self {
        Self {
            inner: Arc::new(Inserter::Custom(Box::new(strategy))),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(*self.inner, Inserter::Empty)
    }

    /// Type name of the serialized elements, if known.
    pub fn element_type(&self) -> Option<&'static str> {
        match &*self.inner {
            Inserter::Value { element_type, .. } | Inserter::Stream { element_type, .. } => {
                Some(*element_type)
            }
            Inserter::Empty | Inserter::Custom(_) => None,
        }
    }

    /// Write the payload into `target`.
    pub async fn insert(
        &self,
        target: &mut ClientHttpRequest,
        context: &InsertContext,
    ) -> Result<(), ClientError> {
        match &*self.inner {
            Inserter::Empty => {
                target.set_body(Body::empty());
                Ok(())
            }
            Inserter::Value { serialize, .. } => {
                let value = serialize()?;
                let writer = context.select_writer(target)?;
                let bytes = writer.write(Payload::Single(&value))?;
                target.set_body(Body::from(bytes));
                Ok(())
            }
            Inserter::Stream {
                element_type,
                elements,
            } => {
                let values = collect_elements(elements).await?;
                tracing::trace!(
                    element_type = %element_type,
                    elements = values.len(),
                    "Writing stream body"
                );
                let writer = context.select_writer(target)?;
                let bytes = writer.write(Payload::Elements(&values))?;
                target.set_body(Body::from(bytes));
                Ok(())
            }
            Inserter::Custom(strategy) => strategy.insert(target, context).await,
        }
    }
}

/// Drain the stream on first use and hand out the shared elements afterwards.
async fn collect_elements(state: &Mutex<StreamState>) -> Result<Arc<[Value]>, ClientError> {
    let mut state = state.lock().await;
    match &mut *state {
        StreamState::Collected(values) => Ok(values.clone()),
        StreamState::Failed(reason) => Err(ClientError::Body(reason.clone())),
        StreamState::Pending(stream) => {
            let mut values = Vec::new();
            while let Some(element) = stream.next().await {
                match element {
                    Ok(value) => values.push(value),
                    Err(e) => {
                        *state = StreamState::Failed(e.to_string());
                        return Err(ClientError::Encode(e));
                    }
                }
            }
            let values: Arc<[Value]> = values.into();
            *state = StreamState::Collected(values.clone());
            Ok(values)
        }
    }
}

impl Default for BodyInserter {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for BodyInserter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &*self.inner {
            Inserter::Empty => "empty",
            Inserter::Value { .. } => "value",
            Inserter::Stream { .. } => "stream",
            Inserter::Custom(_) => "custom",
        };
        f.debug_struct("BodyInserter")
            .field("kind", &kind)
            .field("element_type", &self.element_type())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, Uri};
    use futures_util::stream;

    fn target() -> ClientHttpRequest {
        ClientHttpRequest::new(Method::POST, Uri::from_static("http://localhost/items"))
    }

    fn context() -> InsertContext {
        InsertContext::new(ExchangeStrategies::with_defaults().writers().to_vec(), HashMap::new())
    }

    async fn body_string(request: &mut ClientHttpRequest) -> String {
        let bytes = axum::body::to_bytes(request.take_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_value_defaults_to_json() {
        let mut request = target();
        BodyInserter::from_value(serde_json::json!({"name": "widget"}))
            .insert(&mut request, &context())
            .await
            .unwrap();

        assert_eq!(request.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(body_string(&mut request).await, r#"{"name":"widget"}"#);
    }

    #[tokio::test]
    async fn test_stream_honours_content_type() {
        let mut request = target();
        request.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/x-ndjson; charset=utf-8"),
        );

        BodyInserter::from_stream(stream::iter(vec![1, 2, 3]))
            .insert(&mut request, &context())
            .await
            .unwrap();

        assert_eq!(body_string(&mut request).await, "1\n2\n3\n");
    }

    #[tokio::test]
    async fn test_stream_elements_shared_by_clones() {
        let inserter = BodyInserter::from_stream(stream::iter(vec!["a", "b"]));
        let copy = inserter.clone();

        let mut first = target();
        inserter.insert(&mut first, &context()).await.unwrap();
        assert_eq!(body_string(&mut first).await, r#"["a","b"]"#);

        let mut second = target();
        second.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/x-ndjson"),
        );
        copy.insert(&mut second, &context()).await.unwrap();
        assert_eq!(body_string(&mut second).await, "\"a\"\n\"b\"\n");
    }

    #[tokio::test]
    async fn test_stream_encode_failure_repeats() {
        struct Unserializable;
        impl Serialize for Unserializable {
            fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("not serializable"))
            }
        }

        let inserter = BodyInserter::from_stream(stream::iter(vec![Unserializable]));
        let err = inserter.insert(&mut target(), &context()).await.unwrap_err();
        assert!(matches!(err, ClientError::Encode(_)));

        let err = inserter.insert(&mut target(), &context()).await.unwrap_err();
        assert!(matches!(err, ClientError::Body(reason) if reason.contains("not serializable")));
    }

    #[tokio::test]
    async fn test_text_writer_rejects_non_strings() {
        let mut request = target();
        request
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        let err = BodyInserter::from_value(42)
            .insert(&mut request, &context())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::UnsupportedPayload { .. }));
    }

    #[tokio::test]
    async fn test_no_writer_for_content_type() {
        let mut request = target();
        request
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/xml"));

        let err = BodyInserter::from_value("x")
            .insert(&mut request, &context())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::NoWriter { content_type } if content_type == "application/xml"
        ));
    }

    #[tokio::test]
    async fn test_empty_needs_no_writer() {
        let mut request = target();
        let context = InsertContext::new(Vec::new(), HashMap::new());
        BodyInserter::empty().insert(&mut request, &context).await.unwrap();

        assert!(request.headers().get(header::CONTENT_TYPE).is_none());
        assert_eq!(body_string(&mut request).await, "");
    }

    #[test]
    fn test_element_type_recorded() {
        let inserter = BodyInserter::from_stream(stream::iter(vec![1u32]));
        assert_eq!(inserter.element_type(), Some("u32"));
        assert!(BodyInserter::empty().element_type().is_none());
    }
}
