//! Request predicates.
//!
//! # Responsibilities
//! - Decide whether a handler applies to a request (method, path, headers, ...)
//! - Compose conditions with AND / OR / NOT
//! - Disclose their structure to a `PredicateVisitor`
//!
//! # Design Decisions
//! - One tagged union instead of a trait object per condition
//! - Attribute predicates always match; they only carry metadata
//! - Path patterns use `{name}` for one segment and `{*name}` for the rest
//! - No regex; segment-by-segment comparison only

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use axum::body::Body;
use axum::http::{Method, Request};

use crate::routing::attributes::{AttributeBag, AttributeKey, AttributeValue};
use crate::routing::visitor::PredicateVisitor;

/// Variables captured from a request path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathVariables(HashMap<String, String>);

impl PathVariables {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn insert(&mut self, name: &str, value: String) {
        self.0.insert(name.to_string(), value);
    }

    pub(crate) fn extend(&mut self, other: PathVariables) {
        self.0.extend(other.0);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Variable(String),
    CatchAll(String),
}

/// A parsed path pattern such as `/items/{id}` or `/static/{*file}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parse `pattern`. Anything that is not a well-formed `{..}` capture is a literal,
    /// and a catch-all is only honoured as the final segment.
    pub fn parse(pattern: &str) -> Self {
        let parts: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
        let last = parts.len().saturating_sub(1);
        let segments = parts
            .iter()
            .enumerate()
            .map(|(i, part)| {
                match part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                    Some(inner) if inner.starts_with('*') && inner.len() > 1 && i == last => {
                        Segment::CatchAll(inner[1..].to_string())
                    }
                    Some(inner) if !inner.is_empty() && !inner.starts_with('*') => {
                        Segment::Variable(inner.to_string())
                    }
                    _ => Segment::Literal((*part).to_string()),
                }
            })
            .collect();

        Self {
            raw: pattern.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Name of the trailing catch-all capture, if the pattern has one.
    pub fn catch_all(&self) -> Option<&str> {
        match self.segments.last() {
            Some(Segment::CatchAll(name)) => Some(name),
            _ => None,
        }
    }

    /// Match `path`, returning the captured variables.
    pub fn match_path(&self, path: &str) -> Option<PathVariables> {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut variables = PathVariables::default();

        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::CatchAll(name) => {
                    variables.insert(name, parts.get(i..).unwrap_or_default().join("/"));
                    return Some(variables);
                }
                Segment::Literal(literal) => {
                    if parts.get(i) != Some(&literal.as_str()) {
                        return None;
                    }
                }
                Segment::Variable(name) => {
                    let value = parts.get(i)?;
                    variables.insert(name, (*value).to_string());
                }
            }
        }

        if parts.len() == self.segments.len() {
            Some(variables)
        } else {
            None
        }
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// A composable condition on an incoming request.
#[derive(Debug, Clone)]
pub enum RequestPredicate {
    /// Always matches; carries a named attribute.
    Attribute { name: String, value: AttributeValue },
    Method(Vec<Method>),
    Path(PathPattern),
    /// Matches paths whose last segment ends in `.{extension}` (case-insensitive).
    PathExtension(String),
    Header { name: String, value: String },
    QueryParam { name: String, value: String },
    And(Box<RequestPredicate>, Box<RequestPredicate>),
    Or(Box<RequestPredicate>, Box<RequestPredicate>),
    Negate(Box<RequestPredicate>),
    /// A condition this crate cannot inspect. Never matches.
    Unknown(String),
}

impl RequestPredicate {
    pub fn method(method: Method) -> Self {
        Self::Method(vec![method])
    }

    pub fn methods(methods: impl IntoIterator<Item = Method>) -> Self {
        Self::Method(methods.into_iter().collect())
    }

    pub fn path(pattern: &str) -> Self {
        Self::Path(PathPattern::parse(pattern))
    }

    pub fn path_extension(extension: impl Into<String>) -> Self {
        Self::PathExtension(extension.into())
    }

    pub fn header(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Header {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn query_param(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::QueryParam {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Always-matching predicate carrying `value` under `name`.
    pub fn with_attribute(name: impl Into<String>, value: AttributeValue) -> Self {
        Self::Attribute {
            name: name.into(),
            value,
        }
    }

    /// Typed variant of [`with_attribute`](Self::with_attribute).
    pub fn attribute<T: Any + Send + Sync>(key: &AttributeKey<T>, value: T) -> Self {
        Self::with_attribute(key.name(), key.value(value))
    }

    pub fn unknown(label: impl Into<String>) -> Self {
        Self::Unknown(label.into())
    }

    pub fn and(self, other: RequestPredicate) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: RequestPredicate) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    pub fn negate(self) -> Self {
        Self::Negate(Box::new(self))
    }

    /// Evaluate against `request`.
    pub fn matches(&self, request: &Request<Body>) -> bool {
        match self {
            Self::Attribute { .. } => true,
            Self::Method(methods) => methods.contains(request.method()),
            Self::Path(pattern) => pattern.match_path(request.uri().path()).is_some(),
            Self::PathExtension(extension) => {
                let path = request.uri().path();
                let file = path.rsplit('/').next().unwrap_or(path);
                file.rsplit_once('.')
                    .map(|(_, ext)| ext.eq_ignore_ascii_case(extension))
                    .unwrap_or(false)
            }
            Self::Header { name, value } => request
                .headers()
                .get_all(name.as_str())
                .iter()
                .any(|v| v.to_str().map(|v| v == value).unwrap_or(false)),
            Self::QueryParam { name, value } => request
                .uri()
                .query()
                .map(|query| {
                    url::form_urlencoded::parse(query.as_bytes())
                        .any(|(k, v)| k == name.as_str() && v == value.as_str())
                })
                .unwrap_or(false),
            Self::And(left, right) => left.matches(request) && right.matches(request),
            Self::Or(left, right) => left.matches(request) || right.matches(request),
            Self::Negate(inner) => !inner.matches(request),
            Self::Unknown(_) => false,
        }
    }

    /// Path variables captured by the path patterns this predicate requires.
    ///
    /// Call after [`matches`](Self::matches) succeeded. For `Or`, the first
    /// matching branch contributes; negated patterns capture nothing.
    pub fn path_variables(&self, request: &Request<Body>) -> PathVariables {
        let mut variables = PathVariables::default();
        self.collect_variables(request, &mut variables);
        variables
    }

    fn collect_variables(&self, request: &Request<Body>, variables: &mut PathVariables) {
        match self {
            Self::Path(pattern) => {
                if let Some(captured) = pattern.match_path(request.uri().path()) {
                    variables.extend(captured);
                }
            }
            Self::And(left, right) => {
                left.collect_variables(request, variables);
                right.collect_variables(request, variables);
            }
            Self::Or(left, right) => {
                if left.matches(request) {
                    left.collect_variables(request, variables);
                } else {
                    right.collect_variables(request, variables);
                }
            }
            _ => {}
        }
    }

    /// Find the first attribute named by `key` anywhere in this predicate.
    pub fn find_attribute<T: Any + Send + Sync>(&self, key: &AttributeKey<T>) -> Option<&T> {
        match self {
            Self::Attribute { name, value } if name == key.name() => value.downcast_ref::<T>(),
            Self::And(left, right) | Self::Or(left, right) => left
                .find_attribute(key)
                .or_else(|| right.find_attribute(key)),
            Self::Negate(inner) => inner.find_attribute(key),
            _ => None,
        }
    }

    /// All attributes in this predicate, later ones winning on name clashes.
    pub fn attributes(&self) -> AttributeBag {
        struct Collect(AttributeBag);

        impl PredicateVisitor for Collect {
            fn with_attribute(&mut self, name: &str, value: &AttributeValue) {
                self.0.insert(name, value.clone());
            }
        }

        let mut collect = Collect(AttributeBag::new());
        self.accept(&mut collect);
        collect.0
    }

    /// Disclose this predicate's structure to `visitor`.
    pub fn accept(&self, visitor: &mut dyn PredicateVisitor) {
        match self {
            Self::Attribute { name, value } => visitor.with_attribute(name, value),
            Self::Method(methods) => visitor.method(methods),
            Self::Path(pattern) => visitor.path(pattern.as_str()),
            Self::PathExtension(extension) => visitor.path_extension(extension),
            Self::Header { name, value } => visitor.header(name, value),
            Self::QueryParam { name, value } => visitor.query_param(name, value),
            Self::And(left, right) => {
                visitor.start_and();
                left.accept(visitor);
                visitor.and();
                right.accept(visitor);
                visitor.end_and();
            }
            Self::Or(left, right) => {
                visitor.start_or();
                left.accept(visitor);
                visitor.or();
                right.accept(visitor);
                visitor.end_or();
            }
            Self::Negate(inner) => {
                visitor.start_negate();
                inner.accept(visitor);
                visitor.end_negate();
            }
            Self::Unknown(label) => visitor.unknown(label),
        }
    }
}

impl fmt::Display for RequestPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attribute { name, .. } => write!(f, "@{}", name),
            Self::Method(methods) => {
                let names: Vec<_> = methods.iter().map(Method::as_str).collect();
                f.write_str(&names.join("|"))
            }
            Self::Path(pattern) => write!(f, "{}", pattern),
            Self::PathExtension(extension) => write!(f, "*.{}", extension),
            Self::Header { name, value } => write!(f, "{}: {}", name, value),
            Self::QueryParam { name, value } => write!(f, "?{}={}", name, value),
            Self::And(left, right) => write!(f, "({} && {})", left, right),
            Self::Or(left, right) => write!(f, "({} || {})", left, right),
            Self::Negate(inner) => write!(f, "!{}", inner),
            Self::Unknown(label) => f.write_str(label),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::default())
            .unwrap()
    }

    #[test]
    fn test_path_pattern_variables() {
        let pattern = PathPattern::parse("/items/{id}/parts/{part}");
        let vars = pattern.match_path("/items/42/parts/bolt").unwrap();
        assert_eq!(vars.get("id"), Some("42"));
        assert_eq!(vars.get("part"), Some("bolt"));

        assert!(pattern.match_path("/items/42/parts").is_none());
        assert!(pattern.match_path("/items/42/parts/bolt/extra").is_none());
        assert!(pattern.match_path("/things/42/parts/bolt").is_none());
    }

    #[test]
    fn test_path_pattern_catch_all() {
        let pattern = PathPattern::parse("/static/{*file}");
        assert_eq!(pattern.catch_all(), Some("file"));

        let vars = pattern.match_path("/static/css/site.css").unwrap();
        assert_eq!(vars.get("file"), Some("css/site.css"));

        let vars = pattern.match_path("/static").unwrap();
        assert_eq!(vars.get("file"), Some(""));

        assert!(pattern.match_path("/other/site.css").is_none());
    }

    #[test]
    fn test_malformed_captures_are_literals() {
        let pattern = PathPattern::parse("/a/{*rest}/b");
        assert!(pattern.catch_all().is_none());
        assert!(pattern.match_path("/a/{*rest}/b").is_some());
        assert!(pattern.match_path("/a/x/b").is_none());
    }

    #[test]
    fn test_root_pattern() {
        let pattern = PathPattern::parse("/");
        assert!(pattern.match_path("/").is_some());
        assert!(pattern.match_path("/x").is_none());
    }

    #[test]
    fn test_method_and_path() {
        let predicate =
            RequestPredicate::method(Method::GET).and(RequestPredicate::path("/foo/{id}"));

        assert!(predicate.matches(&request(Method::GET, "/foo/1")));
        assert!(!predicate.matches(&request(Method::POST, "/foo/1")));
        assert!(!predicate.matches(&request(Method::GET, "/bar/1")));

        let vars = predicate.path_variables(&request(Method::GET, "/foo/1"));
        assert_eq!(vars.get("id"), Some("1"));
    }

    #[test]
    fn test_header_query_extension() {
        let req = Request::builder()
            .uri("/files/report.PDF?lang=en%20US&x=1")
            .header("accept", "application/pdf")
            .body(Body::default())
            .unwrap();

        assert!(RequestPredicate::path_extension("pdf").matches(&req));
        assert!(!RequestPredicate::path_extension("txt").matches(&req));
        assert!(RequestPredicate::header("accept", "application/pdf").matches(&req));
        assert!(!RequestPredicate::header("accept", "text/html").matches(&req));
        assert!(RequestPredicate::query_param("lang", "en US").matches(&req));
        assert!(!RequestPredicate::query_param("lang", "fr").matches(&req));
    }

    #[test]
    fn test_or_negate_unknown() {
        let req = request(Method::DELETE, "/x");
        let get_or_delete =
            RequestPredicate::method(Method::GET).or(RequestPredicate::method(Method::DELETE));

        assert!(get_or_delete.matches(&req));
        assert!(!get_or_delete.clone().negate().matches(&req));
        assert!(!RequestPredicate::unknown("custom").matches(&req));
        assert!(RequestPredicate::with_attribute("k", std::sync::Arc::new(1u8)).matches(&req));
    }

    #[test]
    fn test_find_attribute() {
        const TAG: AttributeKey<&'static str> = AttributeKey::new("tag");
        let predicate = RequestPredicate::method(Method::GET)
            .and(RequestPredicate::path("/a"))
            .and(RequestPredicate::attribute(&TAG, "docs"));

        assert_eq!(predicate.find_attribute(&TAG), Some(&"docs"));
        assert_eq!(predicate.attributes().names(), vec!["tag"]);
    }

    #[derive(Default)]
    struct Trace(Vec<String>);

    impl PredicateVisitor for Trace {
        fn method(&mut self, methods: &[Method]) {
            let names: Vec<_> = methods.iter().map(Method::as_str).collect();
            self.0.push(format!("method {}", names.join(",")));
        }
        fn path(&mut self, pattern: &str) {
            self.0.push(format!("path {}", pattern));
        }
        fn start_and(&mut self) {
            self.0.push("(".into());
        }
        fn and(&mut self) {
            self.0.push("&&".into());
        }
        fn end_and(&mut self) {
            self.0.push(")".into());
        }
        fn start_negate(&mut self) {
            self.0.push("!".into());
        }
    }

    #[test]
    fn test_accept_order() {
        let predicate = RequestPredicate::method(Method::GET)
            .and(RequestPredicate::path("/a").negate())
            .and(RequestPredicate::header("x", "y"));

        let mut trace = Trace::default();
        predicate.accept(&mut trace);

        assert_eq!(
            trace.0,
            vec!["(", "(", "method GET", "&&", "!", "path /a", ")", "&&", ")"]
        );
        assert_eq!(predicate.to_string(), "((GET && !/a) && x: y)");
    }
}
