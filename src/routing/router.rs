//! Route table composition and lookup.
//!
//! # Responsibilities
//! - Compose predicates and handlers into an immutable route table
//! - Look up the handler for a request
//! - Walk the table for a `RouteVisitor`
//!
//! # Design Decisions
//! - Immutable after `build()` (shared via Arc without locks)
//! - First match wins, in registration order
//! - Nested groups are guards: child patterns are absolute paths
//! - Resource mounts always match their pattern; a missing file is a 404

use std::fmt;
use std::future::Future;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::future::BoxFuture;

use crate::routing::predicate::{PathPattern, PathVariables, RequestPredicate};
use crate::routing::visitor::RouteVisitor;

type BoxHandler = dyn Fn(Request<Body>) -> BoxFuture<'static, Response> + Send + Sync;

/// An async request handler.
#[derive(Clone)]
pub struct HandlerFunction {
    inner: Arc<BoxHandler>,
}

impl HandlerFunction {
    pub fn new<F, Fut, R>(f: F) -> Self
    where
        F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + 'static,
    {
        let inner: Arc<BoxHandler> =
            Arc::new(move |request: Request<Body>| -> BoxFuture<'static, Response> {
                let fut = f(request);
                Box::pin(async move { fut.await.into_response() })
            });
        Self { inner }
    }

    pub async fn handle(&self, request: Request<Body>) -> Response {
        (self.inner)(request).await
    }
}

impl fmt::Debug for HandlerFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HandlerFunction@{:p}", Arc::as_ptr(&self.inner) as *const ())
    }
}

/// Shorthand for [`HandlerFunction::new`].
pub fn handler_fn<F, Fut, R>(f: F) -> HandlerFunction
where
    F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + 'static,
{
    HandlerFunction::new(f)
}

/// A successful lookup.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub handler: HandlerFunction,
    pub variables: PathVariables,
}

/// A composed route table.
#[derive(Debug, Clone)]
pub enum RouterFunction {
    Route {
        predicate: RequestPredicate,
        handler: HandlerFunction,
    },
    Nested {
        predicate: RequestPredicate,
        routes: Vec<RouterFunction>,
    },
    Resources {
        pattern: PathPattern,
        location: PathBuf,
    },
    Composed(Vec<RouterFunction>),
}

impl RouterFunction {
    /// Find the handler for `request`.
    pub fn lookup(&self, request: &Request<Body>) -> Option<RouteMatch> {
        match self {
            Self::Route { predicate, handler } => {
                if predicate.matches(request) {
                    Some(RouteMatch {
                        handler: handler.clone(),
                        variables: predicate.path_variables(request),
                    })
                } else {
                    None
                }
            }
            Self::Nested { predicate, routes } => {
                if !predicate.matches(request) {
                    return None;
                }
                let mut found = routes.iter().find_map(|r| r.lookup(request))?;
                let mut variables = predicate.path_variables(request);
                variables.extend(found.variables);
                found.variables = variables;
                Some(found)
            }
            Self::Resources { pattern, location } => {
                if request.method() != Method::GET && request.method() != Method::HEAD {
                    return None;
                }
                let variables = pattern.match_path(request.uri().path())?;
                let relative = pattern
                    .catch_all()
                    .and_then(|name| variables.get(name))
                    .unwrap_or_default()
                    .to_string();
                Some(RouteMatch {
                    handler: resource_handler(location.clone(), relative),
                    variables,
                })
            }
            Self::Composed(routes) => routes.iter().find_map(|r| r.lookup(request)),
        }
    }

    /// Walk this table, notifying `visitor` of every entry.
    pub fn accept(&self, visitor: &mut dyn RouteVisitor) {
        match self {
            Self::Route { predicate, handler } => visitor.route(predicate, handler),
            Self::Nested { predicate, routes } => {
                visitor.start_nested(predicate);
                for route in routes {
                    route.accept(visitor);
                }
                visitor.end_nested(predicate);
            }
            Self::Resources { pattern, location } => visitor.resources(pattern.as_str(), location),
            Self::Composed(routes) => {
                for route in routes {
                    route.accept(visitor);
                }
            }
        }
    }
}

fn resource_handler(location: PathBuf, relative: String) -> HandlerFunction {
    handler_fn(move |_request: Request<Body>| {
        let location = location.clone();
        let relative = relative.clone();
        async move { serve_file(&location, &relative).await }
    })
}

async fn serve_file(location: &Path, relative: &str) -> Response {
    let relative = Path::new(relative);
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return StatusCode::NOT_FOUND.into_response();
    }

    let file = location.join(relative);
    match tokio::fs::read(&file).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, content_type(&file))], bytes).into_response(),
        Err(e) => {
            tracing::debug!(file = %file.display(), error = %e, "Resource not readable");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

fn content_type(file: &Path) -> &'static str {
    match file.extension().and_then(|e| e.to_str()) {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("js") => "text/javascript",
        Some("json") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        _ => "application/octet-stream",
    }
}

/// Start a new route table.
pub fn route() -> RouterBuilder {
    RouterBuilder::new()
}

/// Builder for a [`RouterFunction`].
#[derive(Debug, Default)]
pub struct RouterBuilder {
    routes: Vec<RouterFunction>,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(self, pattern: &str, handler: HandlerFunction) -> Self {
        self.method_route(Method::GET, pattern, None, handler)
    }

    /// GET route that also requires `predicate`.
    pub fn get_with(
        self,
        pattern: &str,
        predicate: RequestPredicate,
        handler: HandlerFunction,
    ) -> Self {
        self.method_route(Method::GET, pattern, Some(predicate), handler)
    }

    pub fn post(self, pattern: &str, handler: HandlerFunction) -> Self {
        self.method_route(Method::POST, pattern, None, handler)
    }

    pub fn put(self, pattern: &str, handler: HandlerFunction) -> Self {
        self.method_route(Method::PUT, pattern, None, handler)
    }

    pub fn delete(self, pattern: &str, handler: HandlerFunction) -> Self {
        self.method_route(Method::DELETE, pattern, None, handler)
    }

    /// Route guarded by an arbitrary predicate.
    pub fn route(mut self, predicate: RequestPredicate, handler: HandlerFunction) -> Self {
        self.routes.push(RouterFunction::Route { predicate, handler });
        self
    }

    /// Group routes behind `predicate`.
    pub fn nest<F>(mut self, predicate: RequestPredicate, configure: F) -> Self
    where
        F: FnOnce(RouterBuilder) -> RouterBuilder,
    {
        let nested = configure(RouterBuilder::new());
        self.routes.push(RouterFunction::Nested {
            predicate,
            routes: nested.routes,
        });
        self
    }

    /// Serve files below `location` for `pattern`, which should end in `{*name}`.
    pub fn resources(mut self, pattern: &str, location: impl Into<PathBuf>) -> Self {
        self.routes.push(RouterFunction::Resources {
            pattern: PathPattern::parse(pattern),
            location: location.into(),
        });
        self
    }

    /// Append an already composed table.
    pub fn add(mut self, routes: RouterFunction) -> Self {
        self.routes.push(routes);
        self
    }

    pub fn build(self) -> RouterFunction {
        RouterFunction::Composed(self.routes)
    }

    fn method_route(
        self,
        method: Method,
        pattern: &str,
        extra: Option<RequestPredicate>,
        handler: HandlerFunction,
    ) -> Self {
        let mut predicate = RequestPredicate::method(method).and(RequestPredicate::path(pattern));
        if let Some(extra) = extra {
            predicate = predicate.and(extra);
        }
        self.route(predicate, handler)
    }
}
