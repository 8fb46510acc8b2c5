//! Route documentation.
//!
//! Walks a route table and records, per route, the HTTP methods and path
//! pattern it requires plus its `Operation` if one is attached. Conditions
//! under a negation are not documented as requirements.

use std::path::Path;

use axum::http::Method;
use serde::Serialize;

use crate::routing::attributes::AttributeValue;
use crate::routing::operation::{Operation, OPERATION};
use crate::routing::predicate::RequestPredicate;
use crate::routing::router::{HandlerFunction, RouterFunction};
use crate::routing::visitor::{PredicateVisitor, RouteVisitor};

/// One documented route.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DocumentedRoute {
    pub methods: Vec<String>,
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<Operation>,
}

/// Documentation for a whole route table.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RouteDocs {
    pub routes: Vec<DocumentedRoute>,
}

impl RouteDocs {
    pub fn collect(routes: &RouterFunction) -> Self {
        let mut visitor = DocsVisitor::default();
        routes.accept(&mut visitor);
        Self {
            routes: visitor.routes,
        }
    }

    /// Only routes that carry an operation.
    pub fn documented(&self) -> impl Iterator<Item = &DocumentedRoute> {
        self.routes.iter().filter(|r| r.operation.is_some())
    }
}

#[derive(Default)]
struct DocsVisitor {
    routes: Vec<DocumentedRoute>,
    current: Option<DocumentedRoute>,
    negated: usize,
}

impl RouteVisitor for DocsVisitor {
    fn route(&mut self, predicate: &RequestPredicate, _handler: &HandlerFunction) {
        self.current = Some(DocumentedRoute {
            methods: Vec::new(),
            path: None,
            operation: None,
        });
        self.negated = 0;
        predicate.accept(self);
        self.routes.extend(self.current.take());
    }

    fn resources(&mut self, pattern: &str, _location: &Path) {
        self.routes.push(DocumentedRoute {
            methods: vec![Method::GET.to_string(), Method::HEAD.to_string()],
            path: Some(pattern.to_string()),
            operation: None,
        });
    }
}

impl PredicateVisitor for DocsVisitor {
    fn with_attribute(&mut self, name: &str, value: &AttributeValue) {
        if name != OPERATION.name() {
            return;
        }
        let operation = value.downcast_ref::<Operation>();
        if let (Some(current), Some(operation)) = (self.current.as_mut(), operation) {
            current.operation = Some(operation.clone());
        }
    }

    fn method(&mut self, methods: &[Method]) {
        if self.negated > 0 {
            return;
        }
        if let Some(current) = self.current.as_mut() {
            current
                .methods
                .extend(methods.iter().map(|m| m.as_str().to_string()));
        }
    }

    fn path(&mut self, pattern: &str) {
        if self.negated > 0 {
            return;
        }
        if let Some(current) = self.current.as_mut() {
            current.path.get_or_insert_with(|| pattern.to_string());
        }
    }

    fn start_negate(&mut self) {
        self.negated += 1;
    }

    fn end_negate(&mut self) {
        self.negated = self.negated.saturating_sub(1);
    }
}
