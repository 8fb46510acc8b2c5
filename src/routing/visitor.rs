//! Visitor contracts for route tables and predicates.
//!
//! Every callback defaults to a no-op, so a visitor implements only the
//! variants it cares about. Composite predicates bracket their children with
//! `start_*` / `end_*` calls and separate them with `and` / `or`.

use std::path::Path;

use axum::http::Method;

use crate::routing::attributes::AttributeValue;
use crate::routing::predicate::RequestPredicate;
use crate::routing::router::HandlerFunction;

/// Receives the structure of a [`RequestPredicate`].
#[allow(unused_variables)]
pub trait PredicateVisitor {
    fn with_attribute(&mut self, name: &str, value: &AttributeValue) {}

    fn method(&mut self, methods: &[Method]) {}

    fn path(&mut self, pattern: &str) {}

    fn path_extension(&mut self, extension: &str) {}

    fn header(&mut self, name: &str, value: &str) {}

    fn query_param(&mut self, name: &str, value: &str) {}

    fn start_and(&mut self) {}

    fn and(&mut self) {}

    fn end_and(&mut self) {}

    fn start_or(&mut self) {}

    fn or(&mut self) {}

    fn end_or(&mut self) {}

    fn start_negate(&mut self) {}

    fn end_negate(&mut self) {}

    fn unknown(&mut self, label: &str) {}
}

/// Receives the entries of a route table.
#[allow(unused_variables)]
pub trait RouteVisitor {
    /// A concrete route: called once per route, in registration order.
    fn route(&mut self, predicate: &RequestPredicate, handler: &HandlerFunction) {}

    /// A static resource mount.
    fn resources(&mut self, pattern: &str, location: &Path) {}

    /// Entering a nested group guarded by `predicate`.
    fn start_nested(&mut self, predicate: &RequestPredicate) {}

    fn end_nested(&mut self, predicate: &RequestPredicate) {}
}
