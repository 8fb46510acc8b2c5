//! Per-route attribute collection.
//!
//! # Data Flow
//! ```text
//! RouterFunction::accept(visitor)
//!     → route(predicate, handler)          idle → collecting
//!     → predicate.accept(visitor)          with_attribute() fills the bag
//!     → report (tracing event + stored RouteAttributes)
//!     → bag reset                          collecting → idle
//! ```

use std::mem;

use crate::routing::attributes::{AttributeBag, AttributeValue};
use crate::routing::predicate::RequestPredicate;
use crate::routing::router::HandlerFunction;
use crate::routing::visitor::{PredicateVisitor, RouteVisitor};

/// Whether the visitor is inside a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisitorState {
    #[default]
    Idle,
    Collecting,
}

/// Attributes reported for one route.
#[derive(Debug, Clone)]
pub struct RouteAttributes {
    /// Display form of the route predicate.
    pub route: String,
    pub attributes: AttributeBag,
}

/// Collects the attributes of every route it visits.
#[derive(Debug, Default)]
pub struct AttributesVisitor {
    state: VisitorState,
    attributes: AttributeBag,
    reports: Vec<RouteAttributes>,
}

impl AttributesVisitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> VisitorState {
        self.state
    }

    /// Reports so far, in visiting order.
    pub fn reports(&self) -> &[RouteAttributes] {
        &self.reports
    }

    pub fn into_reports(self) -> Vec<RouteAttributes> {
        self.reports
    }
}

impl RouteVisitor for AttributesVisitor {
    fn route(&mut self, predicate: &RequestPredicate, handler: &HandlerFunction) {
        self.attributes.clear();
        self.state = VisitorState::Collecting;

        predicate.accept(self);

        tracing::info!(
            route = %predicate,
            handler = ?handler,
            attributes = ?self.attributes.names(),
            "Route attributes"
        );
        self.reports.push(RouteAttributes {
            route: predicate.to_string(),
            attributes: mem::take(&mut self.attributes),
        });
        self.state = VisitorState::Idle;
    }
}

impl PredicateVisitor for AttributesVisitor {
    fn with_attribute(&mut self, name: &str, value: &AttributeValue) {
        if self.state == VisitorState::Collecting {
            self.attributes.insert(name, value.clone());
        }
    }
}
