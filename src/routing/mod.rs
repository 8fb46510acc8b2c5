//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Composition (at startup):
//!     route() / OperationRouteBuilder::route()
//!     → predicates (method, path, attribute, ...) + handlers
//!     → build() → immutable RouterFunction
//!
//! Incoming Request:
//!     → RouterFunction::lookup (predicate evaluation, first match wins)
//!     → RouteMatch { handler, path variables }
//!
//! Inspection:
//!     → RouterFunction::accept(RouteVisitor)
//!     → RequestPredicate::accept(PredicateVisitor)
//!     → AttributesVisitor / RouteDocs
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (segment matching only)
//! - Deterministic: same input always matches same route
//! - Metadata rides on predicates as typed attributes

pub mod attributes;
pub mod attributes_visitor;
pub mod docs;
pub mod operation;
pub mod predicate;
pub mod router;
pub mod visitor;

pub use attributes::{AttributeBag, AttributeKey, AttributeValue};
pub use attributes_visitor::{AttributesVisitor, RouteAttributes, VisitorState};
pub use docs::{DocumentedRoute, RouteDocs};
pub use operation::{Operation, OperationBuilder, OperationRouteBuilder, OPERATION};
pub use predicate::{PathPattern, PathVariables, RequestPredicate};
pub use router::{handler_fn, route, HandlerFunction, RouteMatch, RouterBuilder, RouterFunction};
pub use visitor::{PredicateVisitor, RouteVisitor};
