//! Functional HTTP toolkit.
//!
//! Two halves share one crate:
//! - an outbound request model (`ClientRequest`) that is built fluently,
//!   frozen, and written onto a transport request with pluggable body
//!   writers
//! - an inbound functional router (`RouterFunction`) whose predicates carry
//!   typed attributes that visitors can walk, e.g. to produce route docs

pub mod config;
pub mod http;
pub mod observability;
pub mod routing;

pub use config::AppConfig;
pub use http::{ClientRequest, ExchangeFunction, HttpServer};
pub use routing::{route, OperationRouteBuilder, RouterFunction};
