//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound:
//!     ClientRequestBuilder (method, URL, headers, cookies, body)
//!     → build() → immutable ClientRequest
//!     → exchange.rs (default headers, timeout)
//!     → ClientRequest::write_to(ClientHttpRequest, ExchangeStrategies)
//!     → body.rs (BodyInserter picks a MessageWriter)
//!     → transport.rs → hyper-util client
//!
//! Inbound:
//!     TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → routing::RouterFunction::lookup
//!     → handler
//! ```

pub mod body;
pub mod client;
pub mod error;
pub mod exchange;
pub mod multimap;
pub mod server;
pub mod transport;

pub use body::{BodyInserter, ExchangeStrategies, InsertBody, InsertContext, MessageWriter};
pub use client::{ClientRequest, ClientRequestBuilder};
pub use error::ClientError;
pub use exchange::ExchangeFunction;
pub use multimap::MultiValueMap;
pub use server::HttpServer;
pub use transport::{ClientHttpRequest, HttpCookie};
