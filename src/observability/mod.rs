//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! client exchanges, route dispatch
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//! ```

pub mod logging;
pub mod metrics;
