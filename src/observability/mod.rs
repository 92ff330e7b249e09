//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Connection services and the gateway produce:
//!     → logging.rs (tracing events with structured fields)
//!     → metrics.rs (dispatch counters and latency histograms)
//!
//! Consumers:
//!     → stdout (fmt layer, filter from RUST_LOG or config)
//!     → Prometheus scrape endpoint (optional)
//! ```

pub mod logging;
pub mod metrics;
