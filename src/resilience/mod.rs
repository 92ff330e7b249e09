//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Downstream attempt fails before a response
//!     → retries.rs (connect failure? retries left?)
//!     → backoff.rs (delay = factor * 2^retry)
//!     → next attempt, or the error surfaces to the dispatcher
//! ```

pub mod backoff;
pub mod retries;

pub use retries::RetryPolicy;
