//! Observability for the bookmark service.
//!
//! Provides metrics definitions and the Prometheus recorder setup.

pub mod metrics;
