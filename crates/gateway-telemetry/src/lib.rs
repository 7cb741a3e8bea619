//! # Gateway Telemetry
//!
//! Observability for the meal advisor LLM gateway.
//!
//! This crate provides:
//! - Structured logging setup (pretty or JSON lines)
//! - Prometheus counters and histograms for provider attempts
//! - Span helpers for provider calls

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LoggingConfig, TelemetryError};
pub use metrics::{GatewayMetrics, RequestOutcome};
