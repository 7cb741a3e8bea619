//! # Gateway Resilience
//!
//! Resilience patterns for the meal advisor LLM gateway:
//! - Circuit breaker derived from the call log
//! - Retry policy with linear backoff

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod circuit_breaker;
pub mod retry;

// Re-export main types
pub use circuit_breaker::{
    evaluate, CircuitBreakerConfig, CircuitEvaluation, CircuitState, LogCircuitBreaker,
};
pub use retry::{RetryConfig, RetryPolicy};
