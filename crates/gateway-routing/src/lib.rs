//! # Gateway Routing
//!
//! Priority-ordered provider fallback for the meal advisor LLM gateway.
//!
//! This crate provides:
//! - A provider registry view that always yields candidates in priority order
//! - The router: circuit check, retries with linear backoff, per-attempt
//!   logging and fall-through to the next provider
//! - Administrative health checks and circuit overviews

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod registry;
pub mod router;

pub use registry::ProviderRegistry;
pub use router::{ProviderCircuit, Router, RouterConfig, RouterConfigBuilder, CANCELLED_BY_CALLER};
