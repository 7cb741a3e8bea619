//! # Gateway Providers
//!
//! Provider adapters for the meal advisor LLM gateway.
//!
//! One adapter per provider family, all behind
//! [`gateway_core::ProviderAdapter`]:
//! - OpenAI-compatible endpoints and "new-api" relays
//! - Google Gemini
//! - Anthropic Claude
//!
//! Adapters never fail outward; upstream problems become failed
//! [`gateway_core::ProviderResult`] values.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod common;
pub mod claude;
pub mod factory;
pub mod gemini;
pub mod openai_compatible;

// Re-export main types
pub use common::{build_client, AdapterTimeouts, REACHABLE};
pub use factory::{build_adapter, build_adapter_from_str, HttpAdapterFactory};

pub use claude::{ClaudeAdapter, ANTHROPIC_VERSION};
pub use gemini::GeminiAdapter;
pub use openai_compatible::OpenAICompatibleAdapter;
