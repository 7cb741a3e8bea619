//! Recommendation results.

use crate::structured::StructuredRecommendation;
use gateway_core::ProviderId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a recommendation was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// Parsed from a model answer
    Llm,
    /// Generated by the deterministic rules
    FallbackRule,
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Llm => f.write_str("llm"),
            Self::FallbackRule => f.write_str("fallback_rule"),
        }
    }
}

/// A recommendation plus where it came from.
///
/// Serializes flat: the recommendation fields sit next to
/// `generation_mode` and, for fallbacks, `fallback_reason`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecommendationOutcome {
    /// The recommendation itself
    #[serde(flatten)]
    pub recommendation: StructuredRecommendation,
    /// Model or rules
    pub generation_mode: GenerationMode,
    /// Why the rules were used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    /// Provider that answered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<ProviderId>,
    /// Attempt that answered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempt: Option<u32>,
}

impl RecommendationOutcome {
    /// Outcome for a parsed model answer
    #[must_use]
    pub fn from_llm(
        recommendation: StructuredRecommendation,
        provider_id: Option<ProviderId>,
        attempt: Option<u32>,
    ) -> Self {
        Self {
            recommendation,
            generation_mode: GenerationMode::Llm,
            fallback_reason: None,
            provider_id,
            attempt,
        }
    }

    /// Whether the rules produced this
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.generation_mode == GenerationMode::FallbackRule
    }
}
