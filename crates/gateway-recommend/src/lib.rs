//! # Gateway Recommend
//!
//! Turns routed model answers into validated meal recommendations.
//!
//! The model is asked for a single JSON object. Its answer is located in
//! the free-form text, parsed and validated as a whole; any failure on the
//! way (no provider, unusable answer, store outage) degrades to a
//! deterministic rule-based recommendation that records why.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod outcome;
pub mod prompt;
pub mod rules;
pub mod service;
pub mod structured;

pub use outcome::{GenerationMode, RecommendationOutcome};
pub use prompt::build_recommendation_prompt;
pub use rules::{
    fallback_recommendation, rule_recommendation, EmotionSignal, HealthProfile, NutritionSummary,
    DEFAULT_GOAL, HIGH_CALORIE_THRESHOLD, HIGH_RISK_THRESHOLD,
};
pub use service::{RecommendationInput, RecommendationService};
pub use structured::{extract_json_blob, parse_recommendation, ParseError, StructuredRecommendation};
