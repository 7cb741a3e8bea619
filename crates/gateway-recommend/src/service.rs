//! Recommendation service: prompt, route, parse, fall back.

use crate::outcome::RecommendationOutcome;
use crate::prompt::build_recommendation_prompt;
use crate::rules::{fallback_recommendation, EmotionSignal, HealthProfile, NutritionSummary};
use crate::structured::parse_recommendation;
use gateway_core::{FallbackResponse, TaskType};
use gateway_routing::Router;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Everything needed to recommend after one meal
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationInput {
    /// Emotion scorer output
    #[serde(default)]
    pub emotion: EmotionSignal,
    /// Nutrition estimate
    #[serde(default)]
    pub nutrition: NutritionSummary,
    /// Free-text mood note
    #[serde(default)]
    pub mood_text: String,
    /// Health profile, if the user has one
    #[serde(default)]
    pub profile: Option<HealthProfile>,
    /// Meal photos passed to vision-capable providers
    #[serde(default)]
    pub image_urls: Vec<String>,
}

/// Produces a recommendation for every input, model-backed when possible
#[derive(Debug, Clone)]
pub struct RecommendationService {
    router: Arc<Router>,
}

impl RecommendationService {
    /// Create a service over a router
    #[must_use]
    pub fn new(router: Arc<Router>) -> Self {
        Self { router }
    }

    /// Get the router
    #[must_use]
    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// Recommend for one meal.
    ///
    /// Never fails: router failures, unusable answers and store errors all
    /// produce a rule-based outcome carrying the reason.
    pub async fn recommend(&self, input: &RecommendationInput) -> RecommendationOutcome {
        let prompt = build_recommendation_prompt(
            &input.emotion,
            &input.nutrition,
            &input.mood_text,
            input.profile.as_ref(),
        );

        let response = match self
            .router
            .call_with_fallback(TaskType::Recommend, &prompt, &input.image_urls)
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "Routing failed, using rule fallback");
                return self.fallback(input, err.to_string());
            }
        };

        if !response.ok {
            let reason = response
                .error
                .unwrap_or_else(|| FallbackResponse::ALL_PROVIDERS_FAILED.to_string());
            info!(reason = %reason, "No provider answered, using rule fallback");
            return self.fallback(input, reason);
        }

        match parse_recommendation(&response.content) {
            Ok(recommendation) => {
                info!(
                    provider_id = ?response.provider_id,
                    attempt = ?response.attempt,
                    "Recommendation parsed from model answer"
                );
                RecommendationOutcome::from_llm(recommendation, response.provider_id, response.attempt)
            }
            Err(err) => {
                warn!(
                    provider_id = ?response.provider_id,
                    error = %err,
                    "Model answer rejected, using rule fallback"
                );
                self.fallback(input, err.to_string())
            }
        }
    }

    fn fallback(&self, input: &RecommendationInput, reason: String) -> RecommendationOutcome {
        fallback_recommendation(
            &input.emotion,
            &input.nutrition,
            input.profile.as_ref(),
            reason,
        )
    }
}
