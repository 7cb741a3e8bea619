//! Deterministic rule-based recommendations.
//!
//! Used whenever no usable model answer is available. The inputs are
//! produced by the emotion and nutrition scorers upstream.

use crate::outcome::{GenerationMode, RecommendationOutcome};
use crate::structured::StructuredRecommendation;
use serde::{Deserialize, Serialize};

/// Goal used when the profile does not name one
pub const DEFAULT_GOAL: &str = "maintain";

/// Meal calories above which the high-calorie tip is given
pub const HIGH_CALORIE_THRESHOLD: f64 = 700.0;

/// Emotional risk score at or above which the breathing tip is given
pub const HIGH_RISK_THRESHOLD: f64 = 0.7;

const MEAL_TIP_HIGH_CALORIE: &str =
    "This meal is high in calories. Cut back on oily or sugary sides and add more vegetables.";
const MEAL_TIP_DEFAULT: &str = "Chew slowly and keep a steady pace through this meal.";
const NEXT_MEAL_TIP: &str =
    "Keep the next meal balanced: protein and vegetables first, and avoid compensating by skipping food.";
const BEHAVIOR_TIP_HIGH_RISK: &str =
    "High emotional risk detected. Try a five minute breathing exercise before deciding on a snack.";
const BEHAVIOR_TIP_DEFAULT: &str =
    "Drink 300ml of water first and wait ten minutes before deciding whether to keep eating.";

/// Output of the emotion scorer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmotionSignal {
    /// Emotion label, e.g. `stressed`
    #[serde(default)]
    pub label: String,
    /// Risk of emotional eating in `[0, 1]`
    #[serde(default)]
    pub risk_score: f64,
}

/// Output of the nutrition estimator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct NutritionSummary {
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub fat: f64,
    #[serde(default)]
    pub carbs: f64,
}

/// The parts of a user's health profile the gateway reads
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthProfile {
    /// Dietary goal, e.g. `fat_loss`
    #[serde(default)]
    pub goal_type: Option<String>,
}

impl HealthProfile {
    /// Profile with a goal
    #[must_use]
    pub fn with_goal(goal: impl Into<String>) -> Self {
        Self {
            goal_type: Some(goal.into()),
        }
    }
}

/// The profile's goal, or [`DEFAULT_GOAL`] when absent or blank
#[must_use]
pub fn goal_of(profile: Option<&HealthProfile>) -> &str {
    profile
        .and_then(|p| p.goal_type.as_deref())
        .map(str::trim)
        .filter(|goal| !goal.is_empty())
        .unwrap_or(DEFAULT_GOAL)
}

/// Rule-based recommendation
#[must_use]
pub fn rule_recommendation(
    emotion: &EmotionSignal,
    nutrition: &NutritionSummary,
    profile: Option<&HealthProfile>,
) -> StructuredRecommendation {
    let meal_suggestion = if nutrition.calories > HIGH_CALORIE_THRESHOLD {
        MEAL_TIP_HIGH_CALORIE
    } else {
        MEAL_TIP_DEFAULT
    };
    let behavior_suggestion = if emotion.risk_score >= HIGH_RISK_THRESHOLD {
        BEHAVIOR_TIP_HIGH_RISK
    } else {
        BEHAVIOR_TIP_DEFAULT
    };

    StructuredRecommendation {
        goal: goal_of(profile).to_string(),
        meal_suggestion: meal_suggestion.to_string(),
        next_meal_suggestion: NEXT_MEAL_TIP.to_string(),
        behavior_suggestion: behavior_suggestion.to_string(),
        risk_alert: None,
    }
}

/// Rule-based recommendation annotated with why the model path was not used
#[must_use]
pub fn fallback_recommendation(
    emotion: &EmotionSignal,
    nutrition: &NutritionSummary,
    profile: Option<&HealthProfile>,
    reason: impl Into<String>,
) -> RecommendationOutcome {
    RecommendationOutcome {
        recommendation: rule_recommendation(emotion, nutrition, profile),
        generation_mode: GenerationMode::FallbackRule,
        fallback_reason: Some(reason.into()),
        provider_id: None,
        attempt: None,
    }
}
