//! Prompt construction.

use crate::rules::{goal_of, EmotionSignal, HealthProfile, NutritionSummary};
use serde_json::json;

/// Build the prompt asking for a single recommendation object
#[must_use]
pub fn build_recommendation_prompt(
    emotion: &EmotionSignal,
    nutrition: &NutritionSummary,
    mood_text: &str,
    profile: Option<&HealthProfile>,
) -> String {
    let emotion = json!({
        "label": emotion.label,
        "risk_score": emotion.risk_score,
    });
    let nutrition = json!({
        "calories": nutrition.calories,
        "protein": nutrition.protein,
        "fat": nutrition.fat,
        "carbs": nutrition.carbs,
    });

    format!(
        "You are a diet and wellbeing assistant. Reply with exactly one JSON object and no other text. \
         The object must contain the keys: goal, meal_suggestion, next_meal_suggestion, \
         behavior_suggestion, risk_alert (may be null).\n\
         Input: emotion={emotion}, nutrition={nutrition}, mood_text={mood}, goal={goal}",
        mood = json!(mood_text),
        goal = goal_of(profile),
    )
}
