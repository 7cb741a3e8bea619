//! Test fixtures and sample data for integration tests

use crate::mock_providers::{MockKind, MockProvider, GEMINI_MODEL};
use gateway_core::{ModelMap, NewProviderConfig, ProviderKind, TaskType};
use gateway_recommend::{EmotionSignal, HealthProfile, NutritionSummary, RecommendationInput};
use serde_json::json;

/// Credential registered for every mock provider
pub const TEST_API_KEY: &str = "test-key";

/// Provider row pointing at a mock server
pub fn provider_for(mock: &MockProvider, name: &str, priority: i32) -> NewProviderConfig {
    let (kind, model_map) = match mock.kind {
        MockKind::OpenAi => (
            ProviderKind::OpenaiCompatible,
            ModelMap::new()
                .with(TaskType::Default, "gpt-4o-mini")
                .with(TaskType::Vision, "gpt-4o"),
        ),
        MockKind::Gemini => (
            ProviderKind::Gemini,
            ModelMap::new().with(TaskType::Default, GEMINI_MODEL),
        ),
        MockKind::Claude => (
            ProviderKind::Claude,
            ModelMap::new().with(TaskType::Default, "claude-3-5-haiku-latest"),
        ),
    };
    NewProviderConfig::new(kind, name, mock.base_url(), TEST_API_KEY)
        .with_model_map(model_map)
        .with_priority(priority)
}

/// A valid recommendation answer as a model would send it
pub fn recommendation_answer() -> String {
    let body = json!({
        "goal": "fat_loss",
        "meal_suggestion": "Swap the fries for a side salad",
        "next_meal_suggestion": "Grilled fish with greens",
        "behavior_suggestion": "Take a ten minute walk",
        "risk_alert": "Signs of stress eating"
    });
    format!("Here is my advice:\n```json\n{body}\n```")
}

/// Input for a stressed user after a heavy meal
pub fn stressed_heavy_meal() -> RecommendationInput {
    RecommendationInput {
        emotion: EmotionSignal {
            label: "stressed".to_string(),
            risk_score: 0.82,
        },
        nutrition: NutritionSummary {
            calories: 1150.0,
            protein: 35.0,
            fat: 60.0,
            carbs: 110.0,
        },
        mood_text: "exam week, ate late".to_string(),
        profile: Some(HealthProfile::with_goal("fat_loss")),
        image_urls: Vec::new(),
    }
}
