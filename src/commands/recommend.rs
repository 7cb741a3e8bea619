//! Meal recommendation command.

use anyhow::{Context as _, Result};
use clap::Args;
use gateway_recommend::{
    EmotionSignal, HealthProfile, NutritionSummary, RecommendationInput, RecommendationOutcome,
};
use std::path::PathBuf;

use crate::context::GatewayContext;
use crate::output::{self, CommandResult, OutputFormat};

/// Arguments for the recommend command.
#[derive(Args, Debug)]
pub struct RecommendArgs {
    /// Read the whole input as JSON from this file instead of flags
    #[arg(long, conflicts_with_all = ["emotion", "risk", "calories"])]
    pub input: Option<PathBuf>,

    /// Emotion label from the scorer
    #[arg(long, default_value = "neutral")]
    pub emotion: String,

    /// Emotional eating risk in [0, 1]
    #[arg(long, default_value_t = 0.0)]
    pub risk: f64,

    /// Meal calories
    #[arg(long, default_value_t = 0.0)]
    pub calories: f64,

    /// Meal protein in grams
    #[arg(long, default_value_t = 0.0)]
    pub protein: f64,

    /// Meal fat in grams
    #[arg(long, default_value_t = 0.0)]
    pub fat: f64,

    /// Meal carbohydrates in grams
    #[arg(long, default_value_t = 0.0)]
    pub carbs: f64,

    /// Free-text mood note
    #[arg(long, default_value = "")]
    pub mood: String,

    /// Dietary goal, e.g. fat_loss
    #[arg(long)]
    pub goal: Option<String>,

    /// Meal photo URL (repeatable)
    #[arg(long = "image")]
    pub images: Vec<String>,
}

impl RecommendArgs {
    async fn into_input(self) -> Result<RecommendationInput> {
        if let Some(path) = self.input {
            let raw = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            return serde_json::from_str(&raw)
                .with_context(|| format!("invalid recommendation input in {}", path.display()));
        }

        Ok(RecommendationInput {
            emotion: EmotionSignal {
                label: self.emotion,
                risk_score: self.risk,
            },
            nutrition: NutritionSummary {
                calories: self.calories,
                protein: self.protein,
                fat: self.fat,
                carbs: self.carbs,
            },
            mood_text: self.mood,
            profile: self.goal.map(HealthProfile::with_goal),
            image_urls: self.images,
        })
    }
}

/// Execute the recommend command.
pub async fn execute(args: RecommendArgs, ctx: &GatewayContext, json: bool) -> Result<()> {
    let format = OutputFormat::from_json_flag(json);
    let input = args.into_input().await?;
    let outcome = ctx.recommendations().recommend(&input).await;

    if json {
        CommandResult::success(outcome).print(format)?;
    } else {
        display_outcome(&outcome);
    }
    Ok(())
}

fn display_outcome(outcome: &RecommendationOutcome) {
    let rec = &outcome.recommendation;
    output::section(&format!("Recommendation ({})", outcome.generation_mode));
    output::key_value("Goal", &rec.goal);
    output::key_value("This meal", &rec.meal_suggestion);
    output::key_value("Next meal", &rec.next_meal_suggestion);
    output::key_value("Behaviour", &rec.behavior_suggestion);
    if let Some(alert) = &rec.risk_alert {
        output::warning(alert);
    }
    if let Some(reason) = &outcome.fallback_reason {
        output::key_value("Fallback reason", reason);
    }
}
