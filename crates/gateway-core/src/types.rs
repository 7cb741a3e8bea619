//! Validated domain types (newtypes).

use crate::error::GatewayError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a configured provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(pub i64);

impl ProviderId {
    /// Raw integer value
    #[must_use]
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ProviderId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Capability bucket used to select a model per provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Global default model
    Default,
    /// Mood / emotion text scoring
    Emotion,
    /// Image understanding
    Vision,
    /// Dietary recommendation
    Recommend,
}

impl TaskType {
    /// Every task in the vocabulary
    pub const ALL: [Self; 4] = [Self::Default, Self::Emotion, Self::Vision, Self::Recommend];

    /// Wire name of the task
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Emotion => "emotion",
            Self::Vision => "vision",
            Self::Recommend => "recommend",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                GatewayError::validation(
                    format!(
                        "unknown task '{s}', expected one of: default, emotion, vision, recommend"
                    ),
                    Some("task"),
                )
            })
    }
}
