//! Append-only record of provider attempts.

use crate::error::GatewayError;
use crate::response::ProviderResult;
use crate::types::{ProviderId, TaskType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Outcome recorded for one attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    /// Provider answered
    Ok,
    /// Attempt failed
    Failed,
    /// Provider skipped because its circuit was open
    SkippedCircuitOpen,
}

impl CallStatus {
    /// Stored status string
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Failed => "failed",
            Self::SkippedCircuitOpen => "skipped_circuit_open",
        }
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CallStatus {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ok" => Ok(Self::Ok),
            "failed" => Ok(Self::Failed),
            "skipped_circuit_open" => Ok(Self::SkippedCircuitOpen),
            other => Err(GatewayError::storage(format!("unknown call status '{other}'"))),
        }
    }
}

/// A stored attempt record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallLogEntry {
    /// Row identifier, increasing in insertion order
    pub id: i64,
    /// Provider, if one was selected
    pub provider_id: Option<ProviderId>,
    /// Task of the call
    pub task: TaskType,
    /// 1-based attempt number; 0 for circuit-open skips
    pub attempt: u32,
    /// Latency of the attempt
    pub latency_ms: u64,
    /// Outcome
    pub status: CallStatus,
    /// Failure description
    pub error_message: Option<String>,
    /// When the entry was written
    pub created_at: DateTime<Utc>,
}

/// An attempt record before it is stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCallLogEntry {
    /// Provider, if one was selected
    pub provider_id: Option<ProviderId>,
    /// Task of the call
    pub task: TaskType,
    /// 1-based attempt number; 0 for circuit-open skips
    pub attempt: u32,
    /// Latency of the attempt
    pub latency_ms: u64,
    /// Outcome
    pub status: CallStatus,
    /// Failure description
    pub error_message: Option<String>,
    /// Timestamp to record
    pub created_at: DateTime<Utc>,
}

impl NewCallLogEntry {
    /// Record an adapter result
    #[must_use]
    pub fn from_result(
        provider_id: ProviderId,
        task: TaskType,
        attempt: u32,
        result: &ProviderResult,
    ) -> Self {
        Self {
            provider_id: Some(provider_id),
            task,
            attempt,
            latency_ms: result.latency_ms,
            status: if result.ok { CallStatus::Ok } else { CallStatus::Failed },
            error_message: result.error.clone(),
            created_at: Utc::now(),
        }
    }

    /// Record a failed attempt that produced no adapter result
    pub fn failed(
        provider_id: ProviderId,
        task: TaskType,
        attempt: u32,
        latency_ms: u64,
        error: impl Into<String>,
    ) -> Self {
        Self {
            provider_id: Some(provider_id),
            task,
            attempt,
            latency_ms,
            status: CallStatus::Failed,
            error_message: Some(error.into()),
            created_at: Utc::now(),
        }
    }

    /// Record a circuit-open skip
    #[must_use]
    pub fn skipped(provider_id: ProviderId, task: TaskType) -> Self {
        Self {
            provider_id: Some(provider_id),
            task,
            attempt: 0,
            latency_ms: 0,
            status: CallStatus::SkippedCircuitOpen,
            error_message: None,
            created_at: Utc::now(),
        }
    }

    /// Override the timestamp
    #[must_use]
    pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Materialise a stored entry
    #[must_use]
    pub fn into_entry(self, id: i64) -> CallLogEntry {
        CallLogEntry {
            id,
            provider_id: self.provider_id,
            task: self.task,
            attempt: self.attempt,
            latency_ms: self.latency_ms,
            status: self.status,
            error_message: self.error_message,
            created_at: self.created_at,
        }
    }
}
