//! Circuit breaker derived from the call log.
//!
//! No state is cached between invocations: the breaker reads the tail of
//! the call log for a (provider, task) pair and decides from that alone,
//! so every process sharing the log sees the same circuit. Only `ok` and
//! `failed` entries are read; the skips an open circuit writes never push
//! the failures that opened it out of the sample.

use chrono::{DateTime, Utc};
use gateway_core::{CallLogEntry, CallLogStore, CallStatus, GatewayResult, ProviderId, TaskType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Requests flow normally
    Closed,
    /// Provider is skipped
    Open,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => f.write_str("closed"),
            Self::Open => f.write_str("open"),
        }
    }
}

/// Circuit breaker configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit; 0 disables the breaker
    pub failure_threshold: u32,
    /// Only entries this recent are considered
    pub window: Duration,
    /// Extra entries read beyond the threshold
    pub slack: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            window: Duration::from_secs(300),
            slack: 5,
        }
    }
}

impl CircuitBreakerConfig {
    /// Create a configuration with the default slack
    #[must_use]
    pub fn new(failure_threshold: u32, window: Duration) -> Self {
        Self {
            failure_threshold,
            window,
            ..Self::default()
        }
    }

    /// Set the slack
    #[must_use]
    pub fn with_slack(mut self, slack: u32) -> Self {
        self.slack = slack;
        self
    }

    /// Whether the breaker can ever open
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.failure_threshold > 0
    }

    /// Number of log entries read per evaluation
    #[must_use]
    pub fn sample_size(&self) -> usize {
        self.failure_threshold.saturating_add(self.slack) as usize
    }

    /// Oldest timestamp inside the window ending at `now`
    #[must_use]
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        chrono::Duration::from_std(self.window)
            .ok()
            .and_then(|window| now.checked_sub_signed(window))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Result of evaluating one (provider, task) circuit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitEvaluation {
    /// Derived state
    pub state: CircuitState,
    /// Length of the failure streak at the head of the log
    pub consecutive_failures: u32,
    /// Number of `ok`/`failed` entries inspected
    pub sampled: usize,
}

impl CircuitEvaluation {
    /// Evaluation used when the breaker is disabled
    #[must_use]
    pub fn closed() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            sampled: 0,
        }
    }

    /// Whether the provider should be skipped
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == CircuitState::Open
    }
}

/// Decide the circuit state from entries ordered newest first.
///
/// `failed` extends the streak, `ok` ends the walk, and circuit-open
/// skips are passed over without counting.
#[must_use]
pub fn evaluate(entries: &[CallLogEntry], failure_threshold: u32) -> CircuitEvaluation {
    if failure_threshold == 0 {
        return CircuitEvaluation::closed();
    }

    let mut streak = 0u32;
    for entry in entries {
        match entry.status {
            CallStatus::Failed => streak += 1,
            CallStatus::Ok => break,
            CallStatus::SkippedCircuitOpen => {}
        }
    }

    CircuitEvaluation {
        state: if streak >= failure_threshold {
            CircuitState::Open
        } else {
            CircuitState::Closed
        },
        consecutive_failures: streak,
        sampled: entries.len(),
    }
}

/// Circuit breaker reading a shared call log
#[derive(Clone)]
pub struct LogCircuitBreaker {
    log: Arc<dyn CallLogStore>,
    config: CircuitBreakerConfig,
}

impl fmt::Debug for LogCircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogCircuitBreaker")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LogCircuitBreaker {
    /// Create a breaker over a call log
    #[must_use]
    pub fn new(log: Arc<dyn CallLogStore>, config: CircuitBreakerConfig) -> Self {
        Self { log, config }
    }

    /// Get the configuration
    #[must_use]
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Evaluate the circuit for (provider, task) as of now.
    ///
    /// # Errors
    /// Returns a storage error if the call log cannot be read
    pub async fn evaluate(
        &self,
        provider_id: ProviderId,
        task: TaskType,
    ) -> GatewayResult<CircuitEvaluation> {
        self.evaluate_at(provider_id, task, Utc::now()).await
    }

    /// Evaluate the circuit for (provider, task) as of `now`.
    ///
    /// # Errors
    /// Returns a storage error if the call log cannot be read
    pub async fn evaluate_at(
        &self,
        provider_id: ProviderId,
        task: TaskType,
        now: DateTime<Utc>,
    ) -> GatewayResult<CircuitEvaluation> {
        if !self.config.is_enabled() {
            return Ok(CircuitEvaluation::closed());
        }

        let since = self.config.window_start(now);
        let entries = self
            .log
            .recent_outcomes_for(provider_id, task, since, self.config.sample_size())
            .await?;

        let evaluation = evaluate(&entries, self.config.failure_threshold);
        if evaluation.is_open() {
            warn!(
                provider_id = %provider_id,
                task = %task,
                consecutive_failures = evaluation.consecutive_failures,
                threshold = self.config.failure_threshold,
                "Circuit open"
            );
        } else {
            debug!(
                provider_id = %provider_id,
                task = %task,
                consecutive_failures = evaluation.consecutive_failures,
                sampled = evaluation.sampled,
                "Circuit closed"
            );
        }
        Ok(evaluation)
    }
}
