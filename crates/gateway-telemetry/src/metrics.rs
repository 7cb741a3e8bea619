//! Prometheus metrics for routed calls.
//!
//! Every attempt the router logs is mirrored here, plus one outcome per
//! `call_with_fallback`. The registry is private to the instance so tests
//! and multiple routers do not collide on the global default registry.

use crate::logging::TelemetryError;
use gateway_core::{CallStatus, ProviderId, TaskType};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::fmt;

/// Final outcome of one fallback chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Some provider answered
    Success,
    /// No provider was enabled
    NoProviders,
    /// Every provider failed or was skipped
    Exhausted,
    /// The request deadline expired
    DeadlineExceeded,
}

impl RequestOutcome {
    /// Label value
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NoProviders => "no_providers",
            Self::Exhausted => "exhausted",
            Self::DeadlineExceeded => "deadline_exceeded",
        }
    }
}

impl fmt::Display for RequestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gateway metric set
#[derive(Clone)]
pub struct GatewayMetrics {
    registry: Registry,
    attempts_total: IntCounterVec,
    attempt_duration: HistogramVec,
    requests_total: IntCounterVec,
}

impl fmt::Debug for GatewayMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayMetrics").finish_non_exhaustive()
    }
}

impl GatewayMetrics {
    /// Create and register all metrics
    ///
    /// # Errors
    /// Returns an error if a metric cannot be registered
    pub fn new() -> Result<Self, TelemetryError> {
        let registry = Registry::new_custom(Some("meal_gateway".to_string()), None)?;

        let attempts_total = IntCounterVec::new(
            Opts::new("provider_attempts_total", "Provider attempts by status"),
            &["provider", "task", "status"],
        )?;

        let attempt_duration = HistogramVec::new(
            HistogramOpts::new(
                "provider_attempt_duration_seconds",
                "Latency of provider attempts",
            )
            .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
            &["provider", "task"],
        )?;

        let requests_total = IntCounterVec::new(
            Opts::new("requests_total", "Fallback chains by outcome"),
            &["task", "outcome"],
        )?;

        registry.register(Box::new(attempts_total.clone()))?;
        registry.register(Box::new(attempt_duration.clone()))?;
        registry.register(Box::new(requests_total.clone()))?;

        Ok(Self {
            registry,
            attempts_total,
            attempt_duration,
            requests_total,
        })
    }

    /// Record one logged attempt.
    ///
    /// Skipped attempts are counted but not timed.
    pub fn record_attempt(
        &self,
        provider_id: ProviderId,
        task: TaskType,
        status: CallStatus,
        latency_ms: u64,
    ) {
        let provider = provider_id.to_string();
        self.attempts_total
            .with_label_values(&[provider.as_str(), task.as_str(), status.as_str()])
            .inc();

        if status != CallStatus::SkippedCircuitOpen {
            let seconds = latency_ms as f64 / 1000.0;
            self.attempt_duration
                .with_label_values(&[provider.as_str(), task.as_str()])
                .observe(seconds);
        }
    }

    /// Record the outcome of a fallback chain
    pub fn record_outcome(&self, task: TaskType, outcome: RequestOutcome) {
        self.requests_total
            .with_label_values(&[task.as_str(), outcome.as_str()])
            .inc();
    }

    /// Attempts recorded for a label set
    #[must_use]
    pub fn attempt_count(&self, provider_id: ProviderId, task: TaskType, status: CallStatus) -> u64 {
        self.attempts_total
            .with_label_values(&[provider_id.to_string().as_str(), task.as_str(), status.as_str()])
            .get()
    }

    /// Outcomes recorded for a label set
    #[must_use]
    pub fn outcome_count(&self, task: TaskType, outcome: RequestOutcome) -> u64 {
        self.requests_total
            .with_label_values(&[task.as_str(), outcome.as_str()])
            .get()
    }

    /// Underlying registry
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render in the Prometheus text exposition format
    ///
    /// # Errors
    /// Returns an error if encoding fails
    pub fn render(&self) -> Result<String, TelemetryError> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::Metrics(e.to_string()))
    }
}
