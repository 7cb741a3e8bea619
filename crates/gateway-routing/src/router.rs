//! Fallback router.
//!
//! One call walks the enabled providers in priority order. Each provider
//! gets a circuit check, then up to `max_retries` attempts with linear
//! backoff between them. Every attempt and every skip is appended to the
//! call log before the next decision is made, so the circuit breaker of
//! a concurrent call already sees it.
//!
//! Provider failures are values: the only `Err` this module returns is a
//! store failure.

use crate::registry::ProviderRegistry;
use gateway_config::RoutingSettings;
use gateway_core::{
    AdapterFactory, AuditLogStore, CallLogEntry, CallLogStore, FallbackResponse, GatewayResult,
    HealthCheckReport, NewCallLogEntry, ProviderConfig, ProviderId, ProviderRequest,
    ProviderResult, ProviderStore, TaskType, DEFAULT_TEMPERATURE,
};
use gateway_resilience::{
    CircuitBreakerConfig, CircuitEvaluation, LogCircuitBreaker, RetryPolicy,
};
use gateway_telemetry::{GatewayMetrics, RequestOutcome};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::Instant;
use tracing::{debug, info, warn, Instrument};

/// Error recorded when the caller drops a call mid-attempt
pub const CANCELLED_BY_CALLER: &str = "attempt cancelled by caller";

/// Router configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RouterConfig {
    /// Attempts per provider and backoff between them
    pub retry: RetryPolicy,
    /// Circuit breaker settings
    pub circuit: CircuitBreakerConfig,
    /// Upper bound for a single adapter call
    pub attempt_timeout: Option<Duration>,
    /// Upper bound for a whole call, backoff included
    pub request_timeout: Option<Duration>,
    /// Sampling temperature sent to providers
    pub temperature: f32,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            circuit: CircuitBreakerConfig::default(),
            attempt_timeout: None,
            request_timeout: None,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl RouterConfig {
    /// Create a configuration builder
    #[must_use]
    pub fn builder() -> RouterConfigBuilder {
        RouterConfigBuilder::default()
    }
}

impl From<&RoutingSettings> for RouterConfig {
    fn from(settings: &RoutingSettings) -> Self {
        Self {
            retry: RetryPolicy::linear(settings.max_retries, settings.retry_backoff),
            circuit: CircuitBreakerConfig::new(
                settings.circuit_failure_threshold,
                settings.circuit_window,
            )
            .with_slack(settings.circuit_slack),
            attempt_timeout: settings.attempt_timeout,
            request_timeout: settings.request_timeout,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// Builder for [`RouterConfig`]
#[derive(Debug, Default)]
pub struct RouterConfigBuilder {
    config: RouterConfig,
}

impl RouterConfigBuilder {
    /// Attempts per provider
    #[must_use]
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        let backoff = self.config.retry.config().backoff;
        self.config.retry = RetryPolicy::linear(max_retries, backoff);
        self
    }

    /// Base backoff delay
    #[must_use]
    pub fn retry_backoff(mut self, backoff: Duration) -> Self {
        let max_retries = self.config.retry.config().max_retries;
        self.config.retry = RetryPolicy::linear(max_retries, backoff);
        self
    }

    /// Consecutive failures that open a circuit
    #[must_use]
    pub fn circuit_failure_threshold(mut self, threshold: u32) -> Self {
        self.config.circuit.failure_threshold = threshold;
        self
    }

    /// Window read by the circuit breaker
    #[must_use]
    pub fn circuit_window(mut self, window: Duration) -> Self {
        self.config.circuit.window = window;
        self
    }

    /// Extra entries read beyond the threshold
    #[must_use]
    pub fn circuit_slack(mut self, slack: u32) -> Self {
        self.config.circuit.slack = slack;
        self
    }

    /// Per-attempt timeout
    #[must_use]
    pub fn attempt_timeout(mut self, timeout: Duration) -> Self {
        self.config.attempt_timeout = Some(timeout);
        self
    }

    /// Whole-call deadline
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = Some(timeout);
        self
    }

    /// Sampling temperature
    #[must_use]
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = temperature;
        self
    }

    /// Build the configuration
    #[must_use]
    pub fn build(self) -> RouterConfig {
        self.config
    }
}

/// Circuit state of one enabled provider for a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderCircuit {
    /// Provider
    pub provider_id: ProviderId,
    /// Display name
    pub name: String,
    /// Priority
    pub priority: i32,
    /// Evaluated task
    pub task: TaskType,
    /// Breaker evaluation
    pub evaluation: CircuitEvaluation,
}

enum AttemptOutcome {
    Succeeded(String),
    Failed,
    DeadlineExceeded,
}

/// Which limit bounds the next adapter call
#[derive(Debug, Clone, Copy)]
enum Budget {
    Attempt(Duration),
    Deadline(Duration),
}

impl Budget {
    fn duration(self) -> Duration {
        match self {
            Self::Attempt(d) | Self::Deadline(d) => d,
        }
    }
}

/// Provider router with retries, circuit breaking and fallback
pub struct Router {
    registry: ProviderRegistry,
    log: Arc<dyn CallLogStore>,
    breaker: LogCircuitBreaker,
    factory: Arc<dyn AdapterFactory>,
    config: RouterConfig,
    metrics: Option<GatewayMetrics>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("config", &self.config)
            .field("metrics", &self.metrics.is_some())
            .finish_non_exhaustive()
    }
}

impl Router {
    /// Create a router
    #[must_use]
    pub fn new(
        providers: Arc<dyn ProviderStore>,
        log: Arc<dyn CallLogStore>,
        factory: Arc<dyn AdapterFactory>,
        config: RouterConfig,
    ) -> Self {
        Self {
            registry: ProviderRegistry::new(providers),
            breaker: LogCircuitBreaker::new(Arc::clone(&log), config.circuit.clone()),
            log,
            factory,
            config,
            metrics: None,
        }
    }

    /// Record provider administration in `audit`, attributed to `actor`
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<dyn AuditLogStore>, actor: Option<String>) -> Self {
        self.registry = self.registry.with_audit(audit, actor);
        self
    }

    /// Mirror logged attempts and outcomes into `metrics`
    #[must_use]
    pub fn with_metrics(mut self, metrics: GatewayMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Get the configuration
    #[must_use]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Get the provider registry
    #[must_use]
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Get the call log
    #[must_use]
    pub fn call_log(&self) -> &Arc<dyn CallLogStore> {
        &self.log
    }

    /// Get the metrics, if attached
    #[must_use]
    pub fn metrics(&self) -> Option<&GatewayMetrics> {
        self.metrics.as_ref()
    }

    /// Run `prompt` against the enabled providers until one succeeds.
    ///
    /// Requests with images go through the adapters' `vision` entry point,
    /// all others through `chat`.
    ///
    /// # Errors
    /// Returns a storage error if the registry or call log fails. Provider
    /// failures are reported in the returned [`FallbackResponse`].
    pub async fn call_with_fallback(
        &self,
        task: TaskType,
        prompt: &str,
        image_urls: &[String],
    ) -> GatewayResult<FallbackResponse> {
        let deadline = self.config.request_timeout.map(|t| Instant::now() + t);
        let request = ProviderRequest::new(task, prompt)
            .with_images(image_urls.to_vec())
            .with_temperature(self.config.temperature);

        let providers = self.registry.list_enabled().await?;
        if providers.is_empty() {
            warn!(task = %task, "No enabled providers");
            return Ok(self.finish(
                task,
                RequestOutcome::NoProviders,
                FallbackResponse::failure(FallbackResponse::NO_ENABLED_PROVIDERS),
            ));
        }

        debug!(task = %task, candidates = providers.len(), images = request.image_urls.len(), "Routing call");

        for provider in &providers {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Ok(self.deadline_exceeded(task));
            }

            let circuit = self.breaker.evaluate(provider.id, task).await?;
            if circuit.is_open() {
                info!(
                    provider_id = %provider.id,
                    task = %task,
                    consecutive_failures = circuit.consecutive_failures,
                    "Skipping provider with open circuit"
                );
                self.record(NewCallLogEntry::skipped(provider.id, task)).await?;
                continue;
            }

            let attempts = self.config.retry.attempts();
            for attempt in 1..=attempts {
                let span = gateway_telemetry::provider_span!(provider.id, task, attempt);
                match self
                    .attempt(provider, &request, attempt, deadline)
                    .instrument(span)
                    .await?
                {
                    AttemptOutcome::Succeeded(content) => {
                        info!(provider_id = %provider.id, task = %task, attempt, "Provider call succeeded");
                        return Ok(self.finish(
                            task,
                            RequestOutcome::Success,
                            FallbackResponse::success(content, provider.id, attempt),
                        ));
                    }
                    AttemptOutcome::DeadlineExceeded => return Ok(self.deadline_exceeded(task)),
                    AttemptOutcome::Failed => {}
                }

                if self.config.retry.should_retry(attempt) {
                    let delay = self.config.retry.delay_for_attempt(attempt);
                    debug!(provider_id = %provider.id, attempt, delay_ms = delay.as_millis() as u64, "Backing off");
                    if !backoff(delay, deadline).await {
                        return Ok(self.deadline_exceeded(task));
                    }
                }
            }

            warn!(provider_id = %provider.id, task = %task, attempts, "Provider exhausted, falling through");
        }

        warn!(task = %task, "All providers failed");
        Ok(self.finish(
            task,
            RequestOutcome::Exhausted,
            FallbackResponse::failure(FallbackResponse::ALL_PROVIDERS_FAILED),
        ))
    }

    async fn attempt(
        &self,
        provider: &ProviderConfig,
        request: &ProviderRequest,
        attempt: u32,
        deadline: Option<Instant>,
    ) -> GatewayResult<AttemptOutcome> {
        let task = request.task;
        let adapter = match self.factory.build(provider) {
            Ok(adapter) => adapter,
            Err(err) => {
                warn!(error = %err, "Adapter construction failed");
                self.record(NewCallLogEntry::failed(provider.id, task, attempt, 0, err.to_string()))
                    .await?;
                return Ok(AttemptOutcome::Failed);
            }
        };

        let mut guard = AttemptGuard::arm(
            Arc::clone(&self.log),
            self.metrics.clone(),
            provider.id,
            task,
            attempt,
        );
        let call = async {
            if request.has_images() {
                adapter.vision(request).await
            } else {
                adapter.chat(request).await
            }
        };

        let (entry, outcome) = match self.budget(deadline) {
            None => Self::settle_result(provider.id, task, attempt, call.await),
            Some(budget) => match tokio::time::timeout(budget.duration(), call).await {
                Ok(result) => Self::settle_result(provider.id, task, attempt, result),
                Err(_) => Self::timed_out(provider.id, task, attempt, guard.elapsed_ms(), budget),
            },
        };

        // Armed until the append returns; a drop while it is pending logs
        // the settled entry instead of a cancellation.
        guard.settle(entry.clone());
        let recorded = self.record(entry).await;
        guard.disarm();
        recorded?;
        Ok(outcome)
    }

    fn settle_result(
        provider_id: ProviderId,
        task: TaskType,
        attempt: u32,
        result: ProviderResult,
    ) -> (NewCallLogEntry, AttemptOutcome) {
        let entry = NewCallLogEntry::from_result(provider_id, task, attempt, &result);
        if result.ok {
            (entry, AttemptOutcome::Succeeded(result.content))
        } else {
            warn!(
                latency_ms = result.latency_ms,
                error = result.error.as_deref().unwrap_or_default(),
                "Attempt failed"
            );
            (entry, AttemptOutcome::Failed)
        }
    }

    fn timed_out(
        provider_id: ProviderId,
        task: TaskType,
        attempt: u32,
        latency_ms: u64,
        budget: Budget,
    ) -> (NewCallLogEntry, AttemptOutcome) {
        match budget {
            Budget::Attempt(limit) => {
                let message = format!("attempt timed out after {}ms", limit.as_millis());
                warn!(latency_ms, error = %message, "Attempt timed out");
                (
                    NewCallLogEntry::failed(provider_id, task, attempt, latency_ms, message),
                    AttemptOutcome::Failed,
                )
            }
            Budget::Deadline(_) => (
                NewCallLogEntry::failed(
                    provider_id,
                    task,
                    attempt,
                    latency_ms,
                    FallbackResponse::DEADLINE_EXCEEDED,
                ),
                AttemptOutcome::DeadlineExceeded,
            ),
        }
    }

    fn budget(&self, deadline: Option<Instant>) -> Option<Budget> {
        let remaining = deadline.map(|d| d.saturating_duration_since(Instant::now()));
        match (self.config.attempt_timeout, remaining) {
            (None, None) => None,
            (Some(limit), None) => Some(Budget::Attempt(limit)),
            (None, Some(remaining)) => Some(Budget::Deadline(remaining)),
            (Some(limit), Some(remaining)) if limit < remaining => Some(Budget::Attempt(limit)),
            (Some(_), Some(remaining)) => Some(Budget::Deadline(remaining)),
        }
    }

    async fn record(&self, entry: NewCallLogEntry) -> GatewayResult<CallLogEntry> {
        let stored = self.log.append(entry).await?;
        if let (Some(metrics), Some(provider_id)) = (&self.metrics, stored.provider_id) {
            metrics.record_attempt(provider_id, stored.task, stored.status, stored.latency_ms);
        }
        Ok(stored)
    }

    fn finish(
        &self,
        task: TaskType,
        outcome: RequestOutcome,
        response: FallbackResponse,
    ) -> FallbackResponse {
        if let Some(metrics) = &self.metrics {
            metrics.record_outcome(task, outcome);
        }
        response
    }

    fn deadline_exceeded(&self, task: TaskType) -> FallbackResponse {
        warn!(task = %task, "Request deadline exceeded");
        self.finish(
            task,
            RequestOutcome::DeadlineExceeded,
            FallbackResponse::failure(FallbackResponse::DEADLINE_EXCEEDED),
        )
    }

    /// Check one provider.
    ///
    /// A provider whose adapter cannot be built is reported as failing.
    pub async fn health_check(&self, provider: &ProviderConfig) -> HealthCheckReport {
        let result = match self.factory.build(provider) {
            Ok(adapter) => adapter.health_check().await,
            Err(err) => ProviderResult::failure(err.to_string(), 0),
        };
        let report = HealthCheckReport::from_result(provider.id, result);
        info!(
            provider_id = %provider.id,
            ok = report.ok,
            detail = %report.detail,
            latency_ms = report.latency_ms,
            "Health check"
        );
        report
    }

    /// Circuit evaluation of every enabled provider for `task`
    ///
    /// # Errors
    /// Returns a storage error if the registry or call log fails
    pub async fn circuit_overview(&self, task: TaskType) -> GatewayResult<Vec<ProviderCircuit>> {
        let providers = self.registry.list_enabled().await?;
        let mut overview = Vec::with_capacity(providers.len());
        for provider in providers {
            let evaluation = self.breaker.evaluate(provider.id, task).await?;
            overview.push(ProviderCircuit {
                provider_id: provider.id,
                name: provider.name,
                priority: provider.priority,
                task,
                evaluation,
            });
        }
        Ok(overview)
    }
}

/// Sleep for `delay`, or until `deadline` if that comes first.
///
/// Returns `false` when the deadline cut the sleep short.
async fn backoff(delay: Duration, deadline: Option<Instant>) -> bool {
    match deadline {
        Some(deadline) if Instant::now() + delay > deadline => {
            tokio::time::sleep_until(deadline).await;
            false
        }
        _ => {
            tokio::time::sleep(delay).await;
            true
        }
    }
}

/// Logs an in-flight attempt if its future is dropped.
///
/// Before the adapter settles, a drop is logged as a cancelled failure.
/// Once [`settle`](Self::settle) hands over the entry, a drop logs that
/// entry, so an attempt whose log append was interrupted is not lost.
struct AttemptGuard {
    log: Arc<dyn CallLogStore>,
    metrics: Option<GatewayMetrics>,
    provider_id: ProviderId,
    task: TaskType,
    attempt: u32,
    started: Instant,
    settled: Option<NewCallLogEntry>,
    armed: bool,
}

impl AttemptGuard {
    fn arm(
        log: Arc<dyn CallLogStore>,
        metrics: Option<GatewayMetrics>,
        provider_id: ProviderId,
        task: TaskType,
        attempt: u32,
    ) -> Self {
        Self {
            log,
            metrics,
            provider_id,
            task,
            attempt,
            started: Instant::now(),
            settled: None,
            armed: true,
        }
    }

    /// The entry to write if dropped from here on
    fn settle(&mut self, entry: NewCallLogEntry) {
        self.settled = Some(entry);
    }

    /// Stop guarding
    fn disarm(&mut self) {
        self.armed = false;
    }

    fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

impl Drop for AttemptGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let entry = match self.settled.take() {
            Some(entry) => {
                warn!(
                    provider_id = %self.provider_id,
                    task = %self.task,
                    attempt = self.attempt,
                    status = %entry.status,
                    "Call dropped while logging attempt"
                );
                entry
            }
            None => {
                let latency_ms = self.elapsed_ms();
                warn!(
                    provider_id = %self.provider_id,
                    task = %self.task,
                    attempt = self.attempt,
                    latency_ms,
                    "Attempt cancelled by caller"
                );
                NewCallLogEntry::failed(
                    self.provider_id,
                    self.task,
                    self.attempt,
                    latency_ms,
                    CANCELLED_BY_CALLER,
                )
            }
        };
        if let Some(metrics) = &self.metrics {
            metrics.record_attempt(self.provider_id, self.task, entry.status, entry.latency_ms);
        }

        match Handle::try_current() {
            Ok(handle) => {
                let log = Arc::clone(&self.log);
                handle.spawn(async move {
                    if let Err(err) = log.append(entry).await {
                        warn!(error = %err, "Failed to log dropped attempt");
                    }
                });
            }
            Err(_) => warn!("No runtime available to log dropped attempt"),
        }
    }
}
