//! Source connectors and their shared contract.
//!
//! Every external authority sits behind [`SourceConnector`] (health probe)
//! plus one retrieval trait:
//!
//! | Connector | Trait | Retrievals |
//! |-----------|-------|------------|
//! | [`FederalRegisterConnector`] | [`PolicySource`] | trade-policy documents |
//! | [`WorldBankConnector`] | [`MacroSource`] | GDP and trade-ratio series, country directory |
//! | [`TariffTrackerConnector`] | [`TariffSource`] | current tariff entry |
//!
//! Retrievals never return errors. Transport failures, an open circuit and
//! malformed payloads are classified as [`SourceError`], logged, and
//! flattened into an empty list or `None` before they leave the connector.

mod federal_register;
mod tariff_tracker;
mod world_bank;

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::circuit_breaker::{CircuitBreaker, CircuitState};
use crate::fetcher::ResilientFetcher;
use crate::http_client::HttpRequest;
use crate::source_policy::SourcePolicy;
use crate::throttling::RateGate;
use crate::{CountryCode, CountryInfo, IndicatorObservation, PolicyDocument, SourceId, SourceStatus, TariffEntry};

pub use federal_register::{FederalRegisterConnector, DEFAULT_RELEVANCE_KEYWORDS};
pub use tariff_tracker::TariffTrackerConnector;
pub use world_bank::WorldBankConnector;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Connector-level failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Unavailable,
    MalformedResponse,
    CircuitOpen,
    NotFound,
    InvalidRequest,
}

/// Structured failure raised inside a connector before it is flattened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    source: SourceId,
    kind: SourceErrorKind,
    message: String,
}

impl SourceError {
    fn new(source: SourceId, kind: SourceErrorKind, message: impl Into<String>) -> Self {
        Self {
            source,
            kind,
            message: message.into(),
        }
    }

    pub fn unavailable(source: SourceId, message: impl Into<String>) -> Self {
        Self::new(source, SourceErrorKind::Unavailable, message)
    }

    pub fn malformed(source: SourceId, message: impl Into<String>) -> Self {
        Self::new(source, SourceErrorKind::MalformedResponse, message)
    }

    pub fn circuit_open(source: SourceId) -> Self {
        Self::new(
            source,
            SourceErrorKind::CircuitOpen,
            "circuit breaker is open; skipping upstream call",
        )
    }

    pub fn not_found(source: SourceId, message: impl Into<String>) -> Self {
        Self::new(source, SourceErrorKind::NotFound, message)
    }

    pub fn invalid_request(source: SourceId, message: impl Into<String>) -> Self {
        Self::new(source, SourceErrorKind::InvalidRequest, message)
    }

    pub const fn source(&self) -> SourceId {
        self.source
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::MalformedResponse => "source.malformed_response",
            SourceErrorKind::CircuitOpen => "source.circuit_open",
            SourceErrorKind::NotFound => "source.not_found",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ({})", self.source, self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Health contract shared by every connector.
///
/// `check_status` always reaches the network (unless the connector is
/// disabled, which reports `Inactive`). A successful probe closes the
/// connector's circuit breaker.
pub trait SourceConnector: Send + Sync {
    fn id(&self) -> SourceId;

    fn check_status<'a>(&'a self) -> BoxFuture<'a, SourceStatus>;
}

/// Publisher of trade-policy documents.
pub trait PolicySource: SourceConnector {
    fn policy_documents<'a>(&'a self, country: &'a CountryCode) -> BoxFuture<'a, Vec<PolicyDocument>>;
}

/// Provider of macroeconomic series and the country directory.
pub trait MacroSource: SourceConnector {
    fn economic_indicators<'a>(
        &'a self,
        country: &'a CountryCode,
    ) -> BoxFuture<'a, Vec<IndicatorObservation>>;

    fn countries<'a>(&'a self) -> BoxFuture<'a, Vec<CountryInfo>>;
}

/// Independent tariff tracker.
pub trait TariffSource: SourceConnector {
    fn current_tariff<'a>(&'a self, country: &'a CountryCode) -> BoxFuture<'a, Option<TariffEntry>>;
}

/// Plumbing shared by the concrete connectors: fetcher, rate gate and
/// circuit breaker for one source.
#[derive(Clone)]
pub(crate) struct ConnectorRuntime {
    policy: SourcePolicy,
    fetcher: ResilientFetcher,
    gate: RateGate,
    breaker: Arc<CircuitBreaker>,
    enabled: bool,
}

impl ConnectorRuntime {
    pub(crate) fn new(policy: SourcePolicy, fetcher: ResilientFetcher) -> Self {
        Self {
            gate: RateGate::from_policy(&policy),
            breaker: Arc::new(CircuitBreaker::with_defaults(policy.source)),
            policy,
            fetcher,
            enabled: true,
        }
    }

    pub(crate) fn with_policy(mut self, policy: SourcePolicy) -> Self {
        self.gate = RateGate::from_policy(&policy);
        self.breaker = Arc::new(CircuitBreaker::with_defaults(policy.source));
        self.policy = policy;
        self
    }

    pub(crate) fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub(crate) fn source(&self) -> SourceId {
        self.policy.source
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn circuit_state(&self) -> CircuitState {
        self.breaker.state()
    }

    /// One health probe. Bypasses the breaker; a success closes it.
    ///
    /// Waiting on the rate gate counts against the fetch budget, so a probe
    /// never outlasts one full walk of the route list.
    pub(crate) async fn probe(&self, request: HttpRequest) -> SourceStatus {
        let source = self.source();
        if !self.enabled {
            return SourceStatus::inactive(source);
        }

        let budget = self.fetcher.plan().budget();
        let outcome = tokio::time::timeout(budget, async {
            self.gate.acquire().await;
            self.fetcher.fetch(request).await
        })
        .await;
        let Ok(outcome) = outcome else {
            warn!(%source, budget_ms = budget.as_millis() as u64, "health probe ran out of budget");
            return SourceStatus::error(
                source,
                format!("health probe exceeded its {} ms budget", budget.as_millis()),
            );
        };

        match outcome {
            Ok(success) => {
                self.breaker.record_success();
                debug!(%source, route = %success.route, latency_ms = success.latency_ms, "health probe succeeded");
                SourceStatus::active(source, self.policy.reliability, self.policy.coverage_percent)
            }
            Err(failure) => {
                self.breaker.record_failure();
                warn!(%source, error = %failure.summary(), "health probe failed");
                SourceStatus::error(source, failure.summary())
            }
        }
    }

    /// Fetches `request` and decodes the body as `T`.
    pub(crate) async fn fetch_json<T>(&self, request: HttpRequest) -> Result<T, SourceError>
    where
        T: DeserializeOwned,
    {
        let source = self.source();
        if !self.enabled {
            return Err(SourceError::invalid_request(source, "source disabled by configuration"));
        }
        if !self.breaker.allow_request() {
            return Err(SourceError::circuit_open(source));
        }

        self.gate.acquire().await;
        let success = match self.fetcher.fetch(request).await {
            Ok(success) => success,
            Err(failure) if failure.not_found() => {
                // Upstream answered; the resource simply does not exist.
                self.breaker.record_success();
                return Err(SourceError::not_found(source, failure.summary()));
            }
            Err(failure) => {
                self.breaker.record_failure();
                return Err(SourceError::unavailable(source, failure.summary()));
            }
        };
        self.breaker.record_success();

        serde_json::from_str(&success.response.body)
            .map_err(|error| SourceError::malformed(source, format!("failed to decode payload: {error}")))
    }
}

/// Logs a retrieval failure the way every connector reports degraded data.
pub(crate) fn log_retrieval_failure(operation: &'static str, country: Option<&CountryCode>, error: &SourceError) {
    let country = country.map(CountryCode::as_str).unwrap_or("-");
    match error.kind() {
        SourceErrorKind::NotFound => {
            debug!(source = %error.source(), operation, country, "no data upstream");
        }
        _ => {
            warn!(
                source = %error.source(),
                operation,
                country,
                code = error.code(),
                error = error.message(),
                "retrieval failed; continuing without this source"
            );
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_error_display_includes_source_and_code() {
        let error = SourceError::malformed(SourceId::WorldBank, "expected array");
        assert_eq!(
            error.to_string(),
            "world_bank: expected array (source.malformed_response)"
        );
        assert_eq!(error.kind(), SourceErrorKind::MalformedResponse);
    }

    #[tokio::test]
    async fn throttled_probe_gives_up_within_the_fetch_budget() {
        use std::time::Duration;

        use crate::connectors::test_support::RecordingHttpClient;
        use crate::fetcher::FetchPlan;
        use crate::HealthState;

        let client = Arc::new(RecordingHttpClient::json("[]"));
        let fetcher = ResilientFetcher::new(client.clone(), FetchPlan::direct(Duration::from_millis(80)));
        let policy = SourcePolicy {
            quota_window: Duration::from_secs(3_600),
            quota_limit: 1,
            ..SourcePolicy::world_bank_default()
        };
        let runtime = ConnectorRuntime::new(policy, fetcher);

        let first = runtime.probe(HttpRequest::get("https://api.example/health")).await;
        assert!(first.is_active());

        let second = tokio::time::timeout(
            Duration::from_secs(2),
            runtime.probe(HttpRequest::get("https://api.example/health")),
        )
        .await
        .expect("probe must return within its budget");

        assert_eq!(second.health, HealthState::Error);
        assert!(second.message.as_deref().unwrap_or_default().contains("budget"));
        assert_eq!(client.recorded_requests().len(), 1);
        assert_eq!(runtime.circuit_state(), CircuitState::Closed);
    }

    #[test]
    fn circuit_open_error_names_the_breaker() {
        let error = SourceError::circuit_open(SourceId::TariffTracker);
        assert_eq!(error.code(), "source.circuit_open");
        assert!(error.message().contains("circuit breaker"));
    }
}
