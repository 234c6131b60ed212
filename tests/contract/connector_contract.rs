//! Contract shared by every source connector: health probes report the
//! declared tier, retrieval failures degrade to empty results, and repeated
//! failures stop upstream traffic.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tariffscope_core::{
    CircuitState, CountryCode, FederalRegisterConnector, FetchPlan, HealthState, HttpClient,
    HttpError, HttpFuture, HttpRequest, HttpResponse, MacroSource, PolicySource, QualityTier,
    ResilientFetcher, SourceConnector, SourceId, TariffSource, TariffTrackerConnector,
    WorldBankConnector,
};

const TRACKER_URL: &str = "https://tracker.example/v1";

/// Transport that answers every request the same way and counts calls.
struct CountingClient {
    response: Result<HttpResponse, HttpError>,
    calls: AtomicUsize,
}

impl CountingClient {
    fn ok(body: &str) -> Arc<Self> {
        Arc::new(Self {
            response: Ok(HttpResponse::ok_json(body)),
            calls: AtomicUsize::new(0),
        })
    }

    fn refusing() -> Arc<Self> {
        Arc::new(Self {
            response: Err(HttpError::new("connection refused")),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl HttpClient for CountingClient {
    fn execute<'a>(&'a self, _request: HttpRequest) -> HttpFuture<'a> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let response = self.response.clone();
        Box::pin(async move { response })
    }
}

struct ConnectorCase {
    id: SourceId,
    declared_tier: QualityTier,
    build: fn(ResilientFetcher) -> ConnectorHandle,
}

enum ConnectorHandle {
    Policy(FederalRegisterConnector),
    Macro(WorldBankConnector),
    Tariff(TariffTrackerConnector),
}

impl ConnectorHandle {
    fn as_connector(&self) -> &dyn SourceConnector {
        match self {
            Self::Policy(connector) => connector,
            Self::Macro(connector) => connector,
            Self::Tariff(connector) => connector,
        }
    }

    fn circuit_state(&self) -> CircuitState {
        match self {
            Self::Policy(connector) => connector.circuit_state(),
            Self::Macro(connector) => connector.circuit_state(),
            Self::Tariff(connector) => connector.circuit_state(),
        }
    }

    /// Runs the connector's country retrieval and reports whether anything came back.
    async fn retrieve(&self, country: &CountryCode) -> bool {
        match self {
            Self::Policy(connector) => !connector.policy_documents(country).await.is_empty(),
            Self::Macro(connector) => !connector.economic_indicators(country).await.is_empty(),
            Self::Tariff(connector) => connector.current_tariff(country).await.is_some(),
        }
    }
}

fn connector_cases() -> Vec<ConnectorCase> {
    vec![
        ConnectorCase {
            id: SourceId::FederalRegister,
            declared_tier: QualityTier::High,
            build: |fetcher| ConnectorHandle::Policy(FederalRegisterConnector::new(fetcher)),
        },
        ConnectorCase {
            id: SourceId::WorldBank,
            declared_tier: QualityTier::High,
            build: |fetcher| ConnectorHandle::Macro(WorldBankConnector::new(fetcher)),
        },
        ConnectorCase {
            id: SourceId::TariffTracker,
            declared_tier: QualityTier::Medium,
            build: |fetcher| {
                ConnectorHandle::Tariff(TariffTrackerConnector::new(
                    fetcher,
                    Some(String::from(TRACKER_URL)),
                ))
            },
        },
    ]
}

fn fetcher(client: Arc<CountingClient>) -> ResilientFetcher {
    ResilientFetcher::new(client, FetchPlan::default())
}

fn china() -> CountryCode {
    CountryCode::parse("CHN").expect("valid code")
}

#[tokio::test]
async fn healthy_probe_reports_declared_tier_for_all_connectors() {
    for case in connector_cases() {
        let connector = (case.build)(fetcher(CountingClient::ok("{}")));
        let status = connector.as_connector().check_status().await;

        assert_eq!(connector.as_connector().id(), case.id);
        assert_eq!(status.source, case.id);
        assert_eq!(status.health, HealthState::Active, "connector '{}'", case.id);
        assert_eq!(status.quality_tier, case.declared_tier, "connector '{}'", case.id);
        assert!(status.coverage_percent > 0.0);
        assert!(status.message.is_none());
    }
}

#[tokio::test]
async fn failed_probe_reports_error_with_detail_for_all_connectors() {
    for case in connector_cases() {
        let connector = (case.build)(fetcher(CountingClient::refusing()));
        let status = connector.as_connector().check_status().await;

        assert_eq!(status.health, HealthState::Error, "connector '{}'", case.id);
        assert_eq!(status.quality_tier, QualityTier::Low);
        assert_eq!(status.coverage_percent, 0.0);
        let message = status.message.expect("error status carries a message");
        assert!(message.contains("connection refused"), "connector '{}': {message}", case.id);
    }
}

#[tokio::test]
async fn retrieval_failure_degrades_to_empty_for_all_connectors() {
    for case in connector_cases() {
        let connector = (case.build)(fetcher(CountingClient::refusing()));
        assert!(!connector.retrieve(&china()).await, "connector '{}'", case.id);
    }
}

#[tokio::test]
async fn undecodable_payload_degrades_to_empty_for_all_connectors() {
    for case in connector_cases() {
        let connector = (case.build)(fetcher(CountingClient::ok("<html>rate limited</html>")));
        assert!(!connector.retrieve(&china()).await, "connector '{}'", case.id);
        // The upstream answered, so a bad body does not count against the circuit.
        assert_eq!(connector.circuit_state(), CircuitState::Closed);
    }
}

#[tokio::test]
async fn repeated_failures_stop_upstream_traffic_for_all_connectors() {
    for case in connector_cases() {
        let client = CountingClient::refusing();
        let connector = (case.build)(fetcher(Arc::clone(&client)));

        for _ in 0..3 {
            connector.retrieve(&china()).await;
        }
        assert_eq!(connector.circuit_state(), CircuitState::Open, "connector '{}'", case.id);

        // World Bank issues one request per indicator series.
        let calls_before = client.calls();
        assert!(calls_before >= 3);
        assert!(!connector.retrieve(&china()).await);
        assert_eq!(client.calls(), calls_before, "connector '{}' hit the network", case.id);
    }
}

#[tokio::test]
async fn disabled_tracker_reports_inactive_without_network() {
    let client = CountingClient::ok("{}");
    let tracker = TariffTrackerConnector::new(fetcher(Arc::clone(&client)), None);

    let status = tracker.check_status().await;
    assert_eq!(status.health, HealthState::Inactive);
    assert!(tracker.current_tariff(&china()).await.is_none());
    assert_eq!(client.calls(), 0);
}
