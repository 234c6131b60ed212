use serde::Deserialize;

use super::{log_retrieval_failure, BoxFuture, ConnectorRuntime, SourceConnector, SourceError, TariffSource};
use crate::circuit_breaker::CircuitState;
use crate::fetcher::ResilientFetcher;
use crate::http_client::{HttpAuth, HttpRequest};
use crate::source_policy::SourcePolicy;
use crate::{CalendarDate, CountryCode, SourceId, SourceStatus, TariffEntry};

/// Client for an independent tariff tracker exposing
/// `GET {base}/tariffs/{country}` and `GET {base}/health`.
///
/// There is no public default endpoint; without a base URL the connector is
/// disabled and reports `Inactive`.
#[derive(Clone)]
pub struct TariffTrackerConnector {
    runtime: ConnectorRuntime,
    base_url: Option<String>,
    auth: HttpAuth,
}

impl TariffTrackerConnector {
    pub fn new(fetcher: ResilientFetcher, base_url: Option<String>) -> Self {
        let base_url = base_url
            .map(|url| url.trim().trim_end_matches('/').to_owned())
            .filter(|url| !url.is_empty());
        Self {
            runtime: ConnectorRuntime::new(SourcePolicy::tariff_tracker_default(), fetcher)
                .with_enabled(base_url.is_some()),
            base_url,
            auth: HttpAuth::None,
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.auth = match api_key {
            Some(token) if !token.trim().is_empty() => HttpAuth::BearerToken(token.trim().to_owned()),
            _ => HttpAuth::None,
        };
        self
    }

    pub fn with_policy(mut self, policy: SourcePolicy) -> Self {
        let enabled = self.runtime.is_enabled();
        self.runtime = self.runtime.with_policy(policy).with_enabled(enabled);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.runtime.is_enabled()
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.runtime.circuit_state()
    }

    fn request(&self, path: &str) -> HttpRequest {
        let base = self.base_url.as_deref().unwrap_or_default();
        HttpRequest::get(format!("{base}{path}")).with_auth(&self.auth)
    }

    async fn fetch_entry(&self, country: &CountryCode) -> Result<Option<TariffEntry>, SourceError> {
        let payload = self
            .runtime
            .fetch_json::<Option<TrackerPayload>>(self.request(&format!("/tariffs/{}", country.as_str())))
            .await?;

        let Some(payload) = payload else {
            return Ok(None);
        };
        let Some(rate) = payload.rate else {
            return Ok(None);
        };

        if let Some(reported) = payload.country.as_deref() {
            if !reported.trim().eq_ignore_ascii_case(country.as_str()) {
                return Err(SourceError::malformed(
                    SourceId::TariffTracker,
                    format!("entry for '{reported}' returned for {country}"),
                ));
            }
        }

        let effective_date = payload
            .effective_date
            .as_deref()
            .and_then(|date| CalendarDate::parse(date).ok());
        let notes = payload.notes.filter(|notes| !notes.trim().is_empty());

        TariffEntry::new(rate, payload.sectors, effective_date, notes)
            .map(Some)
            .map_err(|error| SourceError::malformed(SourceId::TariffTracker, error.to_string()))
    }
}

impl SourceConnector for TariffTrackerConnector {
    fn id(&self) -> SourceId {
        SourceId::TariffTracker
    }

    fn check_status<'a>(&'a self) -> BoxFuture<'a, SourceStatus> {
        Box::pin(async move { self.runtime.probe(self.request("/health")).await })
    }
}

impl TariffSource for TariffTrackerConnector {
    fn current_tariff<'a>(&'a self, country: &'a CountryCode) -> BoxFuture<'a, Option<TariffEntry>> {
        Box::pin(async move {
            if !self.runtime.is_enabled() {
                return None;
            }
            match self.fetch_entry(country).await {
                Ok(entry) => entry,
                Err(error) => {
                    log_retrieval_failure("current_tariff", Some(country), &error);
                    None
                }
            }
        })
    }
}

#[derive(Debug, Deserialize)]
struct TrackerPayload {
    country: Option<String>,
    rate: Option<f64>,
    #[serde(default)]
    sectors: Vec<String>,
    effective_date: Option<String>,
    notes: Option<String>,
}
