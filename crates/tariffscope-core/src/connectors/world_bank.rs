use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{log_retrieval_failure, BoxFuture, ConnectorRuntime, MacroSource, SourceConnector, SourceError};
use crate::circuit_breaker::CircuitState;
use crate::fetcher::ResilientFetcher;
use crate::http_client::HttpRequest;
use crate::source_policy::SourcePolicy;
use crate::{CountryCode, CountryInfo, Indicator, IndicatorObservation, SourceId, SourceStatus};

pub const DEFAULT_BASE_URL: &str = "https://api.worldbank.org/v2";
const DEFAULT_RECENT_YEARS: u32 = 5;
const DIRECTORY_PAGE_SIZE: u32 = 400;
const AGGREGATES_REGION: &str = "Aggregates";

/// GDP and trade-ratio series plus the country directory from the World Bank
/// v2 API.
#[derive(Clone)]
pub struct WorldBankConnector {
    runtime: ConnectorRuntime,
    base_url: String,
    recent_years: u32,
}

impl WorldBankConnector {
    pub fn new(fetcher: ResilientFetcher) -> Self {
        Self {
            runtime: ConnectorRuntime::new(SourcePolicy::world_bank_default(), fetcher),
            base_url: String::from(DEFAULT_BASE_URL),
            recent_years: DEFAULT_RECENT_YEARS,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    /// Number of most recent yearly values requested per indicator (`mrv`).
    pub fn with_recent_years(mut self, years: u32) -> Self {
        self.recent_years = years.max(2);
        self
    }

    pub fn with_policy(mut self, policy: SourcePolicy) -> Self {
        self.runtime = self.runtime.with_policy(policy);
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.runtime = self.runtime.with_enabled(enabled);
        self
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.runtime.circuit_state()
    }

    async fn indicator_series(
        &self,
        country: &CountryCode,
        indicator: Indicator,
    ) -> Result<Vec<IndicatorObservation>, SourceError> {
        let request = HttpRequest::get(format!(
            "{}/country/{}/indicator/{}",
            self.base_url,
            country.as_str().to_lowercase(),
            indicator.code()
        ))
        .with_query("format", "json")
        .with_query("mrv", &self.recent_years.to_string());

        let (_, rows) = self
            .runtime
            .fetch_json::<(Value, Option<Vec<ObservationPayload>>)>(request)
            .await?;

        let observations: Vec<_> = rows
            .unwrap_or_default()
            .into_iter()
            .filter_map(|row| normalize_observation(indicator, row))
            .collect();
        debug!(%country, indicator = indicator.code(), count = observations.len(), "indicator series fetched");
        Ok(observations)
    }
}

impl SourceConnector for WorldBankConnector {
    fn id(&self) -> SourceId {
        SourceId::WorldBank
    }

    fn check_status<'a>(&'a self) -> BoxFuture<'a, SourceStatus> {
        Box::pin(async move {
            let request = HttpRequest::get(format!("{}/country/usa", self.base_url))
                .with_query("format", "json");
            self.runtime.probe(request).await
        })
    }
}

impl MacroSource for WorldBankConnector {
    fn economic_indicators<'a>(
        &'a self,
        country: &'a CountryCode,
    ) -> BoxFuture<'a, Vec<IndicatorObservation>> {
        Box::pin(async move {
            let (gdp, trade) = tokio::join!(
                self.indicator_series(country, Indicator::GdpCurrentUsd),
                self.indicator_series(country, Indicator::TradePercentOfGdp),
            );

            let mut observations = Vec::new();
            for series in [gdp, trade] {
                match series {
                    Ok(values) => observations.extend(values),
                    Err(error) => log_retrieval_failure("economic_indicators", Some(country), &error),
                }
            }
            observations
        })
    }

    fn countries<'a>(&'a self) -> BoxFuture<'a, Vec<CountryInfo>> {
        Box::pin(async move {
            let request = HttpRequest::get(format!("{}/country", self.base_url))
                .with_query("format", "json")
                .with_query("per_page", &DIRECTORY_PAGE_SIZE.to_string());

            match self
                .runtime
                .fetch_json::<(Value, Option<Vec<CountryPayload>>)>(request)
                .await
            {
                Ok((_, rows)) => {
                    let mut countries: Vec<_> = rows
                        .unwrap_or_default()
                        .into_iter()
                        .filter_map(normalize_country)
                        .collect();
                    countries.sort_by(|a, b| a.name.cmp(&b.name));
                    countries
                }
                Err(error) => {
                    log_retrieval_failure("countries", None, &error);
                    Vec::new()
                }
            }
        })
    }
}

#[derive(Debug, Deserialize)]
struct ObservationPayload {
    date: Option<String>,
    value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CountryPayload {
    id: String,
    name: String,
    region: Option<NamedRef>,
}

#[derive(Debug, Deserialize)]
struct NamedRef {
    value: Option<String>,
}

fn normalize_observation(indicator: Indicator, row: ObservationPayload) -> Option<IndicatorObservation> {
    let year = row.date.as_deref()?.trim().parse::<i32>().ok()?;
    IndicatorObservation::new(indicator, row.value?, year).ok()
}

fn normalize_country(row: CountryPayload) -> Option<CountryInfo> {
    let region = row
        .region
        .and_then(|region| region.value)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty());
    if region.as_deref() == Some(AGGREGATES_REGION) {
        return None;
    }

    Some(CountryInfo {
        code: CountryCode::parse(&row.id).ok()?,
        name: row.name.trim().to_owned(),
        region,
    })
}
