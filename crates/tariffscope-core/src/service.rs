//! Consumer-facing facade.
//!
//! [`TariffService`] is what a presentation layer talks to. Every operation
//! answers inside an [`Envelope`] whose metadata names the contributing
//! sources, the latency and whether the profile came from cache.
//!
//! ```rust,ignore
//! use tariffscope_core::{CountryAnalysis, TariffServiceBuilder};
//!
//! let service = TariffServiceBuilder::new().with_env()?.build()?;
//! match service.analyze("CHN").await.data {
//!     CountryAnalysis::Available(result) => println!("risk: {:?}", result.risk_level),
//!     CountryAnalysis::Unavailable { reason, .. } => println!("no data: {reason}"),
//! }
//! ```

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::aggregation::DataAggregationManager;
use crate::config::TariffScopeConfig;
use crate::connectors::{
    FederalRegisterConnector, MacroSource, PolicySource, TariffSource, TariffTrackerConnector,
    WorldBankConnector,
};
use crate::envelope::{Envelope, EnvelopeError, EnvelopeMeta};
use crate::fetcher::ResilientFetcher;
use crate::http_client::{HttpClient, OfflineHttpClient, ReqwestHttpClient};
use crate::impact::TariffImpactModel;
use crate::{
    AnalysisOverrides, AnalysisResult, CoreError, CountryCode, CountryInfo, GlobalOverview,
    HealthState, QualityTier, SourceId, SourceStatus, UtcDateTime,
};

/// Outcome of a single-country analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CountryAnalysis {
    Available(AnalysisResult),
    /// No source produced data, or the country identifier was not valid.
    Unavailable { country: String, reason: String },
}

impl CountryAnalysis {
    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            Self::Available(result) => Some(result),
            Self::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

pub struct TariffService {
    aggregation: Arc<DataAggregationManager>,
    model: TariffImpactModel,
}

impl TariffService {
    pub fn new(aggregation: Arc<DataAggregationManager>, overview_sample: Vec<CountryCode>) -> Self {
        Self {
            model: TariffImpactModel::new(Arc::clone(&aggregation), overview_sample),
            aggregation,
        }
    }

    pub fn aggregation(&self) -> &DataAggregationManager {
        &self.aggregation
    }

    pub fn model(&self) -> &TariffImpactModel {
        &self.model
    }

    pub async fn list_data_sources(&self) -> Envelope<Vec<SourceStatus>> {
        let started = Instant::now();
        let statuses = self.aggregation.data_sources().await;

        let active = active_ids(&statuses);
        let mut meta = EnvelopeMeta::new(active.clone(), elapsed_ms(started), false);
        if active.is_empty() {
            meta.push_warning("no data source is currently active");
        }

        let errors = statuses
            .iter()
            .filter(|status| status.health == HealthState::Error)
            .filter_map(|status| {
                let message = status
                    .message
                    .clone()
                    .unwrap_or_else(|| String::from("health probe failed"));
                EnvelopeError::new("source.unavailable", message)
                    .ok()
                    .map(|error| error.with_source(status.source))
            })
            .collect();

        Envelope {
            meta,
            data: statuses,
            errors,
        }
    }

    pub async fn list_available_countries(&self) -> Envelope<Vec<CountryInfo>> {
        let started = Instant::now();
        let countries = self.aggregation.available_countries().await;

        let sources = if countries.is_empty() {
            Vec::new()
        } else {
            vec![SourceId::WorldBank]
        };
        let mut meta = EnvelopeMeta::new(sources, elapsed_ms(started), false);
        if countries.is_empty() {
            meta.push_warning("country directory unavailable");
        }
        Envelope::success(meta, countries)
    }

    pub async fn analyze(&self, country: &str) -> Envelope<CountryAnalysis> {
        self.analyze_with(country, AnalysisOverrides::default()).await
    }

    pub async fn analyze_with(
        &self,
        country: &str,
        overrides: AnalysisOverrides,
    ) -> Envelope<CountryAnalysis> {
        let started = Instant::now();

        let code = match CountryCode::parse(country) {
            Ok(code) => code,
            Err(error) => {
                let mut meta = EnvelopeMeta::new(Vec::new(), elapsed_ms(started), false);
                meta.push_warning(error.to_string());
                return Envelope::success(
                    meta,
                    CountryAnalysis::Unavailable {
                        country: country.trim().to_owned(),
                        reason: error.to_string(),
                    },
                );
            }
        };

        let Some(analyzed) = self.model.analyze_country_lookup(&code, overrides).await else {
            let reason = format!("no source returned data for {code}");
            let mut meta = EnvelopeMeta::new(Vec::new(), elapsed_ms(started), false);
            meta.push_warning(reason.clone());
            return Envelope::success(
                meta,
                CountryAnalysis::Unavailable {
                    country: code.to_string(),
                    reason,
                },
            );
        };

        let result = analyzed.result;
        let mut meta = EnvelopeMeta::new(
            result.profile.sources.clone(),
            elapsed_ms(started),
            analyzed.cache_hit,
        );
        if result.confidence == QualityTier::Low {
            meta.push_warning("analysis based on limited data; treat figures as indicative");
        }
        if !result.profile.sources.contains(&SourceId::TariffTracker) {
            let tracker_inactive = self
                .aggregation
                .data_sources()
                .await
                .iter()
                .any(|status| {
                    status.source == SourceId::TariffTracker && status.health == HealthState::Inactive
                });
            if tracker_inactive {
                meta.push_warning("tariff source is not configured; impacts assume a 0% tariff rate");
            } else {
                meta.push_warning(format!("no tariff figure for {code}; impacts assume a 0% tariff rate"));
            }
        }
        if let Some(rate) = overrides.tariff_rate {
            if rate.is_finite() {
                meta.push_warning(format!(
                    "tariff rate overridden: {:.1}% instead of {:.1}%",
                    result.effective_tariff_rate, result.profile.tariff_rate
                ));
            }
        }

        Envelope::success(meta, CountryAnalysis::Available(result))
    }

    pub async fn global_overview(&self) -> Envelope<GlobalOverview> {
        let started = Instant::now();
        let overview = self.model.global_overview().await;
        let sources = active_ids(&self.aggregation.data_sources().await);

        let mut meta = EnvelopeMeta::new(sources, elapsed_ms(started), false);
        if overview.countries_analyzed < overview.countries_sampled {
            meta.push_warning(format!(
                "{} of {} sampled economies had no data",
                overview.countries_sampled - overview.countries_analyzed,
                overview.countries_sampled
            ));
        }
        Envelope::success(meta, overview)
    }

    /// Clears cached profiles and re-checks every source.
    pub async fn refresh(&self) {
        let statuses = self.aggregation.refresh_data().await;
        info!(active = active_ids(&statuses).len(), "data refreshed");
    }

    pub async fn overall_data_quality(&self) -> QualityTier {
        self.aggregation.overall_data_quality().await
    }

    pub async fn last_refresh(&self) -> Option<UtcDateTime> {
        self.aggregation.last_refresh().await
    }
}

fn active_ids(statuses: &[SourceStatus]) -> Vec<SourceId> {
    statuses
        .iter()
        .filter(|status| status.is_active())
        .map(|status| status.source)
        .collect()
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64
}

/// Wires connectors, aggregation and the impact model from configuration.
///
/// Any connector can be replaced with a custom implementation, which is how
/// tests inject scripted sources.
///
/// The tariff tracker has no default endpoint. Until
/// `tariff_tracker.base_url` (or `TARIFFSCOPE_TARIFF_TRACKER_URL`) is set it
/// reports `Inactive`, every profile carries a 0% tariff rate and the impact
/// figures are zero. `analyze` flags this with an envelope warning.
pub struct TariffServiceBuilder {
    config: TariffScopeConfig,
    http_client: Option<Arc<dyn HttpClient>>,
    policy_source: Option<Arc<dyn PolicySource>>,
    macro_source: Option<Arc<dyn MacroSource>>,
    tariff_source: Option<Arc<dyn TariffSource>>,
}

impl TariffServiceBuilder {
    pub fn new() -> Self {
        Self::from_config(TariffScopeConfig::default())
    }

    pub fn from_config(config: TariffScopeConfig) -> Self {
        Self {
            config,
            http_client: None,
            policy_source: None,
            macro_source: None,
            tariff_source: None,
        }
    }

    /// Applies `TARIFFSCOPE_*` environment overrides to the current config.
    pub fn with_env(mut self) -> Result<Self, CoreError> {
        self.config = self.config.with_env_overrides()?;
        Ok(self)
    }

    /// Every connector fails its probes and retrievals.
    pub fn with_offline_mode(self) -> Self {
        self.with_http_client(Arc::new(OfflineHttpClient))
    }

    pub fn with_http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn with_policy_source(mut self, source: Arc<dyn PolicySource>) -> Self {
        self.policy_source = Some(source);
        self
    }

    pub fn with_macro_source(mut self, source: Arc<dyn MacroSource>) -> Self {
        self.macro_source = Some(source);
        self
    }

    pub fn with_tariff_source(mut self, source: Arc<dyn TariffSource>) -> Self {
        self.tariff_source = Some(source);
        self
    }

    pub fn config(&self) -> &TariffScopeConfig {
        &self.config
    }

    pub fn build(self) -> Result<TariffService, CoreError> {
        let config = self.config;
        let client: Arc<dyn HttpClient> = match self.http_client {
            Some(client) => client,
            None => Arc::new(ReqwestHttpClient::new()),
        };
        let fetcher = ResilientFetcher::new(client, config.fetch_plan()?);

        let policy_source: Arc<dyn PolicySource> = match self.policy_source {
            Some(source) => source,
            None => Arc::new(
                FederalRegisterConnector::new(fetcher.clone())
                    .with_base_url(config.federal_register.base_url.clone())
                    .with_page_size(config.federal_register.page_size)
                    .with_keywords(config.federal_register.keywords.clone())
                    .with_enabled(config.federal_register.enabled),
            ),
        };
        let macro_source: Arc<dyn MacroSource> = match self.macro_source {
            Some(source) => source,
            None => Arc::new(
                WorldBankConnector::new(fetcher.clone())
                    .with_base_url(config.world_bank.base_url.clone())
                    .with_recent_years(config.world_bank.recent_years)
                    .with_enabled(config.world_bank.enabled),
            ),
        };
        let tariff_source: Arc<dyn TariffSource> = match self.tariff_source {
            Some(source) => source,
            None => Arc::new(
                TariffTrackerConnector::new(fetcher, config.tariff_tracker.base_url.clone())
                    .with_api_key(config.tariff_tracker.api_key.clone()),
            ),
        };

        let aggregation = Arc::new(DataAggregationManager::with_cache_ttl(
            policy_source,
            macro_source,
            tariff_source,
            config.cache_ttl(),
        ));
        Ok(TariffService::new(aggregation, config.overview_countries()?))
    }
}

impl Default for TariffServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_analysis_serializes_with_status_tag() {
        let analysis = CountryAnalysis::Unavailable {
            country: String::from("XYZ"),
            reason: String::from("no source returned data for XYZ"),
        };
        let json = serde_json::to_value(&analysis).expect("serializable");

        assert_eq!(json["status"], "unavailable");
        assert_eq!(json["country"], "XYZ");
        assert!(!analysis.is_available());
        assert!(analysis.result().is_none());
    }

    #[tokio::test]
    async fn offline_service_degrades_to_low_quality() {
        let service = TariffServiceBuilder::new()
            .with_offline_mode()
            .build()
            .expect("default config builds");

        assert_eq!(service.overall_data_quality().await, QualityTier::Low);

        let sources = service.list_data_sources().await;
        assert!(sources.meta.sources.is_empty());
        assert_eq!(sources.data.len(), 3);
        // Tracker has no URL by default, so only two sources report errors.
        assert_eq!(sources.errors.len(), 2);
        assert!(!sources.meta.warnings.is_empty());
    }

    #[tokio::test]
    async fn invalid_country_is_unavailable_not_an_error() {
        let service = TariffServiceBuilder::new()
            .with_offline_mode()
            .build()
            .expect("default config builds");

        let envelope = service.analyze("U$A").await;
        assert!(matches!(
            envelope.data,
            CountryAnalysis::Unavailable { ref country, .. } if country == "U$A"
        ));
    }
}
