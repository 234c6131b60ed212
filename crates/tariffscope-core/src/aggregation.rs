//! Data Aggregation Manager.
//!
//! Owns the three connectors, the latest health snapshot and the profile
//! cache. One aggregation cycle queries every connector for a country
//! concurrently and assembles whatever arrived into a [`RawCountryRecord`].
//!
//! ```text
//!                      ┌───────────────────────┐
//!   country_profile ──▶│  TtlCache (1h)        │── hit ──▶ profile
//!                      └──────────┬────────────┘
//!                                 │ miss
//!                                 ▼
//!        ┌─────────────── tokio::join! ───────────────┐
//!        ▼                      ▼                     ▼
//!   MacroSource           TariffSource           PolicySource
//!        └──────────────────────┬─────────────────────┘
//!                               ▼
//!                      RawCountryRecord ──▶ derive_profile ──▶ cache
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::cache::{TtlCache, DEFAULT_PROFILE_TTL};
use crate::connectors::{MacroSource, PolicySource, TariffSource};
use crate::impact::derive_profile;
use crate::{
    CountryCode, CountryInfo, CountryTariffProfile, QualityTier, RawCountryRecord, SourceStatus,
    UtcDateTime,
};

/// A profile together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileLookup {
    pub profile: CountryTariffProfile,
    pub cache_hit: bool,
}

#[derive(Debug, Default)]
struct AggregationState {
    statuses: Vec<SourceStatus>,
    last_refresh: Option<UtcDateTime>,
}

pub struct DataAggregationManager {
    policy: Arc<dyn PolicySource>,
    macro_source: Arc<dyn MacroSource>,
    tariffs: Arc<dyn TariffSource>,
    state: RwLock<AggregationState>,
    cache: TtlCache<CountryCode, CountryTariffProfile>,
}

impl DataAggregationManager {
    pub fn new(
        policy: Arc<dyn PolicySource>,
        macro_source: Arc<dyn MacroSource>,
        tariffs: Arc<dyn TariffSource>,
    ) -> Self {
        Self::with_cache_ttl(policy, macro_source, tariffs, DEFAULT_PROFILE_TTL)
    }

    pub fn with_cache_ttl(
        policy: Arc<dyn PolicySource>,
        macro_source: Arc<dyn MacroSource>,
        tariffs: Arc<dyn TariffSource>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            policy,
            macro_source,
            tariffs,
            state: RwLock::new(AggregationState::default()),
            cache: TtlCache::new(cache_ttl),
        }
    }

    /// Probes every connector concurrently and records the new snapshot.
    pub async fn initialize(&self) -> Vec<SourceStatus> {
        let (policy, macro_status, tariffs) = tokio::join!(
            self.policy.check_status(),
            self.macro_source.check_status(),
            self.tariffs.check_status(),
        );
        let statuses = vec![policy, macro_status, tariffs];

        let active = statuses.iter().filter(|status| status.is_active()).count();
        info!(active, total = statuses.len(), "source health checked");

        let mut state = self.state.write().await;
        state.statuses = statuses.clone();
        state.last_refresh = Some(UtcDateTime::now());
        statuses
    }

    /// Latest health snapshot; probes once if no check has run yet.
    pub async fn data_sources(&self) -> Vec<SourceStatus> {
        {
            let state = self.state.read().await;
            if !state.statuses.is_empty() {
                return state.statuses.clone();
            }
        }
        self.initialize().await
    }

    pub async fn active_sources(&self) -> Vec<SourceStatus> {
        self.data_sources()
            .await
            .into_iter()
            .filter(SourceStatus::is_active)
            .collect()
    }

    /// Average tier of the active sources; `Low` when none is active.
    pub async fn overall_data_quality(&self) -> QualityTier {
        overall_quality(&self.active_sources().await)
    }

    /// Runs one aggregation cycle. `None` when no connector returned anything.
    pub async fn country_data(&self, country: &CountryCode) -> Option<RawCountryRecord> {
        let (indicators, tariff, policy_documents) = tokio::join!(
            self.macro_source.economic_indicators(country),
            self.tariffs.current_tariff(country),
            self.policy.policy_documents(country),
        );

        let record = RawCountryRecord {
            cycle_id: Uuid::new_v4(),
            country: country.clone(),
            assembled_at: UtcDateTime::now(),
            indicators,
            policy_documents,
            tariff,
        };

        if record.is_empty() {
            info!(%country, "no source returned data");
            return None;
        }
        debug!(
            %country,
            cycle_id = %record.cycle_id,
            indicators = record.indicators.len(),
            documents = record.policy_documents.len(),
            tariff = record.has_tariff(),
            "aggregation cycle assembled"
        );
        Some(record)
    }

    pub async fn available_countries(&self) -> Vec<CountryInfo> {
        self.macro_source.countries().await
    }

    pub async fn country_profile(&self, country: &CountryCode) -> Option<CountryTariffProfile> {
        self.lookup_profile(country).await.map(|lookup| lookup.profile)
    }

    /// Cached profile, or a fresh cycle on miss. Unavailable results are not
    /// cached so the next request tries again.
    pub async fn lookup_profile(&self, country: &CountryCode) -> Option<ProfileLookup> {
        if let Some(profile) = self.cache.get(country).await {
            debug!(%country, "profile cache hit");
            return Some(ProfileLookup {
                profile,
                cache_hit: true,
            });
        }

        let swept = self.cache.clear_expired().await;
        if swept > 0 {
            debug!(swept, "expired profiles dropped");
        }

        let record = self.country_data(country).await?;
        let profile = derive_profile(&record);
        self.cache.put(country.clone(), profile.clone(), None).await;

        Some(ProfileLookup {
            profile,
            cache_hit: false,
        })
    }

    /// Drops every cached profile and re-runs the health checks.
    pub async fn refresh_data(&self) -> Vec<SourceStatus> {
        let dropped = self.cache.len().await;
        self.cache.clear().await;
        info!(dropped, "profile cache cleared");
        self.initialize().await
    }

    pub async fn last_refresh(&self) -> Option<UtcDateTime> {
        self.state.read().await.last_refresh
    }

    pub async fn cache_len(&self) -> usize {
        self.cache.len().await
    }
}

fn overall_quality(active: &[SourceStatus]) -> QualityTier {
    if active.is_empty() {
        return QualityTier::Low;
    }

    let total: u32 = active
        .iter()
        .map(|status| u32::from(status.quality_tier.points()))
        .sum();
    QualityTier::from_average_points(f64::from(total) / active.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SourceId;

    #[test]
    fn overall_quality_averages_active_tiers() {
        let statuses = vec![
            SourceStatus::active(SourceId::FederalRegister, QualityTier::High, 60.0),
            SourceStatus::active(SourceId::WorldBank, QualityTier::High, 95.0),
            SourceStatus::active(SourceId::TariffTracker, QualityTier::Medium, 25.0),
        ];
        assert_eq!(overall_quality(&statuses), QualityTier::High);

        let statuses = vec![
            SourceStatus::active(SourceId::WorldBank, QualityTier::High, 95.0),
            SourceStatus::active(SourceId::TariffTracker, QualityTier::Low, 25.0),
        ];
        assert_eq!(overall_quality(&statuses), QualityTier::Medium);
    }

    #[test]
    fn no_active_source_means_low_quality() {
        assert_eq!(overall_quality(&[]), QualityTier::Low);
    }
}
