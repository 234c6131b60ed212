use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{QualityTier, SourceId};

/// Static per-source characteristics: declared reliability, coverage and
/// request quota.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcePolicy {
    pub source: SourceId,
    /// Quality tier reported while the source is healthy.
    pub reliability: QualityTier,
    /// Share of the country universe the source is expected to cover.
    pub coverage_percent: f64,
    pub quota_window: Duration,
    pub quota_limit: u32,
}

impl SourcePolicy {
    pub fn federal_register_default() -> Self {
        Self {
            source: SourceId::FederalRegister,
            reliability: QualityTier::High,
            coverage_percent: 60.0,
            quota_window: Duration::from_secs(60),
            quota_limit: 60,
        }
    }

    pub fn world_bank_default() -> Self {
        Self {
            source: SourceId::WorldBank,
            reliability: QualityTier::High,
            coverage_percent: 95.0,
            quota_window: Duration::from_secs(60),
            quota_limit: 120,
        }
    }

    pub fn tariff_tracker_default() -> Self {
        Self {
            source: SourceId::TariffTracker,
            reliability: QualityTier::Medium,
            coverage_percent: 25.0,
            quota_window: Duration::from_secs(60),
            quota_limit: 30,
        }
    }

    pub fn default_for(source: SourceId) -> Self {
        match source {
            SourceId::FederalRegister => Self::federal_register_default(),
            SourceId::WorldBank => Self::world_bank_default(),
            SourceId::TariffTracker => Self::tariff_tracker_default(),
        }
    }
}
