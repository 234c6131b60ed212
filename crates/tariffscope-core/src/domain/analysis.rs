use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CountryCode, QualityTier, SourceId};

/// Three-way exposure bucket from tariff rate and trade intensity thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Immutable per-country snapshot derived from one aggregation cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryTariffProfile {
    pub country: CountryCode,
    pub cycle_id: Uuid,
    /// Most recent headline GDP value (current US$).
    pub gdp_current: Option<f64>,
    pub gdp_year: Option<i32>,
    /// Year-over-year growth in percent.
    pub gdp_growth: f64,
    /// Trade as a percentage of GDP.
    pub trade_intensity: f64,
    /// Nominal tariff rate in percent, 0 when the tracker has no entry.
    pub tariff_rate: f64,
    pub affected_sectors: Vec<String>,
    pub impact_level: ImpactLevel,
    pub confidence: QualityTier,
    pub sources: Vec<SourceId>,
}

/// Caller-supplied replacements for profile inputs, applied to a single analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOverrides {
    pub tariff_rate: Option<f64>,
    pub trade_intensity: Option<f64>,
}

impl AnalysisOverrides {
    pub fn tariff_rate(rate: f64) -> Self {
        Self {
            tariff_rate: Some(rate),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tariff_rate.is_none() && self.trade_intensity.is_none()
    }
}

/// Bounded macroeconomic effects, all in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EconomicImpact {
    /// Never below -50.
    pub gdp: f64,
    /// Never below -30.
    pub trade: f64,
    /// Never below -15.
    pub employment: f64,
    /// Never above +20.
    pub consumer_prices: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectorImpact {
    pub primary: f64,
    pub secondary: f64,
    pub tertiary: f64,
    pub technology: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub country: CountryCode,
    pub effective_tariff_rate: f64,
    pub trade_intensity: f64,
    pub economic_impact: EconomicImpact,
    pub sector_impact: SectorImpact,
    pub risk_level: RiskLevel,
    pub risk_factors: Vec<String>,
    pub recommendations: Vec<String>,
    pub confidence: QualityTier,
    pub profile: CountryTariffProfile,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl TierCounts {
    pub fn record_impact(&mut self, level: ImpactLevel) {
        match level {
            ImpactLevel::High => self.high += 1,
            ImpactLevel::Medium => self.medium += 1,
            ImpactLevel::Low => self.low += 1,
        }
    }

    pub fn record_confidence(&mut self, tier: QualityTier) {
        match tier {
            QualityTier::High => self.high += 1,
            QualityTier::Medium => self.medium += 1,
            QualityTier::Low => self.low += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.high + self.medium + self.low
    }
}

/// Aggregate view over the configured sample of economies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalOverview {
    pub countries_sampled: usize,
    pub countries_analyzed: usize,
    pub impact_counts: TierCounts,
    pub confidence_counts: TierCounts,
    pub total_gdp_impact: f64,
    pub total_trade_impact: f64,
    pub average_tariff_rate: f64,
}
