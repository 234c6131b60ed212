use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CalendarDate, CountryCode, SourceId, UtcDateTime, ValidationError};

const MAX_TARIFF_RATE: f64 = 1_000.0;

/// Result of the most recent health probe against a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Active,
    /// Disabled by configuration; never probed.
    Inactive,
    Error,
}

/// Coarse three-level quality scale shared by source quality and profile confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    Low,
    Medium,
    High,
}

impl QualityTier {
    pub const fn points(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }

    /// Maps an averaged point score back onto the tier scale.
    pub fn from_average_points(average: f64) -> Self {
        if average >= 2.5 {
            Self::High
        } else if average >= 1.5 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Health snapshot for one source. Superseded, never merged, by the next check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceStatus {
    pub source: SourceId,
    pub name: String,
    pub health: HealthState,
    pub last_checked_at: UtcDateTime,
    pub quality_tier: QualityTier,
    pub coverage_percent: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SourceStatus {
    pub fn active(source: SourceId, quality_tier: QualityTier, coverage_percent: f64) -> Self {
        Self {
            source,
            name: source.display_name().to_owned(),
            health: HealthState::Active,
            last_checked_at: UtcDateTime::now(),
            quality_tier,
            coverage_percent,
            message: None,
        }
    }

    pub fn error(source: SourceId, message: impl Into<String>) -> Self {
        Self {
            source,
            name: source.display_name().to_owned(),
            health: HealthState::Error,
            last_checked_at: UtcDateTime::now(),
            quality_tier: QualityTier::Low,
            coverage_percent: 0.0,
            message: Some(message.into()),
        }
    }

    pub fn inactive(source: SourceId) -> Self {
        Self {
            source,
            name: source.display_name().to_owned(),
            health: HealthState::Inactive,
            last_checked_at: UtcDateTime::now(),
            quality_tier: QualityTier::Low,
            coverage_percent: 0.0,
            message: Some(String::from("source disabled by configuration")),
        }
    }

    pub fn is_active(&self) -> bool {
        self.health == HealthState::Active
    }
}

/// Macroeconomic indicator series tracked per country.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    GdpCurrentUsd,
    TradePercentOfGdp,
}

impl Indicator {
    pub const ALL: [Self; 2] = [Self::GdpCurrentUsd, Self::TradePercentOfGdp];

    /// World Bank indicator code.
    pub const fn code(self) -> &'static str {
        match self {
            Self::GdpCurrentUsd => "NY.GDP.MKTP.CD",
            Self::TradePercentOfGdp => "NE.TRD.GNFS.ZS",
        }
    }

    pub const fn unit(self) -> &'static str {
        match self {
            Self::GdpCurrentUsd => "current US$",
            Self::TradePercentOfGdp => "% of GDP",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|indicator| indicator.code() == code)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorObservation {
    pub indicator: Indicator,
    pub value: f64,
    pub year: i32,
    pub unit: String,
}

impl IndicatorObservation {
    pub fn new(indicator: Indicator, value: f64, year: i32) -> Result<Self, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteValue { field: "value" });
        }

        Ok(Self {
            indicator,
            value,
            year,
            unit: indicator.unit().to_owned(),
        })
    }
}

/// Trade-policy publication relevant to a country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDocument {
    pub title: String,
    pub published_on: Option<CalendarDate>,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub tariff_relevant: bool,
}

/// Best-known current tariff published by the tracker for a country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TariffEntry {
    /// Headline rate in percent.
    pub rate: f64,
    pub affected_sectors: Vec<String>,
    pub effective_date: Option<CalendarDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl TariffEntry {
    pub fn new(
        rate: f64,
        affected_sectors: Vec<String>,
        effective_date: Option<CalendarDate>,
        notes: Option<String>,
    ) -> Result<Self, ValidationError> {
        if !rate.is_finite() {
            return Err(ValidationError::NonFiniteValue { field: "rate" });
        }
        if !(0.0..=MAX_TARIFF_RATE).contains(&rate) {
            return Err(ValidationError::TariffRateOutOfRange { value: rate });
        }

        let affected_sectors = affected_sectors
            .into_iter()
            .map(|sector| sector.trim().to_owned())
            .filter(|sector| !sector.is_empty())
            .collect();

        Ok(Self {
            rate,
            affected_sectors,
            effective_date,
            notes,
        })
    }
}

/// Entry of the selectable country universe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryInfo {
    pub code: CountryCode,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

/// Everything one aggregation cycle gathered for a country.
///
/// Built once per cycle and never patched afterwards; a refresh produces a new
/// record with a new `cycle_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCountryRecord {
    pub cycle_id: Uuid,
    pub country: CountryCode,
    pub assembled_at: UtcDateTime,
    pub indicators: Vec<IndicatorObservation>,
    pub policy_documents: Vec<PolicyDocument>,
    pub tariff: Option<TariffEntry>,
}

impl RawCountryRecord {
    pub fn series(&self, indicator: Indicator) -> impl Iterator<Item = &IndicatorObservation> {
        self.indicators
            .iter()
            .filter(move |observation| observation.indicator == indicator)
    }

    pub fn has_gdp(&self) -> bool {
        self.series(Indicator::GdpCurrentUsd).next().is_some()
    }

    pub fn has_trade_data(&self) -> bool {
        self.series(Indicator::TradePercentOfGdp).next().is_some()
    }

    pub fn has_tariff(&self) -> bool {
        self.tariff.is_some()
    }

    pub fn has_policy_documents(&self) -> bool {
        !self.policy_documents.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty() && self.policy_documents.is_empty() && self.tariff.is_none()
    }

    /// Sources that contributed at least one item to this record.
    pub fn contributing_sources(&self) -> Vec<SourceId> {
        let mut sources = Vec::with_capacity(3);
        if self.has_policy_documents() {
            sources.push(SourceId::FederalRegister);
        }
        if !self.indicators.is_empty() {
            sources.push(SourceId::WorldBank);
        }
        if self.has_tariff() {
            sources.push(SourceId::TariffTracker);
        }
        sources
    }
}
