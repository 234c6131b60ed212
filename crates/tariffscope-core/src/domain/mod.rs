//! # Domain Models
//!
//! Canonical domain types for tariff aggregation and impact analysis.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`CountryCode`] | Validated ISO 3166 alpha-3 code |
//! | [`SourceStatus`] | Health snapshot of one source |
//! | [`IndicatorObservation`] | One year of a macroeconomic series |
//! | [`PolicyDocument`] | Trade-policy publication |
//! | [`TariffEntry`] | Current tariff from the tracker |
//! | [`RawCountryRecord`] | Output of one aggregation cycle |
//! | [`CountryTariffProfile`] | Derived per-country snapshot |
//! | [`AnalysisResult`] | Impact model output |
//! | [`GlobalOverview`] | Aggregate over sampled economies |
//!
//! Constructors validate their inputs; connectors convert upstream payloads
//! through them so nothing unvalidated reaches the aggregation layer.

mod analysis;
mod country;
mod models;
mod timestamp;

pub use analysis::{
    AnalysisOverrides, AnalysisResult, CountryTariffProfile, EconomicImpact, GlobalOverview,
    ImpactLevel, RiskLevel, SectorImpact, TierCounts,
};
pub use country::CountryCode;
pub use models::{
    CountryInfo, HealthState, Indicator, IndicatorObservation, PolicyDocument, QualityTier,
    RawCountryRecord, SourceStatus, TariffEntry,
};
pub use timestamp::{CalendarDate, UtcDateTime};
