//! Tariff Impact Model.
//!
//! [`derive_profile`] turns one aggregation cycle into a
//! [`CountryTariffProfile`]; [`analyze_profile`] turns a profile plus optional
//! overrides into an [`AnalysisResult`]. Both are pure. [`TariffImpactModel`]
//! wires them to the aggregation manager.
//!
//! | Effect | Formula | Bound |
//! |--------|---------|-------|
//! | GDP | `-(rate * intensity * 0.01)` | `>= -50` |
//! | Trade | `-(rate * 0.5)` | `>= -30` |
//! | Employment | `gdp * 0.3` | `>= -15` |
//! | Consumer prices | `rate * 0.3` | `<= 20` |

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::aggregation::DataAggregationManager;
use crate::{
    AnalysisOverrides, AnalysisResult, CountryCode, CountryTariffProfile, EconomicImpact,
    GlobalOverview, ImpactLevel, Indicator, QualityTier, RawCountryRecord, RiskLevel,
    SectorImpact,
};

const GDP_IMPACT_FLOOR: f64 = -50.0;
const TRADE_IMPACT_FLOOR: f64 = -30.0;
const EMPLOYMENT_IMPACT_FLOOR: f64 = -15.0;
const CONSUMER_PRICE_CEILING: f64 = 20.0;
const MAX_TARIFF_RATE: f64 = 1_000.0;

const PRIMARY_MULTIPLIER: f64 = 0.8;
const SECONDARY_MULTIPLIER: f64 = 1.2;
const TERTIARY_MULTIPLIER: f64 = 0.6;
const TECHNOLOGY_MULTIPLIER: f64 = 1.5;

/// Ten major economies used by the global overview unless configured otherwise.
pub const DEFAULT_OVERVIEW_SAMPLE: [&str; 10] = [
    "USA", "CHN", "DEU", "JPN", "GBR", "IND", "FRA", "BRA", "CAN", "MEX",
];

pub fn classify_impact(tariff_rate: f64, trade_intensity: f64) -> ImpactLevel {
    if tariff_rate >= 20.0 || trade_intensity >= 50.0 {
        ImpactLevel::High
    } else if tariff_rate >= 10.0 || trade_intensity >= 25.0 {
        ImpactLevel::Medium
    } else {
        ImpactLevel::Low
    }
}

/// Confidence from which inputs were present: GDP +2, trade data +2,
/// tariff entry +1, policy documents +1.
pub fn confidence_for(record: &RawCountryRecord) -> QualityTier {
    let points = [
        (record.has_gdp(), 2_u8),
        (record.has_trade_data(), 2),
        (record.has_tariff(), 1),
        (record.has_policy_documents(), 1),
    ]
    .into_iter()
    .filter(|(present, _)| *present)
    .map(|(_, points)| points)
    .sum::<u8>();

    match points {
        5.. => QualityTier::High,
        3..=4 => QualityTier::Medium,
        _ => QualityTier::Low,
    }
}

pub fn derive_profile(record: &RawCountryRecord) -> CountryTariffProfile {
    let mut gdp: Vec<_> = record
        .series(Indicator::GdpCurrentUsd)
        .filter(|observation| observation.year != 0 && observation.value.is_finite())
        .collect();
    gdp.sort_by(|a, b| b.year.cmp(&a.year));

    let gdp_growth = match gdp.as_slice() {
        [latest, previous, ..] if previous.value != 0.0 => {
            (latest.value - previous.value) / previous.value * 100.0
        }
        _ => 0.0,
    };

    let trade: Vec<f64> = record
        .series(Indicator::TradePercentOfGdp)
        .map(|observation| observation.value)
        .filter(|value| value.is_finite() && *value != 0.0)
        .collect();
    let trade_intensity = if trade.is_empty() {
        0.0
    } else {
        trade.iter().sum::<f64>() / trade.len() as f64
    };

    let (tariff_rate, affected_sectors) = record
        .tariff
        .as_ref()
        .map(|entry| (entry.rate, entry.affected_sectors.clone()))
        .unwrap_or_default();

    CountryTariffProfile {
        country: record.country.clone(),
        cycle_id: record.cycle_id,
        gdp_current: gdp.first().map(|observation| observation.value),
        gdp_year: gdp.first().map(|observation| observation.year),
        gdp_growth,
        trade_intensity,
        tariff_rate,
        affected_sectors,
        impact_level: classify_impact(tariff_rate, trade_intensity),
        confidence: confidence_for(record),
        sources: record.contributing_sources(),
    }
}

fn tariff_risk_points(rate: f64) -> u8 {
    if rate >= 25.0 {
        3
    } else if rate >= 15.0 {
        2
    } else if rate >= 5.0 {
        1
    } else {
        0
    }
}

fn intensity_risk_points(intensity: f64) -> u8 {
    if intensity >= 50.0 {
        2
    } else if intensity >= 25.0 {
        1
    } else {
        0
    }
}

fn confidence_risk_points(confidence: QualityTier) -> u8 {
    match confidence {
        QualityTier::Low => 2,
        QualityTier::Medium => 1,
        QualityTier::High => 0,
    }
}

pub fn classify_risk(rate: f64, intensity: f64, confidence: QualityTier) -> RiskLevel {
    let points = tariff_risk_points(rate)
        + intensity_risk_points(intensity)
        + confidence_risk_points(confidence);
    match points {
        6.. => RiskLevel::High,
        3..=5 => RiskLevel::Medium,
        _ => RiskLevel::Low,
    }
}

pub fn economic_impact(rate: f64, intensity: f64) -> EconomicImpact {
    let gdp = (-(rate * intensity * 0.01)).max(GDP_IMPACT_FLOOR);
    EconomicImpact {
        gdp,
        trade: (-(rate * 0.5)).max(TRADE_IMPACT_FLOOR),
        employment: (gdp * 0.3).max(EMPLOYMENT_IMPACT_FLOOR),
        consumer_prices: (rate * 0.3).min(CONSUMER_PRICE_CEILING),
    }
}

pub fn sector_impact(rate: f64) -> SectorImpact {
    let base = -(rate * 0.5);
    SectorImpact {
        primary: base * PRIMARY_MULTIPLIER,
        secondary: base * SECONDARY_MULTIPLIER,
        tertiary: base * TERTIARY_MULTIPLIER,
        technology: base * TECHNOLOGY_MULTIPLIER,
    }
}

fn risk_factors(profile: &CountryTariffProfile, rate: f64, intensity: f64) -> Vec<String> {
    let mut factors = Vec::new();

    if rate >= 25.0 {
        factors.push(format!("Very high tariff rate ({rate:.1}%)"));
    } else if rate >= 15.0 {
        factors.push(format!("High tariff rate ({rate:.1}%)"));
    } else if rate >= 5.0 {
        factors.push(format!("Moderate tariff rate ({rate:.1}%)"));
    }

    if intensity >= 50.0 {
        factors.push(format!("High trade dependence ({intensity:.1}% of GDP)"));
    } else if intensity >= 25.0 {
        factors.push(format!("Moderate trade dependence ({intensity:.1}% of GDP)"));
    }

    match profile.confidence {
        QualityTier::Low => factors.push(String::from("Limited data availability")),
        QualityTier::Medium => factors.push(String::from("Partial data coverage")),
        QualityTier::High => {}
    }

    if profile.gdp_growth < 0.0 {
        factors.push(format!("Contracting economy ({:.1}% GDP growth)", profile.gdp_growth));
    }

    factors
}

fn recommendations(
    profile: &CountryTariffProfile,
    rate: f64,
    intensity: f64,
    impact: &EconomicImpact,
) -> Vec<String> {
    let mut recommendations = Vec::new();

    if rate >= 15.0 {
        recommendations.push(String::from(
            "Diversify suppliers and routes away from tariff-exposed trade lanes",
        ));
    } else if rate >= 5.0 {
        recommendations.push(String::from("Review sourcing costs for tariff-affected inputs"));
    }

    if !profile.affected_sectors.is_empty() && rate >= 5.0 {
        recommendations.push(format!(
            "Monitor affected sectors: {}",
            profile.affected_sectors.join(", ")
        ));
    }

    if intensity >= 50.0 {
        recommendations.push(String::from(
            "Hedge exposure to trade-policy shifts given high trade dependence",
        ));
    }

    if impact.consumer_prices >= 5.0 {
        recommendations.push(String::from("Plan for pass-through of tariffs to consumer prices"));
    }

    if profile.confidence == QualityTier::Low {
        recommendations.push(String::from(
            "Confirm figures with additional sources before acting on this analysis",
        ));
    }

    if recommendations.is_empty() {
        recommendations.push(String::from(
            "Tariff exposure is manageable; continue routine monitoring",
        ));
    }
    recommendations
}

fn sanitize(value: Option<f64>, fallback: f64, max: f64) -> f64 {
    value
        .filter(|value| value.is_finite())
        .map(|value| value.clamp(0.0, max))
        .unwrap_or(fallback)
}

/// Applies the impact formulas to a profile.
pub fn analyze_profile(profile: CountryTariffProfile, overrides: AnalysisOverrides) -> AnalysisResult {
    let rate = sanitize(overrides.tariff_rate, profile.tariff_rate, MAX_TARIFF_RATE);
    let intensity = sanitize(overrides.trade_intensity, profile.trade_intensity, f64::MAX);

    let economic_impact = economic_impact(rate, intensity);
    AnalysisResult {
        country: profile.country.clone(),
        effective_tariff_rate: rate,
        trade_intensity: intensity,
        sector_impact: sector_impact(rate),
        risk_level: classify_risk(rate, intensity, profile.confidence),
        risk_factors: risk_factors(&profile, rate, intensity),
        recommendations: recommendations(&profile, rate, intensity, &economic_impact),
        confidence: profile.confidence,
        economic_impact,
        profile,
    }
}

/// Folds analysis results into the overview totals.
pub fn summarize(countries_sampled: usize, results: &[AnalysisResult]) -> GlobalOverview {
    let mut overview = GlobalOverview {
        countries_sampled,
        countries_analyzed: results.len(),
        ..GlobalOverview::default()
    };

    for result in results {
        overview.impact_counts.record_impact(result.profile.impact_level);
        overview.confidence_counts.record_confidence(result.confidence);
        overview.total_gdp_impact += result.economic_impact.gdp;
        overview.total_trade_impact += result.economic_impact.trade;
        overview.average_tariff_rate += result.effective_tariff_rate;
    }
    if !results.is_empty() {
        overview.average_tariff_rate /= results.len() as f64;
    }
    overview
}

/// Analysis plus whether its profile was served from cache.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzedCountry {
    pub result: AnalysisResult,
    pub cache_hit: bool,
}

pub struct TariffImpactModel {
    aggregation: Arc<DataAggregationManager>,
    overview_sample: Vec<CountryCode>,
}

impl TariffImpactModel {
    pub fn new(aggregation: Arc<DataAggregationManager>, overview_sample: Vec<CountryCode>) -> Self {
        Self {
            aggregation,
            overview_sample,
        }
    }

    pub fn aggregation(&self) -> &Arc<DataAggregationManager> {
        &self.aggregation
    }

    pub fn overview_sample(&self) -> &[CountryCode] {
        &self.overview_sample
    }

    pub async fn country_profile(&self, country: &CountryCode) -> Option<CountryTariffProfile> {
        self.aggregation.country_profile(country).await
    }

    pub async fn analyze_country(
        &self,
        country: &CountryCode,
        overrides: AnalysisOverrides,
    ) -> Option<AnalysisResult> {
        self.analyze_country_lookup(country, overrides)
            .await
            .map(|analyzed| analyzed.result)
    }

    pub async fn analyze_country_lookup(
        &self,
        country: &CountryCode,
        overrides: AnalysisOverrides,
    ) -> Option<AnalyzedCountry> {
        let lookup = self.aggregation.lookup_profile(country).await?;
        let result = analyze_profile(lookup.profile, overrides);
        debug!(
            %country,
            rate = result.effective_tariff_rate,
            risk = ?result.risk_level,
            cache_hit = lookup.cache_hit,
            "country analyzed"
        );
        Some(AnalyzedCountry {
            result,
            cache_hit: lookup.cache_hit,
        })
    }

    /// Analyzes the configured sample concurrently. Countries without data are
    /// left out of the totals but still count as sampled.
    pub async fn global_overview(&self) -> GlobalOverview {
        let mut tasks = JoinSet::new();
        for (index, country) in self.overview_sample.iter().cloned().enumerate() {
            let aggregation = Arc::clone(&self.aggregation);
            tasks.spawn(async move {
                let profile = aggregation.country_profile(&country).await;
                (index, profile)
            });
        }

        let mut profiles = Vec::with_capacity(self.overview_sample.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Some(profile))) => profiles.push((index, profile)),
                Ok((_, None)) => {}
                Err(error) => warn!(%error, "overview task failed"),
            }
        }
        profiles.sort_by_key(|(index, _)| *index);

        let results: Vec<_> = profiles
            .into_iter()
            .map(|(_, profile)| analyze_profile(profile, AnalysisOverrides::default()))
            .collect();
        summarize(self.overview_sample.len(), &results)
    }
}
