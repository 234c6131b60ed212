//! Behavior of the tariff impact model: profile derivation, bounded effects,
//! risk scoring and the global overview.

use std::collections::HashMap;
use std::sync::Arc;

use tariffscope_core::impact::{
    analyze_profile, classify_impact, classify_risk, economic_impact, sector_impact,
};
use tariffscope_core::{
    AnalysisOverrides, BoxFuture, CountryCode, CountryInfo, DataAggregationManager, ImpactLevel,
    Indicator, IndicatorObservation, MacroSource, PolicyDocument, PolicySource, QualityTier,
    RiskLevel, SourceConnector, SourceId, SourceStatus, TariffEntry, TariffImpactModel,
    TariffSource,
};
use tariffscope_tests::{country, observation, tariff_entry};

#[derive(Default)]
struct CountryFixture {
    indicators: Vec<IndicatorObservation>,
    tariff: Option<TariffEntry>,
    documents: usize,
}

/// Serves fixed per-country data for every source role.
#[derive(Default)]
struct FixtureSource {
    countries: HashMap<String, CountryFixture>,
}

impl FixtureSource {
    fn with_country(mut self, code: &str, fixture: CountryFixture) -> Self {
        self.countries.insert(code.to_owned(), fixture);
        self
    }

    fn fixture(&self, country: &CountryCode) -> Option<&CountryFixture> {
        self.countries.get(country.as_str())
    }
}

impl SourceConnector for FixtureSource {
    fn id(&self) -> SourceId {
        SourceId::WorldBank
    }

    fn check_status<'a>(&'a self) -> BoxFuture<'a, SourceStatus> {
        Box::pin(async move { SourceStatus::active(SourceId::WorldBank, QualityTier::High, 95.0) })
    }
}

impl PolicySource for FixtureSource {
    fn policy_documents<'a>(&'a self, country: &'a CountryCode) -> BoxFuture<'a, Vec<PolicyDocument>> {
        Box::pin(async move {
            let count = self.fixture(country).map_or(0, |fixture| fixture.documents);
            (0..count)
                .map(|n| PolicyDocument {
                    title: format!("Tariff notice {n}"),
                    published_on: None,
                    category: String::from("Rule"),
                    url: None,
                    tariff_relevant: true,
                })
                .collect()
        })
    }
}

impl MacroSource for FixtureSource {
    fn economic_indicators<'a>(
        &'a self,
        country: &'a CountryCode,
    ) -> BoxFuture<'a, Vec<IndicatorObservation>> {
        Box::pin(async move {
            self.fixture(country)
                .map(|fixture| fixture.indicators.clone())
                .unwrap_or_default()
        })
    }

    fn countries<'a>(&'a self) -> BoxFuture<'a, Vec<CountryInfo>> {
        Box::pin(async move { Vec::new() })
    }
}

impl TariffSource for FixtureSource {
    fn current_tariff<'a>(&'a self, country: &'a CountryCode) -> BoxFuture<'a, Option<TariffEntry>> {
        Box::pin(async move { self.fixture(country).and_then(|fixture| fixture.tariff.clone()) })
    }
}

fn tariff(rate: f64) -> Option<TariffEntry> {
    Some(tariff_entry(rate, "autos"))
}

fn code(value: &str) -> CountryCode {
    country(value)
}

fn model(source: FixtureSource, sample: &[&str]) -> TariffImpactModel {
    let source = Arc::new(source);
    let aggregation = Arc::new(DataAggregationManager::new(
        source.clone(),
        source.clone(),
        source,
    ));
    TariffImpactModel::new(aggregation, sample.iter().map(|value| code(value)).collect())
}

fn usa_fixture() -> CountryFixture {
    CountryFixture {
        // Out of order on purpose: growth uses the two most recent years.
        indicators: vec![
            observation(Indicator::GdpCurrentUsd, 100.0, 2022),
            observation(Indicator::GdpCurrentUsd, 110.0, 2023),
            observation(Indicator::GdpCurrentUsd, 90.0, 2021),
            observation(Indicator::TradePercentOfGdp, 20.0, 2022),
            observation(Indicator::TradePercentOfGdp, 30.0, 2023),
        ],
        tariff: tariff(10.0),
        documents: 1,
    }
}

// =============================================================================
// Profile derivation
// =============================================================================

#[tokio::test]
async fn gdp_growth_compares_the_two_most_recent_years() {
    let model = model(FixtureSource::default().with_country("USA", usa_fixture()), &[]);

    let profile = model.country_profile(&code("USA")).await.expect("profile");

    assert!((profile.gdp_growth - 10.0).abs() < 1e-9);
    assert_eq!(profile.gdp_current, Some(110.0));
    assert_eq!(profile.gdp_year, Some(2023));
    assert_eq!(profile.trade_intensity, 25.0);
    assert_eq!(profile.confidence, QualityTier::High);
    assert_eq!(profile.impact_level, ImpactLevel::Medium);
}

#[tokio::test]
async fn single_gdp_observation_means_zero_growth() {
    let fixture = CountryFixture {
        indicators: vec![
            observation(Indicator::GdpCurrentUsd, 500.0, 2023),
            observation(Indicator::TradePercentOfGdp, 40.0, 2023),
        ],
        ..CountryFixture::default()
    };
    let model = model(FixtureSource::default().with_country("BRA", fixture), &[]);

    let profile = model.country_profile(&code("BRA")).await.expect("profile");

    assert_eq!(profile.gdp_growth, 0.0);
    assert_eq!(profile.tariff_rate, 0.0);
    assert_eq!(profile.confidence, QualityTier::Medium);
}

#[test]
fn impact_level_thresholds() {
    assert_eq!(classify_impact(25.0, 60.0), ImpactLevel::High);
    assert_eq!(classify_impact(12.0, 10.0), ImpactLevel::Medium);
    assert_eq!(classify_impact(5.0, 30.0), ImpactLevel::Medium);
    assert_eq!(classify_impact(5.0, 10.0), ImpactLevel::Low);
    assert_eq!(classify_impact(0.0, 50.0), ImpactLevel::High);
}

// =============================================================================
// Economic effects
// =============================================================================

#[test]
fn effects_follow_the_published_formulas() {
    let impact = economic_impact(10.0, 30.0);

    assert!((impact.gdp - -3.0).abs() < 1e-9);
    assert!((impact.trade - -5.0).abs() < 1e-9);
    assert!((impact.employment - -0.9).abs() < 1e-9);
    assert!((impact.consumer_prices - 3.0).abs() < 1e-9);

    let sectors = sector_impact(10.0);
    assert!((sectors.primary - -4.0).abs() < 1e-9);
    assert!((sectors.secondary - -6.0).abs() < 1e-9);
    assert!((sectors.tertiary - -3.0).abs() < 1e-9);
    assert!((sectors.technology - -7.5).abs() < 1e-9);
}

#[test]
fn extreme_inputs_stay_within_bounds() {
    let impact = economic_impact(900.0, 400.0);

    assert_eq!(impact.gdp, -50.0);
    assert_eq!(impact.trade, -30.0);
    assert_eq!(impact.employment, -15.0);
    assert_eq!(impact.consumer_prices, 20.0);
}

#[test]
fn higher_tariffs_never_soften_the_effects() {
    let mut previous = economic_impact(0.0, 45.0);
    for step in 1..=200 {
        let current = economic_impact(f64::from(step) * 0.5, 45.0);
        assert!(current.gdp <= previous.gdp);
        assert!(current.trade <= previous.trade);
        assert!(current.employment <= previous.employment);
        assert!(current.consumer_prices >= previous.consumer_prices);
        previous = current;
    }
}

// =============================================================================
// Risk and overrides
// =============================================================================

#[test]
fn risk_combines_rate_dependence_and_confidence() {
    assert_eq!(classify_risk(30.0, 60.0, QualityTier::High), RiskLevel::Medium);
    assert_eq!(classify_risk(30.0, 60.0, QualityTier::Medium), RiskLevel::High);
    assert_eq!(classify_risk(2.0, 10.0, QualityTier::High), RiskLevel::Low);
    assert_eq!(classify_risk(2.0, 10.0, QualityTier::Low), RiskLevel::Low);
    assert_eq!(classify_risk(5.0, 10.0, QualityTier::Low), RiskLevel::Medium);
}

#[tokio::test]
async fn tariff_override_changes_the_analysis_but_not_the_profile() {
    let model = model(FixtureSource::default().with_country("USA", usa_fixture()), &[]);
    let usa = code("USA");

    let baseline = model
        .analyze_country(&usa, AnalysisOverrides::default())
        .await
        .expect("analysis");
    let scenario = model
        .analyze_country(&usa, AnalysisOverrides::tariff_rate(40.0))
        .await
        .expect("analysis");

    assert_eq!(baseline.effective_tariff_rate, 10.0);
    assert_eq!(scenario.effective_tariff_rate, 40.0);
    assert!(scenario.economic_impact.gdp < baseline.economic_impact.gdp);
    assert_eq!(scenario.profile.tariff_rate, 10.0);
    assert_eq!(scenario.profile, baseline.profile);
}

#[tokio::test]
async fn non_finite_override_falls_back_to_the_profile_rate() {
    let model = model(FixtureSource::default().with_country("USA", usa_fixture()), &[]);
    let profile = model.country_profile(&code("USA")).await.expect("profile");

    let result = analyze_profile(profile, AnalysisOverrides::tariff_rate(f64::NAN));
    assert_eq!(result.effective_tariff_rate, 10.0);
    assert!(!result.recommendations.is_empty());
}

// =============================================================================
// Global overview
// =============================================================================

#[tokio::test]
async fn overview_counts_only_countries_with_data() {
    let source = FixtureSource::default()
        .with_country("USA", usa_fixture())
        .with_country(
            "CHN",
            CountryFixture {
                indicators: vec![observation(Indicator::TradePercentOfGdp, 60.0, 2023)],
                tariff: tariff(25.0),
                documents: 3,
            },
        );
    let model = model(source, &["USA", "CHN", "ATA"]);

    let overview = model.global_overview().await;

    assert_eq!(overview.countries_sampled, 3);
    assert_eq!(overview.countries_analyzed, 2);
    assert_eq!(overview.impact_counts.total(), 2);
    assert_eq!(overview.impact_counts.high, 1);
    assert_eq!(overview.impact_counts.medium, 1);
    assert_eq!(overview.confidence_counts.total(), 2);
    assert!((overview.average_tariff_rate - 17.5).abs() < 1e-9);
    // USA: -(10 * 25 * 0.01); CHN: -(25 * 60 * 0.01)
    assert!((overview.total_gdp_impact - -17.5).abs() < 1e-9);
}

#[tokio::test]
async fn overview_of_an_empty_sample_is_all_zero() {
    let model = model(FixtureSource::default(), &[]);

    let overview = model.global_overview().await;

    assert_eq!(overview.countries_sampled, 0);
    assert_eq!(overview.countries_analyzed, 0);
    assert_eq!(overview.average_tariff_rate, 0.0);
}
