//! # TariffScope Core
//!
//! Multi-source tariff data aggregation, confidence scoring and impact
//! modelling.
//!
//! ## Overview
//!
//! This crate pulls trade-policy publications, macroeconomic series and
//! current tariff figures from independent, unreliable sources and turns them
//! into a single per-country profile:
//!
//! - **Resilient fetcher** trying an ordered route list under one time budget
//! - **Source connectors** for the Federal Register, the World Bank and a tariff tracker
//! - **Aggregation manager** merging partial results and caching profiles
//! - **Impact model** deriving bounded GDP, trade, employment and price effects
//! - **Service facade** answering every call in a metadata envelope
//!
//! A failing source never aborts an analysis; missing inputs only lower the
//! profile's confidence tier.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`aggregation`] | Data aggregation manager and profile cache |
//! | [`cache`] | Generic TTL cache |
//! | [`circuit_breaker`] | Per-connector circuit breaker |
//! | [`config`] | TOML and environment configuration |
//! | [`connectors`] | Source connector traits and implementations |
//! | [`domain`] | Domain models (profiles, analyses, source status) |
//! | [`envelope`] | Response envelope with metadata |
//! | [`error`] | Core error types |
//! | [`fetcher`] | Route-list fetcher with a shared time budget |
//! | [`http_client`] | HTTP client abstraction |
//! | [`impact`] | Tariff impact model |
//! | [`service`] | Consumer-facing facade and builder |
//! | [`source`] | Source identifiers |
//! | [`source_policy`] | Declared reliability, coverage and quota per source |
//! | [`telemetry`] | `tracing` subscriber setup |
//! | [`throttling`] | Per-source rate limiting |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tariffscope_core::{telemetry, CountryAnalysis, TariffScopeConfig, TariffServiceBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TariffScopeConfig::default().with_env_overrides()?;
//!     telemetry::init_tracing(&config.log_filter);
//!
//!     let service = TariffServiceBuilder::from_config(config).build()?;
//!     let envelope = service.analyze("CHN").await;
//!     if let CountryAnalysis::Available(result) = &envelope.data {
//!         println!("GDP impact: {:.2}%", result.economic_impact.gdp);
//!     }
//!     println!("sources: {:?}", envelope.meta.sources);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │ TariffService   │──▶ Envelope<T>
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Impact Model    │────▶│ Aggregation      │──▶ TtlCache
//! └─────────────────┘     └────────┬─────────┘
//!                                  │ tokio::join!
//!                                  ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Circuit Breaker │◀────│ Connectors       │
//! │ Rate Gate       │     │ (trait objects)  │
//! └─────────────────┘     └────────┬─────────┘
//!                                  │
//!                                  ▼
//!                         ┌──────────────────┐
//!                         │ ResilientFetcher │──▶ HttpClient
//!                         └──────────────────┘
//! ```

pub mod aggregation;
pub mod cache;
pub mod circuit_breaker;
pub mod config;
pub mod connectors;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod fetcher;
pub mod http_client;
pub mod impact;
pub mod service;
pub mod source;
pub mod source_policy;
pub mod telemetry;
pub mod throttling;

// Aggregation
pub use aggregation::{DataAggregationManager, ProfileLookup};

// Caching
pub use cache::{TtlCache, DEFAULT_PROFILE_TTL};

// Circuit breaker
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};

// Configuration
pub use config::TariffScopeConfig;

// Connectors
pub use connectors::{
    BoxFuture, FederalRegisterConnector, MacroSource, PolicySource, SourceConnector, SourceError,
    SourceErrorKind, TariffSource, TariffTrackerConnector, WorldBankConnector,
};

// Domain models
pub use domain::{
    AnalysisOverrides, AnalysisResult, CalendarDate, CountryCode, CountryInfo,
    CountryTariffProfile, EconomicImpact, GlobalOverview, HealthState, ImpactLevel, Indicator,
    IndicatorObservation, PolicyDocument, QualityTier, RawCountryRecord, RiskLevel, SectorImpact,
    SourceStatus, TariffEntry, TierCounts, UtcDateTime,
};

// Envelope types
pub use envelope::{Envelope, EnvelopeError, EnvelopeMeta};

// Error types
pub use error::{ConfigError, CoreError, ValidationError};

// Fetcher
pub use fetcher::{FetchAttempt, FetchFailure, FetchPlan, FetchResult, FetchSuccess, ResilientFetcher, Route};

// HTTP client types
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpFuture, HttpMethod, HttpRequest, HttpResponse,
    OfflineHttpClient, ReqwestHttpClient,
};

// Impact model
pub use impact::{AnalyzedCountry, TariffImpactModel, DEFAULT_OVERVIEW_SAMPLE};

// Service facade
pub use service::{CountryAnalysis, TariffService, TariffServiceBuilder};

// Source identifiers and policies
pub use source::SourceId;
pub use source_policy::SourcePolicy;

// Throttling
pub use throttling::RateGate;
