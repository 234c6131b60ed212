//! Configuration loading.
//!
//! Settings come from an optional TOML file, then `TARIFFSCOPE_*`
//! environment variables override individual fields:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `TARIFFSCOPE_CACHE_TTL_SECS` | `cache_ttl_secs` |
//! | `TARIFFSCOPE_FETCH_BUDGET_MS` | `fetch.budget_ms` |
//! | `TARIFFSCOPE_RELAY_ROUTES` | `fetch.routes` (`name=prefix,...`, after `direct`) |
//! | `TARIFFSCOPE_TARIFF_TRACKER_URL` | `tariff_tracker.base_url` |
//! | `TARIFFSCOPE_TARIFF_TRACKER_API_KEY` | `tariff_tracker.api_key` |
//! | `TARIFFSCOPE_OVERVIEW_SAMPLE` | `overview_sample` (comma-separated codes) |
//! | `TARIFFSCOPE_LOG` | `log_filter` |

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_PROFILE_TTL;
use crate::connectors::DEFAULT_RELEVANCE_KEYWORDS;
use crate::fetcher::{FetchPlan, Route};
use crate::impact::DEFAULT_OVERVIEW_SAMPLE;
use crate::{ConfigError, CountryCode, ValidationError};

pub const ENV_CACHE_TTL_SECS: &str = "TARIFFSCOPE_CACHE_TTL_SECS";
pub const ENV_FETCH_BUDGET_MS: &str = "TARIFFSCOPE_FETCH_BUDGET_MS";
pub const ENV_RELAY_ROUTES: &str = "TARIFFSCOPE_RELAY_ROUTES";
pub const ENV_TRACKER_URL: &str = "TARIFFSCOPE_TARIFF_TRACKER_URL";
pub const ENV_TRACKER_API_KEY: &str = "TARIFFSCOPE_TARIFF_TRACKER_API_KEY";
pub const ENV_OVERVIEW_SAMPLE: &str = "TARIFFSCOPE_OVERVIEW_SAMPLE";
pub const ENV_LOG: &str = "TARIFFSCOPE_LOG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TariffScopeConfig {
    /// Lifetime of a cached country profile.
    pub cache_ttl_secs: u64,
    pub fetch: FetchConfig,
    pub federal_register: FederalRegisterConfig,
    pub world_bank: WorldBankConfig,
    pub tariff_tracker: TariffTrackerConfig,
    /// Economies analyzed by the global overview.
    pub overview_sample: Vec<String>,
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for TariffScopeConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: DEFAULT_PROFILE_TTL.as_secs(),
            fetch: FetchConfig::default(),
            federal_register: FederalRegisterConfig::default(),
            world_bank: WorldBankConfig::default(),
            tariff_tracker: TariffTrackerConfig::default(),
            overview_sample: DEFAULT_OVERVIEW_SAMPLE.iter().map(|c| (*c).to_owned()).collect(),
            log_filter: String::from("tariffscope_core=info,warn"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Total time allowed for one fetch across every route.
    pub budget_ms: u64,
    pub attempt_timeout_ms: u64,
    pub routes: Vec<Route>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        let plan = FetchPlan::default();
        Self {
            budget_ms: duration_ms(plan.budget()),
            attempt_timeout_ms: duration_ms(plan.attempt_timeout()),
            routes: plan.routes().to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FederalRegisterConfig {
    pub enabled: bool,
    pub base_url: String,
    pub page_size: u32,
    pub keywords: Vec<String>,
}

impl Default for FederalRegisterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: String::from("https://www.federalregister.gov/api/v1"),
            page_size: 10,
            keywords: DEFAULT_RELEVANCE_KEYWORDS.iter().map(|k| (*k).to_owned()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldBankConfig {
    pub enabled: bool,
    pub base_url: String,
    pub recent_years: u32,
}

impl Default for WorldBankConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: String::from("https://api.worldbank.org/v2"),
            recent_years: 5,
        }
    }
}

/// The tracker has no public default endpoint; it stays disabled until a
/// base URL is configured.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TariffTrackerConfig {
    pub base_url: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl TariffScopeConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Applies `TARIFFSCOPE_*` variables from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Applies overrides from any variable lookup.
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_CACHE_TTL_SECS) {
            self.cache_ttl_secs = parse_number(ENV_CACHE_TTL_SECS, &value)?;
        }
        if let Some(value) = lookup(ENV_FETCH_BUDGET_MS) {
            self.fetch.budget_ms = parse_number(ENV_FETCH_BUDGET_MS, &value)?;
        }
        if let Some(value) = lookup(ENV_RELAY_ROUTES) {
            self.fetch.routes = parse_relay_routes(&value)?;
        }
        if let Some(value) = lookup(ENV_TRACKER_URL) {
            self.tariff_tracker.base_url = non_blank(value);
        }
        if let Some(value) = lookup(ENV_TRACKER_API_KEY) {
            self.tariff_tracker.api_key = non_blank(value);
        }
        if let Some(value) = lookup(ENV_OVERVIEW_SAMPLE) {
            self.overview_sample = value
                .split(',')
                .map(str::trim)
                .filter(|code| !code.is_empty())
                .map(str::to_owned)
                .collect();
        }
        if let Some(value) = lookup(ENV_LOG) {
            if let Some(filter) = non_blank(value) {
                self.log_filter = filter;
            }
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.fetch_plan()?;
        self.overview_countries()?;
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn fetch_plan(&self) -> Result<FetchPlan, ValidationError> {
        FetchPlan::new(
            self.fetch.routes.clone(),
            Duration::from_millis(self.fetch.budget_ms),
            Duration::from_millis(self.fetch.attempt_timeout_ms),
        )
    }

    pub fn overview_countries(&self) -> Result<Vec<CountryCode>, ValidationError> {
        self.overview_sample
            .iter()
            .map(|code| CountryCode::parse(code))
            .collect()
    }
}

fn parse_number(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        name,
        value: value.to_owned(),
    })
}

/// `name=prefix` pairs, comma-separated. `direct` always comes first.
fn parse_relay_routes(value: &str) -> Result<Vec<Route>, ConfigError> {
    let mut routes = vec![Route::Direct];
    for entry in value.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
        let Some((name, prefix)) = entry.split_once('=') else {
            return Err(ConfigError::InvalidEnv {
                name: ENV_RELAY_ROUTES,
                value: value.to_owned(),
            });
        };
        routes.push(Route::relay(name.trim(), prefix.trim())?);
    }
    Ok(routes)
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

fn duration_ms(duration: Duration) -> u64 {
    duration.as_millis().min(u128::from(u64::MAX)) as u64
}
