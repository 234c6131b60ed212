use thiserror::Error;

/// Validation and contract errors exposed by `tariffscope-core`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("country code cannot be empty")]
    EmptyCountryCode,
    #[error("country code must be 3 ASCII letters (ISO 3166 alpha-3): '{value}'")]
    InvalidCountryCode { value: String },

    #[error("invalid source '{value}', expected one of federal_register, world_bank, tariff_tracker")]
    InvalidSource { value: String },

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },
    #[error("date must be YYYY-MM-DD: '{value}'")]
    InvalidDate { value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("tariff rate {value} is outside 0..=1000 percent")]
    TariffRateOutOfRange { value: f64 },

    #[error("relay route '{name}' must have a non-empty http(s) prefix")]
    InvalidRoutePrefix { name: String },
    #[error("fetch plan must contain at least one route")]
    EmptyRouteList,

    #[error("envelope error code cannot be empty")]
    EmptyErrorCode,
    #[error("envelope error message cannot be empty")]
    EmptyErrorMessage,
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("environment variable {name} has invalid value '{value}'")]
    InvalidEnv { name: &'static str, value: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
