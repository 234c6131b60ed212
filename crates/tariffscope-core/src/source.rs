use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Canonical identifiers for the external data authorities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    FederalRegister,
    WorldBank,
    TariffTracker,
}

impl SourceId {
    pub const ALL: [Self; 3] = [Self::FederalRegister, Self::WorldBank, Self::TariffTracker];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FederalRegister => "federal_register",
            Self::WorldBank => "world_bank",
            Self::TariffTracker => "tariff_tracker",
        }
    }

    /// Human-readable name shown by the presentation layer.
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::FederalRegister => "Federal Register (trade policy)",
            Self::WorldBank => "World Bank Open Data",
            Self::TariffTracker => "Tariff Tracker",
        }
    }
}

impl Display for SourceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "federal_register" | "federalregister" => Ok(Self::FederalRegister),
            "world_bank" | "worldbank" => Ok(Self::WorldBank),
            "tariff_tracker" | "tarifftracker" => Ok(Self::TariffTracker),
            other => Err(ValidationError::InvalidSource {
                value: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aliases_case_insensitively() {
        assert_eq!("World-Bank".parse::<SourceId>(), Ok(SourceId::WorldBank));
        assert_eq!(
            " federalregister ".parse::<SourceId>(),
            Ok(SourceId::FederalRegister)
        );
        assert!(matches!(
            "bloomberg".parse::<SourceId>(),
            Err(ValidationError::InvalidSource { .. })
        ));
    }

    #[test]
    fn round_trips_through_as_str() {
        for id in SourceId::ALL {
            assert_eq!(id.as_str().parse::<SourceId>(), Ok(id));
        }
    }
}
