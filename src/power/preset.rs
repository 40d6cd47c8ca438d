//! Named power configurations

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{PowerDistribution, PowerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerPreset {
    /// Even split, the standing configuration
    Balanced,
    /// Shields and weapons first
    Combat,
    /// Engines and shields first
    Evasive,
    /// Sensors first
    Science,
}

impl PowerPreset {
    pub const ALL: [PowerPreset; 4] = [
        PowerPreset::Balanced,
        PowerPreset::Combat,
        PowerPreset::Evasive,
        PowerPreset::Science,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Balanced => "balanced",
            Self::Combat => "combat",
            Self::Evasive => "evasive",
            Self::Science => "science",
        }
    }

    pub fn distribution(&self) -> PowerDistribution {
        match self {
            Self::Balanced => PowerDistribution::new(25.0, 25.0, 25.0, 25.0),
            Self::Combat => PowerDistribution::new(20.0, 35.0, 35.0, 10.0),
            Self::Evasive => PowerDistribution::new(45.0, 35.0, 10.0, 10.0),
            Self::Science => PowerDistribution::new(15.0, 20.0, 5.0, 60.0),
        }
    }
}

impl fmt::Display for PowerPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PowerPreset {
    type Err = PowerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.name() == key)
            .ok_or(PowerError::UnknownPreset(key))
    }
}
