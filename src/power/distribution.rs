//! The four-channel allocation table

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::PowerError;

/// Allowed drift from exactly 100% when summing channels
pub const SUM_TOLERANCE: f32 = 0.1;

/// Allocation share that counts as a 1.0x multiplier
const NOMINAL_SHARE: f32 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerChannel {
    Propulsion,
    Shielding,
    Armament,
    Sensors,
}

impl PowerChannel {
    pub const ALL: [PowerChannel; 4] = [
        PowerChannel::Propulsion,
        PowerChannel::Shielding,
        PowerChannel::Armament,
        PowerChannel::Sensors,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Propulsion => "propulsion",
            Self::Shielding => "shielding",
            Self::Armament => "armament",
            Self::Sensors => "sensors",
        }
    }

    /// The three channels that absorb a change to this one
    pub fn others(self) -> impl Iterator<Item = PowerChannel> {
        Self::ALL.into_iter().filter(move |c| *c != self)
    }
}

impl fmt::Display for PowerChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PowerChannel {
    type Err = PowerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "propulsion" | "engines" | "impulse" | "warp" => Ok(Self::Propulsion),
            "shielding" | "shields" | "deflectors" => Ok(Self::Shielding),
            "armament" | "weapons" | "phasers" => Ok(Self::Armament),
            "sensors" | "sensor" | "scanners" => Ok(Self::Sensors),
            other => Err(PowerError::UnknownChannel(other.to_string())),
        }
    }
}

/// Percentage allocated to each channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerDistribution {
    pub propulsion: f32,
    pub shielding: f32,
    pub armament: f32,
    pub sensors: f32,
}

impl Default for PowerDistribution {
    fn default() -> Self {
        Self::new(25.0, 25.0, 25.0, 25.0)
    }
}

impl PowerDistribution {
    pub const fn new(propulsion: f32, shielding: f32, armament: f32, sensors: f32) -> Self {
        Self {
            propulsion,
            shielding,
            armament,
            sensors,
        }
    }

    /// Build from string-keyed pairs; keys must name every channel exactly once
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, PowerError>
    where
        I: IntoIterator<Item = (&'a str, f32)>,
    {
        let mut values: [Option<f32>; 4] = [None; 4];
        for (key, value) in pairs {
            let channel: PowerChannel = key.parse()?;
            let slot = &mut values[channel as usize];
            if slot.is_some() {
                return Err(PowerError::UnknownChannel(format!("{} (duplicate)", key)));
            }
            *slot = Some(value);
        }

        let mut dist = Self::new(0.0, 0.0, 0.0, 0.0);
        for channel in PowerChannel::ALL {
            let value = values[channel as usize].ok_or(PowerError::MissingChannel(channel))?;
            dist.set(channel, value);
        }
        Ok(dist)
    }

    pub fn get(&self, channel: PowerChannel) -> f32 {
        match channel {
            PowerChannel::Propulsion => self.propulsion,
            PowerChannel::Shielding => self.shielding,
            PowerChannel::Armament => self.armament,
            PowerChannel::Sensors => self.sensors,
        }
    }

    pub fn set(&mut self, channel: PowerChannel, value: f32) {
        match channel {
            PowerChannel::Propulsion => self.propulsion = value,
            PowerChannel::Shielding => self.shielding = value,
            PowerChannel::Armament => self.armament = value,
            PowerChannel::Sensors => self.sensors = value,
        }
    }

    pub fn sum(&self) -> f32 {
        PowerChannel::ALL.iter().map(|c| self.get(*c)).sum()
    }

    /// Multiplier derived from a channel's share: 25% is 1.0x
    pub fn multiplier(&self, channel: PowerChannel) -> f32 {
        self.get(channel) / NOMINAL_SHARE
    }

    /// Check ranges and the 100% total
    pub fn validate(&self) -> Result<(), PowerError> {
        for channel in PowerChannel::ALL {
            let value = self.get(channel);
            if !value.is_finite() {
                return Err(PowerError::NotFinite);
            }
            if !(0.0..=100.0).contains(&value) {
                return Err(PowerError::OutOfRange { channel, value });
            }
        }
        let sum = self.sum();
        if (sum - 100.0).abs() > SUM_TOLERANCE {
            return Err(PowerError::BadSum { sum });
        }
        Ok(())
    }

    /// Linear blend between two tables; `t` is clamped to [0, 1].
    ///
    /// Blending two valid tables always yields a valid table.
    pub fn lerp(from: &Self, to: &Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mut out = *from;
        for channel in PowerChannel::ALL {
            let a = from.get(channel);
            let b = to.get(channel);
            out.set(channel, a + (b - a) * t);
        }
        out
    }

    /// True when every channel is within `eps` of `other`
    pub fn approx_eq(&self, other: &Self, eps: f32) -> bool {
        PowerChannel::ALL
            .iter()
            .all(|c| (self.get(*c) - other.get(*c)).abs() <= eps)
    }
}

impl fmt::Display for PowerDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "propulsion {:.0}% / shielding {:.0}% / armament {:.0}% / sensors {:.0}%",
            self.propulsion, self.shielding, self.armament, self.sensors
        )
    }
}
