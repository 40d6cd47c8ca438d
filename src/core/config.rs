//! Ship configuration with documented constants
//!
//! All tuning numbers live here, grouped by the department that reads them.
//! Every section falls back to its defaults when missing from a TOML file,
//! so a config file only needs the values it overrides.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{BridgeError, Result};

/// Command intake settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandConfig {
    /// Commands carrying a confidence below this are bounced back to the
    /// operator instead of reaching a department (voice bridge output).
    pub min_confidence: f32,
    /// Default `amount` for damage / power adjustments when omitted
    pub default_amount: f32,
    /// Default impulse when `impulse_percent` is omitted
    pub default_impulse_percent: f32,
    /// Default warp factor when neither the command nor helm memory has one
    pub default_warp_factor: f32,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.3,
            default_amount: 10.0,
            default_impulse_percent: 100.0,
            default_warp_factor: 5.0,
        }
    }
}

/// Alert handling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Length of the klaxon cue played when entering red alert
    pub klaxon_seconds: f32,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self { klaxon_seconds: 4.0 }
    }
}

/// Deflector shields
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShieldConfig {
    pub max_strength: f32,
    /// Percent per second while raising
    pub raise_rate: f32,
    /// Percent per second while lowering
    pub lower_rate: f32,
    /// Percent per second regenerated while raised, at 25% shield power and green alert
    pub regen_rate: f32,
    /// Regeneration multiplier per alert level: [green, yellow, red]
    pub alert_regen_factor: [f32; 3],
}

impl Default for ShieldConfig {
    fn default() -> Self {
        Self {
            max_strength: 100.0,
            raise_rate: 40.0,
            lower_rate: 60.0,
            regen_rate: 2.0,
            alert_regen_factor: [1.0, 1.5, 2.0],
        }
    }
}

/// Weapons
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponConfig {
    pub phaser_cooldown: f32,
    pub torpedo_cooldown: f32,
    /// Cooldown multiplier per alert level: [green, yellow, red]
    pub alert_cooldown_factor: [f32; 3],
    /// Phaser damage at 25% armament power
    pub phaser_damage: f32,
    pub torpedo_damage: f32,
    pub torpedo_capacity: u32,
}

impl Default for WeaponConfig {
    fn default() -> Self {
        Self {
            phaser_cooldown: 2.0,
            torpedo_cooldown: 4.0,
            alert_cooldown_factor: [1.0, 0.85, 0.7],
            phaser_damage: 10.0,
            torpedo_damage: 40.0,
            torpedo_capacity: 250,
        }
    }
}

/// Target acquisition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetingConfig {
    /// Seconds to achieve lock at 25% sensor power
    pub base_lock_time: f32,
}

impl Default for TargetingConfig {
    fn default() -> Self {
        Self { base_lock_time: 3.0 }
    }
}

/// Engineering: power ramps and damage control
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineeringConfig {
    /// Seconds for a power change to ramp from the old table to the new one
    pub power_transition_seconds: f32,
    /// Health points restored per second on the system under repair
    pub repair_rate: f32,
    /// Systems tracked by damage control
    pub systems: Vec<String>,
}

impl Default for EngineeringConfig {
    fn default() -> Self {
        Self {
            power_transition_seconds: 1.5,
            repair_rate: 10.0,
            systems: [
                "warp_drive",
                "impulse_engines",
                "shields",
                "weapons",
                "sensors",
                "life_support",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Sensors / ops
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Base scan durations in seconds: [quick, standard, detailed, deep]
    pub scan_durations: [f32; 4],
    /// Relative measurement uncertainty at 1.0x resolution: [quick, standard, detailed, deep]
    pub scan_uncertainty: [f32; 4],
    /// Sensor range at 1.0x resolution (world units)
    pub base_range: f32,
    pub min_resolution: f32,
    pub max_resolution: f32,
    /// Seed for measurement noise, fixed so runs are reproducible
    pub noise_seed: u64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            scan_durations: [1.0, 3.0, 6.0, 12.0],
            scan_uncertainty: [0.10, 0.05, 0.02, 0.005],
            base_range: 150_000.0,
            min_resolution: 0.1,
            max_resolution: 2.0,
            noise_seed: 1701,
        }
    }
}

/// Warp drive
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WarpConfig {
    /// Seconds between engage and entering warp
    pub charge_seconds: f32,
    /// Warp factors per second the current factor moves toward the target
    pub factor_rate: f32,
    pub max_factor: f32,
    /// World units per second at warp 1
    pub light_speed: f32,
    /// Minimum clearance from the nearest body's surface before warp may engage
    pub min_safe_distance: f32,
    /// Override presses needed inside the window to arm the safety bypass
    pub override_presses: usize,
    pub override_window_seconds: f64,
    /// Sparse factor -> multiple of light speed table, sorted by factor
    pub speed_table: Vec<[f32; 2]>,
}

impl Default for WarpConfig {
    fn default() -> Self {
        Self {
            charge_seconds: 3.0,
            factor_rate: 1.0,
            max_factor: 9.99,
            light_speed: 300.0,
            min_safe_distance: 500.0,
            override_presses: 3,
            override_window_seconds: 1.0,
            speed_table: crate::warp::speed::DEFAULT_SPEED_TABLE.to_vec(),
        }
    }
}

/// Helm / impulse handling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HelmConfig {
    /// World units per second at full impulse and 25% propulsion power
    pub max_impulse_speed: f32,
    /// Degrees per second the ship turns toward its commanded heading
    pub turn_rate: f32,
    /// Autopilot drops out of warp inside this distance from the course target's surface
    pub arrival_distance: f32,
    /// Orbit can only be requested this close to the body's surface
    pub orbit_range: f32,
    /// Ship position at simulation start (Earth approach in the Sol chart)
    pub start_position: [f32; 3],
}

impl Default for HelmConfig {
    fn default() -> Self {
        Self {
            max_impulse_speed: 75.0,
            turn_rate: 30.0,
            arrival_distance: 2_000.0,
            orbit_range: 10_000.0,
            start_position: [100_000.0, 0.0, 5_000.0],
        }
    }
}

/// Complete ship configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipConfig {
    pub command: CommandConfig,
    pub alert: AlertConfig,
    pub shields: ShieldConfig,
    pub weapons: WeaponConfig,
    pub targeting: TargetingConfig,
    pub engineering: EngineeringConfig,
    pub sensors: SensorConfig,
    pub warp: WarpConfig,
    pub helm: HelmConfig,
}

impl ShipConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a config from a TOML file and validate it
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: ShipConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("shields.max_strength", self.shields.max_strength),
            ("shields.raise_rate", self.shields.raise_rate),
            ("shields.lower_rate", self.shields.lower_rate),
            ("weapons.phaser_cooldown", self.weapons.phaser_cooldown),
            ("weapons.torpedo_cooldown", self.weapons.torpedo_cooldown),
            ("targeting.base_lock_time", self.targeting.base_lock_time),
            (
                "engineering.power_transition_seconds",
                self.engineering.power_transition_seconds,
            ),
            ("engineering.repair_rate", self.engineering.repair_rate),
            ("sensors.base_range", self.sensors.base_range),
            ("warp.charge_seconds", self.warp.charge_seconds),
            ("warp.factor_rate", self.warp.factor_rate),
            ("warp.light_speed", self.warp.light_speed),
            ("helm.max_impulse_speed", self.helm.max_impulse_speed),
            ("helm.turn_rate", self.helm.turn_rate),
            ("helm.orbit_range", self.helm.orbit_range),
        ];
        for (name, value) in positive {
            if value <= 0.0 || !value.is_finite() {
                return Err(BridgeError::Configuration(format!(
                    "{} must be positive (got {})",
                    name, value
                )));
            }
        }

        if !(0.0..=1.0).contains(&self.command.min_confidence) {
            return Err(BridgeError::Configuration(format!(
                "command.min_confidence ({}) must be within [0, 1]",
                self.command.min_confidence
            )));
        }

        if self.sensors.scan_durations.iter().any(|d| *d <= 0.0) {
            return Err(BridgeError::Configuration(
                "sensors.scan_durations must all be positive".into(),
            ));
        }

        if self.sensors.min_resolution <= 0.0
            || self.sensors.min_resolution > self.sensors.max_resolution
        {
            return Err(BridgeError::Configuration(format!(
                "sensor resolution bounds [{}, {}] are invalid",
                self.sensors.min_resolution, self.sensors.max_resolution
            )));
        }

        if self.engineering.systems.is_empty() {
            return Err(BridgeError::Configuration(
                "engineering.systems must name at least one system".into(),
            ));
        }

        if self.warp.max_factor < 1.0 {
            return Err(BridgeError::Configuration(format!(
                "warp.max_factor ({}) must be at least 1",
                self.warp.max_factor
            )));
        }

        if self.warp.override_presses == 0 || self.warp.override_window_seconds <= 0.0 {
            return Err(BridgeError::Configuration(
                "warp override needs at least one press and a positive window".into(),
            ));
        }

        crate::warp::speed::WarpSpeedTable::from_entries(&self.warp.speed_table)
            .map_err(BridgeError::Configuration)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ShipConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ShipConfig::from_toml_str(
            r#"
            [warp]
            charge_seconds = 5.0

            [shields]
            raise_rate = 20.0
            "#,
        )
        .unwrap();

        assert_eq!(config.warp.charge_seconds, 5.0);
        assert_eq!(config.warp.max_factor, 9.99);
        assert_eq!(config.shields.raise_rate, 20.0);
        assert_eq!(config.shields.lower_rate, 60.0);
        assert_eq!(config.weapons.torpedo_capacity, 250);
    }

    #[test]
    fn test_rejects_negative_rate() {
        let mut config = ShipConfig::default();
        config.engineering.repair_rate = -1.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("engineering.repair_rate"));
    }

    #[test]
    fn test_rejects_unsorted_speed_table() {
        let mut config = ShipConfig::default();
        config.warp.speed_table = vec![[1.0, 1.0], [3.0, 39.0], [2.0, 10.0]];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_confidence_out_of_range() {
        let mut config = ShipConfig::default();
        config.command.min_confidence = 1.5;
        assert!(matches!(
            config.validate(),
            Err(BridgeError::Configuration(_))
        ));
    }

    #[test]
    fn test_load_sample_config() {
        let config = ShipConfig::load("data/ship.toml").expect("sample config should load");
        assert_eq!(config.warp.override_presses, 3);
        assert!(config.sensors.base_range > 0.0);
    }
}
