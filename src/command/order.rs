//! Typed orders, one closed enum per department
//!
//! Free-form intent strings stop here: everything past this point matches
//! exhaustively on variants.

use glam::Vec3;

use super::message::BridgeCommand;
use super::normalize::{canonical_intent, normalize_key, normalize_target, resolve_route, Route};
use crate::core::config::CommandConfig;
use crate::core::error::{BridgeError, Result};
use crate::core::types::{AlertLevel, Department};
use crate::departments::ops::ScanType;
use crate::departments::tactical::WeaponKind;
use crate::power::{PowerChannel, PowerDistribution, PowerPreset};

#[derive(Debug, Clone, PartialEq)]
pub enum ShipOrder {
    Core(CoreOrder),
    Helm(HelmOrder),
    Tactical(TacticalOrder),
    Engineering(EngineeringOrder),
    Ops(OpsOrder),
}

/// Handled by the coordinator before department routing
#[derive(Debug, Clone, PartialEq)]
pub enum CoreOrder {
    SetAlert(AlertLevel),
    FullStatus,
    /// Passed through to engineering
    DamageReport,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HelmOrder {
    Navigate {
        target: Option<String>,
        warp_factor: Option<f32>,
    },
    NavigateCoordinates {
        coordinates: Vec3,
        warp_factor: Option<f32>,
    },
    Warp {
        warp_factor: Option<f32>,
    },
    /// Change the factor of a charge or warp already under way
    SetWarpFactor {
        warp_factor: f32,
    },
    Impulse {
        percent: f32,
    },
    /// All stop: drop any warp state and kill throttle
    Stop,
    Turn {
        degrees: f32,
        pitch: Option<f32>,
    },
    Orbit {
        target: Option<String>,
    },
    Disengage,
    CancelWarp,
    /// One keystroke toward arming the warp safety override
    SafetyOverride,
    Status,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TacticalOrder {
    RaiseShields,
    LowerShields,
    Fire { weapon: WeaponKind },
    LockTarget { target: String },
    ClearTarget,
    Status,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineeringOrder {
    ApplyPreset(PowerPreset),
    AdjustPower { channel: PowerChannel, delta: f32 },
    SetDistribution(PowerDistribution),
    Damage { system: String, amount: f32 },
    Repair { system: String },
    DamageReport,
    Status,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OpsOrder {
    Scan { target: String, scan_type: ScanType },
    Sweep,
    Contacts,
    Status,
}

impl ShipOrder {
    /// Validate, gate on confidence, route and type a wire command
    pub fn parse(cmd: &BridgeCommand, defaults: &CommandConfig) -> Result<ShipOrder> {
        cmd.validate()?;
        if let Some(confidence) = cmd.confidence {
            if confidence < defaults.min_confidence {
                return Err(BridgeError::LowConfidence {
                    confidence,
                    threshold: defaults.min_confidence,
                });
            }
        }

        let route = resolve_route(&cmd.department);
        let intent = canonical_intent(&cmd.intent);

        if let Some(core) = CoreOrder::parse(route, &intent, cmd)? {
            return Ok(ShipOrder::Core(core));
        }

        match route {
            None => Err(BridgeError::UnknownDepartment(cmd.department.trim().to_string())),
            Some(Route::Core) => Err(BridgeError::UnknownCommand(intent)),
            Some(Route::Department(dept)) => match dept {
                Department::Helm => HelmOrder::parse(&intent, cmd, defaults).map(Self::Helm),
                Department::Tactical => TacticalOrder::parse(&intent, cmd).map(Self::Tactical),
                Department::Engineering => {
                    EngineeringOrder::parse(&intent, cmd, defaults).map(Self::Engineering)
                }
                Department::Ops => OpsOrder::parse(&intent, cmd).map(Self::Ops),
            },
        }
    }
}

fn required_target(cmd: &BridgeCommand, intent: &str) -> Result<String> {
    cmd.target
        .as_deref()
        .map(normalize_target)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| BridgeError::InvalidParameter(format!("{} requires a target", intent)))
}

fn optional_target(cmd: &BridgeCommand) -> Option<String> {
    cmd.target
        .as_deref()
        .map(normalize_target)
        .filter(|t| !t.is_empty())
}

impl CoreOrder {
    fn parse(route: Option<Route>, intent: &str, cmd: &BridgeCommand) -> Result<Option<Self>> {
        let order = match intent {
            "red_alert" | "battle_stations" => Self::SetAlert(AlertLevel::Red),
            "yellow_alert" => Self::SetAlert(AlertLevel::Yellow),
            "green_alert" | "stand_down" | "cancel_alert" => Self::SetAlert(AlertLevel::Green),
            "set_alert" | "alert" => {
                let raw = cmd.level.as_deref().ok_or_else(|| {
                    BridgeError::InvalidParameter("set_alert requires a level".into())
                })?;
                let level = raw.parse().map_err(BridgeError::InvalidParameter)?;
                Self::SetAlert(level)
            }
            "full_status" | "status_report" => Self::FullStatus,
            "status" if route == Some(Route::Core) => Self::FullStatus,
            "damage_report" => Self::DamageReport,
            _ => return Ok(None),
        };
        Ok(Some(order))
    }
}

/// Relative yaw for a named maneuver
fn maneuver_degrees(name: &str) -> Option<f32> {
    match normalize_key(name).as_str() {
        "come_about" | "reverse_course" | "turn_around" => Some(180.0),
        "hard_to_port" | "hard_port" => Some(-90.0),
        "hard_to_starboard" | "hard_starboard" => Some(90.0),
        "bear_to_port" | "port" => Some(-45.0),
        "bear_to_starboard" | "starboard" => Some(45.0),
        _ => None,
    }
}

impl HelmOrder {
    fn parse(intent: &str, cmd: &BridgeCommand, defaults: &CommandConfig) -> Result<Self> {
        let order = match intent {
            "navigate" => Self::Navigate {
                target: optional_target(cmd),
                warp_factor: cmd.warp_factor,
            },
            "navigate_coordinates" => {
                let [x, y, z] = cmd.coordinates.ok_or_else(|| {
                    BridgeError::InvalidParameter(
                        "navigate_coordinates requires coordinates".into(),
                    )
                })?;
                Self::NavigateCoordinates {
                    coordinates: Vec3::new(x, y, z),
                    warp_factor: cmd.warp_factor,
                }
            }
            "warp" => Self::Warp {
                warp_factor: cmd.warp_factor,
            },
            "set_warp_factor" => Self::SetWarpFactor {
                warp_factor: cmd.warp_factor.ok_or_else(|| {
                    BridgeError::InvalidParameter("set_warp_factor requires a warp_factor".into())
                })?,
            },
            "impulse" => Self::Impulse {
                percent: cmd
                    .impulse_percent
                    .unwrap_or(defaults.default_impulse_percent),
            },
            "stop" => Self::Stop,
            "turn" => {
                let degrees = match (cmd.heading, cmd.maneuver.as_deref()) {
                    (Some(deg), _) => deg,
                    (None, Some(name)) => maneuver_degrees(name).ok_or_else(|| {
                        BridgeError::InvalidParameter(format!("unknown maneuver '{}'", name))
                    })?,
                    (None, None) if cmd.pitch.is_some() => 0.0,
                    (None, None) => {
                        return Err(BridgeError::InvalidParameter(
                            "turn requires a heading or maneuver".into(),
                        ))
                    }
                };
                Self::Turn {
                    degrees,
                    pitch: cmd.pitch,
                }
            }
            "orbit" => Self::Orbit {
                target: optional_target(cmd),
            },
            "disengage" => Self::Disengage,
            "cancel_warp" | "abort_warp" | "cancel" => Self::CancelWarp,
            "override" | "safety_override" => Self::SafetyOverride,
            "status" => Self::Status,
            other => return Err(BridgeError::UnknownCommand(other.to_string())),
        };
        Ok(order)
    }
}

impl TacticalOrder {
    fn parse(intent: &str, cmd: &BridgeCommand) -> Result<Self> {
        let order = match intent {
            "raise_shields" => Self::RaiseShields,
            "lower_shields" => Self::LowerShields,
            "fire" => {
                let weapon = match cmd.weapon.as_deref() {
                    Some(name) => name.parse().map_err(BridgeError::InvalidParameter)?,
                    None => WeaponKind::Phasers,
                };
                Self::Fire { weapon }
            }
            "fire_phasers" => Self::Fire {
                weapon: WeaponKind::Phasers,
            },
            "fire_torpedo" | "fire_torpedoes" | "launch_torpedo" => Self::Fire {
                weapon: WeaponKind::Torpedoes,
            },
            "lock_target" | "target" | "set_target" | "lock" => Self::LockTarget {
                target: required_target(cmd, intent)?,
            },
            "clear_target" | "release_target" | "cancel_lock" => Self::ClearTarget,
            "status" => Self::Status,
            other => return Err(BridgeError::UnknownCommand(other.to_string())),
        };
        Ok(order)
    }
}

impl EngineeringOrder {
    fn parse(intent: &str, cmd: &BridgeCommand, defaults: &CommandConfig) -> Result<Self> {
        let amount = cmd.amount.unwrap_or(defaults.default_amount);
        let order = match intent {
            "preset" | "apply_preset" | "power_preset" | "set_preset" => {
                let name = cmd.preset.as_deref().ok_or_else(|| {
                    BridgeError::InvalidParameter("apply_preset requires a preset".into())
                })?;
                Self::ApplyPreset(name.parse()?)
            }
            "boost" | "increase_power" | "divert_power" | "reroute_power" => Self::AdjustPower {
                channel: Self::channel(cmd)?,
                delta: amount,
            },
            "reduce" | "decrease_power" => Self::AdjustPower {
                channel: Self::channel(cmd)?,
                delta: -amount,
            },
            "set_power" | "set_distribution" => {
                let map = cmd.distribution.as_ref().ok_or_else(|| {
                    BridgeError::InvalidParameter("set_power requires a distribution".into())
                })?;
                let dist =
                    PowerDistribution::from_pairs(map.iter().map(|(k, v)| (k.as_str(), *v)))?;
                dist.validate()?;
                Self::SetDistribution(dist)
            }
            "damage" | "apply_damage" | "simulate_damage" => Self::Damage {
                system: Self::system(cmd, intent)?,
                amount,
            },
            "repair" => Self::Repair {
                system: Self::system(cmd, intent)?,
            },
            "damage_report" => Self::DamageReport,
            "status" => Self::Status,
            other => return Err(BridgeError::UnknownCommand(other.to_string())),
        };
        Ok(order)
    }

    fn channel(cmd: &BridgeCommand) -> Result<PowerChannel> {
        let raw = cmd
            .channel
            .as_deref()
            .or(cmd.subsystem.as_deref())
            .or(cmd.target.as_deref())
            .ok_or_else(|| {
                BridgeError::InvalidParameter("power change requires a channel".into())
            })?;
        Ok(raw.parse()?)
    }

    fn system(cmd: &BridgeCommand, intent: &str) -> Result<String> {
        cmd.subsystem
            .as_deref()
            .or(cmd.target.as_deref())
            .map(normalize_key)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                BridgeError::InvalidParameter(format!("{} requires a subsystem", intent))
            })
    }
}

impl OpsOrder {
    fn parse(intent: &str, cmd: &BridgeCommand) -> Result<Self> {
        let order = match intent {
            "scan" => {
                let scan_type = match cmd.scan_type.as_deref() {
                    Some(name) => name.parse().map_err(BridgeError::InvalidParameter)?,
                    None => ScanType::Standard,
                };
                Self::Scan {
                    target: required_target(cmd, intent)?,
                    scan_type,
                }
            }
            "sweep" | "sensor_sweep" | "long_range_scan" | "scan_area" => Self::Sweep,
            "contacts" | "report_contacts" | "scan_results" => Self::Contacts,
            "status" => Self::Status,
            other => return Err(BridgeError::UnknownCommand(other.to_string())),
        };
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(cmd: BridgeCommand) -> Result<ShipOrder> {
        ShipOrder::parse(&cmd, &CommandConfig::default())
    }

    #[test]
    fn test_alert_is_core_regardless_of_department() {
        let order = parse(BridgeCommand::new("tactical", "red_alert")).unwrap();
        assert_eq!(order, ShipOrder::Core(CoreOrder::SetAlert(AlertLevel::Red)));

        let order = parse(BridgeCommand::new("bridge", "set_alert").with_level("yellow")).unwrap();
        assert_eq!(order, ShipOrder::Core(CoreOrder::SetAlert(AlertLevel::Yellow)));
    }

    #[test]
    fn test_status_routes_by_department() {
        assert_eq!(
            parse(BridgeCommand::new("computer", "status")).unwrap(),
            ShipOrder::Core(CoreOrder::FullStatus)
        );
        assert_eq!(
            parse(BridgeCommand::new("weapons", "report")).unwrap(),
            ShipOrder::Tactical(TacticalOrder::Status)
        );
    }

    #[test]
    fn test_unknown_department() {
        let err = parse(BridgeCommand::new("galley", "replicate")).unwrap_err();
        assert!(matches!(err, BridgeError::UnknownDepartment(ref d) if d == "galley"));
    }

    #[test]
    fn test_unknown_intent() {
        let err = parse(BridgeCommand::new("helm", "barrel_roll")).unwrap_err();
        assert!(matches!(err, BridgeError::UnknownCommand(_)));
    }

    #[test]
    fn test_low_confidence_rejected() {
        let err = parse(BridgeCommand::new("helm", "stop").with_confidence(0.1)).unwrap_err();
        assert!(matches!(err, BridgeError::LowConfidence { .. }));
        assert!(parse(BridgeCommand::new("helm", "stop").with_confidence(0.8)).is_ok());
    }

    #[test]
    fn test_navigate_synonym_and_target_alias() {
        let order = parse(
            BridgeCommand::new("navigation", "set_course")
                .with_target("the moon")
                .with_warp_factor(5.0),
        )
        .unwrap();
        assert_eq!(
            order,
            ShipOrder::Helm(HelmOrder::Navigate {
                target: Some("Moon".into()),
                warp_factor: Some(5.0)
            })
        );
    }

    #[test]
    fn test_set_warp_factor_requires_factor() {
        let order = parse(BridgeCommand::new("helm", "adjust warp").with_warp_factor(6.0)).unwrap();
        assert_eq!(
            order,
            ShipOrder::Helm(HelmOrder::SetWarpFactor { warp_factor: 6.0 })
        );
        let err = parse(BridgeCommand::new("helm", "set_warp_factor")).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidParameter(_)));
    }

    #[test]
    fn test_damage_amount_defaults_to_ten() {
        let order = parse(BridgeCommand::new("engineering", "damage").with_subsystem("Shields")).unwrap();
        assert_eq!(
            order,
            ShipOrder::Engineering(EngineeringOrder::Damage {
                system: "shields".into(),
                amount: 10.0
            })
        );
    }

    #[test]
    fn test_reduce_negates_amount() {
        let order = parse(
            BridgeCommand::new("engineering", "reduce")
                .with_channel("weapons")
                .with_amount(6.0),
        )
        .unwrap();
        assert_eq!(
            order,
            ShipOrder::Engineering(EngineeringOrder::AdjustPower {
                channel: PowerChannel::Armament,
                delta: -6.0
            })
        );
    }

    #[test]
    fn test_invalid_preset_is_validation_error() {
        let err = parse(BridgeCommand::new("engineering", "apply_preset").with_preset("ludicrous"))
            .unwrap_err();
        assert!(matches!(err, BridgeError::Power(_)));
    }

    #[test]
    fn test_maneuver_turn() {
        let order = parse(BridgeCommand::new("helm", "turn").with_maneuver("come about")).unwrap();
        assert_eq!(
            order,
            ShipOrder::Helm(HelmOrder::Turn {
                degrees: 180.0,
                pitch: None
            })
        );
        assert!(parse(BridgeCommand::new("helm", "turn")).is_err());
    }

    #[test]
    fn test_fire_torpedo_alias() {
        assert_eq!(
            parse(BridgeCommand::new("tactical", "fire_torpedoes")).unwrap(),
            ShipOrder::Tactical(TacticalOrder::Fire {
                weapon: WeaponKind::Torpedoes
            })
        );
    }

    #[test]
    fn test_scan_requires_target() {
        assert!(parse(BridgeCommand::new("ops", "scan")).is_err());
        let order = parse(
            BridgeCommand::new("sensors", "scan")
                .with_target("mars")
                .with_scan_type("deep"),
        )
        .unwrap();
        assert_eq!(
            order,
            ShipOrder::Ops(OpsOrder::Scan {
                target: "Mars".into(),
                scan_type: ScanType::Deep
            })
        );
    }
}
