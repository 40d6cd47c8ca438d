//! The flat wire record delivered by the UI, keyboard mapper or voice bridge

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::error::{BridgeError, Result};

/// One fixed schema for every department.
///
/// Only `department` and `intent` are required; the rest are intent-specific
/// and fall back to documented defaults when absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BridgeCommand {
    pub department: String,
    pub intent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Warp speed, 0 < factor < 10
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warp_factor: Option<f32>,
    /// Impulse throttle, 0 - 100
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impulse_percent: Option<f32>,
    /// Named maneuver ("come about", "hard to port", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maneuver: Option<String>,
    /// Ship system for damage control
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subsystem: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
    /// Power channel for boost / reduce
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Full power table for set_power
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution: Option<BTreeMap<String, f32>>,
    /// Alert level for set_alert
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weapon: Option<String>,
    /// Relative turn in degrees, positive to starboard
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<[f32; 3]>,
    /// Parser confidence (0.0 - 1.0) when the command came from speech
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl BridgeCommand {
    pub fn new(department: impl Into<String>, intent: impl Into<String>) -> Self {
        Self {
            department: department.into(),
            intent: intent.into(),
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_warp_factor(mut self, factor: f32) -> Self {
        self.warp_factor = Some(factor);
        self
    }

    pub fn with_impulse(mut self, percent: f32) -> Self {
        self.impulse_percent = Some(percent);
        self
    }

    pub fn with_subsystem(mut self, subsystem: impl Into<String>) -> Self {
        self.subsystem = Some(subsystem.into());
        self
    }

    pub fn with_amount(mut self, amount: f32) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_preset(mut self, preset: impl Into<String>) -> Self {
        self.preset = Some(preset.into());
        self
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    pub fn with_scan_type(mut self, scan_type: impl Into<String>) -> Self {
        self.scan_type = Some(scan_type.into());
        self
    }

    pub fn with_weapon(mut self, weapon: impl Into<String>) -> Self {
        self.weapon = Some(weapon.into());
        self
    }

    pub fn with_heading(mut self, degrees: f32) -> Self {
        self.heading = Some(degrees);
        self
    }

    pub fn with_maneuver(mut self, maneuver: impl Into<String>) -> Self {
        self.maneuver = Some(maneuver.into());
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Parse console shorthand: `<department> <intent> [key=value ...]`.
    ///
    /// Underscores in `target` stand for spaces. `coordinates` takes `x,y,z`
    /// and `distribution` takes `channel:value,...`.
    pub fn from_shorthand(line: &str) -> Result<Self> {
        let mut parts = line.split_whitespace();
        let (department, intent) = match (parts.next(), parts.next()) {
            (Some(d), Some(i)) => (d, i),
            _ => {
                return Err(BridgeError::InvalidParameter(
                    "expected '<department> <intent> [key=value ...]'".into(),
                ))
            }
        };

        let mut cmd = Self::new(department, intent);
        for pair in parts {
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                BridgeError::InvalidParameter(format!("expected key=value, got '{}'", pair))
            })?;
            match key {
                "target" => cmd.target = Some(value.replace('_', " ")),
                "warp_factor" | "warp" => cmd.warp_factor = Some(parse_number(key, value)?),
                "impulse_percent" | "impulse" => {
                    cmd.impulse_percent = Some(parse_number(key, value)?)
                }
                "amount" => cmd.amount = Some(parse_number(key, value)?),
                "heading" => cmd.heading = Some(parse_number(key, value)?),
                "pitch" => cmd.pitch = Some(parse_number(key, value)?),
                "confidence" => cmd.confidence = Some(parse_number(key, value)?),
                "maneuver" => cmd.maneuver = Some(value.to_string()),
                "subsystem" | "system" => cmd.subsystem = Some(value.to_string()),
                "preset" => cmd.preset = Some(value.to_string()),
                "channel" => cmd.channel = Some(value.to_string()),
                "level" => cmd.level = Some(value.to_string()),
                "scan_type" | "scan" => cmd.scan_type = Some(value.to_string()),
                "weapon" => cmd.weapon = Some(value.to_string()),
                "coordinates" | "coords" => {
                    let values = value
                        .split(',')
                        .map(|v| parse_number(key, v))
                        .collect::<Result<Vec<f32>>>()?;
                    let xyz: [f32; 3] = values.try_into().map_err(|_| {
                        BridgeError::InvalidParameter("coordinates needs exactly x,y,z".into())
                    })?;
                    cmd.coordinates = Some(xyz);
                }
                "distribution" => {
                    let mut map = BTreeMap::new();
                    for entry in value.split(',') {
                        let (channel, amount) = entry.split_once(':').ok_or_else(|| {
                            BridgeError::InvalidParameter(format!(
                                "expected channel:value, got '{}'",
                                entry
                            ))
                        })?;
                        map.insert(channel.to_string(), parse_number(channel, amount)?);
                    }
                    cmd.distribution = Some(map);
                }
                other => {
                    return Err(BridgeError::InvalidParameter(format!(
                        "unknown field '{}'",
                        other
                    )))
                }
            }
        }
        Ok(cmd)
    }

    /// Range checks on the numeric fields that apply regardless of intent
    pub fn validate(&self) -> Result<()> {
        if self.department.trim().is_empty() {
            return Err(BridgeError::InvalidParameter("department is required".into()));
        }
        if self.intent.trim().is_empty() {
            return Err(BridgeError::InvalidParameter("intent is required".into()));
        }
        if let Some(wf) = self.warp_factor {
            if !(wf > 0.0 && wf < 10.0) {
                return Err(BridgeError::InvalidParameter(format!(
                    "warp factor must be between 0 and 10 (got {})",
                    wf
                )));
            }
        }
        if let Some(imp) = self.impulse_percent {
            if !(0.0..=100.0).contains(&imp) {
                return Err(BridgeError::InvalidParameter(format!(
                    "impulse must be between 0 and 100 (got {})",
                    imp
                )));
            }
        }
        if let Some(amount) = self.amount {
            if !amount.is_finite() {
                return Err(BridgeError::InvalidParameter("amount must be a number".into()));
            }
        }
        if let Some(c) = self.confidence {
            if !c.is_finite() {
                return Err(BridgeError::InvalidParameter("confidence must be a number".into()));
            }
        }
        let angles = [("heading", self.heading), ("pitch", self.pitch)];
        for (name, value) in angles {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(BridgeError::InvalidParameter(format!(
                        "{} must be a finite number of degrees (got {})",
                        name, v
                    )));
                }
            }
        }
        if let Some(xyz) = self.coordinates {
            if xyz.iter().any(|v| !v.is_finite()) {
                return Err(BridgeError::InvalidParameter(format!(
                    "coordinates must be finite (got {:?})",
                    xyz
                )));
            }
        }
        Ok(())
    }
}

fn parse_number(key: &str, value: &str) -> Result<f32> {
    value
        .trim()
        .parse()
        .map_err(|_| {
            BridgeError::InvalidParameter(format!("{} must be a number (got '{}')", key, value))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_voice_bridge_json() {
        let json = r#"{"department":"helm","intent":"navigate","target":"Jupiter","warp_factor":5,"impulse_percent":null,"maneuver":null,"confidence":0.9}"#;
        let cmd = BridgeCommand::from_json(json).unwrap();
        assert_eq!(cmd.department, "helm");
        assert_eq!(cmd.intent, "navigate");
        assert_eq!(cmd.target.as_deref(), Some("Jupiter"));
        assert_eq!(cmd.warp_factor, Some(5.0));
        assert_eq!(cmd.impulse_percent, None);
        assert!(cmd.validate().is_ok());
    }

    #[test]
    fn test_missing_required_field_fails_to_parse() {
        assert!(BridgeCommand::from_json(r#"{"intent":"status"}"#).is_err());
    }

    #[test]
    fn test_warp_factor_bounds() {
        assert!(BridgeCommand::new("helm", "warp").with_warp_factor(9.9).validate().is_ok());
        assert!(BridgeCommand::new("helm", "warp").with_warp_factor(10.0).validate().is_err());
        assert!(BridgeCommand::new("helm", "warp").with_warp_factor(0.0).validate().is_err());
    }

    #[test]
    fn test_impulse_bounds() {
        assert!(BridgeCommand::new("helm", "impulse").with_impulse(100.0).validate().is_ok());
        assert!(BridgeCommand::new("helm", "impulse").with_impulse(120.0).validate().is_err());
    }

    #[test]
    fn test_non_finite_angles_and_coordinates_rejected() {
        let turn = BridgeCommand::new("helm", "turn");
        assert!(turn.clone().with_heading(f32::INFINITY).validate().is_err());
        assert!(turn.clone().with_heading(-45.0).validate().is_ok());

        let mut pitched = turn.clone();
        pitched.pitch = Some(f32::NAN);
        assert!(pitched.validate().is_err());

        let nan_heading = BridgeCommand::from_shorthand("helm turn heading=nan").unwrap();
        assert!(matches!(
            nan_heading.validate(),
            Err(BridgeError::InvalidParameter(ref msg)) if msg.contains("heading")
        ));

        let mut cmd = BridgeCommand::new("helm", "navigate_coordinates");
        cmd.coordinates = Some([1.0, f32::NEG_INFINITY, 3.0]);
        assert!(cmd.validate().is_err());
    }

    #[test]
    fn test_shorthand() {
        let cmd = BridgeCommand::from_shorthand("helm navigate target=starbase_1 warp=6").unwrap();
        assert_eq!(cmd.department, "helm");
        assert_eq!(cmd.intent, "navigate");
        assert_eq!(cmd.target.as_deref(), Some("starbase 1"));
        assert_eq!(cmd.warp_factor, Some(6.0));

        let cmd = BridgeCommand::from_shorthand(
            "engineering set_power distribution=propulsion:40,shielding:30,armament:20,sensors:10",
        )
        .unwrap();
        assert_eq!(cmd.distribution.unwrap()["propulsion"], 40.0);

        let cmd = BridgeCommand::from_shorthand("helm navigate_coordinates coords=1,2,3").unwrap();
        assert_eq!(cmd.coordinates, Some([1.0, 2.0, 3.0]));
    }

    #[test]
    fn test_shorthand_errors() {
        assert!(BridgeCommand::from_shorthand("helm").is_err());
        assert!(BridgeCommand::from_shorthand("helm warp warp=fast").is_err());
        assert!(BridgeCommand::from_shorthand("helm navigate coords=1,2").is_err());
        assert!(BridgeCommand::from_shorthand("helm stop colour=red").is_err());
    }

    #[test]
    fn test_serialization_skips_absent_fields() {
        let json = BridgeCommand::new("tactical", "raise_shields").to_json().unwrap();
        assert_eq!(json, r#"{"department":"tactical","intent":"raise_shields"}"#);
    }
}
